//! Extension trait for hooking into the FDTD update cycle.
//!
//! # Update cycle
//!
//! Every [`Simulation`](crate::fdtd::Simulation) step runs:
//! 1. Coefficient refresh from the current materials
//! 2. H-field update
//! 3. `post_update_h`
//! 4. E-field update
//! 5. `post_update_e`
//! 6. Source injection
//! 7. Boundary enforcement, step counter increment
//! 8. `post_step`
//!
//! `post_step` sees exactly what the host's snapshot will show.
//!
//! Only `attach` can fail. The per-step hooks cannot abort a step halfway
//! through the leapfrog; an extension that detects a problem reports it
//! through `check_termination` instead.

use crate::arrays::Field1D;
use crate::geometry::GridConfig;
use crate::Result;

/// Core extension trait.
///
/// Each hook has a default no-op implementation, so extensions only need to
/// implement the hooks they require.
pub trait Extension: Sized + Send {
    /// Extension name for logging and lookup.
    fn name(&self) -> &str;

    /// Called once when the extension is attached to a simulation.
    ///
    /// Use this to validate configuration against the grid and to allocate
    /// per-cell buffers.
    fn attach(&mut self, _grid: &GridConfig) -> Result<()> {
        Ok(())
    }

    /// Called after the H-field update.
    ///
    /// # Arguments
    /// * `h_field` - Hy, may be modified
    /// * `e_field` - Ez from the previous step
    /// * `step` - Index of the step in progress
    fn post_update_h(&mut self, _h_field: &mut Field1D, _e_field: &Field1D, _step: u64) {}

    /// Called after the E-field update, before source and boundaries.
    fn post_update_e(&mut self, _e_field: &mut Field1D, _h_field: &Field1D, _step: u64) {}

    /// Called once the step is complete. `step` is the index of the step
    /// that just finished.
    fn post_step(&mut self, _e_field: &Field1D, _h_field: &Field1D, _step: u64) {}

    /// Check for early termination.
    ///
    /// Consulted by batch execution at its check interval. Return
    /// `Some(reason)` to stop the batch.
    fn check_termination(&self) -> Option<String> {
        None
    }
}
