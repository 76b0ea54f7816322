//! # fdtd-explorer
//!
//! One-dimensional FDTD (Finite-Difference Time-Domain) kernel for wave
//! propagation through heterogeneous, possibly lossy dielectrics.
//!
//! The crate owns the numerical core only: coefficient derivation, the
//! leapfrog field update on a Yee grid, source injection and PEC boundary
//! enforcement. Rendering, parameter sliders and the real-time loop that
//! calls [`fdtd::Simulation::step`] live in the host application.
//!
//! ```
//! use fdtd_explorer::fdtd::Simulation;
//! use fdtd_explorer::geometry::GridConfig;
//! use fdtd_explorer::materials::{explorer_regions, MaterialUpdate};
//!
//! # fn main() -> fdtd_explorer::Result<()> {
//! let grid = GridConfig::uniform(400, 0.8e-3)?;
//! let mut sim = Simulation::new(grid)?;
//! sim.set_verbose(0);
//!
//! let scene: Vec<MaterialUpdate> = explorer_regions()
//!     .into_iter()
//!     .map(MaterialUpdate::Region)
//!     .collect();
//! sim.step(&scene)?;
//!
//! for _ in 0..100 {
//!     let snapshot = sim.step(&[])?;
//!     assert_eq!(snapshot.ez[0], 0.0);
//! }
//! # Ok(())
//! # }
//! ```

pub mod arrays;
pub mod constants;
pub mod extensions;
pub mod fdtd;
pub mod geometry;
pub mod materials;

/// Errors reported by the simulation kernel.
///
/// All of them are configuration errors caught at the boundary; the
/// time-stepping itself cannot fail once its inputs are valid.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Grid or excitation placement cannot be discretized.
    #[error("invalid grid configuration: {0}")]
    InvalidGridConfig(String),

    /// A material update carries a non-physical value or an invalid span.
    #[error("invalid material parameter for region '{region}': {reason}")]
    InvalidMaterialParameter {
        /// Name of the offending region
        region: String,
        /// What was wrong with it
        reason: String,
    },

    /// A partial update named a region that was never registered.
    #[error("unknown material region '{0}'")]
    UnknownRegion(String),
}

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;
