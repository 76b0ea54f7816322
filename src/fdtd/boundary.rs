//! Grid-edge boundary conditions.

use crate::arrays::Field1D;

/// Boundary applied at both ends of the grid.
///
/// Only perfect electric conductor walls are provided; waves reaching
/// either edge are fully reflected with inverted Ez.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BoundaryCondition {
    /// Tangential E forced to zero
    #[default]
    Pec,
}

impl BoundaryCondition {
    /// Enforce the boundary on Ez.
    #[inline]
    pub fn apply(self, e_field: &mut Field1D) {
        match self {
            BoundaryCondition::Pec => apply_pec(e_field.as_mut_slice()),
        }
    }
}

/// Clamp the first and last Ez cell to zero.
#[inline]
pub fn apply_pec(ez: &mut [f64]) {
    if let Some(first) = ez.first_mut() {
        *first = 0.0;
    }
    if let Some(last) = ez.last_mut() {
        *last = 0.0;
    }
}
