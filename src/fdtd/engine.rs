//! Single-threaded 1D FDTD engine.
//!
//! Ez lives on integer cell positions `x = i dx`, Hy on half-integer
//! positions `x = (i + 1/2) dx`. With that layout the discrete curls are
//!
//! ```text
//! dEz/dx at Hy[i] = (Ez[i+1] - Ez[i]) / dx      for i in 0..N-1
//! dHy/dx at Ez[i] = (Hy[i]   - Hy[i-1]) / dx    for i in 1..N-1
//! ```
//!
//! Hy[N-1] sits outside the last Ez cell and is never read. The magnetic
//! pass runs to completion before the electric pass starts, so the electric
//! update always sees the new Hy and the magnetic update the old Ez.

use crate::arrays::Field1D;
use crate::fdtd::operator::{EFieldCoefficients, Operator};
use crate::materials::MaterialState;

/// Magnetic half step: `Hy[i] += db * (Ez[i+1] - Ez[i])` for i in 0..N-1.
#[inline]
pub fn update_h(hy: &mut [f64], ez: &[f64], db: f64) {
    for (h, pair) in hy.iter_mut().zip(ez.windows(2)) {
        *h += db * (pair[1] - pair[0]);
    }
}

/// Electric half step: `Ez[i] = ca[i] Ez[i] + cb[i] (Hy[i] - Hy[i-1])` for
/// i in 1..N-1. Ez[0] and Ez[N-1] are left alone.
#[inline]
pub fn update_e(ez: &mut [f64], hy: &[f64], ca: &[f64], cb: &[f64]) {
    let n = ez.len();
    for i in 1..n - 1 {
        ez[i] = ca[i] * ez[i] + cb[i] * (hy[i] - hy[i - 1]);
    }
}

/// Field state plus the coefficients it is advanced with.
///
/// The engine only knows how to advance fields; ordering of source
/// injection, boundaries and extension hooks is up to the caller.
#[derive(Debug, Clone)]
pub struct Engine {
    /// Electric field Ez
    e_field: Field1D,
    /// Magnetic field Hy
    h_field: Field1D,
    /// Electric update coefficients, refreshed from the materials each step
    e_coeff: EFieldCoefficients,
    /// Magnetic update coefficient
    db: f64,
    /// Completed timesteps
    timestep: u64,
}

impl Engine {
    /// Create an engine with zero fields and coefficients for `materials`.
    pub fn new(operator: &Operator, materials: &MaterialState) -> Self {
        let n = operator.num_cells();
        Self {
            e_field: Field1D::new(n),
            h_field: Field1D::new(n),
            e_coeff: operator.e_coefficients(materials),
            db: operator.h_coefficient(),
            timestep: 0,
        }
    }

    /// Recompute the electric coefficients from `materials`.
    pub fn refresh_coefficients(&mut self, operator: &Operator, materials: &MaterialState) {
        operator.update_e_coefficients(materials, &mut self.e_coeff);
    }

    /// Advance Hy by one step.
    pub fn update_h(&mut self) {
        update_h(self.h_field.as_mut_slice(), self.e_field.as_slice(), self.db);
    }

    /// Advance Ez by one step using the current Hy.
    pub fn update_e(&mut self) {
        update_e(
            self.e_field.as_mut_slice(),
            self.h_field.as_slice(),
            &self.e_coeff.ca,
            &self.e_coeff.cb,
        );
    }

    /// Mark the current step as complete.
    pub fn advance_timestep(&mut self) {
        self.timestep += 1;
    }

    #[inline]
    pub fn current_timestep(&self) -> u64 {
        self.timestep
    }

    #[inline]
    pub fn coefficients(&self) -> &EFieldCoefficients {
        &self.e_coeff
    }

    #[inline]
    pub fn e_field(&self) -> &Field1D {
        &self.e_field
    }

    #[inline]
    pub fn h_field(&self) -> &Field1D {
        &self.h_field
    }

    /// Read access to (Ez, Hy).
    #[inline]
    pub fn read_fields(&self) -> (&Field1D, &Field1D) {
        (&self.e_field, &self.h_field)
    }

    /// Write access to (Ez, Hy).
    #[inline]
    pub fn write_fields(&mut self) -> (&mut Field1D, &mut Field1D) {
        (&mut self.e_field, &mut self.h_field)
    }

    /// Clear both fields and the timestep counter. Coefficients are kept.
    pub fn reset(&mut self) {
        self.e_field.clear();
        self.h_field.clear();
        self.timestep = 0;
    }
}
