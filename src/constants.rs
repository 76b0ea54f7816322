//! Physical constants used by the discretization.
//!
//! Values are the rounded ones the material explorer uses (c = 3e8 m/s,
//! eps0 = 8.854e-12 F/m), not CODATA.

use std::f64::consts::PI;

/// Speed of light in vacuum (m/s).
pub const C0: f64 = 3e8;

/// Vacuum permeability (H/m).
pub const MU0: f64 = 4.0 * PI * 1e-7;

/// Vacuum permittivity (F/m).
pub const EPS0: f64 = 8.854e-12;

/// Free-space wave impedance (Ohm).
pub const Z0: f64 = MU0 * C0;

/// Safety factor applied to the 1D Courant limit: dt = dx / (CFL_FACTOR * c).
pub const CFL_FACTOR: f64 = 2.0;
