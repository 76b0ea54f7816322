//! FDTD operator: update coefficients derived from grid and materials.
//!
//! The electric update in a lossy cell discretizes
//! `eps dE/dt = dH/dx - sigma E` with the conduction term averaged over the
//! half step, which gives
//!
//! ```text
//! ca = (1 - sigma dt / 2 eps) / (1 + sigma dt / 2 eps)
//! cb = (dt / (eps dx))      / (1 + sigma dt / 2 eps)
//! ```
//!
//! and reduces to `ca = 1`, `cb = dt / (eps dx)` when `sigma = 0`. The
//! lossless branch is evaluated separately so that those cells get exactly
//! that value rather than something one rounding step away.

use crate::constants::{EPS0, MU0};
use crate::geometry::GridConfig;
use crate::materials::MaterialState;

/// Per-cell coefficients for the electric-field update
/// `Ez = ca * Ez + cb * (Hy[i] - Hy[i-1])`.
#[derive(Debug, Clone, PartialEq)]
pub struct EFieldCoefficients {
    /// Damping factor, in (-1, 1]. Positive while `sigma dt / 2 eps < 1`;
    /// strongly conductive cells flip sign but stay bounded.
    pub ca: Vec<f64>,
    /// Curl factor, > 0
    pub cb: Vec<f64>,
}

impl EFieldCoefficients {
    /// Allocate coefficients for `num_cells` cells (ca = 1, cb = 0).
    pub fn new(num_cells: usize) -> Self {
        Self {
            ca: vec![1.0; num_cells],
            cb: vec![0.0; num_cells],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ca.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ca.is_empty()
    }
}

/// Coefficients of a single cell.
///
/// `ca` drops below zero once `sigma > 2 eps / dt` (about 13 S/m in vacuum
/// at dx = 0.8 mm). The update stays stable because `|ca| < 1` for any
/// finite conductivity; the field in such a cell just alternates in sign
/// while it decays.
#[inline]
pub fn cell_coefficients(epsilon_r: f64, sigma: f64, dt: f64, dx: f64, eps0: f64) -> (f64, f64) {
    let eps = eps0 * epsilon_r;
    if sigma == 0.0 {
        return (1.0, dt / (eps * dx));
    }

    let loss = sigma * dt / (2.0 * eps);
    let ca = (1.0 - loss) / (1.0 + loss);
    let cb = (dt / (eps * dx)) / (1.0 + loss);
    (ca, cb)
}

/// Compute fresh coefficients from per-cell material arrays.
///
/// Pure and pointwise: the same inputs always give bit-identical output.
pub fn recompute(
    epsilon_r: &[f64],
    sigma: &[f64],
    dt: f64,
    dx: f64,
    eps0: f64,
) -> EFieldCoefficients {
    let mut coeff = EFieldCoefficients::new(epsilon_r.len());
    recompute_into(epsilon_r, sigma, dt, dx, eps0, &mut coeff);
    coeff
}

/// Same as [`recompute`], overwriting every entry of `out`.
///
/// Nothing from the previous contents of `out` survives, so this is as
/// stateless as [`recompute`] without allocating.
pub fn recompute_into(
    epsilon_r: &[f64],
    sigma: &[f64],
    dt: f64,
    dx: f64,
    eps0: f64,
    out: &mut EFieldCoefficients,
) {
    debug_assert_eq!(epsilon_r.len(), sigma.len());
    debug_assert_eq!(epsilon_r.len(), out.len());

    let cells = epsilon_r.iter().zip(sigma);
    for ((ca, cb), (&eps_r, &sig)) in out.ca.iter_mut().zip(out.cb.iter_mut()).zip(cells) {
        (*ca, *cb) = cell_coefficients(eps_r, sig, dt, dx, eps0);
    }
}

/// Grid-bound operator.
///
/// Holds what does not change over a run (grid, magnetic coefficient) and
/// maps the current [`MaterialState`] to electric coefficients on demand.
#[derive(Debug, Clone)]
pub struct Operator {
    grid: GridConfig,
    db: f64,
}

impl Operator {
    /// Create an operator for `grid`.
    pub fn new(grid: GridConfig) -> Self {
        let db = grid.timestep() / (MU0 * grid.cell_size());
        Self { grid, db }
    }

    #[inline]
    pub fn grid(&self) -> &GridConfig {
        &self.grid
    }

    #[inline]
    pub fn num_cells(&self) -> usize {
        self.grid.num_cells()
    }

    /// Timestep in seconds.
    #[inline]
    pub fn timestep(&self) -> f64 {
        self.grid.timestep()
    }

    /// Magnetic update coefficient dt / (mu0 dx), uniform over the grid.
    #[inline]
    pub fn h_coefficient(&self) -> f64 {
        self.db
    }

    /// Electric coefficients for `materials`.
    pub fn e_coefficients(&self, materials: &MaterialState) -> EFieldCoefficients {
        recompute(
            materials.epsilon_r(),
            materials.sigma(),
            self.grid.timestep(),
            self.grid.cell_size(),
            EPS0,
        )
    }

    /// Electric coefficients for `materials`, written into `out`.
    pub fn update_e_coefficients(&self, materials: &MaterialState, out: &mut EFieldCoefficients) {
        recompute_into(
            materials.epsilon_r(),
            materials.sigma(),
            self.grid.timestep(),
            self.grid.cell_size(),
            EPS0,
            out,
        );
    }
}
