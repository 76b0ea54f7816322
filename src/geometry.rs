//! Spatial and temporal discretization.

use crate::constants::{C0, CFL_FACTOR};
use crate::{Error, Result};

/// Raw grid parameters, as a host might load them from its own config.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridParams {
    /// Number of cells (N)
    pub num_cells: usize,
    /// Cell size dx in meters
    pub cell_size: f64,
}

/// Validated, immutable 1D grid.
///
/// The timestep is derived from the cell size with a fixed CFL safety
/// factor of 2, i.e. `dt = dx / (2 c)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConfig {
    num_cells: usize,
    dx: f64,
    dt: f64,
}

impl GridConfig {
    /// Smallest grid that still has an interior cell.
    pub const MIN_CELLS: usize = 3;

    /// Create a uniform grid of `num_cells` cells of size `dx` meters.
    pub fn uniform(num_cells: usize, dx: f64) -> Result<Self> {
        if num_cells < Self::MIN_CELLS {
            return Err(Error::InvalidGridConfig(format!(
                "need at least {} cells, got {}",
                Self::MIN_CELLS,
                num_cells
            )));
        }
        if !(dx.is_finite() && dx > 0.0) {
            return Err(Error::InvalidGridConfig(format!(
                "cell size must be positive and finite, got {dx}"
            )));
        }

        Ok(Self {
            num_cells,
            dx,
            dt: dx / (CFL_FACTOR * C0),
        })
    }

    /// Build a grid from loaded parameters.
    pub fn from_params(params: &GridParams) -> Result<Self> {
        Self::uniform(params.num_cells, params.cell_size)
    }

    /// Parameters this grid was built from.
    pub fn params(&self) -> GridParams {
        GridParams {
            num_cells: self.num_cells,
            cell_size: self.dx,
        }
    }

    #[inline]
    pub fn num_cells(&self) -> usize {
        self.num_cells
    }

    /// Cell size in meters.
    #[inline]
    pub fn cell_size(&self) -> f64 {
        self.dx
    }

    /// Timestep in seconds.
    #[inline]
    pub fn timestep(&self) -> f64 {
        self.dt
    }

    /// Courant number c*dt/dx (0.5 for this grid family).
    pub fn courant_number(&self) -> f64 {
        C0 * self.dt / self.dx
    }

    /// Summary of the discretization for logging.
    pub fn timestep_info(&self) -> TimestepInfo {
        TimestepInfo::calculate(self)
    }
}

/// Derived quantities of a grid, reported when a simulation is set up.
#[derive(Debug, Clone, Copy)]
pub struct TimestepInfo {
    /// Timestep in seconds
    pub dt: f64,
    /// Courant number c*dt/dx
    pub courant: f64,
    /// Highest frequency representable at this dt (Hz)
    pub nyquist_freq: f64,
    /// Number of cells
    pub num_cells: usize,
    /// Bytes held by field, material and coefficient arrays
    pub memory_bytes: usize,
}

impl TimestepInfo {
    /// Derive timestep information from a grid.
    pub fn calculate(grid: &GridConfig) -> Self {
        let n = grid.num_cells();
        // Ez, Hy, eps_r, sigma, ca, cb
        let memory_bytes = 6 * n * std::mem::size_of::<f64>();

        Self {
            dt: grid.timestep(),
            courant: grid.courant_number(),
            nyquist_freq: 1.0 / (2.0 * grid.timestep()),
            num_cells: n,
            memory_bytes,
        }
    }

    /// Human-readable memory estimate.
    pub fn memory_display(&self) -> String {
        let bytes = self.memory_bytes as f64;
        if bytes < 1024.0 {
            format!("{} B", self.memory_bytes)
        } else if bytes < 1024.0 * 1024.0 {
            format!("{:.1} KiB", bytes / 1024.0)
        } else {
            format!("{:.1} MiB", bytes / (1024.0 * 1024.0))
        }
    }
}
