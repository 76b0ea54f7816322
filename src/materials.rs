//! Per-cell material properties built from named regions.
//!
//! The host (a slider panel, a script, a test) never touches the raw
//! permittivity/conductivity arrays. It submits [`MaterialUpdate`]s, which are
//! validated as a batch and only then committed, after which the per-cell
//! arrays are rebuilt: vacuum everywhere, then every region painted in
//! registration order so that later regions win where they overlap.

use std::ops::Range;

use crate::{Error, Result};

/// Region name used by the explorer's glass slab.
pub const GLASS: &str = "glass";

/// Region name used by the explorer's water layer.
pub const WATER: &str = "water";

/// A named span of cells sharing one material.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MaterialRegion {
    /// Region name, unique within a [`MaterialState`]
    pub name: String,
    /// First cell of the region
    pub start: usize,
    /// One past the last cell of the region
    pub end: usize,
    /// Relative permittivity (>= 1)
    pub epsilon_r: f64,
    /// Electric conductivity in S/m (>= 0)
    pub sigma: f64,
}

impl MaterialRegion {
    /// Create a region covering `cells`.
    pub fn new(name: impl Into<String>, cells: Range<usize>, epsilon_r: f64, sigma: f64) -> Self {
        Self {
            name: name.into(),
            start: cells.start,
            end: cells.end,
            epsilon_r,
            sigma,
        }
    }

    /// Lossless dielectric region.
    pub fn dielectric(name: impl Into<String>, cells: Range<usize>, epsilon_r: f64) -> Self {
        Self::new(name, cells, epsilon_r, 0.0)
    }

    /// Cell span of the region.
    pub fn cells(&self) -> Range<usize> {
        self.start..self.end
    }

    fn validate(&self, num_cells: usize) -> Result<()> {
        if self.start >= self.end || self.end > num_cells {
            return Err(self.invalid(format!(
                "cell span {}..{} is empty or exceeds the grid of {} cells",
                self.start, self.end, num_cells
            )));
        }
        validate_epsilon_r(&self.name, self.epsilon_r)?;
        validate_sigma(&self.name, self.sigma)
    }

    fn invalid(&self, reason: String) -> Error {
        Error::InvalidMaterialParameter {
            region: self.name.clone(),
            reason,
        }
    }
}

/// A change submitted by the parameter-control side.
///
/// Partial updates ([`MaterialUpdate::Permittivity`],
/// [`MaterialUpdate::Conductivity`]) touch one property of one region and
/// leave everything else as it was.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MaterialUpdate {
    /// Register a region, or replace the region with the same name in place
    Region(MaterialRegion),
    /// Change the relative permittivity of an existing region
    Permittivity {
        /// Region name
        region: String,
        /// New relative permittivity
        epsilon_r: f64,
    },
    /// Change the conductivity of an existing region
    Conductivity {
        /// Region name
        region: String,
        /// New conductivity in S/m
        sigma: f64,
    },
    /// Drop a region; its cells revert to whatever lies beneath
    Remove(String),
}

impl MaterialUpdate {
    /// Name of the region this update targets.
    pub fn region_name(&self) -> &str {
        match self {
            MaterialUpdate::Region(region) => &region.name,
            MaterialUpdate::Permittivity { region, .. }
            | MaterialUpdate::Conductivity { region, .. }
            | MaterialUpdate::Remove(region) => region,
        }
    }
}

/// Relative permittivity and conductivity of every cell.
#[derive(Debug, Clone)]
pub struct MaterialState {
    regions: Vec<MaterialRegion>,
    epsilon_r: Vec<f64>,
    sigma: Vec<f64>,
}

impl MaterialState {
    /// All-vacuum material state for `num_cells` cells.
    pub fn vacuum(num_cells: usize) -> Self {
        Self {
            regions: Vec::new(),
            epsilon_r: vec![1.0; num_cells],
            sigma: vec![0.0; num_cells],
        }
    }

    /// Material state with `regions` registered in order.
    pub fn with_regions(
        num_cells: usize,
        regions: impl IntoIterator<Item = MaterialRegion>,
    ) -> Result<Self> {
        let updates: Vec<MaterialUpdate> =
            regions.into_iter().map(MaterialUpdate::Region).collect();
        let mut state = Self::vacuum(num_cells);
        state.apply_updates(&updates)?;
        Ok(state)
    }

    #[inline]
    pub fn num_cells(&self) -> usize {
        self.epsilon_r.len()
    }

    /// Per-cell relative permittivity.
    #[inline]
    pub fn epsilon_r(&self) -> &[f64] {
        &self.epsilon_r
    }

    /// Per-cell conductivity (S/m).
    #[inline]
    pub fn sigma(&self) -> &[f64] {
        &self.sigma
    }

    /// Registered regions in paint order.
    pub fn regions(&self) -> &[MaterialRegion] {
        &self.regions
    }

    /// Look up a region by name.
    pub fn region(&self, name: &str) -> Option<&MaterialRegion> {
        self.regions.iter().find(|r| r.name == name)
    }

    /// Apply a single update (all-or-nothing).
    pub fn apply(&mut self, update: &MaterialUpdate) -> Result<()> {
        self.apply_updates(std::slice::from_ref(update))
    }

    /// Apply a batch of updates in order.
    ///
    /// Either every update is valid and the whole batch is committed, or the
    /// first invalid update is reported and the state is left untouched.
    pub fn apply_updates(&mut self, updates: &[MaterialUpdate]) -> Result<()> {
        if updates.is_empty() {
            return Ok(());
        }

        let mut staged = self.regions.clone();
        for update in updates {
            apply_to(&mut staged, update, self.num_cells())?;
        }

        self.regions = staged;
        self.rasterize();
        Ok(())
    }

    fn rasterize(&mut self) {
        self.epsilon_r.fill(1.0);
        self.sigma.fill(0.0);

        for region in &self.regions {
            self.epsilon_r[region.cells()].fill(region.epsilon_r);
            self.sigma[region.cells()].fill(region.sigma);
        }
    }
}

fn apply_to(
    regions: &mut Vec<MaterialRegion>,
    update: &MaterialUpdate,
    num_cells: usize,
) -> Result<()> {
    match update {
        MaterialUpdate::Region(region) => {
            region.validate(num_cells)?;
            match regions.iter_mut().find(|r| r.name == region.name) {
                Some(existing) => *existing = region.clone(),
                None => regions.push(region.clone()),
            }
        }
        MaterialUpdate::Permittivity { region, epsilon_r } => {
            validate_epsilon_r(region, *epsilon_r)?;
            find_mut(regions, region)?.epsilon_r = *epsilon_r;
        }
        MaterialUpdate::Conductivity { region, sigma } => {
            validate_sigma(region, *sigma)?;
            find_mut(regions, region)?.sigma = *sigma;
        }
        MaterialUpdate::Remove(name) => {
            let index = regions
                .iter()
                .position(|r| &r.name == name)
                .ok_or_else(|| Error::UnknownRegion(name.clone()))?;
            regions.remove(index);
        }
    }
    Ok(())
}

fn find_mut<'a>(regions: &'a mut [MaterialRegion], name: &str) -> Result<&'a mut MaterialRegion> {
    regions
        .iter_mut()
        .find(|r| r.name == name)
        .ok_or_else(|| Error::UnknownRegion(name.to_string()))
}

// Written as negated comparisons so NaN is rejected too.
fn validate_epsilon_r(region: &str, epsilon_r: f64) -> Result<()> {
    if !(epsilon_r >= 1.0 && epsilon_r.is_finite()) {
        return Err(Error::InvalidMaterialParameter {
            region: region.to_string(),
            reason: format!("relative permittivity must be finite and >= 1, got {epsilon_r}"),
        });
    }
    Ok(())
}

fn validate_sigma(region: &str, sigma: f64) -> Result<()> {
    if !(sigma >= 0.0 && sigma.is_finite()) {
        return Err(Error::InvalidMaterialParameter {
            region: region.to_string(),
            reason: format!("conductivity must be finite and >= 0, got {sigma}"),
        });
    }
    Ok(())
}

/// Default scene of the material explorer: a glass slab followed by a lossy
/// water layer. Needs a grid of at least 350 cells.
pub fn explorer_regions() -> [MaterialRegion; 2] {
    [
        MaterialRegion::dielectric(GLASS, 100..250, 4.0),
        MaterialRegion::new(WATER, 250..350, 4.0, 0.15),
    ]
}
