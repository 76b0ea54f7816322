//! Field monitors: point probes and per-cell peak tracking.

use std::collections::VecDeque;
use std::ops::Range;

use crate::arrays::Field1D;
use crate::extensions::Extension;
use crate::geometry::GridConfig;
use crate::{Error, Result};

/// Records Ez at one cell after every step.
///
/// Samples are kept in memory for as long as the probe lives; set a
/// capacity to keep only the most recent ones.
#[derive(Debug, Clone)]
pub struct Probe {
    name: String,
    cell: usize,
    capacity: Option<usize>,
    /// Step index of `samples[0]`
    first_step: u64,
    samples: VecDeque<f64>,
}

impl Probe {
    /// Probe Ez at `cell`.
    pub fn new(name: impl Into<String>, cell: usize) -> Self {
        Self {
            name: name.into(),
            cell,
            capacity: None,
            first_step: 0,
            samples: VecDeque::new(),
        }
    }

    /// Keep at most `capacity` samples, dropping the oldest.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity.max(1));
        self
    }

    #[inline]
    pub fn cell(&self) -> usize {
        self.cell
    }

    /// Recorded Ez values, oldest first.
    #[inline]
    pub fn samples(&self) -> &VecDeque<f64> {
        &self.samples
    }

    /// Recorded Ez values as one slice, oldest first.
    pub fn samples_contiguous(&mut self) -> &[f64] {
        self.samples.make_contiguous()
    }

    /// Step index of the oldest retained sample.
    #[inline]
    pub fn first_step(&self) -> u64 {
        self.first_step
    }

    /// Sample with the largest magnitude among steps in `steps`, as
    /// `(step, value)`.
    pub fn peak_in(&self, steps: Range<u64>) -> Option<(u64, f64)> {
        let mut best: Option<(u64, f64)> = None;
        for (step, value) in self.samples_in(steps) {
            if best.map_or(true, |(_, v)| value.abs() > v.abs()) {
                best = Some((step, value));
            }
        }
        best
    }

    /// Sum of the samples taken during `steps`, i.e. the time integral of
    /// Ez at the probe cell in units of `dt`.
    pub fn area_in(&self, steps: Range<u64>) -> f64 {
        self.samples_in(steps).map(|(_, value)| value).sum()
    }

    fn samples_in(&self, steps: Range<u64>) -> impl Iterator<Item = (u64, f64)> + '_ {
        let first_step = self.first_step;
        self.samples
            .iter()
            .enumerate()
            .map(move |(offset, &value)| (first_step + offset as u64, value))
            .filter(move |(step, _)| steps.contains(step))
    }

    /// Drop all samples.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.first_step = 0;
    }
}

impl Extension for Probe {
    fn name(&self) -> &str {
        &self.name
    }

    fn attach(&mut self, grid: &GridConfig) -> Result<()> {
        if self.cell >= grid.num_cells() {
            return Err(Error::InvalidGridConfig(format!(
                "probe '{}' at cell {} lies outside a grid of {} cells",
                self.name,
                self.cell,
                grid.num_cells()
            )));
        }
        Ok(())
    }

    fn post_step(&mut self, e_field: &Field1D, _h_field: &Field1D, step: u64) {
        if self.samples.is_empty() {
            self.first_step = step;
        }
        if let Some(capacity) = self.capacity {
            if self.samples.len() == capacity {
                self.samples.pop_front();
                self.first_step += 1;
            }
        }
        self.samples.push_back(e_field.get(self.cell));
    }
}

/// Running maximum of |Ez| per cell, the envelope a renderer draws behind
/// the live trace.
///
/// With a limit set it doubles as a divergence guard: batch execution stops
/// once any cell exceeds the limit or turns non-finite.
#[derive(Debug, Clone)]
pub struct PeakHold {
    name: String,
    peaks: Vec<f64>,
    limit: Option<f64>,
    diverged: bool,
}

impl PeakHold {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            peaks: Vec::new(),
            limit: None,
            diverged: false,
        }
    }

    /// Request termination once any |Ez| exceeds `limit`.
    pub fn with_limit(mut self, limit: f64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Per-cell maxima so far.
    #[inline]
    pub fn peaks(&self) -> &[f64] {
        &self.peaks
    }

    /// Largest |Ez| seen anywhere.
    pub fn max(&self) -> f64 {
        self.peaks.iter().fold(0.0f64, |acc, &p| acc.max(p))
    }

    /// Forget everything seen so far.
    pub fn clear(&mut self) {
        self.peaks.fill(0.0);
        self.diverged = false;
    }
}

impl Extension for PeakHold {
    fn name(&self) -> &str {
        &self.name
    }

    fn attach(&mut self, grid: &GridConfig) -> Result<()> {
        self.peaks = vec![0.0; grid.num_cells()];
        self.diverged = false;
        Ok(())
    }

    fn post_step(&mut self, e_field: &Field1D, _h_field: &Field1D, _step: u64) {
        for (peak, &value) in self.peaks.iter_mut().zip(e_field.as_slice()) {
            if !value.is_finite() {
                self.diverged = true;
                continue;
            }
            *peak = peak.max(value.abs());
        }
        if let Some(limit) = self.limit {
            self.diverged |= self.max() > limit;
        }
    }

    fn check_termination(&self) -> Option<String> {
        self.diverged.then(|| match self.limit {
            Some(limit) => format!("{}: |Ez| exceeded {limit:e} or became non-finite", self.name),
            None => format!("{}: Ez became non-finite", self.name),
        })
    }
}

/// Enum dispatch over the built-in extensions, so a simulation can hold a
/// heterogeneous list without trait objects.
#[derive(Debug, Clone)]
pub enum AnyExtension {
    /// Point probe
    Probe(Probe),
    /// Per-cell peak tracker
    PeakHold(PeakHold),
}

impl AnyExtension {
    pub fn as_probe(&self) -> Option<&Probe> {
        match self {
            AnyExtension::Probe(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_peak_hold(&self) -> Option<&PeakHold> {
        match self {
            AnyExtension::PeakHold(p) => Some(p),
            _ => None,
        }
    }
}

impl From<Probe> for AnyExtension {
    fn from(probe: Probe) -> Self {
        AnyExtension::Probe(probe)
    }
}

impl From<PeakHold> for AnyExtension {
    fn from(peak: PeakHold) -> Self {
        AnyExtension::PeakHold(peak)
    }
}

macro_rules! dispatch_extension {
    ($self:expr, $method:ident($($args:expr),*)) => {
        match $self {
            AnyExtension::Probe(e) => e.$method($($args),*),
            AnyExtension::PeakHold(e) => e.$method($($args),*),
        }
    };
}

impl Extension for AnyExtension {
    fn name(&self) -> &str {
        dispatch_extension!(self, name())
    }

    fn attach(&mut self, grid: &GridConfig) -> Result<()> {
        dispatch_extension!(self, attach(grid))
    }

    fn post_update_h(&mut self, h_field: &mut Field1D, e_field: &Field1D, step: u64) {
        dispatch_extension!(self, post_update_h(h_field, e_field, step))
    }

    fn post_update_e(&mut self, e_field: &mut Field1D, h_field: &Field1D, step: u64) {
        dispatch_extension!(self, post_update_e(e_field, h_field, step))
    }

    fn post_step(&mut self, e_field: &Field1D, h_field: &Field1D, step: u64) {
        dispatch_extension!(self, post_step(e_field, h_field, step))
    }

    fn check_termination(&self) -> Option<String> {
        dispatch_extension!(self, check_termination())
    }
}
