//! Soft-source excitation.
//!
//! The waveform is a Gaussian envelope on a sinusoidal carrier, with the
//! envelope expressed in timestep units:
//!
//! ```text
//! s(n) = exp(-((n - t0) / tau)^2) * sin(2 pi f0 n dt)
//! ```
//!
//! The source stays active for the whole run. Once the envelope has decayed
//! the injected values are negligible, but they are still added every step.

use std::f64::consts::PI;

use crate::arrays::Field1D;

/// Envelope centre in timesteps.
pub const PULSE_DELAY: f64 = 25.0;

/// Envelope width in timesteps.
pub const PULSE_WIDTH: f64 = 8.0;

/// Carrier frequency of the default source (Hz).
pub const DEFAULT_FREQUENCY: f64 = 1.5e9;

/// Amplitude of the default source.
pub const DEFAULT_AMPLITUDE: f64 = 1.5;

/// Feed cell of the default source.
pub const DEFAULT_FEED_CELL: usize = 50;

/// Gaussian-modulated sinusoid at step `step` with an explicit envelope.
#[inline]
pub fn modulated_gaussian(step: u64, frequency: f64, dt: f64, t0: f64, tau: f64) -> f64 {
    let n = step as f64;
    let arg = (n - t0) / tau;
    let envelope = (-arg * arg).exp();
    let carrier = (2.0 * PI * frequency * n * dt).sin();
    envelope * carrier
}

/// Unscaled source waveform with the standard envelope (t0 = 25, tau = 8).
#[inline]
pub fn pulse_value(step: u64, frequency: f64, dt: f64) -> f64 {
    modulated_gaussian(step, frequency, dt, PULSE_DELAY, PULSE_WIDTH)
}

/// Additive point source on the Ez grid.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Excitation {
    /// Feed cell index
    pub position: usize,
    /// Amplitude scaling
    pub amplitude: f64,
    /// Carrier frequency (Hz)
    pub frequency: f64,
    /// Envelope centre (timesteps)
    pub t0: f64,
    /// Envelope width (timesteps)
    pub tau: f64,
}

impl Default for Excitation {
    fn default() -> Self {
        Self {
            position: DEFAULT_FEED_CELL,
            amplitude: DEFAULT_AMPLITUDE,
            frequency: DEFAULT_FREQUENCY,
            t0: PULSE_DELAY,
            tau: PULSE_WIDTH,
        }
    }
}

impl Excitation {
    /// Default pulse fed at `position`.
    pub fn at(position: usize) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Set amplitude (builder pattern).
    pub fn with_amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// Set carrier frequency (builder pattern).
    pub fn with_frequency(mut self, frequency: f64) -> Self {
        self.frequency = frequency;
        self
    }

    /// Set envelope centre and width in timesteps (builder pattern).
    pub fn with_envelope(mut self, t0: f64, tau: f64) -> Self {
        self.t0 = t0;
        self.tau = tau;
        self
    }

    /// Scaled source value at `step`.
    #[inline]
    pub fn evaluate(&self, step: u64, dt: f64) -> f64 {
        self.amplitude * modulated_gaussian(step, self.frequency, dt, self.t0, self.tau)
    }

    /// Add this step's value into Ez at the feed cell.
    pub fn inject(&self, e_field: &mut Field1D, step: u64, dt: f64) {
        e_field.add(self.position, self.evaluate(step, dt));
    }

    /// True if the feed cell is strictly inside a grid of `num_cells` cells,
    /// i.e. not on a PEC wall.
    pub fn fits(&self, num_cells: usize) -> bool {
        self.position > 0 && self.position + 1 < num_cells
    }
}
