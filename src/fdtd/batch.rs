//! Batched execution of timesteps.
//!
//! A host that drives the simulation frame by frame calls
//! [`Simulation::step`](crate::fdtd::Simulation::step) directly. Offline
//! runs (tests, benchmarks, parameter sweeps) go through
//! [`Simulation::run_batch`](crate::fdtd::Simulation::run_batch) instead,
//! which adds energy sampling and early termination on top.

use instant::Duration;

/// Configuration for a batch of timesteps.
#[derive(Debug, Clone, Default)]
pub struct EngineBatch {
    /// Number of timesteps to execute
    pub num_steps: u64,

    /// Termination conditions
    pub termination: TerminationConfig,

    /// Energy monitoring settings
    pub energy_monitoring: EnergyMonitorConfig,
}

impl EngineBatch {
    /// Batch of `num_steps` steps with no monitoring.
    pub fn steps(num_steps: u64) -> Self {
        Self {
            num_steps,
            ..Self::default()
        }
    }
}

/// Result from executing a batch of timesteps.
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// Number of timesteps actually executed
    pub timesteps_executed: u64,

    /// Reason for termination
    pub termination_reason: TerminationReason,

    /// Energy samples collected during execution
    pub energy_samples: Vec<EnergySample>,

    /// Wall clock time elapsed
    pub elapsed_time: Duration,
}

/// Reason why a batch terminated.
#[derive(Debug, Clone, PartialEq)]
pub enum TerminationReason {
    /// Completed requested number of steps
    StepsCompleted,

    /// Energy decay threshold reached
    EnergyDecay {
        /// Final decay in dB relative to peak
        final_decay_db: f64,
    },

    /// Extension requested early termination
    ExtensionStop {
        /// Reason provided by extension
        reason: String,
    },
}

/// Configuration for batch termination conditions.
#[derive(Debug, Clone)]
pub struct TerminationConfig {
    /// Energy decay threshold in dB (relative to peak)
    pub energy_decay_db: Option<f64>,

    /// How often to check termination conditions (in timesteps)
    pub check_interval: u64,
}

impl Default for TerminationConfig {
    fn default() -> Self {
        Self {
            energy_decay_db: None,
            check_interval: 100,
        }
    }
}

/// Configuration for energy monitoring during batch execution.
#[derive(Debug, Clone, Default)]
pub struct EnergyMonitorConfig {
    /// Sample energy every N timesteps (0 = disabled)
    pub sample_interval: u64,
}

/// Electromagnetic energy per unit cross-section at one timestep.
///
/// `e_energy = 1/2 sum(eps0 eps_r Ez^2) dx`, `h_energy = 1/2 sum(mu0 Hy^2) dx`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergySample {
    /// Timestep when sample was taken
    pub timestep: u64,

    /// Electric field energy (J/m^2)
    pub e_energy: f64,

    /// Magnetic field energy (J/m^2)
    pub h_energy: f64,

    /// Total energy (E + H)
    pub total_energy: f64,
}

impl EnergySample {
    /// Create a new energy sample.
    pub fn new(timestep: u64, e_energy: f64, h_energy: f64) -> Self {
        Self {
            timestep,
            e_energy,
            h_energy,
            total_energy: e_energy + h_energy,
        }
    }

    /// Decay of this sample relative to `peak`, in dB (<= 0 once past the peak).
    ///
    /// `None` while either energy is zero.
    pub fn decay_db(&self, peak: f64) -> Option<f64> {
        (peak > 0.0 && self.total_energy > 0.0).then(|| 10.0 * (self.total_energy / peak).log10())
    }
}
