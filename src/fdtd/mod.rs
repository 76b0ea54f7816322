//! FDTD core: coefficients, field updates, source, boundaries and the
//! stepping controller.

mod batch;
mod boundary;
mod engine;
mod excitation;
mod operator;
mod simulation;

#[cfg(test)]
mod scenario_testing;

pub use batch::{
    BatchResult, EnergyMonitorConfig, EnergySample, EngineBatch, TerminationConfig,
    TerminationReason,
};
pub use boundary::{apply_pec, BoundaryCondition};
pub use engine::{update_e, update_h, Engine};
pub use excitation::{
    modulated_gaussian, pulse_value, Excitation, DEFAULT_AMPLITUDE, DEFAULT_FEED_CELL,
    DEFAULT_FREQUENCY, PULSE_DELAY, PULSE_WIDTH,
};
pub use operator::{cell_coefficients, recompute, recompute_into, EFieldCoefficients, Operator};
pub use simulation::{EndCondition, FieldSnapshot, Simulation, SimulationStats};
