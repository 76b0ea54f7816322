//! High-level simulation control.
//!
//! [`Simulation`] owns every piece of mutable state: fields, materials,
//! coefficients and the step counter. A host drives it either one frame at a
//! time through [`Simulation::step`], or offline through
//! [`Simulation::run_batch`] / [`Simulation::run`].

use super::batch::{
    BatchResult, EnergyMonitorConfig, EnergySample, EngineBatch, TerminationConfig,
    TerminationReason,
};
use super::{BoundaryCondition, EFieldCoefficients, Engine, Excitation, Operator};
use crate::arrays::Field1D;
use crate::constants::{EPS0, MU0};
use crate::extensions::{AnyExtension, Extension};
use crate::geometry::{GridConfig, TimestepInfo};
use crate::materials::{MaterialState, MaterialUpdate};
use crate::{Error, Result};

use indicatif::{ProgressBar, ProgressStyle};
use instant::Instant;
use log::{debug, info, warn};

/// End condition for [`Simulation::run`].
#[derive(Debug, Clone)]
pub enum EndCondition {
    /// Run for fixed number of timesteps
    Timesteps(u64),
    /// Run until energy decays below threshold (in dB relative to peak)
    EnergyDecay(f64),
    /// Run for fixed simulation time (seconds)
    SimulationTime(f64),
}

impl Default for EndCondition {
    fn default() -> Self {
        Self::Timesteps(10000)
    }
}

/// Statistics from a [`Simulation::run`] call.
#[derive(Debug, Clone)]
pub struct SimulationStats {
    /// Timesteps executed by this run
    pub timesteps: u64,
    /// Simulated time at the end of the run (seconds)
    pub sim_time: f64,
    /// Wall clock time (seconds)
    pub wall_time: f64,
    /// Peak energy seen so far
    pub peak_energy: f64,
    /// Final energy
    pub final_energy: f64,
    /// Average speed (million cell updates per second)
    pub speed_mcells_per_sec: f64,
    /// Why the run stopped
    pub termination_reason: TerminationReason,
}

/// Read-only view of the electric field after a step.
///
/// Borrows the simulation, so it cannot outlive the next call to `step`.
/// Use [`FieldSnapshot::to_vec`] to keep the data around.
#[derive(Debug, Clone, Copy)]
pub struct FieldSnapshot<'a> {
    /// Ez on every cell
    pub ez: &'a [f64],
    /// Completed timesteps
    pub timestep: u64,
    /// Simulated time, `timestep * dt` (seconds)
    pub elapsed: f64,
}

impl FieldSnapshot<'_> {
    /// Owned copy of Ez.
    pub fn to_vec(&self) -> Vec<f64> {
        self.ez.to_vec()
    }
}

/// Main simulation controller.
pub struct Simulation<E = AnyExtension> {
    /// Grid and magnetic coefficient
    operator: Operator,
    /// Per-cell material properties
    materials: MaterialState,
    /// Fields, electric coefficients and step counter
    engine: Engine,
    /// Soft source
    excitation: Excitation,
    /// Edge treatment
    boundary: BoundaryCondition,
    /// Hooks into the update cycle
    extensions: Vec<E>,
    /// End condition for `run`
    end_condition: EndCondition,
    /// Peak energy seen by batch execution
    peak_energy: f64,
    /// Verbosity level
    verbose: u8,
    /// Show progress bar in `run`
    show_progress: bool,
    /// Timesteps per batch in `run`
    batch_size: u64,
}

impl Simulation {
    /// Create a vacuum-filled simulation with the default source and no
    /// extensions.
    pub fn new(grid: GridConfig) -> Result<Self> {
        Self::with_extensions(grid, Vec::new())
    }

    /// Attach a built-in extension, returning its index in
    /// [`Simulation::extensions`].
    pub fn add_extension(&mut self, extension: impl Into<AnyExtension>) -> Result<usize> {
        let mut extension = extension.into();
        extension.attach(self.operator.grid())?;
        self.extensions.push(extension);
        Ok(self.extensions.len() - 1)
    }
}

impl<E: Extension> Simulation<E> {
    /// Create a vacuum-filled simulation with the default source and the
    /// given extensions.
    pub fn with_extensions(grid: GridConfig, extensions: Vec<E>) -> Result<Self> {
        Self::with_source(grid, Excitation::default(), extensions)
    }

    /// Create a vacuum-filled simulation with a custom source. Needed for
    /// grids too short to hold the default feed cell.
    pub fn with_source(
        grid: GridConfig,
        excitation: Excitation,
        mut extensions: Vec<E>,
    ) -> Result<Self> {
        check_excitation(&grid, &excitation)?;
        for ext in &mut extensions {
            ext.attach(&grid)?;
        }

        let info = TimestepInfo::calculate(&grid);
        info!("FDTD grid: {} cells of {:.3e} m", grid.num_cells(), grid.cell_size());
        info!(
            "FDTD timestep: {:.6e} s, Courant: {:.2}, Nyquist: {:.3e} Hz",
            info.dt, info.courant, info.nyquist_freq
        );
        debug!("Estimated memory: {}", info.memory_display());

        let operator = Operator::new(grid);
        let materials = MaterialState::vacuum(grid.num_cells());
        let engine = Engine::new(&operator, &materials);

        Ok(Self {
            operator,
            materials,
            engine,
            excitation,
            boundary: BoundaryCondition::default(),
            extensions,
            end_condition: EndCondition::default(),
            peak_energy: 0.0,
            verbose: 1,
            show_progress: false,
            batch_size: 100,
        })
    }

    /// Replace the source. Fails if the feed cell is on or beyond a wall.
    pub fn set_excitation(&mut self, excitation: Excitation) -> Result<&mut Self> {
        check_excitation(self.operator.grid(), &excitation)?;
        self.excitation = excitation;
        Ok(self)
    }

    /// Set end condition for [`Simulation::run`].
    pub fn set_end_condition(&mut self, condition: EndCondition) -> &mut Self {
        self.end_condition = condition;
        self
    }

    /// Set verbosity level (0=quiet, 1=normal, 2=verbose).
    pub fn set_verbose(&mut self, level: u8) -> &mut Self {
        self.verbose = level;
        self
    }

    /// Enable/disable progress bar in [`Simulation::run`].
    pub fn set_show_progress(&mut self, show: bool) -> &mut Self {
        self.show_progress = show;
        self
    }

    /// Set timesteps per batch in [`Simulation::run`] (at least 1).
    pub fn set_batch_size(&mut self, batch_size: u64) -> &mut Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Apply material updates without stepping.
    ///
    /// All-or-nothing: on error the materials are unchanged.
    pub fn apply_material_updates(&mut self, updates: &[MaterialUpdate]) -> Result<()> {
        if updates.is_empty() {
            return Ok(());
        }

        match self.materials.apply_updates(updates) {
            Ok(()) => {
                debug!(
                    "Applied {} material update(s) at timestep {}",
                    updates.len(),
                    self.engine.current_timestep()
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    "Rejected material update at timestep {}: {}",
                    self.engine.current_timestep(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Advance the simulation by one timestep.
    ///
    /// `updates` are applied first (pass `&[]` when nothing changed). If any
    /// of them is invalid, nothing is applied, the simulation does not
    /// advance and the error is returned; the host can simply call `step`
    /// again with corrected or no updates.
    pub fn step(&mut self, updates: &[MaterialUpdate]) -> Result<FieldSnapshot<'_>> {
        self.apply_material_updates(updates)?;
        self.advance();
        Ok(self.snapshot())
    }

    /// One full leapfrog step with source, boundaries and extension hooks.
    /// Cannot fail, so a step is either not started or fully completed.
    fn advance(&mut self) {
        let step = self.engine.current_timestep();
        let dt = self.operator.timestep();

        self.engine.refresh_coefficients(&self.operator, &self.materials);

        self.engine.update_h();
        {
            let (e_field, h_field) = self.engine.write_fields();
            for ext in &mut self.extensions {
                ext.post_update_h(h_field, e_field, step);
            }
        }

        self.engine.update_e();
        {
            let (e_field, h_field) = self.engine.write_fields();
            for ext in &mut self.extensions {
                ext.post_update_e(e_field, h_field, step);
            }

            self.excitation.inject(e_field, step, dt);
            self.boundary.apply(e_field);
        }

        self.engine.advance_timestep();

        let (e_field, h_field) = self.engine.read_fields();
        for ext in &mut self.extensions {
            ext.post_step(e_field, h_field, step);
        }
    }

    /// Current Ez, step count and simulated time.
    pub fn snapshot(&self) -> FieldSnapshot<'_> {
        FieldSnapshot {
            ez: self.engine.e_field().as_slice(),
            timestep: self.engine.current_timestep(),
            elapsed: self.elapsed_time(),
        }
    }

    /// Electromagnetic energy currently on the grid.
    pub fn energy_sample(&self) -> EnergySample {
        let dx = self.operator.grid().cell_size();
        let (e_field, h_field) = self.engine.read_fields();
        let e_energy = EPS0 * dx * e_field.weighted_energy(self.materials.epsilon_r());
        let h_energy = MU0 * dx * h_field.energy();
        EnergySample::new(self.engine.current_timestep(), e_energy, h_energy)
    }

    /// Execute a batch of timesteps with energy sampling and termination
    /// checks. Step numbers used for sampling and checks are absolute, so
    /// splitting a run into batches does not change when they happen.
    pub fn run_batch(&mut self, batch: EngineBatch) -> Result<BatchResult> {
        let start_time = Instant::now();
        let mut energy_samples = Vec::new();
        let mut steps_executed = 0u64;
        let mut termination_reason = TerminationReason::StepsCompleted;

        for _ in 0..batch.num_steps {
            self.advance();
            steps_executed += 1;
            let completed = self.engine.current_timestep();

            let sample_interval = batch.energy_monitoring.sample_interval;
            if sample_interval > 0 && completed % sample_interval == 0 {
                let sample = self.energy_sample();
                self.peak_energy = self.peak_energy.max(sample.total_energy);
                energy_samples.push(sample);
            }

            let check_interval = batch.termination.check_interval;
            if check_interval == 0 || completed % check_interval != 0 {
                continue;
            }

            if let Some(reason) = self.extensions.iter().find_map(|ext| ext.check_termination()) {
                termination_reason = TerminationReason::ExtensionStop { reason };
                break;
            }

            if let Some(threshold_db) = batch.termination.energy_decay_db {
                let sample = self.energy_sample();
                self.peak_energy = self.peak_energy.max(sample.total_energy);
                if let Some(decay_db) = sample.decay_db(self.peak_energy) {
                    if decay_db < -threshold_db.abs() {
                        termination_reason = TerminationReason::EnergyDecay {
                            final_decay_db: decay_db,
                        };
                        break;
                    }
                }
            }
        }

        Ok(BatchResult {
            timesteps_executed: steps_executed,
            termination_reason,
            energy_samples,
            elapsed_time: start_time.elapsed(),
        })
    }

    /// Run until the configured [`EndCondition`] is met.
    pub fn run(&mut self) -> Result<SimulationStats> {
        let dt = self.operator.timestep();

        let max_timesteps = match &self.end_condition {
            EndCondition::Timesteps(n) => *n,
            EndCondition::SimulationTime(t) => (t / dt).ceil() as u64,
            EndCondition::EnergyDecay(_) => 1_000_000, // Upper limit for energy decay
        };

        let energy_threshold = match &self.end_condition {
            EndCondition::EnergyDecay(db) => Some(*db),
            _ => None,
        };

        let progress = self.show_progress.then(|| {
            let pb = ProgressBar::new(max_timesteps);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({per_sec})")
            {
                pb.set_style(style.progress_chars("##-"));
            }
            pb
        });

        let start_time = Instant::now();
        let mut timesteps_run = 0u64;
        let mut termination_reason = TerminationReason::StepsCompleted;

        while timesteps_run < max_timesteps {
            let remaining = max_timesteps - timesteps_run;
            let batch = EngineBatch {
                num_steps: remaining.min(self.batch_size),
                termination: TerminationConfig {
                    energy_decay_db: energy_threshold,
                    check_interval: 100,
                },
                energy_monitoring: EnergyMonitorConfig { sample_interval: 100 },
            };

            let result = self.run_batch(batch)?;
            timesteps_run += result.timesteps_executed;

            if let Some(ref pb) = progress {
                pb.set_position(timesteps_run);
            }

            match result.termination_reason {
                TerminationReason::StepsCompleted => {}
                reason => {
                    if self.verbose >= 1 {
                        info!(
                            "Stopping at timestep {}: {:?}",
                            self.engine.current_timestep(),
                            reason
                        );
                    }
                    termination_reason = reason;
                    break;
                }
            }
        }

        if let Some(pb) = progress {
            pb.finish_with_message("Simulation complete");
        }

        let wall_time = start_time.elapsed().as_secs_f64();
        let final_energy = self.energy_sample().total_energy;
        self.peak_energy = self.peak_energy.max(final_energy);

        let cell_updates = timesteps_run as f64 * self.operator.num_cells() as f64;
        let speed = if wall_time > 0.0 { cell_updates / wall_time / 1e6 } else { 0.0 };

        let stats = SimulationStats {
            timesteps: timesteps_run,
            sim_time: self.elapsed_time(),
            wall_time,
            peak_energy: self.peak_energy,
            final_energy,
            speed_mcells_per_sec: speed,
            termination_reason,
        };

        if self.verbose >= 1 {
            info!(
                "Completed {} timesteps in {:.2}s ({:.2} MC/s)",
                stats.timesteps, stats.wall_time, stats.speed_mcells_per_sec
            );
        }

        Ok(stats)
    }

    /// Zero the fields and the step counter. Materials, source and
    /// extensions are kept.
    pub fn reset(&mut self) {
        self.engine.reset();
        self.peak_energy = 0.0;
    }

    #[inline]
    pub fn grid(&self) -> &GridConfig {
        self.operator.grid()
    }

    #[inline]
    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    #[inline]
    pub fn materials(&self) -> &MaterialState {
        &self.materials
    }

    #[inline]
    pub fn excitation(&self) -> &Excitation {
        &self.excitation
    }

    /// Coefficients used by the most recent step.
    #[inline]
    pub fn coefficients(&self) -> &EFieldCoefficients {
        self.engine.coefficients()
    }

    /// (Ez, Hy)
    #[inline]
    pub fn fields(&self) -> (&Field1D, &Field1D) {
        self.engine.read_fields()
    }

    /// Completed timesteps.
    #[inline]
    pub fn current_timestep(&self) -> u64 {
        self.engine.current_timestep()
    }

    /// Simulated time in seconds.
    #[inline]
    pub fn elapsed_time(&self) -> f64 {
        self.engine.current_timestep() as f64 * self.operator.timestep()
    }

    #[inline]
    pub fn extensions(&self) -> &[E] {
        &self.extensions
    }

    #[inline]
    pub fn extensions_mut(&mut self) -> &mut [E] {
        &mut self.extensions
    }

    /// First extension called `name`.
    pub fn extension(&self, name: &str) -> Option<&E> {
        self.extensions.iter().find(|ext| ext.name() == name)
    }
}

fn check_excitation(grid: &GridConfig, excitation: &Excitation) -> Result<()> {
    if !excitation.fits(grid.num_cells()) {
        return Err(Error::InvalidGridConfig(format!(
            "feed cell {} must lie strictly inside a grid of {} cells",
            excitation.position,
            grid.num_cells()
        )));
    }
    Ok(())
}
