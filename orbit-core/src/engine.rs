//! Tick orchestration
//!
//! [`Engine`] owns the body registry, the kernel and the integrator
//! configuration. A tick works on a private copy of the state and is
//! published only when both the integrator and the energy computation
//! succeed, so a failed tick leaves the previous state visible.
//!
//! The engine does not react to non-finite energy. It reports it through
//! [`Engine::state`] and leaves recovery to the caller, normally an
//! [`EnergyMonitor`](crate::monitor::EnergyMonitor).

use crate::config::{self, Algorithm, ConfigError, IntegratorConfig};
use crate::integrator::{AdvanceReport, Integrator, IntegratorError};
use crate::kernel::{Backend, Kernel, KernelError};
use crate::registry::{Body, BodyId, BodyRegistry};
use crate::scenario::Scenario;
use crate::state::PhaseState;
use glam::DVec2;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Integrator(#[from] IntegratorError),
    #[error("energy computation failed: {0}")]
    Energy(#[source] KernelError),
    #[error("no body with id {0}")]
    UnknownBody(BodyId),
}

/// Lifecycle label of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Constructed or reset, scratch not yet built; never observed from outside
    Uninitialized,
    /// No tick since construction or reset
    Ready,
    /// Last tick used a fixed-step algorithm
    SteppingFixed,
    /// Last tick used an adaptive algorithm
    SteppingAdaptive,
    /// Published energy is non-finite; waiting for a reset
    Error,
}

/// Outcome of a successful tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    pub advance: AdvanceReport,
    /// Energy published by this tick
    pub total_energy: f64,
    /// Whether integrator scratch was rebuilt before this tick
    pub reinitialized: bool,
}

/// Version stamp of the configuration and registry the scratch was built for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Applied {
    config_version: u64,
    generation: u64,
}

#[derive(Debug)]
pub struct Engine {
    registry: BodyRegistry,
    kernel: Kernel,
    config: IntegratorConfig,
    config_version: u64,
    applied: Option<Applied>,
    integrator: Integrator,
    total_energy: f64,
    elapsed: f64,
    state: EngineState,
}

impl Engine {
    /// Build an engine around an already selected kernel
    pub fn new(kernel: Kernel) -> Self {
        Self::with_config(kernel, IntegratorConfig::default())
    }

    pub fn with_config(kernel: Kernel, config: IntegratorConfig) -> Self {
        let mut engine = Self {
            registry: BodyRegistry::new(),
            kernel,
            config,
            config_version: 0,
            applied: None,
            integrator: Integrator::new(config),
            total_energy: 0.0,
            elapsed: 0.0,
            state: EngineState::Uninitialized,
        };
        engine.reset();
        log::info!("engine ready ({} kernel, {})", engine.kernel.backend(), config.algorithm);
        engine
    }

    /// Advance every body by `dt` days.
    ///
    /// Fails without publishing anything when `dt` is invalid, the kernel
    /// faults, or the integrator cannot finish the tick.
    pub fn step(&mut self, dt: f64) -> Result<StepReport, EngineError> {
        config::validate_dt(dt)?;

        let reinitialized = self.needs_reinitialize();
        if reinitialized {
            self.reinitialize();
        }

        if self.registry.is_empty() {
            // Zero energy is finite, so a divergence left behind is over
            self.total_energy = 0.0;
            self.state = self.stepping_label();
            return Ok(StepReport {
                advance: AdvanceReport::default(),
                total_energy: 0.0,
                reinitialized,
            });
        }

        let mut next = PhaseState::from_bodies(self.registry.snapshot());

        let advance = match self.integrator.advance(&mut next, dt, &self.kernel) {
            Ok(report) => report,
            Err(e) => {
                self.abandon_tick();
                log::debug!("tick of {dt} days failed: {e}");
                return Err(e.into());
            }
        };

        let total_energy = match self.kernel.total_energy(&next) {
            Ok(energy) => energy,
            Err(e) => {
                self.abandon_tick();
                return Err(EngineError::Energy(e));
            }
        };

        self.registry.publish(&next.positions, &next.velocities);
        self.total_energy = total_energy;
        self.elapsed += dt;
        self.state = if total_energy.is_finite() {
            self.stepping_label()
        } else {
            EngineState::Error
        };

        Ok(StepReport {
            advance,
            total_energy,
            reinitialized,
        })
    }

    /// Remove every body and start over with cold scratch
    pub fn reset(&mut self) {
        let removed = self.registry.len();
        self.registry.clear();
        self.total_energy = 0.0;
        self.elapsed = 0.0;
        self.integrator.discard_scratch();
        self.applied = None;
        self.state = EngineState::Ready;
        if removed > 0 {
            log::info!("engine reset, removed {removed} bodies");
        }
    }

    pub fn insert_body(&mut self, position: DVec2, velocity: DVec2, mass: f64) -> Result<BodyId, EngineError> {
        config::validate_body(position, velocity, mass)?;
        Ok(self.registry.insert(mass, position, velocity))
    }

    pub fn remove_body(&mut self, id: BodyId) -> Result<Body, EngineError> {
        self.registry.remove(id).ok_or(EngineError::UnknownBody(id))
    }

    /// Replace all bodies with those of `scenario`. Nothing changes if any
    /// body of the scenario is invalid.
    pub fn load(&mut self, scenario: &Scenario) -> Result<Vec<BodyId>, EngineError> {
        for seed in &scenario.bodies {
            config::validate_body(seed.position, seed.velocity, seed.mass)?;
        }

        self.reset();
        let ids = scenario
            .bodies
            .iter()
            .map(|seed| self.registry.insert(seed.mass, seed.position, seed.velocity))
            .collect();
        log::info!("loaded scenario '{}' with {} bodies", scenario.name, scenario.bodies.len());
        Ok(ids)
    }

    /// Replace the integrator configuration.
    ///
    /// `tolerance` defaults to the current one. Invalid values are rejected
    /// and leave the current configuration in place. Scratch is rebuilt on the
    /// next tick if anything changed.
    pub fn set_integrator_config(
        &mut self,
        algorithm: Algorithm,
        step_size: f64,
        tolerance: Option<f64>,
    ) -> Result<(), EngineError> {
        let config = IntegratorConfig::new(algorithm, step_size, tolerance.unwrap_or(self.config.tolerance))?;
        if config != self.config {
            self.config = config;
            self.config_version += 1;
        }
        Ok(())
    }

    pub fn read_energy(&self) -> f64 {
        self.total_energy
    }

    /// Energy of the bodies as they are now, without publishing it.
    ///
    /// Differs from [`read_energy`](Self::read_energy) after bodies were
    /// inserted or removed since the last tick.
    pub fn measure_energy(&self) -> Result<f64, EngineError> {
        let state = PhaseState::from_bodies(self.registry.snapshot());
        self.kernel.total_energy(&state).map_err(EngineError::Energy)
    }

    pub fn read_bodies(&self) -> &[Body] {
        self.registry.snapshot()
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.registry.get(id)
    }

    pub fn body_count(&self) -> usize {
        self.registry.len()
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Simulated time since construction or the last reset, in days
    pub fn elapsed_time(&self) -> f64 {
        self.elapsed
    }

    pub fn integrator_config(&self) -> &IntegratorConfig {
        &self.config
    }

    /// Version stamp bumped by every accepted configuration change
    pub fn config_version(&self) -> u64 {
        self.config_version
    }

    /// Whether the next tick will rebuild integrator scratch
    pub fn needs_reinitialize(&self) -> bool {
        self.applied != Some(self.current_stamp())
    }

    /// True when the integrator holds no scratch from earlier sub-steps
    pub fn scratch_is_cold(&self) -> bool {
        self.integrator.is_cold()
    }

    pub fn backend(&self) -> Backend {
        self.kernel.backend()
    }

    fn current_stamp(&self) -> Applied {
        Applied {
            config_version: self.config_version,
            generation: self.registry.generation(),
        }
    }

    fn reinitialize(&mut self) {
        self.integrator.reinitialize(self.config);
        self.applied = Some(self.current_stamp());
        log::debug!(
            "integrator reinitialized: {} step={} tol={} (config v{})",
            self.config.algorithm,
            self.config.step_size,
            self.config.tolerance,
            self.config_version
        );
    }

    fn abandon_tick(&mut self) {
        self.integrator.discard_scratch();
        self.applied = None;
    }

    fn stepping_label(&self) -> EngineState {
        if self.config.algorithm.is_adaptive() {
            EngineState::SteppingAdaptive
        } else {
            EngineState::SteppingFixed
        }
    }
}
