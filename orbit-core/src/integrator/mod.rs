//! Time integration for the body state
//!
//! [`Integrator`] owns the active [`IntegratorConfig`] together with the
//! scratch state that some algorithms carry between sub-steps and ticks: the
//! last leapfrog acceleration and the adaptive step suggestion. Dispatch over
//! [`Algorithm`] is a plain `match`; the set of algorithms is closed.
//!
//! Scratch is never reused across a configuration change. [`Integrator::reinitialize`]
//! replaces the configuration and drops everything the previous algorithm
//! left behind.

mod adaptive;
mod fixed;
mod tableau;

use crate::config::{Algorithm, IntegratorConfig, MAX_SUBSTEPS};
use crate::kernel::{Kernel, KernelError};
use crate::state::PhaseState;
use glam::DVec2;
use thiserror::Error;

/// Reasons a tick could not be completed
#[derive(Debug, Error)]
pub enum IntegratorError {
    #[error(transparent)]
    Kernel(#[from] KernelError),
    #[error("adaptive step shrank to {step:e} days, below the minimum of {min_step:e}")]
    Unstable { step: f64, min_step: f64 },
    #[error("tick needs {requested} sub-steps, more than the limit of {limit}")]
    TooManySubsteps { requested: usize, limit: usize },
    #[error("state layout is inconsistent")]
    Layout,
}

/// Bookkeeping for one call to [`Integrator::advance`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdvanceReport {
    /// Accepted sub-steps
    pub substeps: usize,
    /// Rejected adaptive trial steps
    pub rejected: usize,
    /// Calls into the kernel for accelerations
    pub force_evaluations: usize,
    /// Pair interaction terms across all evaluations
    pub pair_interactions: usize,
}

impl AdvanceReport {
    pub(crate) fn record_evaluation(&mut self, pairs: usize) {
        self.force_evaluations += 1;
        self.pair_interactions += pairs;
    }
}

#[derive(Debug, Default)]
struct Scratch {
    /// Acceleration at the current positions, left by the last leapfrog sub-step
    carried_accel: Option<Vec<DVec2>>,
    /// Sub-step suggested by the last accepted adaptive step
    next_step: Option<f64>,
}

impl Scratch {
    fn is_cold(&self) -> bool {
        self.carried_accel.is_none() && self.next_step.is_none()
    }
}

#[derive(Debug, Default)]
pub struct Integrator {
    config: IntegratorConfig,
    scratch: Scratch,
}

impl Integrator {
    pub fn new(config: IntegratorConfig) -> Self {
        Self {
            config,
            scratch: Scratch::default(),
        }
    }

    pub fn config(&self) -> &IntegratorConfig {
        &self.config
    }

    /// Switch to `config` and start cold
    pub fn reinitialize(&mut self, config: IntegratorConfig) {
        self.config = config;
        self.discard_scratch();
    }

    pub fn discard_scratch(&mut self) {
        self.scratch = Scratch::default();
    }

    /// True when no scratch from earlier sub-steps is retained
    pub fn is_cold(&self) -> bool {
        self.scratch.is_cold()
    }

    /// Advance `state` by `dt`.
    ///
    /// On error `state` may hold a partially advanced value and the scratch
    /// is suspect; callers discard both.
    pub fn advance(&mut self, state: &mut PhaseState, dt: f64, kernel: &Kernel) -> Result<AdvanceReport, IntegratorError> {
        if !state.is_consistent() {
            return Err(IntegratorError::Layout);
        }

        let mut report = AdvanceReport::default();
        if state.is_empty() {
            return Ok(report);
        }

        let config = self.config;
        match config.algorithm {
            Algorithm::Rkf45 => adaptive::advance(
                &tableau::RKF45,
                state,
                dt,
                &config,
                &mut self.scratch.next_step,
                kernel,
                &mut report,
            )?,
            Algorithm::DormandPrince => adaptive::advance(
                &tableau::DORMAND_PRINCE,
                state,
                dt,
                &config,
                &mut self.scratch.next_step,
                kernel,
                &mut report,
            )?,
            Algorithm::Euler => run_fixed(dt, config.step_size, &mut report, |h, r| fixed::euler(state, h, kernel, r))?,
            Algorithm::EulerCromer => {
                run_fixed(dt, config.step_size, &mut report, |h, r| fixed::euler_cromer(state, h, kernel, r))?
            }
            Algorithm::Leapfrog => {
                let carried = &mut self.scratch.carried_accel;
                run_fixed(dt, config.step_size, &mut report, |h, r| fixed::leapfrog(state, h, kernel, carried, r))?
            }
            Algorithm::Rk4 => run_fixed(dt, config.step_size, &mut report, |h, r| fixed::rk4(state, h, kernel, r))?,
        }

        Ok(report)
    }
}

/// Split a tick into equal sub-steps and run `substep` on each
fn run_fixed<F>(dt: f64, step_size: f64, report: &mut AdvanceReport, mut substep: F) -> Result<(), IntegratorError>
where
    F: FnMut(f64, &mut AdvanceReport) -> Result<(), KernelError>,
{
    let substeps = fixed_substeps(dt, step_size)?;
    let h = dt / substeps as f64;
    for _ in 0..substeps {
        substep(h, report)?;
        report.substeps += 1;
    }
    Ok(())
}

/// Number of equal sub-steps a fixed-step tick is split into
pub fn fixed_substeps(dt: f64, step_size: f64) -> Result<usize, IntegratorError> {
    let count = (dt / step_size).ceil().max(1.0);
    if count > MAX_SUBSTEPS as f64 {
        return Err(IntegratorError::TooManySubsteps {
            requested: if count.is_finite() { count as usize } else { usize::MAX },
            limit: MAX_SUBSTEPS,
        });
    }
    Ok(count as usize)
}
