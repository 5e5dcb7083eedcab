//! Adaptive stepping with embedded Runge–Kutta pairs

use super::tableau::{combine, evaluate_stages, EmbeddedPair};
use super::{AdvanceReport, IntegratorError};
use crate::config::{IntegratorConfig, MAX_SUBSTEPS, MIN_STEP_FRACTION};
use crate::kernel::Kernel;
use crate::state::PhaseState;
use glam::DVec2;

const SAFETY: f64 = 0.9;
const MIN_SCALE: f64 = 0.2;
const MAX_SCALE: f64 = 5.0;

/// Largest scaled difference between the two embedded solutions.
///
/// Each component is measured against `tol * (1 + |y_old|)`; values above 1
/// mean the step missed the tolerance. Scaling by the state at the start of
/// the step keeps a wildly wrong trial from relaxing its own bound.
fn error_ratio(
    start: &PhaseState,
    high: &(Vec<DVec2>, Vec<DVec2>),
    low: &(Vec<DVec2>, Vec<DVec2>),
    tol: f64,
) -> f64 {
    let pairs = [
        (&start.positions, &high.0, &low.0),
        (&start.velocities, &high.1, &low.1),
    ];

    let mut ratio: f64 = 0.0;
    for (old, hi, lo) in pairs {
        for ((y0, y1), y2) in old.iter().zip(hi).zip(lo) {
            let diff = (*y1 - *y2).abs();
            let scale = (DVec2::ONE + y0.abs()) * tol;
            let scaled = diff / scale;
            if scaled.is_nan() {
                return f64::NAN;
            }
            ratio = ratio.max(scaled.max_element());
        }
    }
    ratio
}

/// Multiplier for the next trial step given the last error ratio
fn step_scale(ratio: f64, low_order: i32) -> f64 {
    if ratio == 0.0 {
        return MAX_SCALE;
    }
    (SAFETY * ratio.powf(-1.0 / f64::from(low_order + 1))).clamp(MIN_SCALE, MAX_SCALE)
}

/// Advance `state` by exactly `dt` using adaptively sized sub-steps.
///
/// `next_step` carries the suggested sub-step between ticks; it is read as
/// the first trial and overwritten with the final suggestion. On error the
/// state may be partially advanced and must be discarded by the caller.
pub(crate) fn advance(
    pair: &EmbeddedPair,
    state: &mut PhaseState,
    dt: f64,
    config: &IntegratorConfig,
    next_step: &mut Option<f64>,
    kernel: &Kernel,
    report: &mut AdvanceReport,
) -> Result<(), IntegratorError> {
    let max_step = config.step_size;
    let tol = config.tolerance;
    let min_step = dt * MIN_STEP_FRACTION;
    let mut h = next_step.unwrap_or(max_step).min(max_step);
    let mut t = 0.0;
    let mut attempts = 0;

    while t < dt {
        attempts += 1;
        if attempts > MAX_SUBSTEPS {
            return Err(IntegratorError::TooManySubsteps {
                requested: attempts,
                limit: MAX_SUBSTEPS,
            });
        }

        let remaining = dt - t;
        let last = h >= remaining;
        let trial = if last { remaining } else { h };

        let stages = evaluate_stages(state, trial, pair.a, kernel, report)?;
        let high = combine(state, trial, &stages, pair.b_high);
        let low = combine(state, trial, &stages, pair.b_low);
        let ratio = error_ratio(state, &high, &low, tol);

        // NaN comes from NaN state or accelerations and cannot be fixed by
        // shrinking; accept it and let the energy report the divergence.
        if ratio.is_nan() || ratio <= 1.0 {
            state.positions = high.0;
            state.velocities = high.1;
            t = if last { dt } else { t + trial };
            report.substeps += 1;

            if !ratio.is_nan() {
                let suggested = trial * step_scale(ratio, pair.low_order);
                // A step clipped to the end of the tick says nothing about
                // the step the dynamics allow.
                h = if last { suggested.max(h) } else { suggested }.min(max_step);
            }
        } else {
            report.rejected += 1;
            h = trial * step_scale(ratio, pair.low_order);
            if h < min_step {
                return Err(IntegratorError::Unstable { step: h, min_step });
            }
        }
    }

    *next_step = Some(h);
    Ok(())
}
