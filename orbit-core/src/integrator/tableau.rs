//! Explicit Runge–Kutta stages for the second-order system x' = v, v' = a(x)

use super::AdvanceReport;
use crate::kernel::{Kernel, KernelError};
use crate::state::PhaseState;
use glam::DVec2;

/// Butcher tableau of an explicit method (lower-triangular `a`, weights `b`)
pub(crate) struct Tableau {
    pub a: &'static [&'static [f64]],
    pub b: &'static [f64],
}

/// Embedded pair: one set of stages, two weight vectors
pub(crate) struct EmbeddedPair {
    pub a: &'static [&'static [f64]],
    /// Weights of the solution that is propagated
    pub b_high: &'static [f64],
    /// Weights of the error estimate
    pub b_low: &'static [f64],
    /// Order of the lower-order solution; sets the step-control exponent
    pub low_order: i32,
}

pub(crate) const RK4: Tableau = Tableau {
    a: &[&[], &[0.5], &[0.0, 0.5], &[0.0, 0.0, 1.0]],
    b: &[1.0 / 6.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 6.0],
};

pub(crate) const RKF45: EmbeddedPair = EmbeddedPair {
    a: &[
        &[],
        &[1.0 / 4.0],
        &[3.0 / 32.0, 9.0 / 32.0],
        &[1932.0 / 2197.0, -7200.0 / 2197.0, 7296.0 / 2197.0],
        &[439.0 / 216.0, -8.0, 3680.0 / 513.0, -845.0 / 4104.0],
        &[-8.0 / 27.0, 2.0, -3544.0 / 2565.0, 1859.0 / 4104.0, -11.0 / 40.0],
    ],
    b_high: &[16.0 / 135.0, 0.0, 6656.0 / 12825.0, 28561.0 / 56430.0, -9.0 / 50.0, 2.0 / 55.0],
    b_low: &[25.0 / 216.0, 0.0, 1408.0 / 2565.0, 2197.0 / 4104.0, -1.0 / 5.0, 0.0],
    low_order: 4,
};

pub(crate) const DORMAND_PRINCE: EmbeddedPair = EmbeddedPair {
    a: &[
        &[],
        &[1.0 / 5.0],
        &[3.0 / 40.0, 9.0 / 40.0],
        &[44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0],
        &[19372.0 / 6561.0, -25360.0 / 2187.0, 64448.0 / 6561.0, -212.0 / 729.0],
        &[9017.0 / 3168.0, -355.0 / 33.0, 46732.0 / 5247.0, 49.0 / 176.0, -5103.0 / 18656.0],
        &[35.0 / 384.0, 0.0, 500.0 / 1113.0, 125.0 / 192.0, -2187.0 / 6784.0, 11.0 / 84.0],
    ],
    b_high: &[35.0 / 384.0, 0.0, 500.0 / 1113.0, 125.0 / 192.0, -2187.0 / 6784.0, 11.0 / 84.0, 0.0],
    b_low: &[
        5179.0 / 57600.0,
        0.0,
        7571.0 / 16695.0,
        393.0 / 640.0,
        -92097.0 / 339200.0,
        187.0 / 2100.0,
        1.0 / 40.0,
    ],
    low_order: 4,
};

/// Derivatives at one stage: dx/dt (a velocity) and dv/dt (an acceleration)
pub(crate) struct Stage {
    pub dx: Vec<DVec2>,
    pub dv: Vec<DVec2>,
}

/// Evaluate every stage of `a` for a step of length `h` from `state`
pub(crate) fn evaluate_stages(
    state: &PhaseState,
    h: f64,
    a: &[&[f64]],
    kernel: &Kernel,
    report: &mut AdvanceReport,
) -> Result<Vec<Stage>, KernelError> {
    let n = state.len();
    let mut stages: Vec<Stage> = Vec::with_capacity(a.len());

    for row in a {
        let mut x = state.positions.clone();
        let mut v = state.velocities.clone();
        for (stage, &coeff) in stages.iter().zip(row.iter()) {
            if coeff == 0.0 {
                continue;
            }
            let w = h * coeff;
            for i in 0..n {
                x[i] += stage.dx[i] * w;
                v[i] += stage.dv[i] * w;
            }
        }

        let mut accel = vec![DVec2::ZERO; n];
        report.record_evaluation(kernel.accelerations(&state.masses, &x, &mut accel)?);
        stages.push(Stage { dx: v, dv: accel });
    }

    Ok(stages)
}

/// Weighted sum of stages: the state after a step of length `h`
pub(crate) fn combine(state: &PhaseState, h: f64, stages: &[Stage], b: &[f64]) -> (Vec<DVec2>, Vec<DVec2>) {
    let mut x = state.positions.clone();
    let mut v = state.velocities.clone();

    for (stage, &weight) in stages.iter().zip(b) {
        if weight == 0.0 {
            continue;
        }
        let w = h * weight;
        for i in 0..x.len() {
            x[i] += stage.dx[i] * w;
            v[i] += stage.dv[i] * w;
        }
    }

    (x, v)
}
