//! Fixed-step integrators: one call advances the state by one sub-step `h`

use super::tableau::{combine, evaluate_stages, RK4};
use super::AdvanceReport;
use crate::kernel::{Kernel, KernelError};
use crate::state::PhaseState;
use glam::DVec2;

fn accelerations(state: &PhaseState, kernel: &Kernel, report: &mut AdvanceReport) -> Result<Vec<DVec2>, KernelError> {
    let mut accel = vec![DVec2::ZERO; state.len()];
    report.record_evaluation(kernel.accelerations(&state.masses, &state.positions, &mut accel)?);
    Ok(accel)
}

/// x += v h, then v += a(x_old) h
pub(crate) fn euler(state: &mut PhaseState, h: f64, kernel: &Kernel, report: &mut AdvanceReport) -> Result<(), KernelError> {
    let accel = accelerations(state, kernel, report)?;
    for ((x, v), a) in state.positions.iter_mut().zip(state.velocities.iter_mut()).zip(&accel) {
        *x += *v * h;
        *v += *a * h;
    }
    Ok(())
}

/// v += a(x) h, then x += v_new h
pub(crate) fn euler_cromer(state: &mut PhaseState, h: f64, kernel: &Kernel, report: &mut AdvanceReport) -> Result<(), KernelError> {
    let accel = accelerations(state, kernel, report)?;
    for ((x, v), a) in state.positions.iter_mut().zip(state.velocities.iter_mut()).zip(&accel) {
        *v += *a * h;
        *x += *v * h;
    }
    Ok(())
}

/// Kick-drift-kick velocity Verlet
///
/// `carried` holds the acceleration at the current positions when the
/// previous sub-step left one behind, and is replaced by the acceleration at
/// the new positions on return.
pub(crate) fn leapfrog(
    state: &mut PhaseState,
    h: f64,
    kernel: &Kernel,
    carried: &mut Option<Vec<DVec2>>,
    report: &mut AdvanceReport,
) -> Result<(), KernelError> {
    let half = 0.5 * h;

    let a_old = match carried.take() {
        Some(a) if a.len() == state.len() => a,
        _ => accelerations(state, kernel, report)?,
    };

    // Kick: v(t + h/2) = v(t) + a(t) h/2
    for (v, a) in state.velocities.iter_mut().zip(&a_old) {
        *v += *a * half;
    }
    // Drift: x(t + h) = x(t) + v(t + h/2) h
    for (x, v) in state.positions.iter_mut().zip(&state.velocities) {
        *x += *v * h;
    }

    let a_new = accelerations(state, kernel, report)?;

    // Kick: v(t + h) = v(t + h/2) + a(t + h) h/2
    for (v, a) in state.velocities.iter_mut().zip(&a_new) {
        *v += *a * half;
    }

    *carried = Some(a_new);
    Ok(())
}

/// Classical fourth-order Runge–Kutta
pub(crate) fn rk4(state: &mut PhaseState, h: f64, kernel: &Kernel, report: &mut AdvanceReport) -> Result<(), KernelError> {
    let stages = evaluate_stages(state, h, RK4.a, kernel, report)?;
    let (x, v) = combine(state, h, &stages, RK4.b);
    state.positions = x;
    state.velocities = v;
    Ok(())
}
