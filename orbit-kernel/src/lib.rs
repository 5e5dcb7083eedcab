//! Native force/energy kernel for Orbit
//!
//! This crate is compiled as a `cdylib` and loaded at runtime by
//! `orbit-core`. Every exported function is a pure function of the arrays it
//! is handed: positions and velocities are interleaved `x, y` pairs, masses are
//! one value per body, and the gravitational constant is passed in by the
//! caller so both backends share it exactly.
//!
//! Panics never cross the ABI. Faults are reported as negative status codes.

use std::panic::{self, AssertUnwindSafe};
use std::slice;

/// Version of the exported ABI. Bumped whenever a signature changes.
pub const ABI_VERSION: u32 = 1;

/// Status returned on success
pub const STATUS_OK: i32 = 0;
/// Status returned when a required pointer is null
pub const STATUS_NULL_POINTER: i32 = -1;
/// Status returned when a panic was caught inside the kernel
pub const STATUS_PANIC: i32 = -2;

#[no_mangle]
pub extern "C" fn orbit_kernel_abi_version() -> u32 {
    ABI_VERSION
}

/// Total energy (kinetic + potential) of `n` bodies.
///
/// Returns NaN if any pointer is null or a panic is caught. Coincident bodies
/// produce an infinite potential term, which is returned as-is.
///
/// # Safety
///
/// `x` and `v` must point to `2 * n` readable `f64`s and `m` to `n`.
#[no_mangle]
pub unsafe extern "C" fn compute_energy(
    n: usize,
    x: *const f64,
    v: *const f64,
    m: *const f64,
    g: f64,
) -> f64 {
    if n == 0 {
        return 0.0;
    }
    if x.is_null() || v.is_null() || m.is_null() {
        return f64::NAN;
    }

    let x = slice::from_raw_parts(x, 2 * n);
    let v = slice::from_raw_parts(v, 2 * n);
    let m = slice::from_raw_parts(m, n);

    panic::catch_unwind(AssertUnwindSafe(|| energy(x, v, m, g))).unwrap_or(f64::NAN)
}

/// Pairwise gravitational accelerations of `n` bodies, written into `a`.
///
/// # Safety
///
/// `a` must point to `2 * n` writable `f64`s, `x` to `2 * n` readable `f64`s
/// and `m` to `n`. `a` must not overlap `x` or `m`.
#[no_mangle]
pub unsafe extern "C" fn compute_acceleration(
    n: usize,
    a: *mut f64,
    x: *const f64,
    m: *const f64,
    g: f64,
) -> i32 {
    if n == 0 {
        return STATUS_OK;
    }
    if a.is_null() || x.is_null() || m.is_null() {
        return STATUS_NULL_POINTER;
    }

    let a = slice::from_raw_parts_mut(a, 2 * n);
    let x = slice::from_raw_parts(x, 2 * n);
    let m = slice::from_raw_parts(m, n);

    match panic::catch_unwind(AssertUnwindSafe(|| acceleration(a, x, m, g))) {
        Ok(()) => STATUS_OK,
        Err(_) => STATUS_PANIC,
    }
}

fn acceleration(a: &mut [f64], x: &[f64], m: &[f64], g: f64) {
    let n = m.len();
    a.fill(0.0);

    for i in 0..n {
        for j in (i + 1)..n {
            let dx = x[2 * j] - x[2 * i];
            let dy = x[2 * j + 1] - x[2 * i + 1];
            let r2 = dx * dx + dy * dy;
            let inv_r3 = 1.0 / (r2 * r2.sqrt());

            // Newton's third law: one evaluation feeds both bodies
            let si = g * m[j] * inv_r3;
            let sj = g * m[i] * inv_r3;
            a[2 * i] += si * dx;
            a[2 * i + 1] += si * dy;
            a[2 * j] -= sj * dx;
            a[2 * j + 1] -= sj * dy;
        }
    }
}

fn energy(x: &[f64], v: &[f64], m: &[f64], g: f64) -> f64 {
    let n = m.len();
    let mut kinetic = 0.0;
    let mut potential = 0.0;

    for i in 0..n {
        let v2 = v[2 * i] * v[2 * i] + v[2 * i + 1] * v[2 * i + 1];
        kinetic += 0.5 * m[i] * v2;

        for j in (i + 1)..n {
            let dx = x[2 * j] - x[2 * i];
            let dy = x[2 * j + 1] - x[2 * i + 1];
            potential -= g * m[i] * m[j] / (dx * dx + dy * dy).sqrt();
        }
    }

    kinetic + potential
}
