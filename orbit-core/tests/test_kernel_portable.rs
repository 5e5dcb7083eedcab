//! Unit tests for the portable force/energy kernel

use glam::DVec2;
use orbit_core::kernel::{pair_count, Kernel, PortableKernel};
use orbit_core::state::PhaseState;
use orbit_core::tests::test_helpers::{approx_eq, rel_err};
use orbit_core::G;

fn ring(n: usize) -> PhaseState {
    let mut state = PhaseState::default();
    for i in 0..n {
        let angle = i as f64 * std::f64::consts::TAU / n as f64;
        state.masses.push(1.0 + i as f64 * 0.1);
        state.positions.push(DVec2::from_angle(angle) * (1.0 + 0.05 * i as f64));
        state.velocities.push(DVec2::from_angle(angle).perp() * 0.01);
    }
    state
}

#[test]
fn test_acceleration_magnitude_and_direction() {
    let masses = [1.0, 2.0];
    let positions = [DVec2::new(0.0, 0.0), DVec2::new(3.0, 4.0)]; // distance = 5.0
    let mut out = [DVec2::ZERO; 2];

    PortableKernel.accelerations(&masses, &positions, &mut out, 1.0);

    // |a_0| = G * m_1 / r² = 2 / 25 toward body 1
    let dir = DVec2::new(3.0, 4.0).normalize();
    assert!(approx_eq(out[0].x, 0.08 * dir.x, 1e-12));
    assert!(approx_eq(out[0].y, 0.08 * dir.y, 1e-12));
    // |a_1| = G * m_0 / r² = 1 / 25 toward body 0
    assert!(approx_eq(out[1].x, -0.04 * dir.x, 1e-12));
    assert!(approx_eq(out[1].y, -0.04 * dir.y, 1e-12));
}

#[test]
fn test_momentum_balance() {
    let state = ring(7);
    let mut out = vec![DVec2::ZERO; 7];
    PortableKernel.accelerations(&state.masses, &state.positions, &mut out, G);

    // Σ m_i a_i = 0 by Newton's third law
    let net: DVec2 = state.masses.iter().zip(&out).map(|(m, a)| *a * *m).sum();
    assert!(net.length() < 1e-15, "net force {net:?}");
}

#[test]
fn test_pair_count_invariant() {
    for n in [0usize, 1, 2, 3, 10, 25] {
        let state = ring(n);
        let mut out = vec![DVec2::ZERO; n];
        let pairs = PortableKernel.accelerations(&state.masses, &state.positions, &mut out, G);
        assert_eq!(pairs, n * n.saturating_sub(1) / 2, "n = {n}");
        assert_eq!(pairs, pair_count(n));
    }
}

#[test]
fn test_energy_two_bodies() {
    let masses = [1.0, 3.0];
    let positions = [DVec2::new(0.0, 0.0), DVec2::new(2.0, 0.0)];
    let velocities = [DVec2::new(0.0, 1.0), DVec2::new(0.0, -1.0)];

    let e = PortableKernel.total_energy(&masses, &positions, &velocities, 1.0);

    // KE = 2, PE = -1 * 3 / 2
    assert!(approx_eq(e, 0.5, 1e-12));
}

#[test]
fn test_energy_uses_gravitational_constant() {
    let state = ring(2);
    let kernel = Kernel::portable();
    let e = kernel.total_energy(&state).unwrap();

    let r = state.positions[0].distance(state.positions[1]);
    let kinetic: f64 = state
        .masses
        .iter()
        .zip(&state.velocities)
        .map(|(m, v)| 0.5 * m * v.length_squared())
        .sum();
    let expected = kinetic - G * state.masses[0] * state.masses[1] / r;
    assert!(rel_err(e, expected) < 1e-12);
}

#[test]
fn test_coincident_bodies_produce_non_finite_values() {
    let masses = [1.0, 1.0];
    let positions = [DVec2::new(1.0, 1.0), DVec2::new(1.0, 1.0)];
    let velocities = [DVec2::ZERO; 2];
    let mut out = [DVec2::ZERO; 2];

    PortableKernel.accelerations(&masses, &positions, &mut out, G);
    assert!(!out[0].is_finite());

    let e = PortableKernel.total_energy(&masses, &positions, &velocities, G);
    assert!(!e.is_finite());
}

#[test]
fn test_empty_state_has_zero_energy() {
    let kernel = Kernel::portable();
    assert_eq!(kernel.total_energy(&PhaseState::default()).unwrap(), 0.0);
}

#[test]
fn test_layout_mismatch_is_rejected() {
    let kernel = Kernel::portable();
    let mut state = ring(3);
    state.velocities.pop();
    assert!(kernel.total_energy(&state).is_err());

    let mut out = vec![DVec2::ZERO; 2];
    let state = ring(3);
    assert!(kernel.accelerations(&state.masses, &state.positions, &mut out).is_err());
}
