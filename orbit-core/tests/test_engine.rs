//! Engine lifecycle, configuration and recovery tests

use glam::DVec2;
use orbit_core::tests::test_helpers::{bodies_identical, circular_pair_engine, run_ticks};
use orbit_core::{
    format_engine_error, format_fallback_prompt, Algorithm, ConfigError, EnergyMonitor, Engine,
    EngineError, EngineState, IntegratorError, Kernel, Scenario,
};

fn coincident_engine(algorithm: Algorithm) -> Engine {
    let mut engine = Engine::new(Kernel::portable());
    engine.set_integrator_config(algorithm, 0.1, None).unwrap();
    engine.insert_body(DVec2::new(1.0, 1.0), DVec2::ZERO, 1.0).unwrap();
    engine.insert_body(DVec2::new(1.0, 1.0), DVec2::ZERO, 1.0).unwrap();
    engine
}

#[test]
fn test_new_engine_is_ready_and_empty() {
    let engine = Engine::new(Kernel::portable());
    assert_eq!(engine.state(), EngineState::Ready);
    assert_eq!(engine.body_count(), 0);
    assert_eq!(engine.read_energy(), 0.0);
    assert!(engine.needs_reinitialize());
}

#[test]
fn test_step_preserves_body_count() {
    for scenario in [Scenario::figure_eight(), Scenario::inner_solar_system()] {
        let mut engine = Engine::new(Kernel::portable());
        engine.load(&scenario).unwrap();
        let n = engine.body_count();

        let report = engine.step(1.0).unwrap();
        assert_eq!(engine.body_count(), n);
        assert_eq!(engine.read_bodies().len(), n);
        assert_eq!(report.advance.pair_interactions, report.advance.force_evaluations * n * (n - 1) / 2);
    }
}

#[test]
fn test_step_publishes_fresh_energy() {
    let mut engine = circular_pair_engine(Algorithm::Leapfrog, 0.1);
    assert_eq!(engine.read_energy(), 0.0);

    let report = engine.step(1.0).unwrap();
    assert!(report.total_energy < 0.0, "bound orbit has negative energy");
    assert_eq!(engine.read_energy(), report.total_energy);
    assert_eq!(engine.state(), EngineState::SteppingFixed);
    assert_eq!(engine.elapsed_time(), 1.0);
}

#[test]
fn test_measure_energy_does_not_publish() {
    let mut engine = circular_pair_engine(Algorithm::Leapfrog, 0.1);
    let measured = engine.measure_energy().unwrap();
    assert!(measured < 0.0);
    assert_eq!(engine.read_energy(), 0.0);

    let report = engine.step(0.1).unwrap();
    assert!((report.total_energy - measured).abs() < 1e-4 * measured.abs());
}

#[test]
fn test_step_on_empty_engine() {
    let mut engine = Engine::new(Kernel::portable());
    let report = engine.step(1.0).unwrap();
    assert_eq!(report.total_energy, 0.0);
    assert_eq!(report.advance.substeps, 0);
}

#[test]
fn test_invalid_dt_rejected() {
    let mut engine = circular_pair_engine(Algorithm::Leapfrog, 0.1);
    let before = engine.read_bodies().to_vec();

    for dt in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        let err = engine.step(dt).unwrap_err();
        assert!(matches!(err, EngineError::Config(ConfigError::NonPositiveDt(_))));
    }
    assert!(bodies_identical(engine.read_bodies(), &before));
}

#[test]
fn test_invalid_config_leaves_prior_config() {
    let mut engine = Engine::new(Kernel::portable());
    engine.set_integrator_config(Algorithm::Rk4, 0.25, Some(1e-6)).unwrap();
    let version = engine.config_version();
    let config = *engine.integrator_config();

    assert!(matches!(
        engine.set_integrator_config(Algorithm::Euler, 0.0, None),
        Err(EngineError::Config(ConfigError::NonPositiveStepSize(_)))
    ));
    assert!(matches!(
        engine.set_integrator_config(Algorithm::Rkf45, 0.1, Some(-1.0)),
        Err(EngineError::Config(ConfigError::NonPositiveTolerance(_)))
    ));
    assert!(engine.set_integrator_config(Algorithm::Euler, f64::NAN, None).is_err());

    assert_eq!(*engine.integrator_config(), config);
    assert_eq!(engine.config_version(), version);
}

#[test]
fn test_invalid_body_rejected() {
    let mut engine = Engine::new(Kernel::portable());

    assert!(matches!(
        engine.insert_body(DVec2::ZERO, DVec2::ZERO, 0.0),
        Err(EngineError::Config(ConfigError::NonPositiveMass(_)))
    ));
    assert!(engine.insert_body(DVec2::ZERO, DVec2::ZERO, -2.0).is_err());
    assert!(matches!(
        engine.insert_body(DVec2::new(f64::NAN, 0.0), DVec2::ZERO, 1.0),
        Err(EngineError::Config(ConfigError::NonFiniteVector { field: "position", .. }))
    ));
    assert!(engine.insert_body(DVec2::ZERO, DVec2::new(0.0, f64::INFINITY), 1.0).is_err());
    assert_eq!(engine.body_count(), 0);
}

#[test]
fn test_remove_body() {
    let mut engine = circular_pair_engine(Algorithm::Leapfrog, 0.1);
    let id = engine.read_bodies()[0].id;

    let removed = engine.remove_body(id).unwrap();
    assert_eq!(removed.id, id);
    assert_eq!(engine.body_count(), 1);
    assert!(engine.body(id).is_none());
    assert!(matches!(engine.remove_body(id), Err(EngineError::UnknownBody(_))));
}

#[test]
fn test_unchanged_config_keeps_version() {
    let mut engine = Engine::new(Kernel::portable());
    let config = *engine.integrator_config();
    let version = engine.config_version();

    engine
        .set_integrator_config(config.algorithm, config.step_size, Some(config.tolerance))
        .unwrap();
    assert_eq!(engine.config_version(), version);

    engine.set_integrator_config(Algorithm::Rk4, config.step_size, None).unwrap();
    assert_eq!(engine.config_version(), version + 1);
}

#[test]
fn test_config_change_triggers_reinitialize() {
    let mut engine = circular_pair_engine(Algorithm::Leapfrog, 0.1);
    assert!(engine.step(1.0).unwrap().reinitialized);
    assert!(!engine.step(1.0).unwrap().reinitialized);
    assert!(!engine.needs_reinitialize());

    engine.set_integrator_config(Algorithm::Leapfrog, 0.05, None).unwrap();
    assert!(engine.needs_reinitialize());
    assert!(engine.step(1.0).unwrap().reinitialized);
    assert!(!engine.needs_reinitialize());
}

#[test]
fn test_body_change_triggers_reinitialize() {
    let mut engine = circular_pair_engine(Algorithm::Leapfrog, 0.1);
    run_ticks(&mut engine, 3, 1.0).unwrap();
    assert!(!engine.needs_reinitialize());

    engine.insert_body(DVec2::new(5.0, 0.0), DVec2::ZERO, 1e-3).unwrap();
    assert!(engine.needs_reinitialize());

    // Cold leapfrog tick: ten sub-steps plus the initial acceleration
    let report = engine.step(1.0).unwrap();
    assert!(report.reinitialized);
    assert_eq!(report.advance.force_evaluations, 11);
}

#[test]
fn test_config_switch_isolation() {
    let mut engine = circular_pair_engine(Algorithm::Leapfrog, 0.1);
    run_ticks(&mut engine, 20, 1.0).unwrap();
    assert!(!engine.scratch_is_cold());

    let sequence = [
        Algorithm::Rk4,
        Algorithm::DormandPrince,
        Algorithm::Euler,
        Algorithm::Rkf45,
        Algorithm::EulerCromer,
        Algorithm::Leapfrog,
    ];
    for algorithm in sequence {
        // Change the body count as well so any stale buffer would mismatch
        engine
            .insert_body(DVec2::new(10.0 + engine.body_count() as f64, 0.0), DVec2::ZERO, 1e-6)
            .unwrap();
        engine.set_integrator_config(algorithm, 0.1, Some(1e-8)).unwrap();

        let report = engine
            .step(1.0)
            .unwrap_or_else(|e| panic!("{algorithm} after switch: {e}"));
        assert!(report.reinitialized, "{algorithm} should start cold");
        run_ticks(&mut engine, 5, 1.0).unwrap();
    }

    // Back on leapfrog, the first tick after the switch paid for a cold start
    engine.set_integrator_config(Algorithm::Leapfrog, 0.2, None).unwrap();
    let report = engine.step(1.0).unwrap();
    assert_eq!(report.advance.force_evaluations, 6);
}

#[test]
fn test_state_labels_follow_algorithm() {
    let mut engine = circular_pair_engine(Algorithm::Rkf45, 0.5);
    engine.step(1.0).unwrap();
    assert_eq!(engine.state(), EngineState::SteppingAdaptive);

    engine.set_integrator_config(Algorithm::Rk4, 0.5, None).unwrap();
    engine.step(1.0).unwrap();
    assert_eq!(engine.state(), EngineState::SteppingFixed);
}

#[test]
fn test_coincident_bodies_diverge_then_reset() {
    for algorithm in [Algorithm::Leapfrog, Algorithm::DormandPrince] {
        let mut engine = coincident_engine(algorithm);

        engine.step(1.0).unwrap();
        assert!(!engine.read_energy().is_finite(), "{algorithm}");
        assert_eq!(engine.state(), EngineState::Error);

        engine.reset();
        assert_eq!(engine.read_energy(), 0.0);
        assert!(engine.read_bodies().is_empty());
        assert_eq!(engine.state(), EngineState::Ready);
        assert!(engine.needs_reinitialize());
    }
}

#[test]
fn test_energy_monitor_recovers_from_divergence() {
    let mut engine = coincident_engine(Algorithm::Leapfrog);
    let mut monitor = EnergyMonitor::new();

    assert!(monitor.check(&mut engine).is_none(), "energy still zero before the first tick");

    engine.step(1.0).unwrap();
    let notice = monitor.check(&mut engine).expect("divergence should be reported");
    assert_eq!(notice.removed, 2);
    assert!(!notice.energy.is_finite());
    assert!(notice.to_string().contains("removed all 2 bodies"));

    assert_eq!(engine.read_energy(), 0.0);
    assert_eq!(engine.body_count(), 0);
    assert_eq!(monitor.resets(), 1);
    assert!(monitor.check(&mut engine).is_none());
}

#[test]
fn test_failed_tick_keeps_previous_state() {
    let mut engine = circular_pair_engine(Algorithm::Leapfrog, 0.1);
    run_ticks(&mut engine, 5, 1.0).unwrap();
    let energy = engine.read_energy();
    let elapsed = engine.elapsed_time();

    engine.insert_body(DVec2::new(3.0, 0.0), DVec2::ZERO, 1.0).unwrap();
    engine.insert_body(DVec2::new(3.0 + 1e-10, 3e-11), DVec2::ZERO, 0.5).unwrap();
    engine.set_integrator_config(Algorithm::Rkf45, 0.01, Some(1e-9)).unwrap();
    let before = engine.read_bodies().to_vec();

    let err = engine.step(1.0).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Integrator(IntegratorError::Unstable { .. })
            | EngineError::Integrator(IntegratorError::TooManySubsteps { .. })
    ));

    assert!(bodies_identical(engine.read_bodies(), &before));
    assert_eq!(engine.read_energy(), energy);
    assert_eq!(engine.elapsed_time(), elapsed);
    assert!(engine.needs_reinitialize());
}

#[test]
fn test_load_is_all_or_nothing() {
    let mut engine = circular_pair_engine(Algorithm::Leapfrog, 0.1);
    let before = engine.read_bodies().to_vec();

    let mut broken = Scenario::inner_solar_system();
    broken.bodies[2].mass = 0.0;
    assert!(engine.load(&broken).is_err());
    assert!(bodies_identical(engine.read_bodies(), &before));

    let ids = engine.load(&Scenario::inner_solar_system()).unwrap();
    assert_eq!(ids.len(), 5);
    assert_eq!(engine.body_count(), 5);
}

#[test]
fn test_reset_clears_elapsed_time() {
    let mut engine = circular_pair_engine(Algorithm::Leapfrog, 0.1);
    run_ticks(&mut engine, 4, 0.5).unwrap();
    assert_eq!(engine.elapsed_time(), 2.0);

    engine.reset();
    assert_eq!(engine.elapsed_time(), 0.0);
    engine.reset();
    assert_eq!(engine.body_count(), 0);
}

#[test]
fn test_error_messages_carry_hints() {
    let mut engine = circular_pair_engine(Algorithm::Leapfrog, 0.1);

    let err = engine.step(-1.0).unwrap_err();
    let msg = format_engine_error(&err);
    assert!(msg.starts_with("Error: tick length must be positive"));
    assert!(msg.contains("nothing was changed"));

    let id = engine.read_bodies()[0].id;
    engine.remove_body(id).unwrap();
    let msg = format_engine_error(&engine.remove_body(id).unwrap_err());
    assert!(msg.contains(&id.to_string()));
}

#[test]
fn test_fallback_prompt_names_the_failure() {
    let err = Kernel::load_native("/nonexistent/liborbit_kernel.so").unwrap_err();
    let prompt = format_fallback_prompt(&err);
    assert!(prompt.contains("liborbit_kernel"));
    assert!(prompt.ends_with("Continue with the portable kernel?"));
}

#[test]
fn test_removing_diverged_bodies_clears_error_state() {
    let mut engine = coincident_engine(Algorithm::Leapfrog);
    engine.step(1.0).unwrap();
    assert_eq!(engine.state(), EngineState::Error);

    let ids: Vec<_> = engine.read_bodies().iter().map(|b| b.id).collect();
    for id in ids {
        engine.remove_body(id).unwrap();
    }
    engine.step(1.0).unwrap();

    assert_eq!(engine.read_energy(), 0.0);
    assert_ne!(engine.state(), EngineState::Error);
    assert_eq!(engine.state(), EngineState::SteppingFixed);
}
