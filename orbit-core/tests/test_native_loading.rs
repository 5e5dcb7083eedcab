//! Loading the native kernel from a shared library at runtime

use glam::DVec2;
use orbit_core::kernel::{Backend, Kernel, KernelError};
use orbit_core::state::PhaseState;
use orbit_core::tests::test_helpers::{rel_err, vec_rel_eq};
use orbit_core::Scenario;
use std::path::PathBuf;

/// The `orbit_kernel` cdylib built alongside this test binary.
///
/// Test executables live in `target/<profile>/deps`; the library is emitted
/// there as a dependency artifact and into `target/<profile>` when the
/// workspace builds it directly.
fn built_library() -> PathBuf {
    let name = libloading::library_filename("orbit_kernel");
    let exe = std::env::current_exe().expect("test executable path");
    let deps = exe.parent().expect("test executable directory").to_path_buf();

    let mut candidates = vec![deps.join(&name)];
    if let Some(profile) = deps.parent() {
        candidates.push(profile.join(&name));
    }
    candidates.push(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../target/debug").join(&name));

    if let Some(found) = candidates.iter().find(|p| p.is_file()) {
        return found.clone();
    }

    // Dependency artifacts may carry a hash suffix
    let prefix = format!("{}orbit_kernel", std::env::consts::DLL_PREFIX);
    std::fs::read_dir(&deps)
        .expect("readable deps directory")
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .find(|p| {
            p.file_name().and_then(|n| n.to_str()).is_some_and(|n| {
                n.starts_with(&prefix) && n.ends_with(std::env::consts::DLL_SUFFIX)
            })
        })
        .unwrap_or_else(|| panic!("orbit_kernel library not found in {candidates:?}; build orbit-kernel first"))
}

fn scenario_state(scenario: &Scenario) -> PhaseState {
    PhaseState {
        masses: scenario.bodies.iter().map(|b| b.mass).collect(),
        positions: scenario.bodies.iter().map(|b| b.position).collect(),
        velocities: scenario.bodies.iter().map(|b| b.velocity).collect(),
    }
}

#[test]
fn test_load_built_library() {
    let path = built_library();
    let kernel = Kernel::load_native(&path).unwrap();
    assert_eq!(kernel.backend(), Backend::Native);

    match &kernel {
        Kernel::Native(native) => assert_eq!(native.path(), Some(path.as_path())),
        Kernel::Portable(_) => panic!("expected native kernel"),
    }
}

#[test]
fn test_loaded_library_agrees_with_portable_kernel() {
    let native = Kernel::load_native(built_library()).unwrap();
    let portable = Kernel::portable();
    let state = scenario_state(&Scenario::inner_solar_system());
    let n = state.len();

    let e_native = native.total_energy(&state).unwrap();
    let e_portable = portable.total_energy(&state).unwrap();
    assert!(rel_err(e_native, e_portable) < 1e-9, "{e_native} vs {e_portable}");

    let mut a_native = vec![DVec2::ZERO; n];
    let mut a_portable = vec![DVec2::ZERO; n];
    let pairs = native.accelerations(&state.masses, &state.positions, &mut a_native).unwrap();
    portable.accelerations(&state.masses, &state.positions, &mut a_portable).unwrap();
    assert_eq!(pairs, n * (n - 1) / 2);

    for (i, (an, ap)) in a_native.iter().zip(&a_portable).enumerate() {
        assert!(vec_rel_eq(*an, *ap, 1e-9), "body {i}: {an:?} vs {ap:?}");
    }
}

#[test]
#[cfg(target_os = "linux")]
fn test_library_without_kernel_symbols() {
    let err = Kernel::load_native("libm.so.6").unwrap_err();
    match err {
        KernelError::MissingSymbol { symbol, .. } => assert_eq!(symbol, "orbit_kernel_abi_version"),
        other => panic!("expected a missing symbol, got {other:?}"),
    }
}
