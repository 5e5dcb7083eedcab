//! Force/energy kernels
//!
//! A [`Kernel`] computes pairwise gravitational accelerations and the total
//! energy of a snapshot. The backend is chosen once at startup and handed to
//! the engine by value; callers never see which one is running except through
//! [`Kernel::backend`].

mod native;
mod portable;

pub use native::{
    default_library_path, AccelerationFn, EnergyFn, NativeKernel, NATIVE_ABI_VERSION,
    NATIVE_LIBRARY_NAME,
};
pub use portable::{pair_count, PortableKernel};

use crate::config::G;
use crate::state::PhaseState;
use glam::DVec2;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failures while loading or calling a kernel
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("could not locate the running executable: {0}")]
    Locate(#[source] std::io::Error),
    #[error("failed to load native kernel from {}: {source}", path.display())]
    LoadFailed {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },
    #[error("native kernel {} has no symbol `{symbol}`: {source}", path.display())]
    MissingSymbol {
        path: PathBuf,
        symbol: &'static str,
        #[source]
        source: libloading::Error,
    },
    #[error("native kernel ABI version {found} does not match expected version {expected}")]
    AbiMismatch { expected: u32, found: u32 },
    #[error("native kernel reported fault status {status}")]
    NativeFault { status: i32 },
    #[error("state layout mismatch: {masses} masses, {positions} positions, {vectors} vectors")]
    LayoutMismatch {
        masses: usize,
        positions: usize,
        vectors: usize,
    },
}

/// Which implementation a [`Kernel`] runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Native,
    Portable,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Native => f.write_str("native"),
            Backend::Portable => f.write_str("portable"),
        }
    }
}

/// What the process asks for at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendPreference {
    /// Load the native library, from `path` or the default location
    Native { path: Option<PathBuf> },
    Portable,
}

/// Selected kernel backend
#[derive(Debug)]
pub enum Kernel {
    Native(NativeKernel),
    Portable(PortableKernel),
}

impl Kernel {
    pub fn portable() -> Self {
        Kernel::Portable(PortableKernel)
    }

    /// Load the native kernel from a shared library
    pub fn load_native(path: impl AsRef<Path>) -> Result<Self, KernelError> {
        let kernel = NativeKernel::load(path)?;
        log::info!("loaded native kernel from {:?}", kernel.path());
        Ok(Kernel::Native(kernel))
    }

    /// Resolve a startup preference. A failed native load is returned to the
    /// caller, who decides whether to continue with [`Kernel::portable`].
    pub fn select(preference: &BackendPreference) -> Result<Self, KernelError> {
        match preference {
            BackendPreference::Portable => {
                log::info!("using portable kernel");
                Ok(Kernel::portable())
            }
            BackendPreference::Native { path: Some(path) } => Kernel::load_native(path),
            BackendPreference::Native { path: None } => Kernel::load_native(default_library_path()?),
        }
    }

    /// Try the native kernel and fall back to the portable one with a warning
    pub fn native_or_portable(path: Option<PathBuf>) -> Self {
        match Kernel::select(&BackendPreference::Native { path }) {
            Ok(kernel) => kernel,
            Err(e) => {
                log::warn!("{e}; falling back to the portable kernel");
                Kernel::portable()
            }
        }
    }

    pub fn backend(&self) -> Backend {
        match self {
            Kernel::Native(_) => Backend::Native,
            Kernel::Portable(_) => Backend::Portable,
        }
    }

    /// Accelerations for `positions` into `out`; returns the pair terms evaluated
    pub fn accelerations(&self, masses: &[f64], positions: &[DVec2], out: &mut [DVec2]) -> Result<usize, KernelError> {
        check_layout(masses, positions, out.len())?;
        match self {
            Kernel::Native(native) => {
                native.accelerations(masses, positions, out, G)?;
                Ok(pair_count(masses.len()))
            }
            Kernel::Portable(portable) => Ok(portable.accelerations(masses, positions, out, G)),
        }
    }

    /// Total energy of a snapshot
    pub fn total_energy(&self, state: &PhaseState) -> Result<f64, KernelError> {
        check_layout(&state.masses, &state.positions, state.velocities.len())?;
        if state.is_empty() {
            return Ok(0.0);
        }
        Ok(match self {
            Kernel::Native(native) => native.total_energy(&state.masses, &state.positions, &state.velocities, G),
            Kernel::Portable(portable) => portable.total_energy(&state.masses, &state.positions, &state.velocities, G),
        })
    }
}

fn check_layout(masses: &[f64], positions: &[DVec2], vectors: usize) -> Result<(), KernelError> {
    if positions.len() != masses.len() || vectors != masses.len() {
        return Err(KernelError::LayoutMismatch {
            masses: masses.len(),
            positions: positions.len(),
            vectors,
        });
    }
    Ok(())
}
