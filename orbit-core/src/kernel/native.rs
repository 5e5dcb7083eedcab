//! Natively compiled kernel reached over the C ABI
//!
//! The shared library is produced by the `orbit-kernel` crate. It is opened
//! once, its entry points are resolved into plain function pointers, and the
//! library handle is kept alive next to them for as long as the kernel lives.

use super::KernelError;
use crate::state::{as_flat, as_flat_mut};
use glam::DVec2;
use libloading::Library;
use std::fmt;
use std::path::{Path, PathBuf};

/// ABI version this build of the engine expects from the native library
pub const NATIVE_ABI_VERSION: u32 = 1;

/// File stem of the native library, without platform prefix or extension
pub const NATIVE_LIBRARY_NAME: &str = "orbit_kernel";

pub type AbiVersionFn = unsafe extern "C" fn() -> u32;
pub type EnergyFn = unsafe extern "C" fn(usize, *const f64, *const f64, *const f64, f64) -> f64;
pub type AccelerationFn = unsafe extern "C" fn(usize, *mut f64, *const f64, *const f64, f64) -> i32;

enum Origin {
    Library { path: PathBuf, _library: Library },
    Linked,
}

/// Handle to the native kernel entry points
pub struct NativeKernel {
    energy: EnergyFn,
    acceleration: AccelerationFn,
    origin: Origin,
}

impl NativeKernel {
    /// Open the shared library at `path` and resolve its entry points
    pub fn load(path: impl AsRef<Path>) -> Result<Self, KernelError> {
        let path = path.as_ref().to_path_buf();

        // SAFETY: the library has no initialisation routines with
        // preconditions; a foreign library that does is the caller's choice.
        let library = unsafe { Library::new(&path) }.map_err(|source| KernelError::LoadFailed {
            path: path.clone(),
            source,
        })?;

        // SAFETY: the symbol types below mirror the exported signatures of
        // `orbit-kernel` for NATIVE_ABI_VERSION, which is checked first.
        let (energy, acceleration) = unsafe {
            let version: AbiVersionFn = symbol(&library, &path, "orbit_kernel_abi_version")?;
            let found = version();
            if found != NATIVE_ABI_VERSION {
                return Err(KernelError::AbiMismatch {
                    expected: NATIVE_ABI_VERSION,
                    found,
                });
            }
            (
                symbol::<EnergyFn>(&library, &path, "compute_energy")?,
                symbol::<AccelerationFn>(&library, &path, "compute_acceleration")?,
            )
        };

        Ok(Self {
            energy,
            acceleration,
            origin: Origin::Library {
                path,
                _library: library,
            },
        })
    }

    /// Wrap entry points that are linked into the process instead of loaded
    ///
    /// # Safety
    ///
    /// Both functions must implement the `orbit-kernel` ABI at
    /// [`NATIVE_ABI_VERSION`].
    pub unsafe fn from_entry_points(energy: EnergyFn, acceleration: AccelerationFn) -> Self {
        Self {
            energy,
            acceleration,
            origin: Origin::Linked,
        }
    }

    /// Path the library was loaded from, if any
    pub fn path(&self) -> Option<&Path> {
        match &self.origin {
            Origin::Library { path, .. } => Some(path),
            Origin::Linked => None,
        }
    }

    pub(crate) fn accelerations(
        &self,
        masses: &[f64],
        positions: &[DVec2],
        out: &mut [DVec2],
        g: f64,
    ) -> Result<(), KernelError> {
        // SAFETY: the caller checked that all three slices hold `masses.len()`
        // bodies, and `out` is a distinct mutable borrow.
        let status = unsafe {
            (self.acceleration)(
                masses.len(),
                as_flat_mut(out),
                as_flat(positions),
                masses.as_ptr(),
                g,
            )
        };
        if status == 0 {
            Ok(())
        } else {
            Err(KernelError::NativeFault { status })
        }
    }

    pub(crate) fn total_energy(&self, masses: &[f64], positions: &[DVec2], velocities: &[DVec2], g: f64) -> f64 {
        // SAFETY: lengths checked by the caller; the call only reads.
        unsafe {
            (self.energy)(
                masses.len(),
                as_flat(positions),
                as_flat(velocities),
                masses.as_ptr(),
                g,
            )
        }
    }
}

impl fmt::Debug for NativeKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin {
            Origin::Library { path, .. } => f.debug_struct("NativeKernel").field("path", path).finish(),
            Origin::Linked => f.debug_struct("NativeKernel").field("path", &"<linked>").finish(),
        }
    }
}

/// Default location of the native library: beside the running executable
pub fn default_library_path() -> Result<PathBuf, KernelError> {
    let exe = std::env::current_exe().map_err(KernelError::Locate)?;
    let dir = exe.parent().unwrap_or_else(|| Path::new("."));
    Ok(dir.join(libloading::library_filename(NATIVE_LIBRARY_NAME)))
}

unsafe fn symbol<T: Copy>(library: &Library, path: &Path, name: &'static str) -> Result<T, KernelError> {
    library
        .get::<T>(name.as_bytes())
        .map(|s| *s)
        .map_err(|source| KernelError::MissingSymbol {
            path: path.to_path_buf(),
            symbol: name,
            source,
        })
}
