//! Flat phase-space state handed to the integrators and kernels

use crate::registry::Body;
use glam::DVec2;

// `DVec2` is `#[repr(C)] { x: f64, y: f64 }`, so a `[DVec2]` is an
// interleaved `[f64]` of twice the length. The native kernel relies on this.
const _: () = assert!(std::mem::size_of::<DVec2>() == 2 * std::mem::size_of::<f64>());

/// Masses, positions and velocities of every body, in registry order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PhaseState {
    pub masses: Vec<f64>,
    pub positions: Vec<DVec2>,
    pub velocities: Vec<DVec2>,
}

impl PhaseState {
    pub fn from_bodies(bodies: &[Body]) -> Self {
        Self {
            masses: bodies.iter().map(|b| b.mass).collect(),
            positions: bodies.iter().map(|b| b.position).collect(),
            velocities: bodies.iter().map(|b| b.velocity).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.masses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masses.is_empty()
    }

    /// Whether all three arrays describe the same number of bodies
    pub fn is_consistent(&self) -> bool {
        self.positions.len() == self.masses.len() && self.velocities.len() == self.masses.len()
    }
}

/// View a slice of vectors as interleaved `x, y` scalars
pub(crate) fn as_flat(v: &[DVec2]) -> *const f64 {
    v.as_ptr().cast::<f64>()
}

pub(crate) fn as_flat_mut(v: &mut [DVec2]) -> *mut f64 {
    v.as_mut_ptr().cast::<f64>()
}
