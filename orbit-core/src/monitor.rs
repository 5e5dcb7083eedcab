//! Energy watchdog run by the presentation layer after each tick

use crate::engine::Engine;
use std::fmt;

/// Emitted when the monitor had to wipe the simulation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DivergenceNotice {
    /// Bodies removed by the reset
    pub removed: usize,
    /// The non-finite energy that triggered the reset
    pub energy: f64,
}

impl fmt::Display for DivergenceNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "removed all {} bodies due to non-finite energy ({})",
            self.removed, self.energy
        )
    }
}

/// Resets the engine whenever its published energy stops being finite
#[derive(Debug, Default)]
pub struct EnergyMonitor {
    resets: usize,
}

impl EnergyMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, engine: &mut Engine) -> Option<DivergenceNotice> {
        let energy = engine.read_energy();
        if energy.is_finite() {
            return None;
        }

        let notice = DivergenceNotice {
            removed: engine.body_count(),
            energy,
        };
        engine.reset();
        self.resets += 1;
        log::warn!("{notice}");
        Some(notice)
    }

    /// Number of resets performed so far
    pub fn resets(&self) -> usize {
        self.resets
    }
}
