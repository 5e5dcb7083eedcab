//! Bodies created from a press-drag-release gesture
//!
//! The presentation layer measures how long the button was held and where
//! it was pressed and released, in world coordinates. The mass grows with
//! the cube of the hold time so that the display radius, which scales with
//! the cube root of the mass, grows linearly while the button is held.

use crate::config::SOLAR_RADIUS;
use crate::scenario::BodySeed;
use glam::DVec2;

/// Launch speed per AU of drag, in AU/day
pub const LAUNCH_VELOCITY_SCALE: f64 = 0.01;

/// Default solar masses per cubed second of hold time
pub const DEFAULT_MASS_SCALE: f64 = 1.0;

/// Mass in solar masses for a button held `hold_secs` seconds
pub fn launch_mass(hold_secs: f64, mass_scale: f64) -> f64 {
    mass_scale * hold_secs.max(0.0).powi(3)
}

/// Physical radius in AU of a star of `mass` solar masses
pub fn star_radius(mass: f64) -> f64 {
    SOLAR_RADIUS * mass.max(0.0).cbrt()
}

/// Seed for a body pressed at `press` and released at `release`.
///
/// The body starts at the press point and moves along the drag. A zero hold
/// time gives a zero mass, which the engine rejects on insertion.
pub fn launch(press: DVec2, release: DVec2, hold_secs: f64, mass_scale: f64) -> BodySeed {
    BodySeed {
        position: press,
        velocity: (release - press) * LAUNCH_VELOCITY_SCALE,
        mass: launch_mass(hold_secs, mass_scale),
    }
}
