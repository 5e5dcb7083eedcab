//! Viewer parameters adjustable at runtime

use orbit_core::launch::DEFAULT_MASS_SCALE;

/// Knobs of the viewer that are not part of the engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Ticks run per rendered frame
    pub time_speed: u32,
    /// Simulated days per tick
    pub dt: f64,
    /// Pixels per AU
    pub distance_scale: f32,
    /// Solar masses per cubed second of right-button hold
    pub new_star_mass_scale: f64,
    /// Exaggeration of star radii on screen
    pub star_scale: f32,
    /// Camera pan speed in pixels per second
    pub camera_speed: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            time_speed: 1,
            dt: 0.1,
            distance_scale: 150.0,
            new_star_mass_scale: DEFAULT_MASS_SCALE,
            star_scale: 200.0,
            camera_speed: 600.0,
        }
    }
}

impl Settings {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
