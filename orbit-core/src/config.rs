//! Units, constants and integrator configuration
//!
//! All quantities use astronomical units for length, days for time and solar
//! masses for mass. The gravitational constant lives here and nowhere else;
//! the native kernel receives it as a call argument.

use glam::DVec2;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Gravitational constant in AU³ M☉⁻¹ day⁻²
pub const G: f64 = 2.959_122_082_855_911e-4;

/// Solar radius in AU
pub const SOLAR_RADIUS: f64 = 0.004_650_47;

/// Upper bound on sub-steps (accepted or rejected) within a single tick
pub const MAX_SUBSTEPS: usize = 100_000;

/// Smallest adaptive sub-step, as a fraction of the tick length
pub const MIN_STEP_FRACTION: f64 = 1e-12;

/// Default sub-step length in days
pub const DEFAULT_STEP_SIZE: f64 = 0.1;

/// Default local error tolerance for adaptive algorithms
pub const DEFAULT_TOLERANCE: f64 = 1e-8;

/// Configuration values rejected at the API boundary
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("step size must be positive and finite, got {0}")]
    NonPositiveStepSize(f64),
    #[error("tolerance must be positive and finite, got {0}")]
    NonPositiveTolerance(f64),
    #[error("tick length must be positive and finite, got {0}")]
    NonPositiveDt(f64),
    #[error("body mass must be positive and finite, got {0}")]
    NonPositiveMass(f64),
    #[error("{field} must be finite, got ({x}, {y})")]
    NonFiniteVector { field: &'static str, x: f64, y: f64 },
}

/// Integration algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Algorithm {
    /// Explicit Euler
    Euler,
    /// Semi-implicit (symplectic) Euler
    EulerCromer,
    /// Velocity Verlet in kick-drift-kick form
    #[default]
    Leapfrog,
    /// Classical fourth-order Runge–Kutta
    Rk4,
    /// Runge–Kutta–Fehlberg 4(5), adaptive
    Rkf45,
    /// Dormand–Prince 5(4), adaptive
    DormandPrince,
}

impl Algorithm {
    pub const ALL: [Algorithm; 6] = [
        Algorithm::Euler,
        Algorithm::EulerCromer,
        Algorithm::Leapfrog,
        Algorithm::Rk4,
        Algorithm::Rkf45,
        Algorithm::DormandPrince,
    ];

    /// Whether the algorithm varies its sub-step to meet a tolerance
    pub fn is_adaptive(self) -> bool {
        matches!(self, Algorithm::Rkf45 | Algorithm::DormandPrince)
    }

    /// Short identifier, also accepted by `FromStr`
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Euler => "euler",
            Algorithm::EulerCromer => "euler-cromer",
            Algorithm::Leapfrog => "leapfrog",
            Algorithm::Rk4 => "rk4",
            Algorithm::Rkf45 => "rkf45",
            Algorithm::DormandPrince => "dopri",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown algorithm '{0}' (expected one of: euler, euler-cromer, leapfrog, rk4, rkf45, dopri)")]
pub struct ParseAlgorithmError(String);

impl FromStr for Algorithm {
    type Err = ParseAlgorithmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Algorithm::ALL
            .into_iter()
            .find(|a| a.name() == normalized)
            .or(match normalized.as_str() {
                "verlet" => Some(Algorithm::Leapfrog),
                "dormand-prince" => Some(Algorithm::DormandPrince),
                _ => None,
            })
            .ok_or_else(|| ParseAlgorithmError(s.to_string()))
    }
}

/// Stepping parameters for the active integrator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegratorConfig {
    pub algorithm: Algorithm,
    /// Fixed sub-step length, or the largest sub-step for adaptive algorithms (days)
    pub step_size: f64,
    /// Local error tolerance; only read by adaptive algorithms
    pub tolerance: f64,
}

impl IntegratorConfig {
    /// Build a validated configuration
    pub fn new(algorithm: Algorithm, step_size: f64, tolerance: f64) -> Result<Self, ConfigError> {
        let config = Self {
            algorithm,
            step_size,
            tolerance,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.step_size > 0.0 && self.step_size.is_finite()) {
            return Err(ConfigError::NonPositiveStepSize(self.step_size));
        }
        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return Err(ConfigError::NonPositiveTolerance(self.tolerance));
        }
        Ok(())
    }
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            step_size: DEFAULT_STEP_SIZE,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// Check the values of a body before it enters the registry
pub fn validate_body(position: DVec2, velocity: DVec2, mass: f64) -> Result<(), ConfigError> {
    if !(mass > 0.0 && mass.is_finite()) {
        return Err(ConfigError::NonPositiveMass(mass));
    }
    for (field, v) in [("position", position), ("velocity", velocity)] {
        if !v.is_finite() {
            return Err(ConfigError::NonFiniteVector {
                field,
                x: v.x,
                y: v.y,
            });
        }
    }
    Ok(())
}

/// Validate a tick length
pub fn validate_dt(dt: f64) -> Result<(), ConfigError> {
    if dt > 0.0 && dt.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositiveDt(dt))
    }
}
