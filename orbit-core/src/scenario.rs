//! Built-in initial conditions

use crate::config::G;
use glam::DVec2;

/// Initial state of one body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodySeed {
    pub position: DVec2,
    pub velocity: DVec2,
    pub mass: f64,
}

/// A named set of bodies to start a simulation from
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub name: &'static str,
    pub bodies: Vec<BodySeed>,
}

impl Scenario {
    pub const NAMES: [&'static str; 3] = ["two-body", "figure-eight", "inner-solar-system"];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "two-body" => Some(Self::two_body_circular(1.0, 1.0, 1.0)),
            "figure-eight" => Some(Self::figure_eight()),
            "inner-solar-system" => Some(Self::inner_solar_system()),
            _ => None,
        }
    }

    /// Two bodies on circular orbits about their common centre of mass,
    /// which sits at the origin and is at rest.
    pub fn two_body_circular(m1: f64, m2: f64, separation: f64) -> Self {
        let total = m1 + m2;
        let r1 = separation * m2 / total;
        let r2 = separation * m1 / total;
        // v_i² / r_i = G m_other / d²
        let v1 = (G * m2 * r1).sqrt() / separation;
        let v2 = (G * m1 * r2).sqrt() / separation;

        Self {
            name: "two-body",
            bodies: vec![
                BodySeed {
                    position: DVec2::new(-r1, 0.0),
                    velocity: DVec2::new(0.0, -v1),
                    mass: m1,
                },
                BodySeed {
                    position: DVec2::new(r2, 0.0),
                    velocity: DVec2::new(0.0, v2),
                    mass: m2,
                },
            ],
        }
    }

    /// Chenciner–Montgomery figure-eight choreography of three solar masses,
    /// rescaled from G = 1 to simulation units
    pub fn figure_eight() -> Self {
        let x1 = DVec2::new(0.970_004_36, -0.243_087_53);
        let v3 = DVec2::new(-0.932_407_37, -0.864_731_46);
        let vscale = G.sqrt();

        Self {
            name: "figure-eight",
            bodies: vec![
                BodySeed {
                    position: x1,
                    velocity: -0.5 * v3 * vscale,
                    mass: 1.0,
                },
                BodySeed {
                    position: -x1,
                    velocity: -0.5 * v3 * vscale,
                    mass: 1.0,
                },
                BodySeed {
                    position: DVec2::ZERO,
                    velocity: v3 * vscale,
                    mass: 1.0,
                },
            ],
        }
    }

    /// The Sun with Mercury, Venus, Earth and Mars on circular orbits
    pub fn inner_solar_system() -> Self {
        // (semi-major axis in AU, mass in M☉, starting angle in radians)
        const PLANETS: [(f64, f64, f64); 4] = [
            (0.387, 1.660e-7, 0.0),
            (0.723, 2.448e-6, 1.2),
            (1.000, 3.003e-6, 2.6),
            (1.524, 3.227e-7, 4.1),
        ];

        let mut bodies = vec![BodySeed {
            position: DVec2::ZERO,
            velocity: DVec2::ZERO,
            mass: 1.0,
        }];
        bodies.extend(PLANETS.iter().map(|&(a, mass, angle)| {
            let dir = DVec2::from_angle(angle);
            BodySeed {
                position: dir * a,
                velocity: dir.perp() * (G / a).sqrt(),
                mass,
            }
        }));

        Self {
            name: "inner-solar-system",
            bodies,
        }
    }
}
