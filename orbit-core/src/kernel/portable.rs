//! Pure-Rust force/energy kernel

use glam::DVec2;

/// Number of pair interactions among `n` bodies
pub fn pair_count(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

/// Direct O(n²) summation with no softening
#[derive(Debug, Clone, Copy, Default)]
pub struct PortableKernel;

impl PortableKernel {
    /// Write the acceleration of every body into `out` and return the number
    /// of pair terms evaluated.
    ///
    /// Coincident bodies give `inf * 0 = NaN` components, which are left to
    /// propagate.
    pub fn accelerations(&self, masses: &[f64], positions: &[DVec2], out: &mut [DVec2], g: f64) -> usize {
        let n = masses.len();
        out.fill(DVec2::ZERO);

        let mut pairs = 0;
        for i in 0..n {
            for j in (i + 1)..n {
                let dr = positions[j] - positions[i];
                let r2 = dr.x * dr.x + dr.y * dr.y;
                let inv_r3 = 1.0 / (r2 * r2.sqrt());

                out[i] += dr * (g * masses[j] * inv_r3);
                out[j] -= dr * (g * masses[i] * inv_r3);
                pairs += 1;
            }
        }
        pairs
    }

    /// Kinetic plus potential energy
    pub fn total_energy(&self, masses: &[f64], positions: &[DVec2], velocities: &[DVec2], g: f64) -> f64 {
        let n = masses.len();
        let mut kinetic = 0.0;
        let mut potential = 0.0;

        for i in 0..n {
            let v = velocities[i];
            kinetic += 0.5 * masses[i] * (v.x * v.x + v.y * v.y);

            for j in (i + 1)..n {
                let dr = positions[j] - positions[i];
                potential -= g * masses[i] * masses[j] / (dr.x * dr.x + dr.y * dr.y).sqrt();
            }
        }

        kinetic + potential
    }
}
