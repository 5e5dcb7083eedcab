use glam::DVec2;
use std::fmt;

/// Opaque identity of a body within one engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(u64);

impl BodyId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A point mass in the simulation
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub id: BodyId,
    pub mass: f64,
    pub position: DVec2,
    pub velocity: DVec2,
}

/// The live set of bodies, in insertion order
#[derive(Debug, Default)]
pub struct BodyRegistry {
    bodies: Vec<Body>,
    next_id: u64,
    generation: u64,
}

impl BodyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a body and return its identity.
    ///
    /// The id is assigned here rather than taken from the caller, so a body
    /// is given as its mass and phase-space coordinates. Ids are never reused.
    pub fn insert(&mut self, mass: f64, position: DVec2, velocity: DVec2) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        self.bodies.push(Body {
            id,
            mass,
            position,
            velocity,
        });
        self.generation += 1;
        id
    }

    /// Remove a body, keeping the order of the rest
    pub fn remove(&mut self, id: BodyId) -> Option<Body> {
        let idx = self.bodies.iter().position(|b| b.id == id)?;
        self.generation += 1;
        Some(self.bodies.remove(idx))
    }

    /// Remove every body. Calling this on an empty registry changes nothing.
    pub fn clear(&mut self) {
        if !self.bodies.is_empty() {
            self.bodies.clear();
            self.generation += 1;
        }
    }

    pub fn snapshot(&self) -> &[Body] {
        &self.bodies
    }

    pub fn get(&self, id: BodyId) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Counter bumped on every membership change
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Overwrite kinematics in snapshot order. Membership is untouched.
    pub(crate) fn publish(&mut self, positions: &[DVec2], velocities: &[DVec2]) {
        debug_assert_eq!(positions.len(), self.bodies.len());
        debug_assert_eq!(velocities.len(), self.bodies.len());

        for ((body, pos), vel) in self.bodies.iter_mut().zip(positions).zip(velocities) {
            body.position = *pos;
            body.velocity = *vel;
        }
    }
}
