//! Unit-speed vehicle with accumulated heading.
//!
//! The vehicle is a two-state machine: it starts alive and becomes dead the
//! first time a step lands outside the map or inside an occupied cell. Once
//! dead it ignores every further command.

use serde::{Deserialize, Serialize};

use crate::track::TrackMap;

/// Position and heading of a vehicle in grid space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Horizontal position (column axis).
    pub x: f64,
    /// Vertical position (row axis).
    pub y: f64,
    /// Heading in radians. Never normalized.
    pub heading: f64,
}

impl Pose {
    /// Create a pose.
    #[must_use]
    pub const fn new(x: f64, y: f64, heading: f64) -> Self {
        Self { x, y, heading }
    }
}

impl Default for Pose {
    /// The reference start pose: `(15, 15)` facing along `+x`.
    fn default() -> Self {
        Self::new(15.0, 15.0, 0.0)
    }
}

/// A simulated vehicle and its recorded trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pose: Pose,
    alive: bool,
    path: Vec<(f64, f64)>,
}

impl Default for Vehicle {
    fn default() -> Self {
        Self::new(Pose::default())
    }
}

impl Vehicle {
    /// Place a live vehicle at `start`. The path holds the start position.
    #[must_use]
    pub fn new(start: Pose) -> Self {
        Self {
            pose: start,
            alive: true,
            path: vec![(start.x, start.y)],
        }
    }

    /// Turn by `steering_deg` degrees, then move one unit along the new heading.
    ///
    /// The new position is always recorded. The vehicle dies if that position
    /// is off the map or occupied. Calls on a dead vehicle do nothing.
    pub fn advance(&mut self, steering_deg: f64, track: &TrackMap) {
        if !self.alive {
            return;
        }

        self.pose.heading += steering_deg.to_radians();
        self.pose.x += self.pose.heading.cos();
        self.pose.y += self.pose.heading.sin();
        self.path.push((self.pose.x, self.pose.y));

        if track.occupied(self.pose.x, self.pose.y) {
            self.alive = false;
        }
    }

    /// Current pose.
    #[must_use]
    pub const fn pose(&self) -> Pose {
        self.pose
    }

    /// Whether the vehicle is still driving.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Every position visited, starting with the start position.
    #[must_use]
    pub fn path(&self) -> &[(f64, f64)] {
        &self.path
    }

    /// Number of steps taken so far.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}
