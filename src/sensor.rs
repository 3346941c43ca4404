//! Stepped ray-cast distance sensors.
//!
//! Each ray is sampled at `step, 2·step, …` up to `horizon`. The first sample
//! that lands off the map or in an occupied cell reports its distance; a ray
//! that never hits anything reports `horizon`. There is no refinement between
//! samples, so readings are always multiples of `step`.

use serde::{Deserialize, Serialize};

use crate::track::TrackMap;
use crate::vehicle::Vehicle;

/// Number of rays in the array.
pub const RAY_COUNT: usize = 5;

/// Ray layout and sampling policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Ray directions relative to the vehicle heading, in degrees.
    pub angles_deg: [f64; RAY_COUNT],
    /// Distance between consecutive samples along a ray.
    pub step: u32,
    /// Maximum scan distance; also the "clear" reading.
    pub horizon: u32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            angles_deg: [-90.0, -45.0, 0.0, 45.0, 90.0],
            step: 5,
            horizon: 100,
        }
    }
}

impl SensorConfig {
    /// Whether sampling would make progress and stay within the horizon.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.step > 0 && self.horizon >= self.step && self.angles_deg.iter().all(|a| a.is_finite())
    }
}

/// One scan: a distance per ray, in ray order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SensorReading(pub [u32; RAY_COUNT]);

impl SensorReading {
    /// Diagonal-left ray (index 1).
    #[must_use]
    pub const fn left(&self) -> u32 {
        self.0[1]
    }

    /// Forward ray (index 2).
    #[must_use]
    pub const fn front(&self) -> u32 {
        self.0[2]
    }

    /// Diagonal-right ray (index 3).
    #[must_use]
    pub const fn right(&self) -> u32 {
        self.0[3]
    }

    /// The three readings fed to the controller.
    #[must_use]
    pub fn controller_inputs(&self) -> [f64; 3] {
        [
            f64::from(self.left()),
            f64::from(self.front()),
            f64::from(self.right()),
        ]
    }
}

/// A fixed fan of rays cast from the vehicle position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorArray {
    config: SensorConfig,
}

impl SensorArray {
    /// Build an array from its configuration.
    #[must_use]
    pub fn new(config: SensorConfig) -> Self {
        Self { config }
    }

    /// The configuration this array was built from.
    #[must_use]
    pub const fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// Scan all rays from the vehicle's current pose.
    #[must_use]
    pub fn scan(&self, vehicle: &Vehicle, track: &TrackMap) -> SensorReading {
        let pose = vehicle.pose();
        SensorReading(
            self.config
                .angles_deg
                .map(|offset| self.cast(pose.x, pose.y, pose.heading + offset.to_radians(), track)),
        )
    }

    fn cast(&self, x: f64, y: f64, direction: f64, track: &TrackMap) -> u32 {
        let (dy, dx) = direction.sin_cos();
        let SensorConfig { step, horizon, .. } = self.config;
        std::iter::successors(Some(step), |d| d.checked_add(step))
            .take_while(|&d| d <= horizon)
            .find(|&d| {
                let d = f64::from(d);
                track.occupied(x + d * dx, y + d * dy)
            })
            .unwrap_or(horizon)
    }
}
