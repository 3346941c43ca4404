//! Fixed occupancy grid the vehicle drives on.
//!
//! A [`TrackMap`] is a square boolean grid with an occupied outer ring and any
//! number of rectangular interior [`Obstacle`]s. It is built once from a
//! [`TrackConfig`] and never mutated afterwards, so a single map can be shared
//! by reference across concurrent simulations.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Side length of the reference map.
pub const REFERENCE_MAP_SIZE: usize = 100;

/// An axis-aligned block of occupied cells, half-open on both axes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Occupied columns.
    pub x: Range<usize>,
    /// Occupied rows.
    pub y: Range<usize>,
}

impl Obstacle {
    /// Create an obstacle covering `x × y`.
    #[must_use]
    pub const fn new(x: Range<usize>, y: Range<usize>) -> Self {
        Self { x, y }
    }
}

/// Configuration for building a [`TrackMap`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackConfig {
    /// Side length of the square grid.
    pub size: usize,
    /// Interior blocks, in addition to the boundary walls.
    pub obstacles: Vec<Obstacle>,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self::reference()
    }
}

impl TrackConfig {
    /// The 100×100 map with a single `[30,70)×[30,70)` interior block.
    #[must_use]
    pub fn reference() -> Self {
        Self {
            size: REFERENCE_MAP_SIZE,
            obstacles: vec![Obstacle::new(30..70, 30..70)],
        }
    }

    /// A map of the given size with boundary walls only.
    #[must_use]
    pub fn open(size: usize) -> Self {
        Self {
            size,
            obstacles: Vec::new(),
        }
    }
}

/// Error type for track construction failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackError {
    /// A grid needs at least one free cell inside the walls.
    #[error("track size {0} leaves no free cells inside the boundary walls")]
    TooSmall(usize),
    /// An obstacle reaches past the grid edge.
    #[error("obstacle {index} extends beyond a {size}x{size} grid")]
    ObstacleOutOfBounds {
        /// Position of the obstacle in the config.
        index: usize,
        /// Grid side length.
        size: usize,
    },
    /// Stored cells do not cover a `size` by `size` grid.
    #[error("{actual} cells cannot form a {size}x{size} grid")]
    CellCountMismatch {
        /// Grid side length.
        size: usize,
        /// Cells found.
        actual: usize,
    },
}

/// Immutable occupancy grid, indexed `[x][y]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TrackMapData")]
pub struct TrackMap {
    size: usize,
    cells: Vec<bool>,
}

/// Unchecked serialized form of a [`TrackMap`].
#[derive(Deserialize)]
struct TrackMapData {
    size: usize,
    cells: Vec<bool>,
}

impl TryFrom<TrackMapData> for TrackMap {
    type Error = TrackError;

    fn try_from(data: TrackMapData) -> Result<Self, Self::Error> {
        if data.size < 3 {
            return Err(TrackError::TooSmall(data.size));
        }
        if data.size.checked_mul(data.size) != Some(data.cells.len()) {
            return Err(TrackError::CellCountMismatch {
                size: data.size,
                actual: data.cells.len(),
            });
        }
        Ok(Self {
            size: data.size,
            cells: data.cells,
        })
    }
}

impl Default for TrackMap {
    fn default() -> Self {
        Self::reference()
    }
}

impl TrackMap {
    /// Build the reference map.
    #[must_use]
    pub fn reference() -> Self {
        Self::build(&TrackConfig::reference())
    }

    /// Build a map from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError`] if the grid is too small to hold a free cell or
    /// an obstacle does not fit inside it.
    pub fn try_new(config: &TrackConfig) -> Result<Self, TrackError> {
        if config.size < 3 {
            return Err(TrackError::TooSmall(config.size));
        }
        for (index, obstacle) in config.obstacles.iter().enumerate() {
            if obstacle.x.end > config.size || obstacle.y.end > config.size {
                return Err(TrackError::ObstacleOutOfBounds {
                    index,
                    size: config.size,
                });
            }
        }

        Ok(Self::build(config))
    }

    fn build(config: &TrackConfig) -> Self {
        let mut map = Self::walled(config.size);
        for obstacle in &config.obstacles {
            map.fill(obstacle);
        }
        map
    }

    fn walled(size: usize) -> Self {
        let mut cells = vec![false; size * size];
        for i in 0..size {
            cells[i] = true; // x = 0
            cells[(size - 1) * size + i] = true; // x = size - 1
            cells[i * size] = true; // y = 0
            cells[i * size + size - 1] = true; // y = size - 1
        }
        Self { size, cells }
    }

    fn fill(&mut self, obstacle: &Obstacle) {
        for x in obstacle.x.clone() {
            for y in obstacle.y.clone() {
                self.cells[x * self.size + y] = true;
            }
        }
    }

    /// Side length of the grid.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Whether `(x, y)` is off the grid or inside an occupied cell.
    ///
    /// Coordinates are floored to the containing cell, so `-0.5` is off the
    /// grid rather than in column 0.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn occupied(&self, x: f64, y: f64) -> bool {
        let size = self.size as f64;
        if !(0.0..size).contains(&x) || !(0.0..size).contains(&y) {
            return true;
        }
        let (cx, cy) = (x.floor() as usize, y.floor() as usize);
        self.cells[cx * self.size + cy]
    }

    /// Occupancy of a single integer cell. Cells off the grid count as occupied.
    #[must_use]
    pub fn cell(&self, x: usize, y: usize) -> bool {
        if x >= self.size || y >= self.size {
            return true;
        }
        self.cells[x * self.size + y]
    }

    /// Grid columns for rendering: `occupancy()[x][y]`.
    #[must_use]
    pub fn occupancy(&self) -> Vec<Vec<bool>> {
        self.cells
            .chunks(self.size)
            .map(<[bool]>::to_vec)
            .collect()
    }
}
