//! Membership functions for linguistic terms.
//!
//! Auto-shaped partitions only need three shapes: symmetric triangles for the
//! interior terms and open-ended shoulders for the two extremes. A shoulder is
//! fully satisfied beyond its peak, so readings clamped to the universe edge
//! still belong to the extreme term.

use serde::{Deserialize, Serialize};

/// Shape of a single fuzzy term over a one-dimensional universe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Membership {
    /// Triangle rising from `left` to a peak of 1 at `peak`, falling to `right`.
    Triangle {
        /// Left foot (membership 0).
        left: f64,
        /// Apex (membership 1).
        peak: f64,
        /// Right foot (membership 0).
        right: f64,
    },
    /// 1 for everything at or below `peak`, falling to 0 at `foot`.
    LeftShoulder {
        /// Last point of full membership.
        peak: f64,
        /// First point of zero membership.
        foot: f64,
    },
    /// 0 at or below `foot`, rising to 1 at `peak` and staying there.
    RightShoulder {
        /// Last point of zero membership.
        foot: f64,
        /// First point of full membership.
        peak: f64,
    },
}

impl Membership {
    /// Membership degree of `x`, in `[0, 1]`.
    ///
    /// NaN inputs yield 0.
    #[inline]
    #[must_use]
    pub fn degree(self, x: f64) -> f64 {
        if x.is_nan() {
            return 0.0;
        }

        match self {
            Self::Triangle { left, peak, right } => {
                if x <= left || x >= right {
                    if x == peak {
                        1.0
                    } else {
                        0.0
                    }
                } else if x <= peak {
                    (x - left) / (peak - left)
                } else {
                    (right - x) / (right - peak)
                }
            }
            Self::LeftShoulder { peak, foot } => {
                if x <= peak {
                    1.0
                } else if x >= foot {
                    0.0
                } else {
                    (foot - x) / (foot - peak)
                }
            }
            Self::RightShoulder { foot, peak } => {
                if x >= peak {
                    1.0
                } else if x <= foot {
                    0.0
                } else {
                    (x - foot) / (peak - foot)
                }
            }
        }
    }

    /// The point of full membership closest to the centre of the support.
    #[must_use]
    pub const fn peak(self) -> f64 {
        match self {
            Self::Triangle { peak, .. }
            | Self::LeftShoulder { peak, .. }
            | Self::RightShoulder { peak, .. } => peak,
        }
    }

    /// Clip this shape at `height` (Mamdani implication).
    #[inline]
    #[must_use]
    pub fn clipped(self, x: f64, height: f64) -> f64 {
        self.degree(x).min(height)
    }
}
