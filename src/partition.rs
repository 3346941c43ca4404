//! Linguistic partitions: a universe split into five labelled fuzzy terms.
//!
//! [`LinguisticPartition::auto`] shapes the terms the way automatic
//! membership generation usually does: peaks evenly spaced from one end of the
//! universe to the other, each interior term a symmetric triangle reaching
//! its neighbours' peaks, and the two extremes open-ended shoulders. Any
//! reading inside the universe then belongs to at most two adjacent terms with
//! degrees summing to 1.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::membership::Membership;

/// Number of terms in every partition.
pub const TERM_COUNT: usize = 5;

/// Labels for the distance inputs, from very near to very far.
pub const DISTANCE_LABELS: [&str; TERM_COUNT] = ["mp", "p", "m", "l", "ml"];

/// Labels for the steering output, from hard left to hard right.
pub const STEERING_LABELS: [&str; TERM_COUNT] = ["me", "e", "c", "d", "md"];

/// Error type for partition construction failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PartitionError {
    /// The universe bounds are not finite or not strictly increasing.
    #[error("partition `{name}` has an invalid universe [{min}, {max}]")]
    InvalidUniverse {
        /// Partition name.
        name: String,
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
}

/// One labelled region of a partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    /// Linguistic label.
    pub label: String,
    /// Membership shape.
    pub shape: Membership,
}

/// A named variable whose universe is covered by [`TERM_COUNT`] ordered terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinguisticPartition {
    name: String,
    min: f64,
    max: f64,
    terms: Vec<Term>,
}

impl LinguisticPartition {
    /// Build an evenly spaced partition over `[min, max]`.
    ///
    /// # Errors
    ///
    /// Returns [`PartitionError::InvalidUniverse`] unless `min < max` and both
    /// are finite.
    pub fn auto(
        name: impl Into<String>,
        min: f64,
        max: f64,
        labels: [&str; TERM_COUNT],
    ) -> Result<Self, PartitionError> {
        let name = name.into();
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(PartitionError::InvalidUniverse { name, min, max });
        }

        #[allow(clippy::cast_precision_loss)]
        let spacing = (max - min) / (TERM_COUNT - 1) as f64;
        let terms = labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                #[allow(clippy::cast_precision_loss)]
                let peak = min + spacing * i as f64;
                let shape = match i {
                    0 => Membership::LeftShoulder {
                        peak: min,
                        foot: min + spacing,
                    },
                    i if i == TERM_COUNT - 1 => Membership::RightShoulder {
                        foot: max - spacing,
                        peak: max,
                    },
                    _ => Membership::Triangle {
                        left: peak - spacing,
                        peak,
                        right: peak + spacing,
                    },
                };
                Term {
                    label: (*label).to_owned(),
                    shape,
                }
            })
            .collect();

        Ok(Self {
            name,
            min,
            max,
            terms,
        })
    }

    /// Variable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Universe bounds `(min, max)`.
    #[must_use]
    pub const fn universe(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    /// Terms in order.
    #[must_use]
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Index of the term with the given label.
    #[must_use]
    pub fn term_index(&self, label: &str) -> Option<usize> {
        self.terms.iter().position(|t| t.label == label)
    }

    /// Membership degree of `x` in every term.
    #[must_use]
    pub fn fuzzify(&self, x: f64) -> [f64; TERM_COUNT] {
        let mut degrees = [0.0; TERM_COUNT];
        for (degree, term) in degrees.iter_mut().zip(&self.terms) {
            *degree = term.shape.degree(x);
        }
        degrees
    }

    /// Centre of gravity of a single unclipped term, restricted to the universe.
    ///
    /// For interior terms this is the triangle apex; for the shoulders it is
    /// one third of the way from the universe edge to the foot.
    ///
    /// # Panics
    ///
    /// Panics if `term >= TERM_COUNT`.
    #[must_use]
    pub fn term_centroid(&self, term: usize) -> f64 {
        match self.terms[term].shape {
            Membership::Triangle { peak, .. } => peak,
            Membership::LeftShoulder { peak, foot } => peak + (foot - peak) / 3.0,
            Membership::RightShoulder { foot, peak } => peak - (peak - foot) / 3.0,
        }
    }
}
