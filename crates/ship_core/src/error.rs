//! Error types for spaceship generation.

use thiserror::Error;

/// Result type for every fallible generation and mesh operation.
pub type ShipResult<T> = Result<T, ShipError>;

/// Errors that abort a generation run.
///
/// All of them are fatal to the current run: the pipeline never hands out a
/// partially built mesh, the host re-runs with another seed instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShipError {
    /// Random range with `min > max`, non-finite bounds, or an empty/zero-weight choice.
    #[error("invalid range: [{min}, {max}]")]
    InvalidRange {
        /// Lower bound that was requested.
        min: f64,
        /// Upper bound that was requested.
        max: f64,
    },

    /// Extrude or scale attempted on a face without area.
    #[error("face {index} (generation {generation}) is degenerate: area {area}")]
    DegenerateFace {
        /// Arena slot of the face.
        index: u32,
        /// Generation of the handle.
        generation: u32,
        /// Measured area.
        area: f32,
    },

    /// Operation on a face handle whose face has been deleted.
    #[error("stale face handle {index} (generation {generation})")]
    StaleHandle {
        /// Arena slot of the face.
        index: u32,
        /// Generation of the handle.
        generation: u32,
    },

    /// A configuration value lies outside its supported range.
    #[error("configuration value `{field}` = {value} is outside [{min}, {max}]")]
    ConfigurationOutOfBounds {
        /// Name of the offending field.
        field: &'static str,
        /// Value that was supplied.
        value: f64,
        /// Smallest accepted value.
        min: f64,
        /// Largest accepted value.
        max: f64,
    },

    /// The operation needs a different polygon arity (grid splits need quads).
    #[error("operation needs a quad, face has {sides} sides")]
    UnsupportedPolygon {
        /// Number of vertices in the face loop.
        sides: usize,
    },

    /// The mesh violates a topology invariant.
    #[error("invalid topology: {details}")]
    InvalidTopology {
        /// Description of the violation.
        details: String,
    },
}

impl ShipError {
    /// Shorthand for [`ShipError::InvalidRange`] from `f32` bounds.
    pub fn range(min: f32, max: f32) -> Self {
        Self::InvalidRange {
            min: min as f64,
            max: max as f64,
        }
    }

    /// Shorthand for [`ShipError::ConfigurationOutOfBounds`].
    pub fn out_of_bounds(field: &'static str, value: f64, min: f64, max: f64) -> Self {
        Self::ConfigurationOutOfBounds {
            field,
            value,
            min,
            max,
        }
    }

    /// Shorthand for [`ShipError::InvalidTopology`].
    pub fn topology(details: impl Into<String>) -> Self {
        Self::InvalidTopology {
            details: details.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_value() {
        let err = ShipError::out_of_bounds("num_hull_segments", 99.0, 0.0, 32.0);
        assert_eq!(
            err.to_string(),
            "configuration value `num_hull_segments` = 99 is outside [0, 32]"
        );

        let err = ShipError::StaleHandle {
            index: 4,
            generation: 2,
        };
        assert!(err.to_string().contains("stale face handle 4"));
    }
}
