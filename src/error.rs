//! Error types for graph construction.

use crate::coordinate::Coordinate;

/// Generic error type for [Coordinate] construction and composition.
///
/// [Coordinate]: crate::coordinate::Coordinate
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CoordinateError {
    /// Construction was given the same dimension name twice.
    #[error("duplicate dimension {0} in coordinate construction")]
    DuplicateDimension(String),
    /// Merging two coordinates that both declare the same dimension.
    #[error("cannot merge coordinates: overlapping dimension {0}")]
    OverlappingDimension(String),
}

/// Generic error type for graph construction (expansion and dependency
/// resolution).
///
/// Every variant carries the offending name and/or coordinate so the
/// caller can report back to whatever declared the template.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A reference names a task/data item absent from the IR.
    #[error("unknown name: {0}")]
    UnknownName(String),
    /// Expansion tried to insert two items with an equal `(name,
    /// coordinate)` pair.
    #[error("duplicate coordinate for {name}: {coordinate:?}")]
    DuplicateCoordinate {
        /// Name of the Array the duplicate was inserted into.
        name: String,
        /// The coordinate that collided.
        coordinate: Coordinate,
    },
    /// An Array received an item whose coordinate's dimension set differs
    /// from the Array's established dimensions.
    #[error("dimension mismatch for {name}: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        /// Name of the Array.
        name: String,
        /// The Array's established dimension set.
        expected: Vec<String>,
        /// The offending coordinate's dimension set.
        actual: Vec<String>,
    },
    /// An input reference resolved to zero items with no valid excuse.
    #[error("unresolved input {port:?} on task {task}{coordinate:?} referencing {target}")]
    UnresolvedInput {
        /// The task the unresolved reference belongs to.
        task: String,
        /// The task's coordinate.
        coordinate: Coordinate,
        /// The name the reference targeted.
        target: String,
        /// The declared port, if any.
        port: Option<String>,
    },
    /// Two distinct Task items declared the same output Data coordinate.
    #[error("multiple writers for data {name}{coordinate:?}: {first} and {second}")]
    MultipleWriters {
        /// Name of the contested Data item.
        name: String,
        /// Its coordinate.
        coordinate: Coordinate,
        /// The first task observed writing it.
        first: String,
        /// The second task observed writing it.
        second: String,
    },
    /// The graph has a non-temporal dependency cycle.
    #[error("cyclic dependency involving task {0}")]
    Cyclic(String),
    /// A malformed ISO 8601 duration literal reached the core.
    #[error("malformed duration literal: {0}")]
    BadDuration(String),
    /// A malformed ISO 8601 date literal reached the core.
    #[error("malformed date literal: {0}")]
    BadDate(String),
    /// Bubble-up conversion from coordinate construction/merge failures.
    #[error(transparent)]
    Coordinate(#[from] CoordinateError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
