use thiserror::Error;

use crate::common::{Point, MAX_PARENTS};

/// Failures that abort a search. A missing path is not an error: searches
/// report it as `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("state {position} at time {time} already has {max} parents", max = MAX_PARENTS)]
    ParentOverflow { position: Point, time: usize },

    #[error("search gave up after expanding {0} states")]
    ExpansionLimit(usize),

    #[error("{position} is outside the {width}x{height} grid")]
    OutOfBounds {
        position: Point,
        width: usize,
        height: usize,
    },

    #[error("grid of {width}x{height} needs {expected} cells, got {actual}")]
    GridShape {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error("invalid constraint row {row:?}: {reason}")]
    InvalidConstraint { row: Vec<i64>, reason: &'static str },
}
