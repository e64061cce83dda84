use serde::{Deserialize, Serialize};
use std::fmt;

/// The aggregate operations.
///
/// Declaration order carries the external ordinal contract used for
/// command-line configuration: MIN=0, MAX=1, SUM=2, AVG=3, COUNT=4.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggOp {
    Min,
    Max,
    Sum,
    Avg,
    Count,
}

impl AggOp {
    /// Look an operation up by its stable integer ordinal.
    ///
    /// # Arguments
    ///
    /// * `i` - Ordinal of the operation.
    pub fn from_ordinal(i: usize) -> Option<Self> {
        match i {
            0 => Some(AggOp::Min),
            1 => Some(AggOp::Max),
            2 => Some(AggOp::Sum),
            3 => Some(AggOp::Avg),
            4 => Some(AggOp::Count),
            _ => None,
        }
    }

    /// The stable integer ordinal of the operation.
    pub fn ordinal(&self) -> usize {
        match self {
            AggOp::Min => 0,
            AggOp::Max => 1,
            AggOp::Sum => 2,
            AggOp::Avg => 3,
            AggOp::Count => 4,
        }
    }
}

impl fmt::Display for AggOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op_str = match self {
            AggOp::Min => "min",
            AggOp::Max => "max",
            AggOp::Sum => "sum",
            AggOp::Avg => "avg",
            AggOp::Count => "count",
        };
        write!(f, "{}", op_str)
    }
}

/// The operations which can be used to compare two fields.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum PredicateOp {
    Equals,
    GreaterThan,
    LessThan,
    LessThanOrEq,
    GreaterThanOrEq,
    NotEq,
}

impl PredicateOp {
    /// Do predicate comparison.
    ///
    /// # Arguments
    ///
    /// * `left_field` - Left field of the predicate.
    /// * `right_field` - Right field of the predicate.
    pub fn compare<T: Ord>(&self, left_field: &T, right_field: &T) -> bool {
        match self {
            PredicateOp::Equals => left_field == right_field,
            PredicateOp::GreaterThan => left_field > right_field,
            PredicateOp::LessThan => left_field < right_field,
            PredicateOp::LessThanOrEq => left_field <= right_field,
            PredicateOp::GreaterThanOrEq => left_field >= right_field,
            PredicateOp::NotEq => left_field != right_field,
        }
    }

    /// Flip the operator.
    pub fn flip(&self) -> Self {
        match self {
            PredicateOp::GreaterThan => PredicateOp::LessThan,
            PredicateOp::LessThan => PredicateOp::GreaterThan,
            PredicateOp::LessThanOrEq => PredicateOp::GreaterThanOrEq,
            PredicateOp::GreaterThanOrEq => PredicateOp::LessThanOrEq,
            op => *op,
        }
    }
}
