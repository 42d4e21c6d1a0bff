//! Construction-time errors.
//!
//! Everything that can go wrong with a scene is caught while it is being built:
//! malformed graphs, empty particle fields and out-of-range tuning parameters.
//! Once a scene is running, degenerate conditions (ray misses, full pools,
//! isolated nodes, non-finite positions) are recovered locally and never
//! surface as errors.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConstructionError {
    #[error("graph has no nodes")]
    EmptyGraph,

    #[error("edge {edge} references node {node}, but the graph only has {node_count} nodes")]
    DanglingEdge {
        edge: usize,
        node: u32,
        node_count: usize,
    },

    #[error("edge {edge} has zero length (both endpoints share a position)")]
    ZeroLengthEdge { edge: usize },

    #[error("graph has no edges; agents and pulses need at least one")]
    NoEdges,

    #[error("particle field `{name}` has no particles")]
    EmptyField { name: &'static str },

    #[error("particle field `{name}`: column `{column}` has {actual} entries, expected {expected}")]
    ColumnLength {
        name: &'static str,
        column: &'static str,
        actual: usize,
        expected: usize,
    },

    #[error("particle field `{name}` uses wrap boundaries but is anchored to rest positions")]
    WrapNeedsDrift { name: &'static str },

    #[error("no edge starts in node group {group}")]
    NoEdgesInGroup { group: u32 },

    #[error("parameter `{name}` = {value} is out of range (expected {expected})")]
    InvalidParameter {
        name: &'static str,
        value: f32,
        expected: &'static str,
    },

    #[error("unknown scene `{0}`")]
    UnknownScene(String),
}

/// Checks that `value` lies in the open interval (lo, hi).
pub(crate) fn check_open(
    name: &'static str,
    value: f32,
    lo: f32,
    hi: f32,
    expected: &'static str,
) -> Result<(), ConstructionError> {
    if value.is_finite() && value > lo && value < hi {
        Ok(())
    } else {
        Err(ConstructionError::InvalidParameter {
            name,
            value,
            expected,
        })
    }
}

/// Checks that `value` lies in the half-open interval (lo, hi].
pub(crate) fn check_upper_closed(
    name: &'static str,
    value: f32,
    lo: f32,
    hi: f32,
    expected: &'static str,
) -> Result<(), ConstructionError> {
    if value.is_finite() && value > lo && value <= hi {
        Ok(())
    } else {
        Err(ConstructionError::InvalidParameter {
            name,
            value,
            expected,
        })
    }
}

/// Checks that `value` is finite and non-negative.
pub(crate) fn check_non_negative(
    name: &'static str,
    value: f32,
) -> Result<(), ConstructionError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConstructionError::InvalidParameter {
            name,
            value,
            expected: ">= 0",
        })
    }
}

/// Checks that `value` is a probability in [0, 1].
pub(crate) fn check_probability(name: &'static str, value: f64) -> Result<(), ConstructionError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConstructionError::InvalidParameter {
            name,
            value: value as f32,
            expected: "[0, 1]",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offender() {
        let e = ConstructionError::DanglingEdge {
            edge: 3,
            node: 9,
            node_count: 4,
        };
        let msg = e.to_string();
        assert!(msg.contains("edge 3"));
        assert!(msg.contains("node 9"));
    }

    #[test]
    fn range_checks_reject_nan() {
        assert!(check_open("damping", f32::NAN, 0.0, 1.0, "(0, 1)").is_err());
        assert!(check_upper_closed("k", 1.0, 0.0, 1.0, "(0, 1]").is_ok());
        assert!(check_upper_closed("k", 0.0, 0.0, 1.0, "(0, 1]").is_err());
        assert!(check_non_negative("radius", -0.1).is_err());
        assert!(check_probability("chance", 1.0).is_ok());
        assert!(check_probability("chance", 1.5).is_err());
        assert!(check_probability("chance", f64::NAN).is_err());
    }
}
