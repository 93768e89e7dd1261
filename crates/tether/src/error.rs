//! Drag engine error types

use thiserror::Error;

use crate::registry::ElementId;

/// Errors raised by the drag engine
///
/// Only configuration mistakes are errors. Conditions that merely prevent an
/// animation from playing (missing frames, contended overlay, nothing to
/// animate) degrade silently and are reported as `bool`/`Option`.
#[derive(Error, Debug)]
pub enum DragError {
    /// An explicitly configured radius was zero or negative
    #[error("Invalid {name}: {value} (must be greater than zero)")]
    InvalidRadius { name: &'static str, value: f32 },

    /// A distance threshold was out of range
    #[error("Invalid {name}: {value}")]
    InvalidDistance { name: &'static str, value: f32 },

    /// Sort indices are non-negative
    #[error("Sort index cannot be negative: {0}")]
    NegativeSort(i32),

    /// A subordinate named a leader that is not registered in its scope
    #[error("Leader mark '{0}' does not resolve to a live element; register the leader first")]
    LeaderNotFound(String),

    /// An element named its own mark as its leader
    #[error("Element cannot be its own leader (mark '{0}')")]
    SelfLeadership(String),

    /// The element id is not (or no longer) registered
    #[error("Unknown element: {0:?}")]
    UnknownElement(ElementId),

    /// Malformed configuration file
    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    /// Failed to read a configuration file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for drag engine operations
pub type Result<T> = std::result::Result<T, DragError>;
