//! Runtime validation errors
//!
//! Every operation that returns one of these leaves the component untouched.

use thiserror::Error;

/// Rejected input to a damage component
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DamageError {
    #[error("Quadrant index out of range: {0}")]
    InvalidQuadrant(usize),
    #[error("Shield distribution must sum to 1.0 (got {0})")]
    InvalidDistribution(f64),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(&'static str),
    #[error("Unknown armor zone: {0}")]
    UnknownZone(String),
    #[error("Malformed save data: {0}")]
    MalformedSave(String),
    #[error("Invalid damage constants: {0}")]
    InvalidConfig(String),
}
