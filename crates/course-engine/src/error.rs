//! Error types for course-engine operations.
//!
//! Scheduling conflicts are not errors; they come back as
//! [`ConflictResult`](crate::conflict::ConflictResult) values. These variants
//! cover inputs that cannot describe any schedule at all.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),

    #[error("Invalid speed: {0}")]
    InvalidSpeed(String),

    #[error("Invalid fare parameters: {0}")]
    InvalidFare(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
