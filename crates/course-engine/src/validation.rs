//! Integrity checks for a planning set before it is handed to the resolver.
//!
//! The resolver already fails closed on bad start times; this module reports
//! every problem at once so a caller (or an admin screen) can fix the data.
//! Detects:
//! - Duplicate ride IDs
//! - Unparseable start times
//! - Negative or non-finite distances
//! - Coordinates outside the valid latitude/longitude ranges

use std::collections::HashSet;

use serde::Serialize;

use crate::ride::Ride;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    /// Two rides share the same ID.
    DuplicateId,
    /// A start time is not RFC 3339.
    InvalidStartTime,
    /// Distance is negative, NaN or infinite.
    InvalidDistance,
    /// A latitude or longitude is out of range or not finite.
    InvalidCoordinates,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a set of rides.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues, in
/// input order.
pub fn validate_planning(rides: &[Ride]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut ids = HashSet::new();

    for ride in rides {
        if !ids.insert(ride.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate ride ID: {}", ride.id),
            ));
        }

        if let Err(e) = ride.start() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidStartTime,
                format!("Ride '{}': {}", ride.id, e),
            ));
        }

        if !ride.distance_km.is_finite() || ride.distance_km < 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDistance,
                format!("Ride '{}' has invalid distance {}", ride.id, ride.distance_km),
            ));
        }

        for (label, coords) in [
            ("origin", ride.origin_coords),
            ("destination", ride.destination_coords),
        ] {
            if let Some(c) = coords.filter(|c| !c.is_valid()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidCoordinates,
                    format!(
                        "Ride '{}' has invalid {} coordinates ({}, {})",
                        ride.id, label, c.latitude, c.longitude
                    ),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
