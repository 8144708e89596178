//! The ride ("course") placed on a taxi's timeline.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::geo::Coordinates;

/// Duration assumed when a stored ride has none.
pub const DEFAULT_DURATION_MINUTES: u32 = 30;

/// Distance assumed when a stored ride has none, in km.
pub const DEFAULT_DISTANCE_KM: f64 = 10.0;

/// Booking state of a ride. Only pending and confirmed rides occupy the taxi.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RideStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
    Rejected,
}

impl RideStatus {
    /// Whether a ride in this state blocks the timeline.
    pub fn is_active(self) -> bool {
        matches!(self, RideStatus::Pending | RideStatus::Confirmed)
    }
}

/// One scheduled taxi trip.
///
/// `start_time` is kept as the RFC 3339 string the caller supplied: an
/// unparseable value is a reportable input problem, not something the type
/// should refuse to carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ride {
    /// Opaque identifier, unique within a planning set.
    pub id: String,
    /// Pickup address. Only used in messages.
    pub origin: String,
    /// Drop-off address. Only used in messages.
    pub destination: String,
    /// When the ride begins (RFC 3339, e.g. `"2026-01-14T10:00:00Z"`).
    pub start_time: String,
    /// Estimated duration of the ride itself.
    #[serde(default = "default_duration_minutes")]
    pub duration_minutes: u32,
    /// Estimated driving distance. Carried for display only.
    #[serde(default = "default_distance_km")]
    pub distance_km: f64,
    #[serde(default)]
    pub status: RideStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_coords: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_coords: Option<Coordinates>,
}

impl Ride {
    /// Parse [`Ride::start_time`] into a UTC instant.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidDatetime`] if the string is not RFC 3339.
    pub fn start(&self) -> Result<DateTime<Utc>, EngineError> {
        parse_rfc3339(&self.start_time)
    }

    /// End of the ride given an already parsed start.
    pub fn end_from(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        start + Duration::minutes(i64::from(self.duration_minutes))
    }

    /// Copy of this ride moved to a different start instant.
    pub fn rescheduled(&self, start: DateTime<Utc>) -> Self {
        Self {
            start_time: start.to_rfc3339(),
            ..self.clone()
        }
    }

    /// `"origin → destination"`, for messages.
    pub fn route_label(&self) -> String {
        format!("{} → {}", self.origin, self.destination)
    }
}

fn default_duration_minutes() -> u32 {
    DEFAULT_DURATION_MINUTES
}

fn default_distance_km() -> f64 {
    DEFAULT_DISTANCE_KM
}

/// Parse an RFC 3339 datetime string into `DateTime<Utc>`.
pub(crate) fn parse_rfc3339(s: &str) -> Result<DateTime<Utc>, EngineError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| EngineError::InvalidDatetime(format!("'{}': {}", s, e)))
}
