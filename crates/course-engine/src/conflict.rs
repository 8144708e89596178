//! Pairwise gap check between two rides on the same taxi.
//!
//! Ride A (earlier) and ride B (later) are compatible when
//!
//! ```text
//! end(A) + travel(A.destination → B.origin) + safety buffer <= start(B)
//! ```
//!
//! with the gap measured in whole minutes (floored). An exactly equal gap is
//! acceptable. Travel time comes from, in order of preference: the caller's
//! override, the geometric estimate when both endpoints have coordinates, and
//! finally a conservative fixed default.

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::geo::{estimate_travel_minutes, AverageSpeed};
use crate::ride::Ride;

/// Minutes reserved for traffic variance, payment and unloading by default.
pub const DEFAULT_SAFETY_BUFFER_MINUTES: u32 = 15;

/// Travel time assumed when coordinates are missing on either side.
pub const DEFAULT_TRAVEL_MINUTES: u32 = 20;

// ── Options ─────────────────────────────────────────────────────────────────

/// Tunables for conflict checks. Every field has a default and can be
/// overridden independently; missing JSON fields take their default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictCheckOptions {
    /// Extra minutes kept free after the inter-ride travel.
    pub safety_buffer_minutes: u32,
    /// When set, used as the inter-ride travel time instead of any estimate.
    pub inter_ride_travel_minutes_override: Option<u32>,
    /// Road speed used by the geometric travel estimate.
    pub average_speed_kmh: AverageSpeed,
}

impl Default for ConflictCheckOptions {
    fn default() -> Self {
        Self {
            safety_buffer_minutes: DEFAULT_SAFETY_BUFFER_MINUTES,
            inter_ride_travel_minutes_override: None,
            average_speed_kmh: AverageSpeed::default(),
        }
    }
}

// ── Result types ────────────────────────────────────────────────────────────

/// Where the travel time in a [`GapDetails`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelSource {
    /// Caller-supplied override.
    Override,
    /// Haversine estimate between A's destination and B's origin.
    Estimated,
    /// Coordinates were missing; [`DEFAULT_TRAVEL_MINUTES`] was used.
    Fallback,
    /// Both rides start at the same instant; no travel was computed.
    SameStart,
}

/// The arithmetic behind a conflict decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapDetails {
    /// Computed end of the earlier ride.
    pub first_end: DateTime<Utc>,
    /// Start of the later ride.
    pub second_start: DateTime<Utc>,
    pub travel_minutes: i64,
    pub travel_source: TravelSource,
    pub buffer_minutes: i64,
    /// `travel_minutes + buffer_minutes`.
    pub required_gap_minutes: i64,
    /// Whole minutes between `first_end` and `second_start`, floored. Negative
    /// when the rides overlap.
    pub actual_gap_minutes: i64,
    /// `required - actual`, present only when conflicting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortfall_minutes: Option<i64>,
}

impl GapDetails {
    /// Spare minutes beyond the required gap (negative when conflicting).
    pub fn margin_minutes(&self) -> i64 {
        self.actual_gap_minutes - self.required_gap_minutes
    }
}

/// Why a check could not be evaluated. Treated as a conflict by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvalidInputReason {
    /// A ride's start time is not RFC 3339.
    UnparseableStartTime { ride_id: String, value: String },
    /// The pairwise check was handed its rides in the wrong order.
    ChronologicalOrder {
        first_ride: String,
        second_ride: String,
    },
}

/// Outcome of a conflict check.
///
/// Both `Conflict` and `InvalidInput` count as "cannot schedule":
/// [`ConflictResult::has_conflict`] is true for either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConflictResult {
    NoConflict {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<GapDetails>,
    },
    Conflict {
        message: String,
        /// Id of the existing ride that blocked the candidate, when checked
        /// against a planning.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        blocking_ride: Option<String>,
        details: GapDetails,
    },
    InvalidInput {
        message: String,
        reason: InvalidInputReason,
    },
}

impl ConflictResult {
    pub fn has_conflict(&self) -> bool {
        !matches!(self, ConflictResult::NoConflict { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            ConflictResult::NoConflict { message, .. }
            | ConflictResult::Conflict { message, .. }
            | ConflictResult::InvalidInput { message, .. } => message,
        }
    }

    pub fn details(&self) -> Option<&GapDetails> {
        match self {
            ConflictResult::NoConflict { details, .. } => details.as_ref(),
            ConflictResult::Conflict { details, .. } => Some(details),
            ConflictResult::InvalidInput { .. } => None,
        }
    }

    pub fn shortfall_minutes(&self) -> Option<i64> {
        self.details().and_then(|d| d.shortfall_minutes)
    }

    pub fn blocking_ride(&self) -> Option<&str> {
        match self {
            ConflictResult::Conflict { blocking_ride, .. } => blocking_ride.as_deref(),
            _ => None,
        }
    }

    pub(crate) fn invalid_start(ride: &Ride) -> Self {
        ConflictResult::InvalidInput {
            message: format!(
                "invalid start time for ride {}: '{}'",
                ride.id, ride.start_time
            ),
            reason: InvalidInputReason::UnparseableStartTime {
                ride_id: ride.id.clone(),
                value: ride.start_time.clone(),
            },
        }
    }

    /// Attribute a conflict to an existing ride and prefix its message.
    pub(crate) fn blocked_by(self, existing: &Ride) -> Self {
        match self {
            ConflictResult::Conflict { message, details, .. } => ConflictResult::Conflict {
                message: format!(
                    "conflict with ride {} ({}): {}",
                    existing.id,
                    existing.route_label(),
                    message
                ),
                blocking_ride: Some(existing.id.clone()),
                details,
            },
            other => other,
        }
    }
}

// ── check_pairwise_conflict ─────────────────────────────────────────────────

/// Decide whether `second` can follow `first` on the same taxi.
///
/// `first` must not start after `second`. Equal starts are evaluated
/// normally here; the planning resolver is what forbids them outright.
///
/// Never fails: an unparseable start time or out-of-order pair comes back as
/// [`ConflictResult::InvalidInput`], which callers treat as a conflict.
///
/// # Examples
///
/// ```
/// use course_engine::{check_pairwise_conflict, ConflictCheckOptions, Ride, RideStatus};
///
/// let ride = |id: &str, start: &str| Ride {
///     id: id.to_string(),
///     origin: "A".to_string(),
///     destination: "B".to_string(),
///     start_time: start.to_string(),
///     duration_minutes: 20,
///     distance_km: 3.0,
///     status: RideStatus::Confirmed,
///     origin_coords: None,
///     destination_coords: None,
/// };
///
/// // No coordinates → 20 min travel + 15 min buffer = 35 min required.
/// let result = check_pairwise_conflict(
///     &ride("a", "2026-01-14T10:00:00Z"),
///     &ride("b", "2026-01-14T10:55:00Z"),
///     &ConflictCheckOptions::default(),
/// );
/// assert!(!result.has_conflict());
/// assert_eq!(result.details().unwrap().actual_gap_minutes, 35);
/// ```
pub fn check_pairwise_conflict(
    first: &Ride,
    second: &Ride,
    options: &ConflictCheckOptions,
) -> ConflictResult {
    let Ok(first_start) = first.start() else {
        return ConflictResult::invalid_start(first);
    };
    let Ok(second_start) = second.start() else {
        return ConflictResult::invalid_start(second);
    };

    if second_start < first_start {
        return ConflictResult::InvalidInput {
            message: format!(
                "ride {} starts before ride {}; pass rides in chronological order",
                second.id, first.id
            ),
            reason: InvalidInputReason::ChronologicalOrder {
                first_ride: first.id.clone(),
                second_ride: second.id.clone(),
            },
        };
    }

    evaluate_gap(first, first_start, second, second_start, options)
}

/// Gap arithmetic on already parsed, already ordered starts.
pub(crate) fn evaluate_gap(
    first: &Ride,
    first_start: DateTime<Utc>,
    second: &Ride,
    second_start: DateTime<Utc>,
    options: &ConflictCheckOptions,
) -> ConflictResult {
    let first_end = first.end_from(first_start);
    let (travel, travel_source) = inter_ride_travel(first, second, options);
    let buffer = i64::from(options.safety_buffer_minutes);

    let required = travel + buffer;
    let actual = (second_start - first_end)
        .num_milliseconds()
        .div_euclid(60_000);
    let has_conflict = actual < required;

    debug!(
        "gap {} → {}: actual={}min required={}min (travel={}min {:?}, buffer={}min) conflict={}",
        first.id, second.id, actual, required, travel, travel_source, buffer, has_conflict
    );

    let mut details = GapDetails {
        first_end,
        second_start,
        travel_minutes: travel,
        travel_source,
        buffer_minutes: buffer,
        required_gap_minutes: required,
        actual_gap_minutes: actual,
        shortfall_minutes: None,
    };

    if has_conflict {
        let shortfall = required - actual;
        details.shortfall_minutes = Some(shortfall);
        ConflictResult::Conflict {
            message: format!(
                "conflict: {shortfall} minute(s) short. Available: {actual} min, \
                 required: {required} min (travel: {travel} min + buffer: {buffer} min)"
            ),
            blocking_ride: None,
            details,
        }
    } else {
        let margin = actual - required;
        ConflictResult::NoConflict {
            message: format!(
                "no conflict: {margin} minute(s) of margin. Available: {actual} min, \
                 required: {required} min"
            ),
            details: Some(details),
        }
    }
}

fn inter_ride_travel(
    first: &Ride,
    second: &Ride,
    options: &ConflictCheckOptions,
) -> (i64, TravelSource) {
    if let Some(minutes) = options.inter_ride_travel_minutes_override {
        return (i64::from(minutes), TravelSource::Override);
    }
    match (first.destination_coords, second.origin_coords) {
        (Some(from), Some(to)) => (
            i64::from(estimate_travel_minutes(from, to, options.average_speed_kmh)),
            TravelSource::Estimated,
        ),
        _ => (i64::from(DEFAULT_TRAVEL_MINUTES), TravelSource::Fallback),
    }
}
