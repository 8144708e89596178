//! Check a candidate ride against a taxi's whole planning, and search forward
//! for the next start time that fits.
//!
//! The candidate is compared with **every** existing ride, not only its
//! immediate neighbours: a long ride further away in the timeline can still
//! overlap. At tens of rides per day the full scan is cheap.
//!
//! All functions work on a snapshot. Two bookings racing for the same window
//! must be serialized by the caller's data store; nothing here can see rides
//! written after the snapshot was taken.

use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::conflict::{
    evaluate_gap, ConflictCheckOptions, ConflictResult, GapDetails, TravelSource,
};
use crate::error::EngineError;
use crate::ride::Ride;

/// Distance between two proposals in the slot search.
pub const SLOT_STEP_MINUTES: i64 = 5;

/// Number of proposals tried before giving up (24 hours of 5-minute steps).
pub const MAX_SLOT_ATTEMPTS: u32 = 288;

/// Half-width of the window of existing rides worth checking a candidate against.
pub const PLANNING_WINDOW_HOURS: i64 = 24;

/// How many slot attempts are logged individually.
const LOGGED_ATTEMPTS: u32 = 10;

// ── check_against_planning ──────────────────────────────────────────────────

/// Check `candidate` against every ride in `existing` (in any order).
///
/// Existing rides are sorted by start (stably, so rides sharing a start keep
/// their input order) and checked one by one; the first blocking ride wins.
/// A candidate starting at exactly the same instant as an existing ride is
/// always rejected with a 1-minute shortfall, whatever the durations.
///
/// Fails closed: an unparseable start time on the candidate or on any existing
/// ride yields [`ConflictResult::InvalidInput`].
pub fn check_against_planning(
    candidate: &Ride,
    existing: &[Ride],
    options: &ConflictCheckOptions,
) -> ConflictResult {
    if existing.is_empty() {
        return ConflictResult::NoConflict {
            message: "no existing rides, no conflict possible".to_string(),
            details: None,
        };
    }

    let Ok(candidate_start) = candidate.start() else {
        return ConflictResult::invalid_start(candidate);
    };
    let timeline = match Timeline::build(existing) {
        Ok(timeline) => timeline,
        Err(result) => return result,
    };

    timeline.check(candidate, candidate_start, options)
}

/// Existing rides with parsed starts, sorted chronologically.
struct Timeline<'a> {
    rides: Vec<(DateTime<Utc>, &'a Ride)>,
}

impl<'a> Timeline<'a> {
    fn build(existing: &'a [Ride]) -> Result<Self, ConflictResult> {
        let mut rides = existing
            .iter()
            .map(|ride| {
                ride.start()
                    .map(|start| (start, ride))
                    .map_err(|_| ConflictResult::invalid_start(ride))
            })
            .collect::<Result<Vec<_>, _>>()?;
        // `sort_by_key` is stable.
        rides.sort_by_key(|(start, _)| *start);
        Ok(Self { rides })
    }

    fn check(
        &self,
        candidate: &Ride,
        candidate_start: DateTime<Utc>,
        options: &ConflictCheckOptions,
    ) -> ConflictResult {
        if self.rides.is_empty() {
            return ConflictResult::NoConflict {
                message: "no existing rides, no conflict possible".to_string(),
                details: None,
            };
        }

        for &(existing_start, existing) in &self.rides {
            if existing_start == candidate_start {
                return same_start_conflict(existing, existing_start, candidate_start);
            }

            let result = if existing_start < candidate_start {
                evaluate_gap(existing, existing_start, candidate, candidate_start, options)
            } else {
                evaluate_gap(candidate, candidate_start, existing, existing_start, options)
            };

            if result.has_conflict() {
                return result.blocked_by(existing);
            }
        }

        ConflictResult::NoConflict {
            message: "no conflict with existing rides".to_string(),
            details: None,
        }
    }
}

fn same_start_conflict(
    existing: &Ride,
    existing_start: DateTime<Utc>,
    candidate_start: DateTime<Utc>,
) -> ConflictResult {
    ConflictResult::Conflict {
        message: format!(
            "conflict: same start time as ride {} ({}); two rides cannot start at the same moment",
            existing.id,
            existing.route_label()
        ),
        blocking_ride: Some(existing.id.clone()),
        details: GapDetails {
            first_end: existing_start,
            second_start: candidate_start,
            travel_minutes: 0,
            travel_source: TravelSource::SameStart,
            buffer_minutes: 0,
            required_gap_minutes: 1,
            actual_gap_minutes: 0,
            shortfall_minutes: Some(1),
        },
    }
}

// ── find_next_available_slot ────────────────────────────────────────────────

/// Result of the alternative-slot search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SlotSearch {
    /// A proposal that passed [`check_against_planning`].
    Found {
        slot: DateTime<Utc>,
        /// 1-based index of the successful proposal.
        attempts: u32,
    },
    /// Every proposal in the 24-hour search range conflicted. `fallback` is
    /// the requested start + 24 hours and has **not** been checked.
    Exhausted { fallback: DateTime<Utc> },
}

impl SlotSearch {
    /// The proposed instant, verified or not.
    pub fn slot(&self) -> DateTime<Utc> {
        match self {
            SlotSearch::Found { slot, .. } => *slot,
            SlotSearch::Exhausted { fallback } => *fallback,
        }
    }

    /// Whether [`SlotSearch::slot`] was checked conflict-free.
    pub fn is_verified(&self) -> bool {
        matches!(self, SlotSearch::Found { .. })
    }
}

/// Search for the first start time after `conflicting`'s requested start
/// that passes [`check_against_planning`] against `existing`.
///
/// Proposals start 5 minutes after the requested start (the requested
/// instant itself is never retried) and advance in 5-minute steps, up to
/// [`MAX_SLOT_ATTEMPTS`] proposals. All other ride fields are kept.
///
/// # Errors
///
/// Returns [`EngineError::InvalidDatetime`] if `conflicting` has an unparseable
/// start, since there is no instant to search from.
///
/// # Examples
///
/// ```
/// use course_engine::{find_next_available_slot, ConflictCheckOptions, Ride, RideStatus};
///
/// let ride = |id: &str, start: &str| Ride {
///     id: id.to_string(),
///     origin: "A".to_string(),
///     destination: "B".to_string(),
///     start_time: start.to_string(),
///     duration_minutes: 30,
///     distance_km: 5.0,
///     status: RideStatus::Confirmed,
///     origin_coords: None,
///     destination_coords: None,
/// };
/// let planning = vec![ride("p1", "2026-01-14T10:00:00Z")];
/// let wanted = ride("new", "2026-01-14T10:00:00Z");
///
/// let search = find_next_available_slot(&wanted, &planning, &ConflictCheckOptions::default())?;
/// // 10:30 end + 20 min default travel + 15 min buffer
/// assert_eq!(search.slot().to_rfc3339(), "2026-01-14T11:05:00+00:00");
/// assert!(search.is_verified());
/// # Ok::<(), course_engine::EngineError>(())
/// ```
pub fn find_next_available_slot(
    conflicting: &Ride,
    existing: &[Ride],
    options: &ConflictCheckOptions,
) -> Result<SlotSearch, EngineError> {
    let requested = conflicting.start()?;
    let step = Duration::minutes(SLOT_STEP_MINUTES);
    let mut proposed = requested + step;

    debug!(
        "searching alternative slot for ride {} requested at {}, starting at {}",
        conflicting.id,
        requested.to_rfc3339(),
        proposed.to_rfc3339()
    );

    // Unparseable existing rides make every proposal conflict; checking once
    // gives the same answer as 288 times.
    let Ok(timeline) = Timeline::build(existing) else {
        return Ok(exhausted(conflicting, requested));
    };

    for attempt in 1..=MAX_SLOT_ATTEMPTS {
        let result = timeline.check(conflicting, proposed, options);

        if attempt <= LOGGED_ATTEMPTS {
            debug!(
                "  attempt {}: {} → {}",
                attempt,
                proposed.to_rfc3339(),
                if result.has_conflict() { "conflict" } else { "ok" }
            );
        }

        if !result.has_conflict() {
            info!(
                "slot found for ride {} after {} attempt(s): {}",
                conflicting.id,
                attempt,
                proposed.to_rfc3339()
            );
            return Ok(SlotSearch::Found {
                slot: proposed,
                attempts: attempt,
            });
        }

        proposed += step;
    }

    Ok(exhausted(conflicting, requested))
}

fn exhausted(conflicting: &Ride, requested: DateTime<Utc>) -> SlotSearch {
    let fallback = requested + Duration::hours(PLANNING_WINDOW_HOURS);
    warn!(
        "no slot found within 24h for ride {}; falling back to unverified {}",
        conflicting.id,
        fallback.to_rfc3339()
    );
    SlotSearch::Exhausted { fallback }
}

// ── Planning window ─────────────────────────────────────────────────────────

/// The `[at - 24h, at + 24h]` window of existing rides relevant to a
/// candidate starting at `at`.
pub fn planning_window(at: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let half = Duration::hours(PLANNING_WINDOW_HOURS);
    (at - half, at + half)
}

/// Active rides whose start falls inside [`planning_window`] of `at`
/// (inclusive).
///
/// Cancelled and rejected rides never occupy the taxi and are dropped. Active
/// rides with an unparseable start are kept so that a later
/// [`check_against_planning`] still fails closed on them.
pub fn rides_in_window(at: DateTime<Utc>, rides: &[Ride]) -> Vec<Ride> {
    let (from, to) = planning_window(at);
    rides
        .iter()
        .filter(|ride| ride.status.is_active())
        .filter(|ride| match ride.start() {
            Ok(start) => from <= start && start <= to,
            Err(_) => true,
        })
        .cloned()
        .collect()
}
