//! # course-engine
//!
//! Scheduling-conflict engine for a single taxi.
//!
//! Decides whether a requested ride can be inserted into the taxi's existing
//! timeline, and if not, which later start time is the next one that fits.
//! Every function is a pure computation over the inputs it is handed: no
//! clock access, no I/O, no shared state.
//!
//! ## Modules
//!
//! - [`geo`] — Coordinates, haversine distance, inter-ride travel-time estimate
//! - [`ride`] — The ride ("course") model
//! - [`conflict`] — Pairwise gap check between two chronologically ordered rides
//! - [`planning`] — Check a candidate against a whole planning, next-slot search
//! - [`fare`] — Fare formula (pickup, per-km tariff, traffic time, supplements)
//! - [`calendar`] — Night, Sunday and public-holiday rate detection
//! - [`validation`] — Integrity checks over a planning set
//! - [`error`] — Error types

pub mod calendar;
pub mod conflict;
pub mod error;
pub mod fare;
pub mod geo;
pub mod planning;
pub mod ride;
pub mod validation;

pub use calendar::{is_night_or_holiday, parse_timezone, DEFAULT_TIMEZONE};
pub use conflict::{
    check_pairwise_conflict, ConflictCheckOptions, ConflictResult, GapDetails, InvalidInputReason,
    TravelSource,
};
pub use error::EngineError;
pub use fare::{estimate_fare, FareBreakdown, FareEstimate, FareParams, Tariff};
pub use geo::{estimate_travel_minutes, haversine_km, AverageSpeed, Coordinates};
pub use planning::{
    check_against_planning, find_next_available_slot, planning_window, rides_in_window,
    SlotSearch,
};
pub use ride::{Ride, RideStatus};
pub use validation::{validate_planning, ValidationError, ValidationErrorKind};
