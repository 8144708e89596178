//! Regulated taxi fare estimate.
//!
//! ```text
//! total = pickup + km × tariff + (minutes / 60) × 15% × hourly rate + supplements
//! ```
//!
//! raised to the minimum fare and rounded to the cent. The tariff letter
//! depends on whether the ride is at night (or on a Sunday / public holiday,
//! see [`crate::calendar`]) and whether the taxi returns empty.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

pub const PICKUP_CHARGE: f64 = 2.35;
pub const HOURLY_RATE: f64 = 34.60;
pub const MINIMUM_FARE: f64 = 8.00;

/// Share of the ride time billed at the hourly rate (red lights, congestion).
pub const TRAFFIC_TIME_SHARE: f64 = 0.15;

/// Per bulky item. Regular luggage is included.
pub const BULKY_LUGGAGE_SUPPLEMENT: f64 = 2.00;

/// Per passenger beyond [`INCLUDED_PASSENGERS`].
pub const EXTRA_PASSENGER_SUPPLEMENT: f64 = 4.00;
pub const INCLUDED_PASSENGERS: u32 = 4;

/// Per-kilometre tariff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tariff {
    /// Day, loaded return.
    A,
    /// Night or holiday, loaded return.
    B,
    /// Day, empty return.
    C,
    /// Night or holiday, empty return.
    D,
}

impl Tariff {
    pub fn select(night_or_holiday: bool, empty_return: bool) -> Self {
        match (night_or_holiday, empty_return) {
            (false, false) => Tariff::A,
            (true, false) => Tariff::B,
            (false, true) => Tariff::C,
            (true, true) => Tariff::D,
        }
    }

    pub fn per_km(self) -> f64 {
        match self {
            Tariff::A => 1.11,
            Tariff::B => 1.44,
            Tariff::C => 2.22,
            Tariff::D => 2.88,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tariff::A => "A (day, loaded return)",
            Tariff::B => "B (night, loaded return)",
            Tariff::C => "C (day, empty return)",
            Tariff::D => "D (night, empty return)",
        }
    }
}

/// Inputs to [`estimate_fare`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FareParams {
    pub distance_km: f64,
    pub duration_minutes: u32,
    #[serde(default)]
    pub night_or_holiday: bool,
    #[serde(default)]
    pub empty_return: bool,
    #[serde(default)]
    pub bulky_luggage: u32,
    #[serde(default = "default_passengers")]
    pub passengers: u32,
}

fn default_passengers() -> u32 {
    1
}

/// Cost components, each rounded to the cent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FareBreakdown {
    pub pickup: f64,
    pub distance: f64,
    pub traffic: f64,
    pub supplements: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FareEstimate {
    pub tariff: Tariff,
    pub tariff_label: String,
    pub breakdown: FareBreakdown,
    /// Never below [`MINIMUM_FARE`].
    pub total: f64,
}

/// Estimate the fare for a ride.
///
/// # Errors
///
/// Returns [`EngineError::InvalidFare`] if `distance_km` is negative or not finite.
///
/// # Examples
///
/// ```
/// use course_engine::fare::{estimate_fare, FareParams, Tariff};
///
/// let estimate = estimate_fare(&FareParams {
///     distance_km: 10.0,
///     duration_minutes: 20,
///     night_or_holiday: false,
///     empty_return: false,
///     bulky_luggage: 0,
///     passengers: 1,
/// })?;
/// assert_eq!(estimate.tariff, Tariff::A);
/// assert_eq!(estimate.total, 15.18);
/// # Ok::<(), course_engine::EngineError>(())
/// ```
pub fn estimate_fare(params: &FareParams) -> Result<FareEstimate, EngineError> {
    if !params.distance_km.is_finite() || params.distance_km < 0.0 {
        return Err(EngineError::InvalidFare(format!(
            "distance must be a non-negative number of km, got {}",
            params.distance_km
        )));
    }

    let tariff = Tariff::select(params.night_or_holiday, params.empty_return);

    let distance = params.distance_km * tariff.per_km();
    let billed_hours = f64::from(params.duration_minutes) / 60.0 * TRAFFIC_TIME_SHARE;
    let traffic = billed_hours * HOURLY_RATE;

    let extra_passengers = params.passengers.saturating_sub(INCLUDED_PASSENGERS);
    let supplements = f64::from(params.bulky_luggage) * BULKY_LUGGAGE_SUPPLEMENT
        + f64::from(extra_passengers) * EXTRA_PASSENGER_SUPPLEMENT;

    let total = (PICKUP_CHARGE + distance + traffic + supplements).max(MINIMUM_FARE);

    Ok(FareEstimate {
        tariff,
        tariff_label: tariff.label().to_string(),
        breakdown: FareBreakdown {
            pickup: PICKUP_CHARGE,
            distance: round_cents(distance),
            traffic: round_cents(traffic),
            supplements: round_cents(supplements),
        },
        total: round_cents(total),
    })
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
