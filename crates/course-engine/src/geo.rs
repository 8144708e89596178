//! Geographic helpers and the inter-ride travel-time estimate.
//!
//! The estimate is deliberately crude: great-circle distance on a spherical
//! Earth, stretched by a road-curvature factor and divided by an assumed
//! average speed. It is only used as the mandatory gap between two rides when
//! no better figure is available, so it rounds up and never goes below
//! [`MIN_TRAVEL_MINUTES`].

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Mean Earth radius used by the haversine formula, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Ratio of real driving distance to straight-line distance.
///
/// Tuned for a dense, hilly city centre with winding streets. Lower it for
/// grid-like road networks.
pub const ROAD_CORRECTION_FACTOR: f64 = 1.4;

/// Floor applied to every travel estimate. A taxi never teleports.
pub const MIN_TRAVEL_MINUTES: u32 = 5;

/// Average road speed assumed when none is configured, in km/h.
pub const DEFAULT_AVERAGE_SPEED_KMH: f64 = 25.0;

// ── Coordinates ─────────────────────────────────────────────────────────────

/// A geographic point in decimal degrees.
///
/// Accepts `lat`/`lng` and `lat`/`lon` spellings when deserialized, since
/// geocoders disagree on the name of the longitude field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lng", alias = "lon")]
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components are finite and inside their valid ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

// ── AverageSpeed ────────────────────────────────────────────────────────────

/// A finite, strictly positive road speed in km/h.
///
/// Validated on construction (including deserialization) so that the travel
/// estimate can never divide by zero or produce NaN.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct AverageSpeed(f64);

impl AverageSpeed {
    /// Build a speed from km/h.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidSpeed`] if `kmh` is zero, negative, or not finite.
    pub fn new(kmh: f64) -> Result<Self, EngineError> {
        if kmh.is_finite() && kmh > 0.0 {
            Ok(Self(kmh))
        } else {
            Err(EngineError::InvalidSpeed(format!(
                "average speed must be a positive number of km/h, got {kmh}"
            )))
        }
    }

    pub fn kmh(self) -> f64 {
        self.0
    }
}

impl Default for AverageSpeed {
    fn default() -> Self {
        Self(DEFAULT_AVERAGE_SPEED_KMH)
    }
}

impl TryFrom<f64> for AverageSpeed {
    type Error = EngineError;

    fn try_from(kmh: f64) -> Result<Self, Self::Error> {
        Self::new(kmh)
    }
}

impl From<AverageSpeed> for f64 {
    fn from(speed: AverageSpeed) -> Self {
        speed.0
    }
}

// ── Distance and travel time ────────────────────────────────────────────────

/// Great-circle distance between two points, in kilometres.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    // Fixed evaluation order keeps the result bit-for-bit symmetric.
    let (a, b) = if (a.latitude, a.longitude) <= (b.latitude, b.longitude) {
        (a, b)
    } else {
        (b, a)
    };

    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);
    // Rounding can push `h` just past 1 for near-antipodal points.
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Estimate the minutes a taxi needs to drive from `from` to `to`.
///
/// Straight-line distance × [`ROAD_CORRECTION_FACTOR`], converted to minutes
/// at `speed`, rounded up to the next whole minute and floored at
/// [`MIN_TRAVEL_MINUTES`]. Symmetric in its two points.
///
/// # Examples
///
/// ```
/// use course_engine::geo::{estimate_travel_minutes, AverageSpeed, Coordinates};
///
/// let here = Coordinates::new(43.2951, 5.3744);
/// assert_eq!(estimate_travel_minutes(here, here, AverageSpeed::default()), 5);
/// ```
pub fn estimate_travel_minutes(from: Coordinates, to: Coordinates, speed: AverageSpeed) -> u32 {
    let road_km = haversine_km(from, to) * ROAD_CORRECTION_FACTOR;
    let minutes = (road_km / speed.kmh() * 60.0).ceil();

    // `as` saturates for out-of-range floats.
    (minutes as u32).max(MIN_TRAVEL_MINUTES)
}
