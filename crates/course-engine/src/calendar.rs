//! Night, Sunday and public-holiday detection for the fare tariff.
//!
//! The night tariff applies from 19:00 to 07:00 local time, all day on
//! Sundays, and all day on French public holidays. Local time matters: a
//! ride at 18:30 UTC is already a night ride in Paris.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc, Weekday};
use chrono_tz::Tz;

use crate::error::EngineError;

/// Timezone the tariff hours are defined in when the caller has no other.
pub const DEFAULT_TIMEZONE: &str = "Europe/Paris";

/// First hour (local) of the night tariff.
pub const NIGHT_STARTS_AT: u32 = 19;
/// First hour (local) of the day tariff.
pub const DAY_STARTS_AT: u32 = 7;

/// Parse an IANA timezone string into `Tz`.
///
/// # Errors
///
/// Returns [`EngineError::InvalidTimezone`] for unknown names.
pub fn parse_timezone(s: &str) -> Result<Tz, EngineError> {
    s.parse::<Tz>()
        .map_err(|_| EngineError::InvalidTimezone(format!("'{}'", s)))
}

/// Whether a ride starting at `at` is billed at the night/holiday tariff.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use chrono_tz::Europe::Paris;
/// use course_engine::calendar::is_night_or_holiday;
///
/// // Wednesday 14 January 2026, 18:30 UTC = 19:30 in Paris
/// let at = Utc.with_ymd_and_hms(2026, 1, 14, 18, 30, 0).unwrap();
/// assert!(is_night_or_holiday(at, Paris));
/// ```
pub fn is_night_or_holiday(at: DateTime<Utc>, tz: Tz) -> bool {
    let local = at.with_timezone(&tz);
    let hour = local.hour();

    hour >= NIGHT_STARTS_AT
        || hour < DAY_STARTS_AT
        || local.weekday() == Weekday::Sun
        || is_public_holiday(local.date_naive())
}

/// French public holidays: eight fixed dates plus three tied to Easter.
pub fn is_public_holiday(date: NaiveDate) -> bool {
    const FIXED: [(u32, u32); 8] = [
        (1, 1),   // New Year
        (5, 1),   // Labour Day
        (5, 8),   // Victory in Europe
        (7, 14),  // Bastille Day
        (8, 15),  // Assumption
        (11, 1),  // All Saints
        (11, 11), // Armistice
        (12, 25), // Christmas
    ];

    if FIXED.contains(&(date.month(), date.day())) {
        return true;
    }

    let Some(easter) = easter_sunday(date.year()) else {
        return false;
    };
    [1, 39, 50]
        .iter()
        .any(|&offset| easter + Duration::days(offset) == date)
}

/// Gregorian Easter Sunday (anonymous Gregorian algorithm).
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year.rem_euclid(19);
    let b = year.div_euclid(100);
    let c = year.rem_euclid(100);
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15).rem_euclid(30);
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k).rem_euclid(7);
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;

    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}
