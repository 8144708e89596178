//! Property tests for the scheduling invariants.

use chrono::{DateTime, Duration, TimeZone, Utc};
use course_engine::{
    check_against_planning, check_pairwise_conflict, estimate_travel_minutes,
    find_next_available_slot, AverageSpeed, ConflictCheckOptions, Coordinates, Ride, RideStatus,
    SlotSearch, TravelSource,
};
use proptest::prelude::*;

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 14, 0, 0, 0).unwrap()
}

fn ride_at(id: &str, offset_minutes: i64, duration_minutes: u32) -> Ride {
    Ride {
        id: id.to_string(),
        origin: format!("{id}-from"),
        destination: format!("{id}-to"),
        start_time: (base() + Duration::minutes(offset_minutes)).to_rfc3339(),
        duration_minutes,
        distance_km: 5.0,
        status: RideStatus::Confirmed,
        origin_coords: None,
        destination_coords: None,
    }
}

fn coordinates() -> impl Strategy<Value = Coordinates> {
    (-89.0f64..89.0, -179.0f64..179.0).prop_map(|(lat, lng)| Coordinates::new(lat, lng))
}

fn options() -> impl Strategy<Value = ConflictCheckOptions> {
    (0u32..60, prop::option::of(0u32..90), 5.0f64..80.0).prop_map(|(buffer, travel, speed)| {
        ConflictCheckOptions {
            safety_buffer_minutes: buffer,
            inter_ride_travel_minutes_override: travel,
            average_speed_kmh: AverageSpeed::new(speed).unwrap(),
        }
    })
}

/// Up to eight rides scattered over two days, with or without coordinates.
fn planning() -> impl Strategy<Value = Vec<Ride>> {
    prop::collection::vec(
        (0i64..2 * 24 * 60, 0u32..120, prop::option::of((coordinates(), coordinates()))),
        0..8,
    )
    .prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (offset, duration, coords))| {
                let mut ride = ride_at(&format!("p{i}"), offset, duration);
                if let Some((from, to)) = coords {
                    ride.origin_coords = Some(from);
                    ride.destination_coords = Some(to);
                }
                ride
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn pairwise_margin_and_shortfall_balance(
        travel in 0u32..90,
        buffer in 0u32..60,
        duration in 0u32..180,
        gap in -200i64..400,
    ) {
        prop_assume!(i64::from(duration) + gap >= 0);
        let first = ride_at("a", 600, duration);
        let second = ride_at("b", 600 + i64::from(duration) + gap, 30);
        let options = ConflictCheckOptions {
            safety_buffer_minutes: buffer,
            inter_ride_travel_minutes_override: Some(travel),
            ..ConflictCheckOptions::default()
        };

        let result = check_pairwise_conflict(&first, &second, &options);
        let details = result.details().expect("ordered, parseable rides have details");
        let required = i64::from(travel) + i64::from(buffer);

        prop_assert_eq!(details.actual_gap_minutes, gap);
        prop_assert_eq!(details.required_gap_minutes, required);
        if gap >= required {
            prop_assert!(!result.has_conflict());
            prop_assert_eq!(details.margin_minutes(), gap - required);
            prop_assert_eq!(details.shortfall_minutes, None);
        } else {
            prop_assert!(result.has_conflict());
            let shortfall = details.shortfall_minutes.expect("conflict has a shortfall");
            prop_assert!(shortfall > 0);
            prop_assert_eq!(shortfall + details.actual_gap_minutes, required);
        }
    }

    #[test]
    fn pairwise_balance_with_estimated_travel(
        from in coordinates(),
        to in coordinates(),
        speed in 5.0f64..80.0,
        buffer in 0u32..60,
        duration in 0u32..180,
        gap in -200i64..2_000,
    ) {
        prop_assume!(i64::from(duration) + gap >= 0);
        let mut first = ride_at("a", 600, duration);
        first.destination_coords = Some(from);
        let mut second = ride_at("b", 600 + i64::from(duration) + gap, 30);
        second.origin_coords = Some(to);
        let speed = AverageSpeed::new(speed).unwrap();
        let options = ConflictCheckOptions {
            safety_buffer_minutes: buffer,
            inter_ride_travel_minutes_override: None,
            average_speed_kmh: speed,
        };

        let result = check_pairwise_conflict(&first, &second, &options);
        let details = result.details().expect("ordered, parseable rides have details");
        let travel = i64::from(estimate_travel_minutes(from, to, speed));
        let required = travel + i64::from(buffer);

        prop_assert_eq!(details.travel_source, TravelSource::Estimated);
        prop_assert_eq!(details.travel_minutes, travel);
        prop_assert_eq!(details.actual_gap_minutes, gap);
        prop_assert_eq!(details.required_gap_minutes, required);
        if gap >= required {
            prop_assert!(!result.has_conflict());
            prop_assert_eq!(details.margin_minutes(), gap - required);
        } else {
            prop_assert!(result.has_conflict());
            let shortfall = details.shortfall_minutes.expect("conflict has a shortfall");
            prop_assert_eq!(shortfall + details.actual_gap_minutes, required);
        }
    }

    #[test]
    fn identical_start_always_conflicts(
        existing in planning(),
        pick in any::<prop::sample::Index>(),
        duration in 0u32..300,
        options in options(),
    ) {
        prop_assume!(!existing.is_empty());
        let target = &existing[pick.index(existing.len())];
        let candidate = Ride {
            id: "candidate".to_string(),
            start_time: target.start_time.clone(),
            duration_minutes: duration,
            ..ride_at("candidate", 0, 0)
        };

        let result = check_against_planning(&candidate, &existing, &options);
        prop_assert!(result.has_conflict());
    }

    #[test]
    fn identical_start_with_single_ride_has_one_minute_shortfall(
        offset in 0i64..10_000,
        existing_duration in 0u32..300,
        duration in 0u32..300,
        options in options(),
    ) {
        let existing = vec![ride_at("p0", offset, existing_duration)];
        let candidate = ride_at("candidate", offset, duration);

        let result = check_against_planning(&candidate, &existing, &options);
        prop_assert_eq!(result.blocking_ride(), Some("p0"));
        prop_assert_eq!(result.shortfall_minutes(), Some(1));
    }

    #[test]
    fn empty_planning_never_conflicts(
        offset in 0i64..10_000,
        duration in 0u32..600,
        options in options(),
    ) {
        let candidate = ride_at("candidate", offset, duration);
        prop_assert!(!check_against_planning(&candidate, &[], &options).has_conflict());
    }

    #[test]
    fn found_slot_rechecks_clean(
        existing in planning(),
        offset in 0i64..2 * 24 * 60,
        duration in 0u32..120,
        options in options(),
    ) {
        let candidate = ride_at("candidate", offset, duration);
        let requested = candidate.start().unwrap();

        let search = find_next_available_slot(&candidate, &existing, &options).unwrap();
        match search {
            SlotSearch::Found { slot, attempts } => {
                prop_assert!(slot > requested);
                prop_assert_eq!(slot - requested, Duration::minutes(5 * i64::from(attempts)));
                let moved = candidate.rescheduled(slot);
                prop_assert!(!check_against_planning(&moved, &existing, &options).has_conflict());
            }
            SlotSearch::Exhausted { fallback } => {
                prop_assert_eq!(fallback, requested + Duration::hours(24));
            }
        }
    }

    #[test]
    fn travel_estimate_is_symmetric(a in coordinates(), b in coordinates(), speed in 1.0f64..130.0) {
        let speed = AverageSpeed::new(speed).unwrap();
        prop_assert_eq!(
            estimate_travel_minutes(a, b, speed),
            estimate_travel_minutes(b, a, speed)
        );
    }

    #[test]
    fn travel_estimate_never_below_five(a in coordinates(), b in coordinates(), speed in 1.0f64..130.0) {
        let speed = AverageSpeed::new(speed).unwrap();
        prop_assert!(estimate_travel_minutes(a, b, speed) >= 5);
        prop_assert_eq!(estimate_travel_minutes(a, a, speed), 5);
    }
}
