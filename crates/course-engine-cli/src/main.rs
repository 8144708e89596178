use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use course_engine::geo::DEFAULT_AVERAGE_SPEED_KMH;
use course_engine::{
    check_against_planning, estimate_fare, estimate_travel_minutes, find_next_available_slot,
    is_night_or_holiday, parse_timezone, rides_in_window, validate_planning, AverageSpeed,
    ConflictCheckOptions, ConflictResult, Coordinates, FareParams, Ride, SlotSearch,
    DEFAULT_TIMEZONE,
};
use log::info;
use serde::Serialize;

#[derive(Parser)]
#[command(
    name = "course",
    about = "Check taxi ride conflicts, find free slots and estimate fares",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check a candidate ride against a planning; suggest a slot on conflict
    Check(PlanningArgs),
    /// Find the next start time at which a candidate ride fits
    NextSlot(PlanningArgs),
    /// Estimate the driving minutes between two points
    Travel {
        /// Start point as "lat,lng"
        #[arg(long, value_parser = parse_point)]
        from: Coordinates,
        /// End point as "lat,lng"
        #[arg(long, value_parser = parse_point)]
        to: Coordinates,
        /// Average road speed in km/h
        #[arg(long, default_value_t = DEFAULT_AVERAGE_SPEED_KMH)]
        speed: f64,
    },
    /// Estimate the fare of a ride
    Fare(FareArgs),
    /// Report integrity problems in a planning file
    Validate {
        /// JSON array of rides
        #[arg(long)]
        planning: PathBuf,
    },
}

#[derive(Args)]
struct PlanningArgs {
    /// JSON file with the requested ride
    #[arg(long)]
    candidate: PathBuf,
    /// JSON file with an array of already booked rides
    #[arg(long)]
    planning: PathBuf,
    /// JSON file with conflict-check options (flags below override it)
    #[arg(long)]
    options: Option<PathBuf>,
    /// Safety buffer in minutes
    #[arg(long)]
    buffer: Option<u32>,
    /// Average road speed in km/h
    #[arg(long)]
    speed: Option<f64>,
    /// Fixed inter-ride travel time in minutes, bypassing the estimate
    #[arg(long)]
    travel_minutes: Option<u32>,
}

#[derive(Args)]
struct FareArgs {
    #[arg(long)]
    distance_km: f64,
    #[arg(long)]
    duration_minutes: u32,
    /// Force the night/holiday tariff
    #[arg(long, conflicts_with = "at")]
    night: bool,
    /// Ride start (RFC 3339); picks the tariff from the local time
    #[arg(long)]
    at: Option<String>,
    /// IANA timezone used with --at
    #[arg(long, default_value = DEFAULT_TIMEZONE)]
    timezone: String,
    /// The taxi returns empty
    #[arg(long)]
    empty_return: bool,
    /// Number of bulky luggage items
    #[arg(long, default_value_t = 0)]
    bulky: u32,
    #[arg(long, default_value_t = 1)]
    passengers: u32,
}

#[derive(Serialize)]
struct CheckReport {
    result: ConflictResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    alternative: Option<SlotSearch>,
}

#[derive(Serialize)]
struct TravelReport {
    minutes: u32,
}

fn main() -> Result<ExitCode> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Check(args) => {
            let (candidate, planning, options) = args.load()?;
            let result = check_against_planning(&candidate, &planning, &options);
            info!("{}", result.message());

            let alternative = if result.has_conflict() {
                Some(find_next_available_slot(&candidate, &planning, &options)?)
            } else {
                None
            };
            print_json(&CheckReport {
                result,
                alternative,
            })?;
        }
        Command::NextSlot(args) => {
            let (candidate, planning, options) = args.load()?;
            let search = find_next_available_slot(&candidate, &planning, &options)?;
            print_json(&search)?;
        }
        Command::Travel { from, to, speed } => {
            let speed = AverageSpeed::new(speed)?;
            let minutes = estimate_travel_minutes(from, to, speed);
            print_json(&TravelReport { minutes })?;
        }
        Command::Fare(args) => {
            let params = args.into_params()?;
            let estimate = estimate_fare(&params)?;
            print_json(&estimate)?;
        }
        Command::Validate { planning } => {
            let rides: Vec<Ride> = read_json(&planning)?;
            if let Err(errors) = validate_planning(&rides) {
                for error in &errors {
                    eprintln!("{}", error.message);
                }
                print_json(&errors)?;
                return Ok(ExitCode::FAILURE);
            }
            println!("ok: {} ride(s)", rides.len());
        }
    }

    Ok(ExitCode::SUCCESS)
}

impl PlanningArgs {
    fn load(&self) -> Result<(Ride, Vec<Ride>, ConflictCheckOptions)> {
        let candidate: Ride = read_json(&self.candidate)?;
        let planning: Vec<Ride> = read_json(&self.planning)?;
        // Same pre-filter as the booking flow: active rides within a day.
        let planning = match candidate.start() {
            Ok(at) => rides_in_window(at, &planning),
            Err(_) => planning,
        };

        let mut options = match &self.options {
            Some(path) => read_json(path)?,
            None => ConflictCheckOptions::default(),
        };
        if let Some(buffer) = self.buffer {
            options.safety_buffer_minutes = buffer;
        }
        if let Some(speed) = self.speed {
            options.average_speed_kmh = AverageSpeed::new(speed)?;
        }
        if self.travel_minutes.is_some() {
            options.inter_ride_travel_minutes_override = self.travel_minutes;
        }

        Ok((candidate, planning, options))
    }
}

impl FareArgs {
    fn into_params(self) -> Result<FareParams> {
        let night_or_holiday = match &self.at {
            Some(at) => {
                let at: DateTime<Utc> = DateTime::parse_from_rfc3339(at)
                    .with_context(|| format!("invalid --at datetime '{at}'"))?
                    .with_timezone(&Utc);
                is_night_or_holiday(at, parse_timezone(&self.timezone)?)
            }
            None => self.night,
        };

        Ok(FareParams {
            distance_km: self.distance_km,
            duration_minutes: self.duration_minutes,
            night_or_holiday,
            empty_return: self.empty_return,
            bulky_luggage: self.bulky,
            passengers: self.passengers,
        })
    }
}

fn parse_point(s: &str) -> Result<Coordinates> {
    let Some((lat, lng)) = s.split_once(',') else {
        bail!("expected \"lat,lng\", got '{s}'");
    };
    let point = Coordinates::new(
        lat.trim().parse().context("invalid latitude")?,
        lng.trim().parse().context("invalid longitude")?,
    );
    if !point.is_valid() {
        bail!("coordinates out of range: '{s}'");
    }
    Ok(point)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
