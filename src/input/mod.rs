//! Input time series: weather and load feeds aligned onto the simulation grid.
//!
//! Everything in here runs before the first step. A series that reaches the
//! solver is complete, finite, and evenly spaced at the run interval.

pub mod load;
pub mod weather;

use chrono::{Duration, NaiveDateTime};
use tracing::debug;

use crate::config::ScenarioConfig;
use crate::error::{ConfigError, DataError, SimError};
use crate::sim::clock::{Clock, Interval};

pub use load::{BaseProfile, LoadSample};
pub use weather::WeatherSample;

/// One aligned input sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesRecord {
    pub timestamp: NaiveDateTime,
    /// Ambient air temperature (°C).
    pub ambient_c: f64,
    /// Horizontal irradiance (W/m²).
    pub irradiance_w_m2: f64,
    /// Electrical load served by the battery (W).
    pub load_w: f64,
    /// Relative humidity (%), passed through to the results untouched.
    pub relative_humidity_pct: Option<f64>,
}

/// A validated, evenly spaced input series.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    interval: Interval,
    records: Vec<TimeSeriesRecord>,
}

impl TimeSeries {
    /// Validates `records` against `interval`.
    ///
    /// # Errors
    ///
    /// - `ConfigError` when the first spacing differs from `interval`.
    /// - `DataError` for an empty series, a non-finite value, or any later
    ///   gap, duplicate, or reversal.
    pub fn new(records: Vec<TimeSeriesRecord>, interval: Interval) -> Result<Self, SimError> {
        if records.is_empty() {
            return Err(DataError::new(0, "time series is empty").into());
        }
        for (row, r) in records.iter().enumerate() {
            for (name, value) in [
                ("ambient_temp_c", r.ambient_c),
                ("irradiance_w_m2", r.irradiance_w_m2),
                ("load_w", r.load_w),
            ] {
                if !value.is_finite() {
                    return Err(DataError::new(row, format!("{name} is {value}")).into());
                }
            }
            if let Some(rh) = r.relative_humidity_pct {
                if !(rh.is_finite() && (0.0..=100.0).contains(&rh)) {
                    return Err(DataError::new(
                        row,
                        format!("relative_humidity_pct must be within 0–100, got {rh}"),
                    )
                    .into());
                }
            }
        }

        let step = interval.duration();
        if let [first, second, ..] = records.as_slice() {
            let spacing = second.timestamp - first.timestamp;
            if spacing != step {
                return Err(ConfigError::new(
                    "simulation.interval",
                    format!(
                        "input spacing is {}s but the configured interval is {interval}",
                        spacing.num_seconds()
                    ),
                )
                .into());
            }
        }
        for (i, pair) in records.windows(2).enumerate().skip(1) {
            let spacing = pair[1].timestamp - pair[0].timestamp;
            if spacing != step {
                return Err(DataError::new(
                    i + 1,
                    format!(
                        "expected {} after {}, found {}",
                        pair[0].timestamp + step,
                        pair[0].timestamp,
                        pair[1].timestamp
                    ),
                )
                .into());
            }
        }

        Ok(Self { interval, records })
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn records(&self) -> &[TimeSeriesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeSeriesRecord> {
        self.records.iter()
    }

    /// Hottest ambient temperature in the series (°C).
    pub fn max_ambient_c(&self) -> f64 {
        self.records
            .iter()
            .map(|r| r.ambient_c)
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

/// A timestamped sample that can be interpolated in time.
pub trait Sample: Copy {
    fn timestamp(&self) -> NaiveDateTime;

    /// Linear blend toward `next` by `frac`, stamped `at`.
    fn lerp(&self, next: &Self, frac: f64, at: NaiveDateTime) -> Self;
}

/// Resamples an hourly series onto a finer interval.
///
/// Each hour is linearly interpolated toward the next; the final hour is held
/// flat. Series already at `interval`, or with a single sample, are returned
/// unchanged and left for [`TimeSeries::new`] to judge.
///
/// # Errors
///
/// Returns a `DataError` when an hourly series is not contiguous.
pub fn resample<T: Sample>(samples: &[T], interval: Interval) -> Result<Vec<T>, DataError> {
    let hourly = match samples {
        [a, b, ..] => b.timestamp() - a.timestamp() == Duration::hours(1),
        _ => false,
    };
    if !hourly || interval == Interval::Hour {
        return Ok(samples.to_vec());
    }

    let per_hour = interval.steps_per_hour();
    let step = interval.duration();
    let mut out = Vec::with_capacity(samples.len() * per_hour);
    for (i, cur) in samples.iter().enumerate() {
        let next = match samples.get(i + 1) {
            Some(next) => {
                if next.timestamp() - cur.timestamp() != Duration::hours(1) {
                    return Err(DataError::new(
                        i + 1,
                        format!("hourly samples must be contiguous after {}", cur.timestamp()),
                    ));
                }
                next
            }
            None => cur,
        };
        for k in 0..per_hour {
            let at = cur.timestamp() + step * k as i32;
            out.push(cur.lerp(next, k as f64 / per_hour as f64, at));
        }
    }
    Ok(out)
}

/// Joins weather and load samples on timestamp.
///
/// # Errors
///
/// Returns a `DataError` naming the first weather row without a matching
/// load sample, plus anything [`TimeSeries::new`] rejects.
pub fn align(
    weather: &[WeatherSample],
    load: &[LoadSample],
    interval: Interval,
) -> Result<TimeSeries, SimError> {
    let mut j = 0usize;
    let mut records = Vec::with_capacity(weather.len());
    for (row, w) in weather.iter().enumerate() {
        while j < load.len() && load[j].timestamp < w.timestamp {
            j += 1;
        }
        match load.get(j) {
            Some(l) if l.timestamp == w.timestamp => records.push(TimeSeriesRecord {
                timestamp: w.timestamp,
                ambient_c: w.ambient_c,
                irradiance_w_m2: w.irradiance_w_m2,
                load_w: l.load_w,
                relative_humidity_pct: w.relative_humidity_pct,
            }),
            _ => {
                return Err(
                    DataError::new(row, format!("no load sample at {}", w.timestamp)).into(),
                );
            }
        }
    }
    TimeSeries::new(records, interval)
}

/// Builds the input series a scenario asks for: CSV feeds where configured,
/// synthetic profiles otherwise.
///
/// # Errors
///
/// Returns any I/O, CSV, or data error from the feeds, or a `ConfigError`
/// when their spacing does not match the configured interval.
pub fn load_series(cfg: &ScenarioConfig) -> Result<TimeSeries, SimError> {
    let interval = cfg.simulation.interval;
    let clock = Clock::for_days(cfg.simulation.start, interval, cfg.simulation.days);

    let weather = match &cfg.weather.csv_path {
        Some(path) => resample(&weather::read_weather_csv(path)?, interval)?,
        None => weather::synthetic_weather(&cfg.weather, clock),
    };

    let load = match &cfg.load.csv_path {
        Some(path) => resample(&load::read_load_csv(path)?, interval)?,
        None => {
            let first = weather
                .first()
                .map_or(cfg.simulation.start, |w| w.timestamp);
            let hours = weather.len().div_ceil(interval.steps_per_hour()).max(1);
            let base = match &cfg.load.base_profile_path {
                Some(path) => Some(load::read_base_profile_csv(path)?),
                None => None,
            };
            let hourly = load::synthetic_load(
                &cfg.load,
                base.as_ref(),
                first,
                hours,
                cfg.simulation.seed,
            );
            resample(&hourly, interval)?
        }
    };

    debug!(
        weather = weather.len(),
        load = load.len(),
        interval = %interval,
        "input feeds prepared"
    );
    align(&weather, &load, interval)
}

/// Parses a CSV timestamp in ISO 8601 (`T` or space separated).
pub(crate) fn parse_timestamp(raw: &str, row: usize) -> Result<NaiveDateTime, DataError> {
    let raw = raw.trim();
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| DataError::new(row, format!("unparseable timestamp \"{raw}\"")))
}

/// Unwraps a CSV cell that must be present and finite.
pub(crate) fn required(value: Option<f64>, name: &str, row: usize) -> Result<f64, DataError> {
    match value {
        Some(v) if v.is_finite() => Ok(v),
        Some(v) => Err(DataError::new(row, format!("{name} is {v}"))),
        None => Err(DataError::new(row, format!("{name} is missing"))),
    }
}
