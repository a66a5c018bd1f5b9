//! Electrical load feed: CSV ingestion, half-hourly base profiles, and a
//! seeded synthetic profile.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Deserialize;

use crate::config::LoadConfig;
use crate::error::{DataError, SimError};

use super::{Sample, parse_timestamp, required};

/// Average electrical load over one sample period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadSample {
    pub timestamp: NaiveDateTime,
    /// Load served by the battery (W).
    pub load_w: f64,
}

impl Sample for LoadSample {
    fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    fn lerp(&self, next: &Self, frac: f64, at: NaiveDateTime) -> Self {
        Self {
            timestamp: at,
            load_w: self.load_w + (next.load_w - self.load_w) * frac,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LoadRow {
    timestamp: String,
    load_w: Option<f64>,
}

/// Reads `timestamp,load_w` rows from a CSV file.
///
/// # Errors
///
/// Returns an I/O or CSV error if the file cannot be parsed, or a
/// `DataError` for a missing, non-finite, or unparseable cell.
pub fn read_load_csv(path: &Path) -> Result<Vec<LoadSample>, SimError> {
    read_load(File::open(path)?)
}

/// Reads load rows from any CSV reader.
///
/// # Errors
///
/// Same as [`read_load_csv`].
pub fn read_load(reader: impl Read) -> Result<Vec<LoadSample>, SimError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut out = Vec::new();
    for (row, result) in rdr.deserialize::<LoadRow>().enumerate() {
        let r = result?;
        out.push(LoadSample {
            timestamp: parse_timestamp(&r.timestamp, row)?,
            load_w: required(r.load_w, "load_w", row)?,
        });
    }
    Ok(out)
}

/// Typical-year hourly consumption shape, keyed by calendar day.
///
/// Built from half-hourly smart-meter exports; the year of each row is
/// discarded so the shape repeats across years. 29 February is dropped.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BaseProfile {
    days: HashMap<(u32, u32), [f64; 24]>,
}

impl BaseProfile {
    /// Energy for the hour starting at `at` (kWh), if the day is covered.
    pub fn hour_kwh(&self, at: NaiveDateTime) -> Option<f64> {
        self.days
            .get(&(at.month(), at.day()))
            .map(|hours| hours[at.hour() as usize])
    }

    /// Mean daily energy over the covered days (kWh).
    pub fn mean_daily_kwh(&self) -> f64 {
        if self.days.is_empty() {
            return 0.0;
        }
        let total: f64 = self.days.values().flat_map(|h| h.iter()).sum();
        total / self.days.len() as f64
    }

    pub fn days(&self) -> usize {
        self.days.len()
    }
}

const HALF_HOURS: usize = 48;

/// Reads a half-hourly smart-meter export from a CSV file.
///
/// # Errors
///
/// Same as [`read_base_profile`].
pub fn read_base_profile_csv(path: &Path) -> Result<BaseProfile, SimError> {
    read_base_profile(File::open(path)?)
}

/// Reads a wide half-hourly export: a `Date` column followed by 48 kWh
/// readings per row. Pairs of readings are summed into hourly energy.
///
/// # Errors
///
/// Returns a CSV error for malformed input, or a `DataError` for a row with
/// the wrong width, an unparseable date, or a missing or negative reading.
pub fn read_base_profile(reader: impl Read) -> Result<BaseProfile, SimError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut profile = BaseProfile::default();
    for (row, result) in rdr.records().enumerate() {
        let rec = result?;
        if rec.len() != HALF_HOURS + 1 {
            return Err(DataError::new(
                row,
                format!("expected a date and {HALF_HOURS} readings, found {} fields", rec.len()),
            )
            .into());
        }
        let raw_date = rec.get(0).unwrap_or_default();
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
            .map_err(|_| DataError::new(row, format!("unparseable date \"{raw_date}\"")))?;
        if date.month() == 2 && date.day() == 29 {
            continue;
        }

        let mut hours = [0.0; 24];
        for (i, cell) in rec.iter().skip(1).enumerate() {
            let kwh: f64 = cell
                .parse()
                .ok()
                .filter(|v: &f64| v.is_finite() && *v >= 0.0)
                .ok_or_else(|| {
                    DataError::new(row, format!("half-hour {i} reading \"{cell}\" is invalid"))
                })?;
            hours[i / 2] += kwh;
        }
        profile.days.insert((date.month(), date.day()), hours);
    }
    Ok(profile)
}

/// Zero-mean Gaussian sample via the Box–Muller transform.
fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}

/// Generates `hours` hourly load samples starting at `start`.
///
/// Without a base profile the daily energy is spread evenly over the day.
/// With one, each hour follows the profile, rescaled so its mean day uses
/// `daily_kwh`; days the profile does not cover fall back to the even
/// spread. Each hour is then scaled by `1 + d_day + d_hour`, both drawn from
/// zero-mean Gaussians, clamped at zero. The same seed always yields the
/// same profile.
pub fn synthetic_load(
    cfg: &LoadConfig,
    base: Option<&BaseProfile>,
    start: NaiveDateTime,
    hours: usize,
    seed: u64,
) -> Vec<LoadSample> {
    let mut rng = StdRng::seed_from_u64(seed);
    let flat_w = cfg.daily_kwh * 1000.0 / 24.0;
    let scale = base
        .map(BaseProfile::mean_daily_kwh)
        .filter(|mean| *mean > 0.0)
        .map_or(0.0, |mean| cfg.daily_kwh / mean);
    let mut day_factor = 0.0;
    (0..hours)
        .map(|h| {
            let timestamp = start + Duration::hours(h as i64);
            if h % 24 == 0 {
                day_factor = gaussian_noise(&mut rng, cfg.daily_variability);
            }
            let hour_factor = gaussian_noise(&mut rng, cfg.hourly_variability);
            let mean_w = base
                .filter(|_| scale > 0.0)
                .and_then(|b| b.hour_kwh(timestamp))
                .map_or(flat_w, |kwh| kwh * scale * 1000.0);
            LoadSample {
                timestamp,
                load_w: mean_w * (1.0 + day_factor + hour_factor).max(0.0),
            }
        })
        .collect()
}
