//! Weather feed: CSV ingestion and a synthetic diurnal profile.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDateTime, Timelike};
use serde::Deserialize;

use crate::config::WeatherConfig;
use crate::error::{DataError, SimError};
use crate::sim::clock::Clock;

use super::{Sample, parse_timestamp, required};

/// One weather observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherSample {
    pub timestamp: NaiveDateTime,
    /// Ambient air temperature (°C).
    pub ambient_c: f64,
    /// Horizontal irradiance (W/m²).
    pub irradiance_w_m2: f64,
    /// Relative humidity (%), when the feed carries it.
    pub relative_humidity_pct: Option<f64>,
}

impl Sample for WeatherSample {
    fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    fn lerp(&self, next: &Self, frac: f64, at: NaiveDateTime) -> Self {
        Self {
            timestamp: at,
            ambient_c: self.ambient_c + (next.ambient_c - self.ambient_c) * frac,
            irradiance_w_m2: self.irradiance_w_m2
                + (next.irradiance_w_m2 - self.irradiance_w_m2) * frac,
            relative_humidity_pct: match (self.relative_humidity_pct, next.relative_humidity_pct) {
                (Some(a), Some(b)) => Some(a + (b - a) * frac),
                (own, _) => own,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct WeatherRow {
    timestamp: String,
    ambient_temp_c: Option<f64>,
    irradiance_w_m2: Option<f64>,
    #[serde(default)]
    relative_humidity_pct: Option<f64>,
}

/// Reads `timestamp,ambient_temp_c,irradiance_w_m2` rows from a CSV file.
///
/// An optional `relative_humidity_pct` column is carried through to the
/// results; an empty cell means no reading.
///
/// # Errors
///
/// Returns an I/O or CSV error if the file cannot be parsed, or a
/// `DataError` for a missing, non-finite, or unparseable cell.
pub fn read_weather_csv(path: &Path) -> Result<Vec<WeatherSample>, SimError> {
    read_weather(File::open(path)?)
}

/// Reads weather rows from any CSV reader.
///
/// # Errors
///
/// Same as [`read_weather_csv`].
pub fn read_weather(reader: impl Read) -> Result<Vec<WeatherSample>, SimError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut out = Vec::new();
    for (row, result) in rdr.deserialize::<WeatherRow>().enumerate() {
        let r = result?;
        out.push(WeatherSample {
            timestamp: parse_timestamp(&r.timestamp, row)?,
            ambient_c: required(r.ambient_temp_c, "ambient_temp_c", row)?,
            irradiance_w_m2: required(r.irradiance_w_m2, "irradiance_w_m2", row)?,
            relative_humidity_pct: r
                .relative_humidity_pct
                .map(|v| humidity(v, row))
                .transpose()?,
        });
    }
    Ok(out)
}

fn humidity(value: f64, row: usize) -> Result<f64, DataError> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(value)
    } else {
        Err(DataError::new(
            row,
            format!("relative_humidity_pct must be within 0–100, got {value}"),
        ))
    }
}

/// Generates a sinusoidal day/night profile on every step of `clock`.
///
/// Temperature bottoms out at `coldest_hour` and peaks twelve hours later.
/// Irradiance follows a half sine between sunrise and sunset.
pub fn synthetic_weather(cfg: &WeatherConfig, mut clock: Clock) -> Vec<WeatherSample> {
    let mut out = Vec::with_capacity(clock.total());
    clock.run(|_, ts| {
        let hour = f64::from(ts.num_seconds_from_midnight()) / 3600.0;
        let phase = 2.0 * std::f64::consts::PI * (hour - cfg.coldest_hour as f64) / 24.0;
        let ambient_c = cfg.mean_ambient_c - cfg.diurnal_amplitude_c * phase.cos();

        let (rise, set) = (cfg.sunrise_hour as f64, cfg.sunset_hour as f64);
        let irradiance_w_m2 = if hour >= rise && hour < set {
            cfg.peak_irradiance_w_m2 * (std::f64::consts::PI * (hour - rise) / (set - rise)).sin()
        } else {
            0.0
        };

        out.push(WeatherSample {
            timestamp: ts,
            ambient_c,
            irradiance_w_m2: irradiance_w_m2.max(0.0),
            relative_humidity_pct: None,
        });
    });
    out
}
