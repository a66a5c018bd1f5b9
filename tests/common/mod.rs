//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use battery_box_sim::config::{HeaterConfig, ScenarioConfig};
use battery_box_sim::input::{TimeSeries, TimeSeriesRecord};
use battery_box_sim::model::ThermalModel;
use battery_box_sim::sim::clock::{Clock, Interval};
use chrono::{NaiveDate, NaiveDateTime};

/// 2025-01-01 00:00:00.
pub fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid date")
}

/// Constant conditions for `steps` steps at `interval`.
pub fn constant_series(
    steps: usize,
    interval: Interval,
    ambient_c: f64,
    irradiance_w_m2: f64,
    load_w: f64,
) -> TimeSeries {
    let clock = Clock::new(t0(), interval, steps);
    let records = (0..steps)
        .map(|i| TimeSeriesRecord {
            timestamp: clock.timestamp_at(i),
            ambient_c,
            irradiance_w_m2,
            load_w,
            relative_humidity_pct: None,
        })
        .collect();
    TimeSeries::new(records, interval).expect("valid series")
}

/// A heavy battery in a concrete-clad box.
pub fn heavy_box() -> ScenarioConfig {
    let mut cfg = ScenarioConfig::baseline();
    cfg.simulation.interval = Interval::Hour;
    cfg.battery.mass_kg = 200.0;
    cfg.container.inner_thickness_m = 0.05;
    cfg.container.outer_material = "Concrete".to_string();
    cfg.container.outer_thickness_m = 0.10;
    cfg.heater.enabled = false;
    cfg
}

pub fn build_model(cfg: &ScenarioConfig) -> ThermalModel {
    ThermalModel::build(&cfg.battery, &cfg.container).expect("model builds")
}

pub fn heater_off() -> HeaterConfig {
    HeaterConfig {
        enabled: false,
        ..HeaterConfig::default()
    }
}
