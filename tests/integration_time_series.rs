mod common;

use battery_box_sim::config::ScenarioConfig;
use battery_box_sim::error::SimError;
use battery_box_sim::input::weather::read_weather;
use battery_box_sim::input::{LoadSample, TimeSeries, TimeSeriesRecord, align, resample};
use battery_box_sim::io::export::write_csv;
use battery_box_sim::sim::clock::Interval;
use battery_box_sim::sim::engine::run_scenario;
use chrono::Duration;

#[test]
fn result_timestamps_step_by_exactly_the_interval() {
    let cfg = ScenarioConfig::baseline();
    let series = common::constant_series(90, Interval::Minute, 2.0, 0.0, 100.0);
    let result = run_scenario(&cfg, &series).expect("runs");

    assert_eq!(result.rows()[0].timestamp, common::t0());
    for pair in result.rows().windows(2) {
        assert_eq!(pair[1].timestamp - pair[0].timestamp, Duration::minutes(1));
    }
}

#[test]
fn gap_in_series_fails_before_any_step() {
    let mut records: Vec<TimeSeriesRecord> = (0..10)
        .map(|i| TimeSeriesRecord {
            timestamp: common::t0() + Duration::minutes(i),
            ambient_c: 0.0,
            irradiance_w_m2: 0.0,
            load_w: 0.0,
            relative_humidity_pct: None,
        })
        .collect();
    records.remove(6);

    let err = TimeSeries::new(records, Interval::Minute).expect_err("gap must be rejected");
    assert!(matches!(err, SimError::Data(ref d) if d.row == 6), "{err}");
}

#[test]
fn hourly_weather_csv_feeds_a_minute_run() {
    let csv = "timestamp,ambient_temp_c,irradiance_w_m2\n\
               2025-01-01T00:00:00,-4.0,0\n\
               2025-01-01T01:00:00,-5.0,0\n\
               2025-01-01T02:00:00,-6.0,0\n";
    let weather = resample(&read_weather(csv.as_bytes()).expect("parses"), Interval::Minute)
        .expect("contiguous");
    assert_eq!(weather.len(), 180);

    let load: Vec<LoadSample> = weather
        .iter()
        .map(|w| LoadSample {
            timestamp: w.timestamp,
            load_w: 200.0,
        })
        .collect();
    let series = align(&weather, &load, Interval::Minute).expect("aligned");
    let result = run_scenario(&ScenarioConfig::baseline(), &series).expect("runs");
    assert_eq!(result.len(), 180);
    assert!((result.rows()[90].ambient_c - -5.5).abs() < 1e-9);
}

#[test]
fn hourly_series_against_minute_config_is_a_configuration_error() {
    let series = common::constant_series(5, Interval::Hour, 0.0, 0.0, 0.0);
    let records = series.records().to_vec();
    let err = TimeSeries::new(records, Interval::Minute).expect_err("mismatch");
    assert!(matches!(err, SimError::Configuration(_)));
}

#[test]
fn identical_inputs_give_identical_tables() {
    let cfg = ScenarioConfig::cold_climate();
    let series = battery_box_sim::input::load_series(&cfg).expect("synthetic feeds");
    let a = run_scenario(&cfg, &series).expect("runs");
    let b = run_scenario(&cfg, &battery_box_sim::input::load_series(&cfg).expect("feeds"))
        .expect("runs");
    assert_eq!(a, b);

    let mut csv_a = Vec::new();
    let mut csv_b = Vec::new();
    write_csv(a.rows(), &mut csv_a).expect("writes");
    write_csv(b.rows(), &mut csv_b).expect("writes");
    assert_eq!(csv_a, csv_b);
}

#[test]
fn different_seeds_change_the_load_profile() {
    let mut cfg = ScenarioConfig::baseline();
    let a = battery_box_sim::input::load_series(&cfg).expect("feeds");
    cfg.simulation.seed += 1;
    let b = battery_box_sim::input::load_series(&cfg).expect("feeds");
    assert_ne!(a, b);
}
