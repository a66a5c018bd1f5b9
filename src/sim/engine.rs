//! Simulation driver: steps the thermal network through an input series.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use crate::config::{HeaterConfig, InitialConfig, ScenarioConfig};
use crate::error::{ConfigError, SimError};
use crate::input::TimeSeries;
use crate::model::face::FaceMap;
use crate::model::thermal::ThermalModel;
use crate::sim::clock::Interval;

use super::heater::HeaterController;
use super::network::{Boundary, compute_flows};
use super::summary::RunSummary;
use super::types::{Mechanisms, Node, NodeTemperatures, PerNode, ResultRow};

/// The complete, ordered result table of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    interval: Interval,
    rows: Vec<ResultRow>,
}

impl SimulationResult {
    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<ResultRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Net energy gained by `node` over the whole run (J).
    pub fn cumulative_energy(&self, node: Node) -> f64 {
        self.rows.last().map_or(0.0, |r| r.cumulative_j[node])
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary::from_rows(&self.rows, self.interval)
    }
}

/// Simulation engine owning the run state of one simulation.
///
/// The model and input series are borrowed read-only, so several engines
/// may share them. Node temperatures, the heater controller, and the
/// running energy totals belong to this engine alone.
pub struct Engine<'a> {
    model: &'a ThermalModel,
    series: &'a TimeSeries,
    heater: HeaterController,
    temps: NodeTemperatures,
    cumulative: PerNode,
    dt_s: f64,
    cursor: usize,
}

impl<'a> Engine<'a> {
    /// Creates an engine positioned before the first record.
    ///
    /// # Arguments
    ///
    /// * `model` - Resolved thermal network
    /// * `series` - Validated input series; its interval sets the step length
    /// * `heater` - Heater controller in its initial state
    /// * `initial` - Node temperatures before the first step (°C)
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when an initial temperature is not finite.
    pub fn new(
        model: &'a ThermalModel,
        series: &'a TimeSeries,
        heater: HeaterController,
        initial: NodeTemperatures,
    ) -> Result<Self, ConfigError> {
        if !initial.is_finite() {
            return Err(ConfigError::new(
                "initial",
                format!("initial temperatures must be finite, got {initial:?}"),
            ));
        }

        let dt_s = f64::from(series.interval().seconds());
        let t_ref = initial.max().max(series.max_ambient_c());
        debug!(
            dt_s,
            substeps = model.substeps_for(dt_s, t_ref),
            "integration sub-steps at start"
        );

        Ok(Self {
            model,
            series,
            heater,
            temps: initial,
            cumulative: PerNode::default(),
            dt_s,
            cursor: 0,
        })
    }

    /// Current node temperatures (°C).
    pub fn temperatures(&self) -> NodeTemperatures {
        self.temps
    }

    pub fn heater(&self) -> &HeaterController {
        &self.heater
    }

    /// Number of steps still to run.
    pub fn remaining(&self) -> usize {
        self.series.len() - self.cursor
    }

    /// Executes the next step and returns its row, or `None` at the end of
    /// the series.
    ///
    /// The heater decides once per row from the battery temperature left by
    /// the previous row. The row is then integrated in equal sub-steps short
    /// enough for explicit Euler to stay stable; within each sub-step every
    /// flow is computed from one temperature snapshot before any node is
    /// updated.
    pub fn step(&mut self) -> Option<ResultRow> {
        let rec = *self.series.records().get(self.cursor)?;
        self.cursor += 1;
        let dt = self.dt_s;
        let boundary = Boundary {
            ambient_c: rec.ambient_c,
            irradiance_w_m2: rec.irradiance_w_m2,
        };

        // 1. Heater decision from the previous battery temperature
        let heater = self.heater.step(self.temps.battery, dt);

        // 2. Battery internal losses: load plus the heater's own draw
        let loss_w = self.model.battery_loss_fraction * (rec.load_w + heater.power_w);

        // 3. Integrate passive flows plus fixed sources over the sub-steps
        let substeps = self
            .model
            .substeps_for(dt, self.temps.max().max(rec.ambient_c));
        let h = dt / f64::from(substeps);
        let mut battery_faces = FaceMap::<Mechanisms>::default();
        let mut container_faces = FaceMap::<Mechanisms>::default();
        let mut inner_outer_conduction_j = 0.0;
        let mut solar_gain_j = 0.0;
        let mut node_net_j = PerNode::default();
        for _ in 0..substeps {
            let flows = compute_flows(self.model, &self.temps, &boundary);
            let mut net_w = flows.node_net_w();
            net_w.battery += heater.to_battery_w + loss_w;
            for node in Node::ALL {
                let q = net_w[node] * h;
                node_net_j[node] += q;
                self.temps[node] += q / self.model.capacity_j_per_k[node];
            }
            battery_faces += flows.battery_faces.map(|_, m| m.scaled(h));
            container_faces += flows.container_faces.map(|_, m| m.scaled(h));
            inner_outer_conduction_j += flows.inner_outer_conduction_w * h;
            solar_gain_j += flows.solar_gain_w * h;
        }
        self.cumulative += node_net_j;

        Some(ResultRow {
            timestamp: rec.timestamp,
            ambient_c: rec.ambient_c,
            irradiance_w_m2: rec.irradiance_w_m2,
            load_w: rec.load_w,
            relative_humidity_pct: rec.relative_humidity_pct,
            temperatures: self.temps,
            heater_on: heater.on,
            heater_energy_j: heater.power_w * dt,
            heater_to_battery_j: heater.to_battery_w * dt,
            heater_to_air_j: heater.to_air_w * dt,
            battery_loss_heat_j: loss_w * dt,
            battery_faces,
            inner_outer_conduction_j,
            container_faces,
            solar_gain_j,
            node_net_j,
            cumulative_j: self.cumulative,
            substeps,
        })
    }

    /// Executes every remaining step.
    pub fn run(mut self) -> SimulationResult {
        info!(steps = self.remaining(), interval = %self.series.interval(), "run started");
        let mut rows = Vec::with_capacity(self.remaining());
        while let Some(row) = self.step() {
            rows.push(row);
        }
        self.finish(rows)
    }

    /// Executes every remaining step, checking `cancel` before each one.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Cancelled` with the index of the step that was
    /// about to run; rows computed so far are discarded.
    pub fn run_with_cancel(mut self, cancel: &AtomicBool) -> Result<SimulationResult, SimError> {
        info!(steps = self.remaining(), interval = %self.series.interval(), "run started");
        let mut rows = Vec::with_capacity(self.remaining());
        loop {
            if cancel.load(Ordering::Relaxed) {
                info!(step = self.cursor, "run cancelled");
                return Err(SimError::Cancelled { step: self.cursor });
            }
            match self.step() {
                Some(row) => rows.push(row),
                None => break,
            }
        }
        Ok(self.finish(rows))
    }

    fn finish(self, rows: Vec<ResultRow>) -> SimulationResult {
        info!(
            steps = rows.len(),
            battery_c = self.temps.battery,
            heater_activations = self.heater.activations(),
            "run finished"
        );
        SimulationResult {
            interval: self.series.interval(),
            rows,
        }
    }
}

/// Runs one simulation from already-built parts.
///
/// # Errors
///
/// Returns a `ConfigError` (wrapped) for an invalid heater or non-finite
/// initial temperatures. Nothing is returned on error.
pub fn run(
    series: &TimeSeries,
    model: &ThermalModel,
    heater: &HeaterConfig,
    initial: NodeTemperatures,
) -> Result<SimulationResult, SimError> {
    let controller = HeaterController::new(heater)?;
    Ok(Engine::new(model, series, controller, initial)?.run())
}

/// Resolves configured initial temperatures; unset nodes start at the
/// first ambient sample.
pub fn initial_temperatures(initial: &InitialConfig, series: &TimeSeries) -> NodeTemperatures {
    let ambient = series.records().first().map_or(0.0, |r| r.ambient_c);
    NodeTemperatures::new(
        initial.battery_temp_c.unwrap_or(ambient),
        initial.inner_wall_temp_c.unwrap_or(ambient),
        initial.outer_wall_temp_c.unwrap_or(ambient),
    )
}

/// Builds the model and heater from a scenario and runs it over `series`.
///
/// # Errors
///
/// Returns the first configuration problem, or any error from [`run`].
pub fn run_scenario(cfg: &ScenarioConfig, series: &TimeSeries) -> Result<SimulationResult, SimError> {
    if series.interval() != cfg.simulation.interval {
        return Err(ConfigError::new(
            "simulation.interval",
            format!(
                "series interval {} differs from configured {}",
                series.interval(),
                cfg.simulation.interval
            ),
        )
        .into());
    }
    let model = ThermalModel::build(&cfg.battery, &cfg.container)?;
    run(
        series,
        &model,
        &cfg.heater,
        initial_temperatures(&cfg.initial, series),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BatteryConfig, ContainerConfig};
    use crate::input::TimeSeriesRecord;
    use crate::model::face::Face;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid date")
    }

    fn flat_series(steps: usize, ambient_c: f64, load_w: f64) -> TimeSeries {
        let records = (0..steps)
            .map(|i| TimeSeriesRecord {
                timestamp: t0() + Duration::minutes(i as i64),
                ambient_c,
                irradiance_w_m2: 0.0,
                load_w,
                relative_humidity_pct: None,
            })
            .collect();
        TimeSeries::new(records, Interval::Minute).expect("valid series")
    }

    fn model() -> ThermalModel {
        ThermalModel::build(&BatteryConfig::default(), &ContainerConfig::default())
            .expect("baseline builds")
    }

    fn no_heater() -> HeaterConfig {
        HeaterConfig {
            enabled: false,
            ..HeaterConfig::default()
        }
    }

    #[test]
    fn equilibrium_stays_put() {
        let series = flat_series(30, 10.0, 0.0);
        let result = run(&series, &model(), &no_heater(), NodeTemperatures::uniform(10.0))
            .expect("runs");
        assert_eq!(result.len(), 30);
        for row in result.rows() {
            assert_eq!(row.temperatures, NodeTemperatures::uniform(10.0));
        }
        assert_eq!(result.cumulative_energy(Node::Battery), 0.0);
    }

    #[test]
    fn step_energy_closes_on_every_node() {
        let m = model();
        let series = flat_series(60, -5.0, 300.0);
        let result = run(&series, &m, &HeaterConfig::default(), NodeTemperatures::new(4.0, 0.0, -3.0))
            .expect("runs");
        let mut prev = NodeTemperatures::new(4.0, 0.0, -3.0);
        for row in result.rows() {
            for node in Node::ALL {
                let stored = m.capacity_j_per_k[node] * (row.temperatures[node] - prev[node]);
                let q = row.node_net_j[node];
                assert!((stored - q).abs() <= 1e-6 * q.abs().max(1.0), "{node}: {stored} vs {q}");
            }
            prev = row.temperatures;
        }
    }

    #[test]
    fn heater_and_loss_heat_reach_battery() {
        let series = flat_series(5, 0.0, 1000.0);
        let result = run(&series, &model(), &HeaterConfig::default(), NodeTemperatures::uniform(0.0))
            .expect("runs");
        let row = &result.rows()[0];
        assert!(row.heater_on);
        assert!((row.heater_energy_j - 30.0 * 60.0).abs() < 1e-9);
        assert!((row.heater_to_battery_j - 24.0 * 60.0).abs() < 1e-9);
        assert!((row.heater_to_air_j - 6.0 * 60.0).abs() < 1e-9);
        assert!((row.battery_loss_heat_j - 0.03 * 1030.0 * 60.0).abs() < 1e-9);
        // all nodes start equal, so only heater and losses move the battery
        assert!(
            (row.node_net_j.battery - row.heater_to_battery_j - row.battery_loss_heat_j).abs()
                < 1e-9
        );
    }

    #[test]
    fn hourly_step_on_thin_walls_is_substepped() {
        let records = (0..24)
            .map(|i| TimeSeriesRecord {
                timestamp: t0() + Duration::hours(i),
                ambient_c: 0.0,
                irradiance_w_m2: 0.0,
                load_w: 0.0,
                relative_humidity_pct: None,
            })
            .collect();
        let series = TimeSeries::new(records, Interval::Hour).expect("valid series");
        let m = model();
        let result = run(&series, &m, &no_heater(), NodeTemperatures::uniform(20.0))
            .expect("hourly run");
        let mut prev = NodeTemperatures::uniform(20.0);
        for row in result.rows() {
            assert!(row.substeps > 1);
            assert!(row.temperatures.battery < prev.battery);
            assert!(row.temperatures.battery > 0.0);
            assert!(row.temperatures.outer_wall > -0.5);
            for node in Node::ALL {
                let stored = m.capacity_j_per_k[node] * (row.temperatures[node] - prev[node]);
                let q = row.node_net_j[node];
                assert!((stored - q).abs() <= 1e-6 * q.abs().max(1.0), "{node}: {stored} vs {q}");
            }
            prev = row.temperatures;
        }
        assert!(result.cumulative_energy(Node::Battery) < 0.0);
    }

    #[test]
    fn row_energies_are_reported_per_face() {
        let series = flat_series(10, -5.0, 0.0);
        let result = run(&series, &model(), &no_heater(), NodeTemperatures::new(20.0, 5.0, 0.0))
            .expect("runs");
        let row = &result.rows()[0];
        let bottom = row.battery_faces[Face::Bottom];
        assert!(bottom.conduction > 0.0);
        assert!(bottom.radiation > 0.0);
        assert_eq!(bottom.convection, 0.0);
        let top = row.battery_faces[Face::Top];
        assert!(top.convection > 0.0 && top.radiation > 0.0);
        assert_eq!(top.conduction, 0.0);
        let net = -row.battery_inner().total() + row.battery_loss_heat_j;
        assert!((row.node_net_j.battery - net).abs() < 1e-6);
    }

    #[test]
    fn non_finite_initial_temperature_is_rejected() {
        let series = flat_series(3, 0.0, 0.0);
        let err = run(&series, &model(), &no_heater(), NodeTemperatures::new(f64::NAN, 0.0, 0.0))
            .expect_err("must fail");
        assert!(matches!(err, SimError::Configuration(_)));
    }

    #[test]
    fn cancelled_run_returns_no_rows() {
        let series = flat_series(10, 0.0, 0.0);
        let m = model();
        let heater = HeaterController::new(&no_heater()).expect("valid heater");
        let engine = Engine::new(&m, &series, heater, NodeTemperatures::uniform(5.0)).expect("engine builds");
        let cancel = AtomicBool::new(true);
        let err = engine.run_with_cancel(&cancel).expect_err("cancelled");
        assert!(matches!(err, SimError::Cancelled { step: 0 }));
    }

    #[test]
    fn uncancelled_run_matches_plain_run() {
        let series = flat_series(20, -2.0, 150.0);
        let m = model();
        let build = || {
            let heater = HeaterController::new(&HeaterConfig::default()).expect("valid heater");
            Engine::new(&m, &series, heater, NodeTemperatures::uniform(6.0)).expect("engine builds")
        };
        let plain = build().run();
        let checked = build()
            .run_with_cancel(&AtomicBool::new(false))
            .expect("not cancelled");
        assert_eq!(plain, checked);
    }

    #[test]
    fn unset_initial_temperatures_follow_first_ambient() {
        let series = flat_series(2, -7.5, 0.0);
        let initial = InitialConfig {
            battery_temp_c: Some(15.0),
            ..InitialConfig::default()
        };
        let t = initial_temperatures(&initial, &series);
        assert_eq!(t, NodeTemperatures::new(15.0, -7.5, -7.5));
    }

    #[test]
    fn run_scenario_rejects_mismatched_series() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.simulation.interval = Interval::Second;
        let series = flat_series(3, 0.0, 0.0);
        assert!(matches!(
            run_scenario(&cfg, &series),
            Err(SimError::Configuration(_))
        ));
    }
}
