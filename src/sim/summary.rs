//! Post-hoc run summary computed from the result table.

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::model::face::FaceMap;

use super::clock::Interval;
use super::types::{Mechanisms, PerNode, ResultRow, sum_faces};

/// Aggregate figures for a complete run.
///
/// Computed from the rows alone, so it can be rebuilt from an exported
/// table without re-running the simulation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub steps: usize,
    pub interval: String,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    /// Lowest battery temperature reached (°C).
    pub battery_min_c: f64,
    /// Highest battery temperature reached (°C).
    pub battery_max_c: f64,
    /// Battery temperature after the last step (°C).
    pub battery_final_c: f64,
    /// Number of Off → On heater transitions.
    pub heater_activations: usize,
    /// Total heater on-time (h).
    pub heater_on_hours: f64,
    pub heater_energy_j: f64,
    pub heater_to_battery_j: f64,
    pub heater_to_air_j: f64,
    pub battery_loss_heat_j: f64,
    /// Battery → inner wall totals by mechanism (J).
    pub battery_inner_j: Mechanisms,
    pub inner_outer_conduction_j: f64,
    /// Outer wall → ambient totals by mechanism (J).
    pub outer_ambient_j: Mechanisms,
    /// Battery → inner wall energy per battery face.
    pub battery_faces_j: FaceMap<Mechanisms>,
    /// Outer wall → ambient energy per container face.
    pub container_faces_j: FaceMap<Mechanisms>,
    pub solar_gain_j: f64,
    /// Net energy gained by each node over the run (J).
    pub node_net_j: PerNode,
}

impl RunSummary {
    /// Computes the summary from the complete result table.
    ///
    /// # Arguments
    ///
    /// * `rows` - Complete result rows in step order
    /// * `interval` - Step length the rows were produced with
    pub fn from_rows(rows: &[ResultRow], interval: Interval) -> Self {
        let mut battery_min_c = f64::INFINITY;
        let mut battery_max_c = f64::NEG_INFINITY;
        let mut activations = 0usize;
        let mut on_steps = 0usize;
        let mut was_on = false;
        let mut heater_energy_j = 0.0;
        let mut heater_to_battery_j = 0.0;
        let mut heater_to_air_j = 0.0;
        let mut battery_loss_heat_j = 0.0;
        let mut battery_faces_j = FaceMap::<Mechanisms>::default();
        let mut inner_outer_conduction_j = 0.0;
        let mut container_faces_j = FaceMap::<Mechanisms>::default();
        let mut solar_gain_j = 0.0;
        let mut node_net_j = PerNode::default();

        for r in rows {
            battery_min_c = battery_min_c.min(r.temperatures.battery);
            battery_max_c = battery_max_c.max(r.temperatures.battery);
            if r.heater_on {
                on_steps += 1;
                if !was_on {
                    activations += 1;
                }
            }
            was_on = r.heater_on;

            heater_energy_j += r.heater_energy_j;
            heater_to_battery_j += r.heater_to_battery_j;
            heater_to_air_j += r.heater_to_air_j;
            battery_loss_heat_j += r.battery_loss_heat_j;
            battery_faces_j += r.battery_faces;
            inner_outer_conduction_j += r.inner_outer_conduction_j;
            container_faces_j += r.container_faces;
            solar_gain_j += r.solar_gain_j;
            node_net_j += r.node_net_j;
        }

        let (battery_min_c, battery_max_c, battery_final_c) = match rows.last() {
            Some(last) => (battery_min_c, battery_max_c, last.temperatures.battery),
            None => (0.0, 0.0, 0.0),
        };

        Self {
            steps: rows.len(),
            interval: interval.to_string(),
            start: rows.first().map(|r| r.timestamp),
            end: rows.last().map(|r| r.timestamp),
            battery_min_c,
            battery_max_c,
            battery_final_c,
            heater_activations: activations,
            heater_on_hours: on_steps as f64 * f64::from(interval.seconds()) / 3600.0,
            heater_energy_j,
            heater_to_battery_j,
            heater_to_air_j,
            battery_loss_heat_j,
            battery_inner_j: sum_faces(&battery_faces_j),
            inner_outer_conduction_j,
            outer_ambient_j: sum_faces(&container_faces_j),
            battery_faces_j,
            container_faces_j,
            solar_gain_j,
            node_net_j,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const KWH: f64 = 3.6e6;
        writeln!(f, "--- Run Summary ---")?;
        writeln!(f, "Steps:                 {} × {}", self.steps, self.interval)?;
        writeln!(
            f,
            "Battery temperature:   min {:.2} °C, max {:.2} °C, final {:.2} °C",
            self.battery_min_c, self.battery_max_c, self.battery_final_c
        )?;
        writeln!(
            f,
            "Heater:                {} activations, {:.2} h on, {:.3} kWh",
            self.heater_activations,
            self.heater_on_hours,
            self.heater_energy_j / KWH
        )?;
        writeln!(
            f,
            "Battery loss heat:     {:.3} kWh",
            self.battery_loss_heat_j / KWH
        )?;
        writeln!(
            f,
            "Battery → inner wall:  {:.3} kWh (cond {:.3}, conv {:.3}, rad {:.3})",
            self.battery_inner_j.total() / KWH,
            self.battery_inner_j.conduction / KWH,
            self.battery_inner_j.convection / KWH,
            self.battery_inner_j.radiation / KWH
        )?;
        writeln!(
            f,
            "Outer wall → ambient:  {:.3} kWh (cond {:.3}, conv {:.3}, rad {:.3})",
            self.outer_ambient_j.total() / KWH,
            self.outer_ambient_j.conduction / KWH,
            self.outer_ambient_j.convection / KWH,
            self.outer_ambient_j.radiation / KWH
        )?;
        writeln!(f, "Solar gain:            {:.3} kWh", self.solar_gain_j / KWH)?;
        write!(
            f,
            "Net energy (J):        battery {:.0}, inner wall {:.0}, outer wall {:.0}",
            self.node_net_j.battery, self.node_net_j.inner_wall, self.node_net_j.outer_wall
        )
    }
}
