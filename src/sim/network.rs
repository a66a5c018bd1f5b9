//! Heat-flow network: conduction, convection, and radiation between nodes.
//!
//! All functions here are pure. They read a snapshot of node temperatures
//! and return flows in watts, so a step can compute every path before any
//! temperature is committed.

use crate::model::face::FaceMap;
use crate::model::thermal::{FaceCoupling, ThermalModel, to_kelvin};

use super::types::{Mechanisms, NodeTemperatures, PerNode, sum_faces};

/// Externally imposed conditions for one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boundary {
    /// Ambient air and sky temperature (°C).
    pub ambient_c: f64,
    /// Horizontal irradiance (W/m²).
    pub irradiance_w_m2: f64,
}

/// Conductive flow (W) through a solid path of conductance `A·k/t`.
///
/// Layers in series combine as `A / Σ(tᵢ/kᵢ)`. Positive from hot to cold.
pub fn conduction_w(conductance_w_per_k: f64, from_c: f64, to_c: f64) -> f64 {
    conductance_w_per_k * (from_c - to_c)
}

/// Convective flow (W) from a surface into a fluid, given `h·A` (W/K).
pub fn convection_w(h_area_w_per_k: f64, surface_c: f64, fluid_c: f64) -> f64 {
    h_area_w_per_k * (surface_c - fluid_c)
}

/// Radiative flow (W) between two grey surfaces, given `A·ε·σ` (W/K⁴).
///
/// Temperatures are taken in °C and raised to the fourth power in kelvin.
pub fn radiation_w(radiation_w_per_k4: f64, from_c: f64, to_c: f64) -> f64 {
    radiation_w_per_k4 * (to_kelvin(from_c).powi(4) - to_kelvin(to_c).powi(4))
}

/// Flow (W) across one face, positive from `from_c` to `to_c`.
///
/// A disabled face yields exactly zero for every mechanism.
pub fn face_flow(coupling: &FaceCoupling, from_c: f64, to_c: f64) -> Mechanisms {
    match *coupling {
        FaceCoupling::Disabled => Mechanisms::default(),
        FaceCoupling::Contact {
            conductance_w_per_k,
            radiation_w_per_k4,
        } => Mechanisms {
            conduction: conduction_w(conductance_w_per_k, from_c, to_c),
            convection: 0.0,
            radiation: radiation_w(radiation_w_per_k4, from_c, to_c),
        },
        FaceCoupling::Air {
            convection_w_per_k,
            radiation_w_per_k4,
        } => Mechanisms {
            conduction: 0.0,
            convection: convection_w(convection_w_per_k, from_c, to_c),
            radiation: radiation_w(radiation_w_per_k4, from_c, to_c),
        },
    }
}

/// Every path flow for one step, in watts.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NetworkFlows {
    /// Battery → inner wall, per battery face.
    pub battery_faces: FaceMap<Mechanisms>,
    /// Outer wall → ambient, per container face.
    pub container_faces: FaceMap<Mechanisms>,
    /// Inner wall → outer wall.
    pub inner_outer_conduction_w: f64,
    /// Absorbed by the outer wall.
    pub solar_gain_w: f64,
}

impl NetworkFlows {
    /// Total battery → inner wall flow by mechanism.
    pub fn battery_inner(&self) -> Mechanisms {
        sum_faces(&self.battery_faces)
    }

    /// Total outer wall → ambient flow by mechanism.
    pub fn outer_ambient(&self) -> Mechanisms {
        sum_faces(&self.container_faces)
    }

    /// Net passive heat gained by each node (W), before heater and loss heat.
    pub fn node_net_w(&self) -> PerNode {
        let battery_inner = self.battery_inner().total();
        let outer_ambient = self.outer_ambient().total();
        PerNode::new(
            -battery_inner,
            battery_inner - self.inner_outer_conduction_w,
            self.inner_outer_conduction_w - outer_ambient + self.solar_gain_w,
        )
    }
}

/// Computes every path flow from a temperature snapshot.
pub fn compute_flows(
    model: &ThermalModel,
    temps: &NodeTemperatures,
    boundary: &Boundary,
) -> NetworkFlows {
    NetworkFlows {
        battery_faces: model
            .battery_faces
            .map(|_, c| face_flow(&c, temps.battery, temps.inner_wall)),
        container_faces: model
            .container_faces
            .map(|_, c| face_flow(&c, temps.outer_wall, boundary.ambient_c)),
        inner_outer_conduction_w: conduction_w(
            model.shell_conductance_w_per_k,
            temps.inner_wall,
            temps.outer_wall,
        ),
        solar_gain_w: model.solar_absorbing_area_m2 * boundary.irradiance_w_m2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BatteryConfig, ContainerConfig};
    use crate::model::face::Face;
    use crate::model::thermal::STEFAN_BOLTZMANN;

    fn model() -> ThermalModel {
        ThermalModel::build(&BatteryConfig::default(), &ContainerConfig::default())
            .expect("baseline builds")
    }

    #[test]
    fn conduction_matches_formula() {
        // 2 m² · 10 K / (0.01/0.033 + 0.01/0.15)
        let r = 0.01 / 0.033 + 0.01 / 0.15;
        let q = conduction_w(2.0 / r, 20.0, 10.0);
        assert!((q - 20.0 / r).abs() < 1e-9);
    }

    #[test]
    fn convection_sign_follows_temperatures() {
        assert!(convection_w(5.0, 20.0, 0.0) > 0.0);
        assert!(convection_w(5.0, 0.0, 20.0) < 0.0);
        assert_eq!(convection_w(5.0, 7.0, 7.0), 0.0);
    }

    #[test]
    fn radiation_uses_kelvin() {
        let q = radiation_w(STEFAN_BOLTZMANN, 0.0, -273.15);
        let expected = 5.670_374e-8 * 273.15_f64.powi(4);
        assert!((q - expected).abs() < 1e-9);
    }

    #[test]
    fn contact_face_radiates_across_a_temperature_difference() {
        let m = model();
        let bottom = face_flow(&m.battery_faces[Face::Bottom], 20.0, 5.0);
        assert!(bottom.conduction > 0.0);
        assert!(bottom.radiation > 0.0);
        assert_eq!(bottom.convection, 0.0);
        let reverse = face_flow(&m.battery_faces[Face::Bottom], 5.0, 20.0);
        assert!(reverse.radiation < 0.0);
        let ground = face_flow(&m.container_faces[Face::Bottom], 3.0, -10.0);
        assert!(ground.radiation > 0.0);
    }

    #[test]
    fn disabled_face_is_zero() {
        let m = face_flow(&FaceCoupling::Disabled, 100.0, -40.0);
        assert!(m.is_zero());
    }

    #[test]
    fn equal_temperatures_carry_no_heat() {
        let flows = compute_flows(
            &model(),
            &NodeTemperatures::uniform(12.0),
            &Boundary {
                ambient_c: 12.0,
                irradiance_w_m2: 0.0,
            },
        );
        assert_eq!(flows.node_net_w(), PerNode::default());
    }

    #[test]
    fn warm_battery_loses_heat_to_inner_wall() {
        let flows = compute_flows(
            &model(),
            &NodeTemperatures::new(20.0, 10.0, 5.0),
            &Boundary {
                ambient_c: 0.0,
                irradiance_w_m2: 0.0,
            },
        );
        let bi = flows.battery_inner();
        assert!(bi.conduction > 0.0);
        assert!(bi.convection > 0.0);
        assert!(bi.radiation > 0.0);
        assert!(flows.container_faces[Face::Bottom].convection == 0.0);
        assert!(flows.container_faces[Face::Bottom].conduction > 0.0);
        assert!(flows.container_faces[Face::Bottom].radiation > 0.0);
        assert!(flows.node_net_w().battery < 0.0);
    }

    #[test]
    fn solar_gain_lands_on_outer_wall() {
        let m = model();
        let flows = compute_flows(
            &m,
            &NodeTemperatures::uniform(0.0),
            &Boundary {
                ambient_c: 0.0,
                irradiance_w_m2: 400.0,
            },
        );
        assert!((flows.solar_gain_w - 400.0 * 0.9 * 0.7).abs() < 1e-9);
        assert_eq!(flows.node_net_w().outer_wall, flows.solar_gain_w);
        assert_eq!(flows.node_net_w().battery, 0.0);
    }

    #[test]
    fn passive_flows_conserve_energy() {
        let flows = compute_flows(
            &model(),
            &NodeTemperatures::new(25.0, 11.0, -3.0),
            &Boundary {
                ambient_c: -8.0,
                irradiance_w_m2: 150.0,
            },
        );
        let net = flows.node_net_w();
        let sum = net.battery + net.inner_wall + net.outer_wall;
        let external = flows.solar_gain_w - flows.outer_ambient().total();
        assert!((sum - external).abs() < 1e-9);
    }
}
