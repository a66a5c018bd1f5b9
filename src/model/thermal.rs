//! Validated, immutable thermal network built from battery and container configuration.
//!
//! Everything that depends only on geometry and materials is resolved here
//! once: per-face couplings, wall conductance, node capacities, and the
//! solar-absorbing area. The solver only combines these with temperatures.

use tracing::debug;

use crate::config::{BatteryConfig, ContainerConfig};
use crate::error::ConfigError;
use crate::sim::types::{Node, PerNode};

use super::face::{Face, FaceMap};
use super::geometry::Cuboid;
use super::material::{Material, MaterialRegistry};

/// Stefan–Boltzmann constant (W/m²·K⁴).
pub const STEFAN_BOLTZMANN: f64 = 5.670_374e-8;

/// Offset between °C and K.
pub const KELVIN_OFFSET: f64 = 273.15;

/// Fraction of the explicit-Euler limit `C / ΣG` a sub-step may use.
pub const STABILITY_MARGIN: f64 = 0.5;

/// Converts °C to K.
pub fn to_kelvin(celsius: f64) -> f64 {
    celsius + KELVIN_OFFSET
}

/// How one face exchanges heat with its neighbour node.
///
/// Every enabled face radiates. Contact faces add conduction through the
/// solid layer they rest on; air faces add convection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FaceCoupling {
    /// No exchange by any mechanism.
    Disabled,
    /// Solid contact: conduction plus radiation.
    Contact {
        /// `A · k / t` (W/K).
        conductance_w_per_k: f64,
        /// `A · ε · σ` (W/K⁴), multiplied by `T₁⁴ − T₂⁴` in kelvin.
        radiation_w_per_k4: f64,
    },
    /// Exposed to air: convection plus radiation.
    Air {
        /// `h · A` (W/K).
        convection_w_per_k: f64,
        /// `A · ε · σ` (W/K⁴).
        radiation_w_per_k4: f64,
    },
}

impl FaceCoupling {
    /// Conductance seen by a small temperature difference around `t_ref_c`.
    ///
    /// Radiation is linearised as `4 · A·ε·σ · T_ref³`.
    pub fn linearised_conductance(&self, t_ref_c: f64) -> f64 {
        let linear = match *self {
            FaceCoupling::Disabled => 0.0,
            FaceCoupling::Contact {
                conductance_w_per_k,
                ..
            } => conductance_w_per_k,
            FaceCoupling::Air {
                convection_w_per_k, ..
            } => convection_w_per_k,
        };
        linear + 4.0 * self.radiation_w_per_k4() * to_kelvin(t_ref_c).powi(3)
    }

    /// Radiative coefficient `A·ε·σ` (W/K⁴); zero when disabled.
    pub fn radiation_w_per_k4(&self) -> f64 {
        match *self {
            FaceCoupling::Disabled => 0.0,
            FaceCoupling::Contact {
                radiation_w_per_k4,
                ..
            }
            | FaceCoupling::Air {
                radiation_w_per_k4,
                ..
            } => radiation_w_per_k4,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, FaceCoupling::Disabled)
    }
}

/// Thermal network for one battery-in-box configuration.
///
/// Built once with [`ThermalModel::build`] and shared read-only by any
/// number of runs.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermalModel {
    /// Battery faces coupled to the inner wall.
    pub battery_faces: FaceMap<FaceCoupling>,
    /// Container faces coupled to ambient.
    pub container_faces: FaceMap<FaceCoupling>,
    /// Inner wall ↔ outer wall composite conductance (W/K).
    pub shell_conductance_w_per_k: f64,
    /// `ε_outer · A_top` when the top face is exposed, else 0 (m²).
    pub solar_absorbing_area_m2: f64,
    /// Heat capacity of each node (J/K).
    pub capacity_j_per_k: PerNode,
    /// Mass of each node (kg).
    pub mass_kg: PerNode,
    /// Fraction of electrical throughput dissipated inside the battery.
    pub battery_loss_fraction: f64,
    /// Effective battery ↔ inner wall emissivity.
    pub enclosure_emissivity: f64,
    pub battery_dimensions: Cuboid,
    pub container_dimensions: Cuboid,
    pub inner_material: Material,
    pub outer_material: Material,
}

impl ThermalModel {
    /// Validates battery and container configuration and resolves the network.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` found: non-positive geometry, mass or
    /// specific heat, unknown material, or a battery that does not fit the box.
    pub fn build(
        battery: &BatteryConfig,
        container: &ContainerConfig,
    ) -> Result<Self, ConfigError> {
        let mut errors = Vec::new();
        battery.validate_into(&mut errors);
        container.validate_into(&mut errors);
        if let Some(first) = errors.into_iter().next() {
            return Err(first);
        }

        let b_dims = battery.dimensions();
        let c_dims = container.dimensions();
        if !b_dims.fits_within(&c_dims) {
            return Err(ConfigError::new(
                "battery.dimensions",
                "battery must fit inside the container",
            ));
        }

        let registry = MaterialRegistry;
        let inner = registry.lookup(&container.inner_material, "container.inner_material")?;
        let outer = registry.lookup(&container.outer_material, "container.outer_material")?;

        let shell_area = c_dims.surface_area_m2();
        let fills_box = (c_dims.volume_m3() - b_dims.volume_m3()).abs() <= 1e-9 * c_dims.volume_m3();
        let contact = if fills_box {
            FaceMap::all()
        } else {
            battery.contact_faces
        };

        let radiating_area = b_dims.masked_area_m2(&battery.transfer_faces);
        let enclosure_emissivity = if radiating_area > 0.0 {
            1.0 / (1.0 / battery.emissivity
                + (radiating_area / shell_area) * (1.0 / inner.emissivity - 1.0))
        } else {
            0.0
        };

        let battery_faces = FaceMap::from_fn(|f| {
            let area = b_dims.face_area_m2(f);
            let radiation_w_per_k4 = area * enclosure_emissivity * STEFAN_BOLTZMANN;
            if !battery.transfer_faces[f] {
                FaceCoupling::Disabled
            } else if contact[f] {
                FaceCoupling::Contact {
                    conductance_w_per_k: area / inner.resistance_per_area(container.inner_thickness_m),
                    radiation_w_per_k4,
                }
            } else {
                FaceCoupling::Air {
                    convection_w_per_k: container.inner_convection_w_per_m2_k * area,
                    radiation_w_per_k4,
                }
            }
        });

        let container_faces = FaceMap::from_fn(|f| {
            let area = c_dims.face_area_m2(f);
            let radiation_w_per_k4 = area * outer.emissivity * STEFAN_BOLTZMANN;
            if !container.transfer_faces[f] {
                FaceCoupling::Disabled
            } else if container.ground_faces[f] {
                FaceCoupling::Contact {
                    conductance_w_per_k: area / outer.resistance_per_area(container.outer_thickness_m),
                    radiation_w_per_k4,
                }
            } else {
                FaceCoupling::Air {
                    convection_w_per_k: container.outer_convection_w_per_m2_k * area,
                    radiation_w_per_k4,
                }
            }
        });

        let solar_absorbing_area_m2 = match container_faces[Face::Top] {
            FaceCoupling::Air { .. } => outer.emissivity * c_dims.face_area_m2(Face::Top),
            _ => 0.0,
        };

        let shell_resistance = inner.resistance_per_area(container.inner_thickness_m)
            + outer.resistance_per_area(container.outer_thickness_m);
        let shell_conductance_w_per_k = shell_area / shell_resistance;

        let inner_mass = shell_area * container.inner_thickness_m * inner.density;
        let outer_mass = shell_area * container.outer_thickness_m * outer.density;
        let wall_capacity = inner_mass * inner.specific_heat + outer_mass * outer.specific_heat;
        let half_mass = (inner_mass + outer_mass) / 2.0;
        let half_capacity = wall_capacity / 2.0;

        let model = Self {
            battery_faces,
            container_faces,
            shell_conductance_w_per_k,
            solar_absorbing_area_m2,
            capacity_j_per_k: PerNode::new(
                battery.mass_kg * battery.specific_heat_j_per_kg_k,
                half_capacity,
                half_capacity,
            ),
            mass_kg: PerNode::new(battery.mass_kg, half_mass, half_mass),
            battery_loss_fraction: battery.loss_fraction,
            enclosure_emissivity,
            battery_dimensions: b_dims,
            container_dimensions: c_dims,
            inner_material: inner,
            outer_material: outer,
        };

        debug!(
            shell_area_m2 = shell_area,
            shell_conductance_w_per_k,
            enclosure_emissivity,
            battery_capacity_j_per_k = model.capacity_j_per_k.battery,
            wall_capacity_j_per_k = half_capacity,
            contact_faces = contact.count(),
            "thermal model built"
        );

        Ok(model)
    }

    /// Wall specific heat as the mass-weighted mean of both layers (J/kg·K).
    pub fn wall_specific_heat(&self) -> f64 {
        self.capacity_j_per_k.inner_wall / self.mass_kg.inner_wall
    }

    /// Total linearised conductance touching each node around `t_ref_c` (W/K).
    pub fn node_conductance_w_per_k(&self, t_ref_c: f64) -> PerNode {
        let battery: f64 = self
            .battery_faces
            .iter()
            .map(|(_, c)| c.linearised_conductance(t_ref_c))
            .sum();
        let ambient: f64 = self
            .container_faces
            .iter()
            .map(|(_, c)| c.linearised_conductance(t_ref_c))
            .sum();
        PerNode::new(
            battery,
            battery + self.shell_conductance_w_per_k,
            self.shell_conductance_w_per_k + ambient,
        )
    }

    /// Largest step (s) for which explicit Euler stays stable at each node.
    ///
    /// A node with no coupling at all is stable for any step.
    pub fn max_stable_step_s(&self, t_ref_c: f64) -> PerNode {
        let g = self.node_conductance_w_per_k(t_ref_c);
        let mut out = PerNode::default();
        for node in Node::ALL {
            out[node] = if g[node] > 0.0 {
                self.capacity_j_per_k[node] / g[node]
            } else {
                f64::INFINITY
            };
        }
        out
    }

    /// Number of equal sub-steps that keep explicit Euler stable over `dt_s`.
    ///
    /// Each sub-step stays within [`STABILITY_MARGIN`] of the tightest node
    /// limit, with radiation linearised at `t_ref_c`.
    pub fn substeps_for(&self, dt_s: f64, t_ref_c: f64) -> u32 {
        let limit = self
            .max_stable_step_s(t_ref_c)
            .iter()
            .map(|(_, l)| l)
            .fold(f64::INFINITY, f64::min);
        if !limit.is_finite() || dt_s <= 0.0 {
            return 1;
        }
        let n = (dt_s / (STABILITY_MARGIN * limit)).ceil();
        if n >= f64::from(u32::MAX) {
            u32::MAX
        } else {
            (n as u32).max(1)
        }
    }
}
