//! Thermal material properties and the built-in material registry.

use serde::Serialize;

use crate::error::ConfigError;

/// Immutable thermal properties of a named material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Material {
    /// Canonical display name.
    pub name: &'static str,
    /// Thermal conductivity in W/(m·K).
    pub conductivity: f64,
    /// Specific heat capacity in J/(kg·K).
    pub specific_heat: f64,
    /// Density in kg/m³.
    pub density: f64,
    /// Surface emissivity (0.0 to 1.0).
    pub emissivity: f64,
}

impl Material {
    /// Conductive resistance of a layer of this material per unit area, in m²·K/W.
    pub fn resistance_per_area(&self, thickness_m: f64) -> f64 {
        thickness_m / self.conductivity
    }
}

const fn material(
    name: &'static str,
    conductivity: f64,
    specific_heat: f64,
    density: f64,
    emissivity: f64,
) -> Material {
    Material {
        name,
        conductivity,
        specific_heat,
        density,
        emissivity,
    }
}

/// Typical room-temperature values for common enclosure materials.
static MATERIALS: &[Material] = &[
    material("Polystyrene", 0.033, 1300.0, 30.0, 0.60),
    material("Polyurethane", 0.025, 1400.0, 40.0, 0.90),
    material("Mineral Wool", 0.040, 840.0, 50.0, 0.90),
    material("Cork", 0.045, 1800.0, 120.0, 0.90),
    material("Wood", 0.150, 1700.0, 600.0, 0.90),
    material("Plywood", 0.130, 1880.0, 545.0, 0.90),
    material("Concrete", 1.400, 880.0, 2300.0, 0.91),
    material("Brick", 0.720, 840.0, 1920.0, 0.93),
    material("Aluminium", 205.0, 900.0, 2700.0, 0.09),
    material("Steel", 45.0, 490.0, 7850.0, 0.30),
    material("HDPE", 0.480, 1900.0, 950.0, 0.92),
];

/// Read-only lookup of named materials.
///
/// Names match case-insensitively and ignore surrounding whitespace, so
/// `"polystyrene"` and `"Polystyrene "` both resolve.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialRegistry;

impl MaterialRegistry {
    /// Looks up a material by name.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` against `field` when the name is unknown.
    pub fn lookup(&self, name: &str, field: &str) -> Result<Material, ConfigError> {
        let wanted = name.trim();
        MATERIALS
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(wanted))
            .copied()
            .ok_or_else(|| {
                ConfigError::new(
                    field,
                    format!(
                        "unknown material \"{wanted}\", available: {}",
                        self.names().collect::<Vec<_>>().join(", ")
                    ),
                )
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        MATERIALS.iter().map(|m| m.name)
    }
}
