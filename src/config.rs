//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::face::{Face, FaceMap};
use crate::model::geometry::Cuboid;
use crate::model::material::MaterialRegistry;
use crate::sim::clock::Interval;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
///
/// Face tables (`[battery.transfer_faces]` and friends) list faces by name;
/// a face omitted from a table that is present reads as `false`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Simulation grid and global parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Battery geometry and thermal parameters.
    #[serde(default)]
    pub battery: BatteryConfig,
    /// Container geometry and wall build-up.
    #[serde(default)]
    pub container: ContainerConfig,
    /// Thermostatic heater parameters.
    #[serde(default)]
    pub heater: HeaterConfig,
    /// Weather feed source.
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Electrical load feed source.
    #[serde(default)]
    pub load: LoadConfig,
    /// Initial node temperatures.
    #[serde(default)]
    pub initial: InitialConfig,
}

/// Simulation grid and global parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Step length: `"1s"`, `"1m"` or `"1h"`.
    pub interval: Interval,
    /// Timestamp of the first step.
    pub start: NaiveDateTime,
    /// Days to simulate when the feeds are synthetic (must be > 0).
    pub days: usize,
    /// Seed for the synthetic load profile.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            interval: Interval::Minute,
            start: default_start(),
            days: 1,
            seed: 42,
        }
    }
}

fn default_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Battery geometry and thermal parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Length (m).
    pub length_m: f64,
    /// Width (m).
    pub width_m: f64,
    /// Height (m).
    pub height_m: f64,
    /// Mass (kg).
    pub mass_kg: f64,
    /// Specific heat capacity (J/kg·K).
    pub specific_heat_j_per_kg_k: f64,
    /// Fraction of electrical throughput turned into heat (0.0–1.0).
    pub loss_fraction: f64,
    /// Surface emissivity (0.0–1.0).
    pub emissivity: f64,
    /// Faces that exchange heat at all.
    pub transfer_faces: FaceMap<bool>,
    /// Faces resting against the container (conduction instead of air).
    pub contact_faces: FaceMap<bool>,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            length_m: 0.9,
            width_m: 0.6,
            height_m: 0.3,
            mass_kg: 36.0,
            specific_heat_j_per_kg_k: 1000.0,
            loss_fraction: 0.03,
            emissivity: 0.9,
            transfer_faces: FaceMap::all(),
            contact_faces: FaceMap::only(&[Face::Bottom]),
        }
    }
}

impl BatteryConfig {
    pub fn dimensions(&self) -> Cuboid {
        Cuboid::new(self.length_m, self.width_m, self.height_m)
    }

    pub(crate) fn validate_into(&self, errors: &mut Vec<ConfigError>) {
        if !self.dimensions().is_valid() {
            errors.push(ConfigError::new(
                "battery.dimensions",
                "length_m, width_m and height_m must be finite and > 0",
            ));
        }
        positive(errors, "battery.mass_kg", self.mass_kg);
        positive(
            errors,
            "battery.specific_heat_j_per_kg_k",
            self.specific_heat_j_per_kg_k,
        );
        unit_range(errors, "battery.loss_fraction", self.loss_fraction);
        emissivity(errors, "battery.emissivity", self.emissivity);
    }
}

/// Container geometry and wall build-up.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContainerConfig {
    /// Length (m).
    pub length_m: f64,
    /// Width (m).
    pub width_m: f64,
    /// Height (m).
    pub height_m: f64,
    /// Inner wall layer material name.
    pub inner_material: String,
    /// Outer wall layer material name.
    pub outer_material: String,
    /// Inner layer thickness (m).
    pub inner_thickness_m: f64,
    /// Outer layer thickness (m).
    pub outer_thickness_m: f64,
    /// Convection coefficient between battery and inner wall (W/m²·K).
    pub inner_convection_w_per_m2_k: f64,
    /// Convection coefficient between outer wall and ambient air (W/m²·K).
    pub outer_convection_w_per_m2_k: f64,
    /// Faces that exchange heat with the surroundings at all.
    pub transfer_faces: FaceMap<bool>,
    /// Faces standing on the ground (conduction instead of air).
    pub ground_faces: FaceMap<bool>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            length_m: 1.0,
            width_m: 0.7,
            height_m: 0.4,
            inner_material: "Polystyrene".to_string(),
            outer_material: "Wood".to_string(),
            inner_thickness_m: 0.01,
            outer_thickness_m: 0.01,
            inner_convection_w_per_m2_k: 5.0,
            outer_convection_w_per_m2_k: 5.0,
            transfer_faces: FaceMap::all(),
            ground_faces: FaceMap::only(&[Face::Bottom]),
        }
    }
}

impl ContainerConfig {
    pub fn dimensions(&self) -> Cuboid {
        Cuboid::new(self.length_m, self.width_m, self.height_m)
    }

    pub(crate) fn validate_into(&self, errors: &mut Vec<ConfigError>) {
        if !self.dimensions().is_valid() {
            errors.push(ConfigError::new(
                "container.dimensions",
                "length_m, width_m and height_m must be finite and > 0",
            ));
        }
        positive(errors, "container.inner_thickness_m", self.inner_thickness_m);
        positive(errors, "container.outer_thickness_m", self.outer_thickness_m);
        non_negative(
            errors,
            "container.inner_convection_w_per_m2_k",
            self.inner_convection_w_per_m2_k,
        );
        non_negative(
            errors,
            "container.outer_convection_w_per_m2_k",
            self.outer_convection_w_per_m2_k,
        );
        let registry = MaterialRegistry;
        if let Err(e) = registry.lookup(&self.inner_material, "container.inner_material") {
            errors.push(e);
        }
        if let Err(e) = registry.lookup(&self.outer_material, "container.outer_material") {
            errors.push(e);
        }
    }
}

/// Thermostatic heater parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeaterConfig {
    /// Master switch; a disabled heater never turns on.
    pub enabled: bool,
    /// Electrical power while on (W, >= 0).
    pub power_w: f64,
    /// Battery temperature below which the heater turns on (°C).
    pub trigger_temp_c: f64,
    /// Minimum on-time once triggered (minutes, >= 0).
    pub min_on_minutes: f64,
    /// Fraction of heater output delivered into the battery (0.0–1.0).
    pub battery_transfer_fraction: f64,
}

impl Default for HeaterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            power_w: 30.0,
            trigger_temp_c: 5.0,
            min_on_minutes: 5.0,
            battery_transfer_fraction: 0.8,
        }
    }
}

impl HeaterConfig {
    pub(crate) fn validate_into(&self, errors: &mut Vec<ConfigError>) {
        non_negative(errors, "heater.power_w", self.power_w);
        if !self.trigger_temp_c.is_finite() {
            errors.push(ConfigError::new("heater.trigger_temp_c", "must be finite"));
        }
        non_negative(errors, "heater.min_on_minutes", self.min_on_minutes);
        unit_range(
            errors,
            "heater.battery_transfer_fraction",
            self.battery_transfer_fraction,
        );
    }
}

/// Weather feed source.
///
/// With `csv_path` set, samples are read from
/// `timestamp,ambient_temp_c,irradiance_w_m2` rows; otherwise a synthetic
/// diurnal profile is generated from the remaining fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeatherConfig {
    /// Optional CSV file with hourly or per-interval samples.
    pub csv_path: Option<PathBuf>,
    /// Daily mean ambient temperature (°C).
    pub mean_ambient_c: f64,
    /// Half of the daily temperature swing (°C).
    pub diurnal_amplitude_c: f64,
    /// Hour of day with the lowest temperature (0–23).
    pub coldest_hour: usize,
    /// Horizontal irradiance at solar noon (W/m²).
    pub peak_irradiance_w_m2: f64,
    /// Sunrise hour (inclusive).
    pub sunrise_hour: usize,
    /// Sunset hour (exclusive).
    pub sunset_hour: usize,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            csv_path: None,
            mean_ambient_c: 4.0,
            diurnal_amplitude_c: 4.0,
            coldest_hour: 5,
            peak_irradiance_w_m2: 250.0,
            sunrise_hour: 8,
            sunset_hour: 16,
        }
    }
}

/// Electrical load feed source.
///
/// With `csv_path` set, samples are read from `timestamp,load_w` rows;
/// otherwise a synthetic domestic profile is generated, flat or shaped by a
/// half-hourly smart-meter base profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadConfig {
    /// Optional CSV file with hourly or per-interval samples.
    pub csv_path: Option<PathBuf>,
    /// Optional half-hourly smart-meter CSV (`Date` plus 48 kWh columns)
    /// shaping the synthetic profile.
    pub base_profile_path: Option<PathBuf>,
    /// Mean daily consumption served by the battery (kWh).
    pub daily_kwh: f64,
    /// Standard deviation of the per-day scaling factor.
    pub daily_variability: f64,
    /// Standard deviation of the per-hour scaling factor.
    pub hourly_variability: f64,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            csv_path: None,
            base_profile_path: None,
            daily_kwh: 9.91,
            daily_variability: 0.15,
            hourly_variability: 0.1,
        }
    }
}

/// Initial node temperatures (°C); unset values start at the first ambient sample.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InitialConfig {
    pub battery_temp_c: Option<f64>,
    pub inner_wall_temp_c: Option<f64>,
    pub outer_wall_temp_c: Option<f64>,
}

fn positive(errors: &mut Vec<ConfigError>, field: &str, value: f64) {
    if !(value.is_finite() && value > 0.0) {
        errors.push(ConfigError::new(field, format!("must be > 0, got {value}")));
    }
}

fn non_negative(errors: &mut Vec<ConfigError>, field: &str, value: f64) {
    if !(value.is_finite() && value >= 0.0) {
        errors.push(ConfigError::new(field, format!("must be >= 0, got {value}")));
    }
}

fn unit_range(errors: &mut Vec<ConfigError>, field: &str, value: f64) {
    if !(0.0..=1.0).contains(&value) {
        errors.push(ConfigError::new(
            field,
            format!("must be in [0.0, 1.0], got {value}"),
        ));
    }
}

fn emissivity(errors: &mut Vec<ConfigError>, field: &str, value: f64) {
    if !(value > 0.0 && value <= 1.0) {
        errors.push(ConfigError::new(
            field,
            format!("must be in (0.0, 1.0], got {value}"),
        ));
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario: the reference battery box with a 30 W pad heater.
    pub fn baseline() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            battery: BatteryConfig::default(),
            container: ContainerConfig::default(),
            heater: HeaterConfig::default(),
            weather: WeatherConfig::default(),
            load: LoadConfig::default(),
            initial: InitialConfig::default(),
        }
    }

    /// Returns the cold-climate preset: sub-zero week, thicker insulation.
    pub fn cold_climate() -> Self {
        Self {
            simulation: SimulationConfig {
                days: 7,
                ..SimulationConfig::default()
            },
            container: ContainerConfig {
                inner_thickness_m: 0.05,
                ..ContainerConfig::default()
            },
            weather: WeatherConfig {
                mean_ambient_c: -6.0,
                diurnal_amplitude_c: 3.0,
                peak_irradiance_w_m2: 120.0,
                ..WeatherConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Returns the no-heater preset: baseline with the heater switched off.
    pub fn no_heater() -> Self {
        Self {
            heater: HeaterConfig {
                enabled: false,
                ..HeaterConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "cold_climate", "no_heater"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "cold_climate" => Ok(Self::cold_climate()),
            "no_heater" => Ok(Self::no_heater()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// Relative CSV paths inside the file are resolved against the file's
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        let mut cfg = Self::from_toml_str(&content)?;
        if let Some(dir) = path.parent() {
            for csv in [
                &mut cfg.weather.csv_path,
                &mut cfg.load.csv_path,
                &mut cfg.load.base_profile_path,
            ]
                .into_iter()
                .flatten()
            {
                if csv.is_relative() {
                    *csv = dir.join(&*csv);
                }
            }
        }
        Ok(cfg)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.simulation.days == 0 {
            errors.push(ConfigError::new("simulation.days", "must be > 0"));
        }

        self.battery.validate_into(&mut errors);
        self.container.validate_into(&mut errors);
        if self.battery.dimensions().is_valid()
            && self.container.dimensions().is_valid()
            && !self
                .battery
                .dimensions()
                .fits_within(&self.container.dimensions())
        {
            errors.push(ConfigError::new(
                "battery.dimensions",
                "battery must fit inside the container",
            ));
        }
        self.heater.validate_into(&mut errors);

        let w = &self.weather;
        if w.csv_path.is_none() {
            if !w.mean_ambient_c.is_finite() || !w.diurnal_amplitude_c.is_finite() {
                errors.push(ConfigError::new(
                    "weather.mean_ambient_c",
                    "mean and amplitude must be finite",
                ));
            }
            if w.coldest_hour > 23 {
                errors.push(ConfigError::new("weather.coldest_hour", "must be <= 23"));
            }
            non_negative(&mut errors, "weather.peak_irradiance_w_m2", w.peak_irradiance_w_m2);
            if w.sunrise_hour >= w.sunset_hour {
                errors.push(ConfigError::new(
                    "weather.sunrise_hour",
                    "must be < weather.sunset_hour",
                ));
            }
            if w.sunset_hour > 24 {
                errors.push(ConfigError::new("weather.sunset_hour", "must be <= 24"));
            }
        }

        let l = &self.load;
        if l.csv_path.is_none() {
            non_negative(&mut errors, "load.daily_kwh", l.daily_kwh);
            non_negative(&mut errors, "load.daily_variability", l.daily_variability);
            non_negative(&mut errors, "load.hourly_variability", l.hourly_variability);
        }

        let i = &self.initial;
        for (field, value) in [
            ("initial.battery_temp_c", i.battery_temp_c),
            ("initial.inner_wall_temp_c", i.inner_wall_temp_c),
            ("initial.outer_wall_temp_c", i.outer_wall_temp_c),
        ] {
            if value.is_some_and(|v| !v.is_finite()) {
                errors.push(ConfigError::new(field, "must be finite"));
            }
        }

        errors
    }
}
