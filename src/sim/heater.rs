//! Thermostatic heater controller with a minimum on-time.

use tracing::debug;

use crate::config::HeaterConfig;
use crate::error::ConfigError;

/// Heater output for one step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeaterOutput {
    pub on: bool,
    /// Electrical power drawn during the step (W).
    pub power_w: f64,
    /// Portion delivered into the battery (W).
    pub to_battery_w: f64,
    /// Portion lost to the enclosed air (W).
    pub to_air_w: f64,
}

/// Two-state (Off/On) heater controller.
///
/// The decision for a step is taken from the battery temperature at the end
/// of the previous step:
///
/// - Off → On when the heater is enabled, has power, and the battery is
///   below the trigger temperature.
/// - On → Off once it has run for at least the minimum on-time and the
///   battery has recovered to the trigger temperature.
///
/// The controller holds no randomness; identical inputs give identical
/// on/off sequences.
#[derive(Debug, Clone)]
pub struct HeaterController {
    enabled: bool,
    power_w: f64,
    trigger_temp_c: f64,
    min_on_s: f64,
    battery_fraction: f64,
    is_on: bool,
    elapsed_on_s: f64,
    activations: usize,
}

impl HeaterController {
    /// Creates a controller in the Off state.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for negative power or minimum on-time, a
    /// non-finite trigger, or a transfer fraction outside `[0, 1]`.
    pub fn new(config: &HeaterConfig) -> Result<Self, ConfigError> {
        let mut errors = Vec::new();
        config.validate_into(&mut errors);
        if let Some(first) = errors.into_iter().next() {
            return Err(first);
        }
        Ok(Self {
            enabled: config.enabled,
            power_w: config.power_w,
            trigger_temp_c: config.trigger_temp_c,
            min_on_s: config.min_on_minutes * 60.0,
            battery_fraction: config.battery_transfer_fraction,
            is_on: false,
            elapsed_on_s: 0.0,
            activations: 0,
        })
    }

    pub fn is_on(&self) -> bool {
        self.is_on
    }

    /// Minimum on-time still owed before the heater may switch off (s).
    pub fn remaining_on_time_s(&self) -> f64 {
        if self.is_on {
            (self.min_on_s - self.elapsed_on_s).max(0.0)
        } else {
            0.0
        }
    }

    /// Number of Off → On transitions so far.
    pub fn activations(&self) -> usize {
        self.activations
    }

    /// Advances the state machine by one step of `dt_s` seconds.
    pub fn step(&mut self, prev_battery_c: f64, dt_s: f64) -> HeaterOutput {
        if self.is_on {
            if self.elapsed_on_s >= self.min_on_s && prev_battery_c >= self.trigger_temp_c {
                self.is_on = false;
                self.elapsed_on_s = 0.0;
                debug!(battery_c = prev_battery_c, "heater off");
            }
        } else if self.enabled && self.power_w > 0.0 && prev_battery_c < self.trigger_temp_c {
            self.is_on = true;
            self.elapsed_on_s = 0.0;
            self.activations += 1;
            debug!(battery_c = prev_battery_c, "heater on");
        }

        if !self.is_on {
            return HeaterOutput::default();
        }

        self.elapsed_on_s += dt_s;
        let to_battery_w = self.power_w * self.battery_fraction;
        HeaterOutput {
            on: true,
            power_w: self.power_w,
            to_battery_w,
            to_air_w: self.power_w - to_battery_w,
        }
    }
}
