//! Thermal simulator for a battery housed in an insulated container.
//!
//! A [`model::ThermalModel`] is built once from battery and container
//! configuration, then [`sim::engine::Engine`] steps it through an aligned
//! weather and load series, recording one [`sim::types::ResultRow`] per step.

pub mod cli;
pub mod config;
pub mod error;
/// Weather and load feeds aligned onto the simulation grid.
pub mod input;
pub mod io;
pub mod model;
/// Simulation engine, heat-flow network, heater controller, and summaries.
pub mod sim;
pub mod telemetry;
