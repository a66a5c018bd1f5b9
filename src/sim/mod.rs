/// Simulation step lengths and the time-grid clock.
pub mod clock;
pub mod engine;
/// Thermostatic heater state machine.
pub mod heater;
pub mod network;
pub mod summary;
pub mod types;
