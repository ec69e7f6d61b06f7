//! Sentinel API Library
//!
//! Reflex-agent surveillance simulation: a guard, a set of fixed cameras and
//! a patrol drone coordinating through a single shared broadcast channel,
//! plus the thin HTTP gateway that drives it.

pub mod agents;
pub mod api;
pub mod config;
pub mod simulation;
pub mod vision;

pub use config::SimulationConfig;
pub use simulation::Simulation;
