//! Simulation tunables and server settings.
//!
//! Defaults reproduce the reference scenario: four cameras, a guard that
//! escalates after three begin-alarms, and a drone patrolling a square.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::agents::errors::{SimulationError, SimulationResult};
use crate::agents::types::Position;

/// Guard escalation thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Begin-alarms needed before the guard takes over the drone
    pub alarm_threshold: u32,
    /// Ticks an override lasts before it is force-released
    pub override_window: u32,
    /// Override ticks the guard can spend before standing down
    pub personal_time: i32,
    /// `personal_time` value at which the police are called
    pub call_cops_at: i32,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            alarm_threshold: 3,
            override_window: 5,
            personal_time: 30,
            call_cops_at: 3,
        }
    }
}

/// Drone motion parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroneConfig {
    pub start: Position,
    /// Where the drone flies when the guard takes control
    pub override_target: Position,
    /// Ticks an override flight takes to reach the target
    pub override_duration: u32,
    /// Patrol corners, visited in order and looped
    pub waypoints: Vec<Position>,
    /// Ticks spent on each patrol segment
    pub segment_duration: u64,
    pub history_capacity: usize,
}

impl Default for DroneConfig {
    fn default() -> Self {
        Self {
            start: [0.0, 0.0, 0.0],
            override_target: [0.0, 40.0, 0.0],
            override_duration: 20,
            waypoints: vec![
                [-50.0, 40.0, -50.0],
                [50.0, 40.0, -50.0],
                [50.0, 40.0, 50.0],
                [-50.0, 40.0, 50.0],
            ],
            segment_duration: 100,
            history_capacity: 10,
        }
    }
}

impl DroneConfig {
    /// Length of one full patrol loop in ticks
    pub fn patrol_period(&self) -> u64 {
        self.waypoints.len() as u64 * self.segment_duration
    }
}

/// Everything needed to build a simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub camera_count: usize,
    pub guard: GuardConfig,
    pub drone: DroneConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            camera_count: 4,
            guard: GuardConfig::default(),
            drone: DroneConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Defaults overlaid with any `SENTINEL_*` environment variables
    pub fn from_env() -> SimulationResult<Self> {
        let mut config = Self::default();

        if let Some(v) = env_parse("SENTINEL_CAMERAS")? {
            config.camera_count = v;
        }
        if let Some(v) = env_parse("SENTINEL_ALARM_THRESHOLD")? {
            config.guard.alarm_threshold = v;
        }
        if let Some(v) = env_parse("SENTINEL_OVERRIDE_WINDOW")? {
            config.guard.override_window = v;
        }
        if let Some(v) = env_parse("SENTINEL_PERSONAL_TIME")? {
            config.guard.personal_time = v;
        }
        if let Some(v) = env_parse("SENTINEL_DRONE_OVERRIDE_TICKS")? {
            config.drone.override_duration = v;
        }
        if let Some(v) = env_parse("SENTINEL_SEGMENT_TICKS")? {
            config.drone.segment_duration = v;
        }

        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations the agents cannot run with
    pub fn validate(&self) -> SimulationResult<()> {
        if self.camera_count == 0 {
            return Err(SimulationError::Config("at least one camera is required".into()));
        }
        if self.guard.alarm_threshold == 0 {
            return Err(SimulationError::Config("alarm_threshold must be positive".into()));
        }
        if self.guard.override_window == 0 {
            return Err(SimulationError::Config("override_window must be positive".into()));
        }
        if self.drone.waypoints.is_empty() {
            return Err(SimulationError::Config("drone needs at least one waypoint".into()));
        }
        if self.drone.segment_duration == 0 || self.drone.override_duration == 0 {
            return Err(SimulationError::Config("drone durations must be positive".into()));
        }
        if self.drone.history_capacity == 0 {
            return Err(SimulationError::Config("history_capacity must be positive".into()));
        }
        Ok(())
    }
}

/// Gateway listener settings
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> SimulationResult<Self> {
        let host = std::env::var("SENTINEL_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env_parse("SENTINEL_PORT")?.unwrap_or(8585);
        Ok(Self { host, port })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_parse<T: FromStr>(key: &str) -> SimulationResult<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| SimulationError::Config(format!("{} has invalid value {:?}", key, raw))),
        Err(_) => Ok(None),
    }
}
