// Read-only exports of agent state for monitoring and tests

use serde::Serialize;

use super::camera::CameraState;
use super::drone::DroneState;
use super::guard::{GuardPhase, GuardState};
use super::messages::ChannelView;

/// Snapshot of a single agent
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "agent_type", rename_all = "lowercase")]
pub enum AgentSnapshot {
    Guard(GuardSnapshot),
    Camera(CameraState),
    Drone(DroneState),
}

/// Guard fields plus its derived phase
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuardSnapshot {
    #[serde(flatten)]
    pub state: GuardState,
    pub phase: GuardPhase,
}

impl From<&GuardState> for GuardSnapshot {
    fn from(state: &GuardState) -> Self {
        Self {
            state: state.clone(),
            phase: state.phase(),
        }
    }
}

/// Everything an observer needs to render one moment of the simulation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemSnapshot {
    pub tick: u64,
    pub channel: ChannelView,
    pub guard: GuardSnapshot,
    pub cameras: Vec<CameraState>,
    pub drone: DroneState,
}
