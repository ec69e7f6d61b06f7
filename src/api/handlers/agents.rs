use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::agents::state::{AgentSnapshot, SystemSnapshot};
use crate::agents::types::{AgentRef, Label};
use crate::api::errors::ApiError;
use crate::api::state::AppState;

/// Request body for delivering a detection label
#[derive(Debug, Deserialize)]
pub struct DetectionRequest {
    pub agent_type: String,
    pub id: Option<usize>,
    pub result: String,
}

/// Response after a detection label was stored
#[derive(Debug, Serialize, Deserialize)]
pub struct DetectionResponse {
    pub message: String,
    pub agent: AgentRef,
    pub result: Label,
}

/// Snapshot of every agent and the channel
///
/// GET /api/agents
pub async fn system_snapshot(State(state): State<AppState>) -> Json<SystemSnapshot> {
    let simulation = state.simulation.lock().await;
    Json(simulation.system_snapshot())
}

/// GET /api/agents/guard
pub async fn guard_snapshot(State(state): State<AppState>) -> Result<Json<AgentSnapshot>, ApiError> {
    snapshot(&state, AgentRef::Guard).await
}

/// GET /api/agents/drone
pub async fn drone_snapshot(State(state): State<AppState>) -> Result<Json<AgentSnapshot>, ApiError> {
    snapshot(&state, AgentRef::Drone).await
}

/// GET /api/agents/cameras/:id
pub async fn camera_snapshot(
    State(state): State<AppState>,
    Path(id): Path<usize>,
) -> Result<Json<AgentSnapshot>, ApiError> {
    snapshot(&state, AgentRef::Camera(id)).await
}

/// Engage the guard's panoramic analysis by hand
///
/// POST /api/agents/guard/panoramic
pub async fn trigger_panoramic(
    State(state): State<AppState>,
) -> Result<Json<AgentSnapshot>, ApiError> {
    let mut simulation = state.simulation.lock().await;
    simulation.trigger_panoramic();
    Ok(Json(simulation.snapshot(AgentRef::Guard)?))
}

async fn snapshot(state: &AppState, agent: AgentRef) -> Result<Json<AgentSnapshot>, ApiError> {
    let simulation = state.simulation.lock().await;
    Ok(Json(simulation.snapshot(agent)?))
}

/// Store a detection label on a camera or the drone
///
/// POST /api/agents/detection
pub async fn set_detection(
    State(state): State<AppState>,
    Json(req): Json<DetectionRequest>,
) -> Result<Json<DetectionResponse>, ApiError> {
    let agent = AgentRef::from_parts(&req.agent_type, req.id)?;
    let label: Label = req.result.trim().to_ascii_uppercase().parse()?;

    let mut simulation = state.simulation.lock().await;
    simulation.set_detection(agent, label)?;

    Ok(Json(DetectionResponse {
        message: "Vision result updated successfully".to_string(),
        agent,
        result: label,
    }))
}
