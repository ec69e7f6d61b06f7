use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::agents::errors::SimulationError;
use crate::agents::messages::Message;
use crate::agents::types::{AgentRef, Label};
use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::vision::VisionRequest;

/// Request body for classifying a frame
#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub agent_type: String,
    pub id: Option<usize>,
    pub image: Option<String>,
}

/// Response after a frame was classified and applied
#[derive(Debug, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub message: String,
    pub agent: AgentRef,
    pub result: Label,
}

/// Request body for a drone confirmation frame
#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub image: Option<String>,
}

/// Response after a drone confirmation frame was classified
#[derive(Debug, Serialize, Deserialize)]
pub struct ConfirmResponse {
    pub message: String,
    pub result: Label,
    /// Whether a confirmed intrusion was put on the channel
    pub broadcast: bool,
}

/// Classify a frame with the detection oracle and store the label
///
/// The oracle is called without holding the simulation lock, so ticks are
/// never delayed by it. On oracle failure no agent is updated.
///
/// POST /api/vision
pub async fn classify(
    State(state): State<AppState>,
    Json(req): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, ApiError> {
    let agent = AgentRef::from_parts(&req.agent_type, req.id)?;
    let image = require_image(req.image)?;

    state.simulation.lock().await.ensure_detector(agent)?;

    let label = ask_oracle(&state, VisionRequest { agent, image }).await?;

    state.simulation.lock().await.set_detection(agent, label)?;

    Ok(Json(ClassifyResponse {
        message: "Vision processing successful".to_string(),
        agent,
        result: label,
    }))
}

/// Classify a drone frame and broadcast a confirmed intrusion on YES
///
/// No agent's detection is touched; a NO answer leaves the channel as is.
///
/// POST /api/vision/final
pub async fn confirm(
    State(state): State<AppState>,
    Json(req): Json<ConfirmRequest>,
) -> Result<Json<ConfirmResponse>, ApiError> {
    let image = require_image(req.image)?;
    let request = VisionRequest {
        agent: AgentRef::Drone,
        image,
    };
    let label = ask_oracle(&state, request).await?;

    let broadcast = label == Label::Yes;
    if broadcast {
        state.simulation.lock().await.broadcast(Message::DroneFinalAlarm);
    }

    Ok(Json(ConfirmResponse {
        message: "Vision processing successful".to_string(),
        result: label,
        broadcast,
    }))
}

fn require_image(image: Option<String>) -> Result<String, ApiError> {
    image
        .filter(|image| !image.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing 'image' in request body"))
}

/// Calls the oracle without holding the simulation lock
async fn ask_oracle(state: &AppState, request: VisionRequest) -> Result<Label, ApiError> {
    let agent = request.agent;
    let label = state.oracle.classify(&request).await.map_err(|e| {
        tracing::warn!(%agent, error = %e, "vision oracle failed");
        SimulationError::from(e)
    })?;
    Ok(label)
}
