use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::Value;

use crate::agents::messages::ChannelView;
use crate::api::errors::ApiError;
use crate::api::state::AppState;

/// Request body for a channel write
///
/// Both fields are taken as raw JSON so that malformed values reach the
/// simulation's own validation and produce a 400.
#[derive(Debug, Deserialize)]
pub struct WriteChannelRequest {
    #[serde(default)]
    pub subject: Value,
    #[serde(default)]
    pub content: Option<Value>,
}

/// Read the channel slot
///
/// GET /api/channel
pub async fn read_channel(State(state): State<AppState>) -> Json<ChannelView> {
    let simulation = state.simulation.lock().await;
    Json(simulation.read_channel())
}

/// Overwrite the channel slot
///
/// POST /api/channel
pub async fn write_channel(
    State(state): State<AppState>,
    Json(req): Json<WriteChannelRequest>,
) -> Result<Json<ChannelView>, ApiError> {
    let mut simulation = state.simulation.lock().await;
    let view = simulation.write_channel(&req.subject, req.content.as_ref())?;
    Ok(Json(view))
}

/// Empty the channel slot
///
/// DELETE /api/channel
pub async fn clear_channel(State(state): State<AppState>) -> StatusCode {
    let mut simulation = state.simulation.lock().await;
    simulation.clear_channel();
    StatusCode::NO_CONTENT
}
