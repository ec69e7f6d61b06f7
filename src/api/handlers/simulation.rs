use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::api::state::AppState;

/// Upper bound on ticks per request
const MAX_STEPS_PER_REQUEST: u32 = 10_000;

/// Request body for running several ticks
#[derive(Debug, Deserialize)]
pub struct StepManyRequest {
    #[serde(default = "default_steps")]
    pub steps: u32,
}

fn default_steps() -> u32 {
    1
}

/// Response after ticks were run
#[derive(Debug, Serialize, Deserialize)]
pub struct StepResponse {
    pub message: String,
    pub tick: u64,
}

/// Advance the simulation by one tick
///
/// POST /api/simulation/step
pub async fn step(State(state): State<AppState>) -> Json<StepResponse> {
    let mut simulation = state.simulation.lock().await;
    simulation.step();

    Json(StepResponse {
        message: "System moved".to_string(),
        tick: simulation.tick(),
    })
}

/// Advance the simulation by several ticks
///
/// POST /api/simulation/steps
pub async fn step_many(
    State(state): State<AppState>,
    Json(req): Json<StepManyRequest>,
) -> Result<Json<StepResponse>, ApiError> {
    if req.steps > MAX_STEPS_PER_REQUEST {
        return Err(ApiError::bad_request(format!(
            "steps must be at most {}",
            MAX_STEPS_PER_REQUEST
        )));
    }

    let mut simulation = state.simulation.lock().await;
    simulation.step_many(req.steps);

    Ok(Json(StepResponse {
        message: format!("Simulated {} steps", req.steps),
        tick: simulation.tick(),
    }))
}

/// Reset every agent and the channel
///
/// POST /api/simulation/reset
pub async fn reset(State(state): State<AppState>) -> Json<StepResponse> {
    let mut simulation = state.simulation.lock().await;
    simulation.reset();

    Json(StepResponse {
        message: "Simulation reset".to_string(),
        tick: simulation.tick(),
    })
}

/// Health check endpoint
///
/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}
