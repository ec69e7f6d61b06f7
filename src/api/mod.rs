// API layer module (adapters for controllers)
// Thin gateway: every handler forwards to the simulation

pub mod errors;
pub mod handlers;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};

use handlers::{agents, channel, simulation, vision};
pub use state::AppState;

/// Builds the gateway router
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(simulation::health_check))
        // Tick control
        .route("/api/simulation/step", post(simulation::step))
        .route("/api/simulation/steps", post(simulation::step_many))
        .route("/api/simulation/reset", post(simulation::reset))
        // Channel
        .route(
            "/api/channel",
            get(channel::read_channel)
                .post(channel::write_channel)
                .delete(channel::clear_channel),
        )
        // Agents
        .route("/api/agents", get(agents::system_snapshot))
        .route("/api/agents/guard", get(agents::guard_snapshot))
        .route("/api/agents/guard/panoramic", post(agents::trigger_panoramic))
        .route("/api/agents/drone", get(agents::drone_snapshot))
        .route("/api/agents/cameras/:id", get(agents::camera_snapshot))
        .route("/api/agents/detection", post(agents::set_detection))
        // Vision oracle
        .route("/api/vision", post(vision::classify))
        .route("/api/vision/final", post(vision::confirm))
        .with_state(state)
}
