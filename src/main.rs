use std::sync::Arc;

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use sentinel_api::agents::Label;
use sentinel_api::api::{self, AppState};
use sentinel_api::config::{ServerConfig, SimulationConfig};
use sentinel_api::simulation::Simulation;
use sentinel_api::vision::ScriptedOracle;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenv::dotenv().ok();

    let server = ServerConfig::from_env().expect("Invalid server configuration");
    let config = SimulationConfig::from_env().expect("Invalid simulation configuration");

    // Offline oracle; label comes from the environment when set
    let fallback = match std::env::var("SENTINEL_ORACLE_LABEL") {
        Ok(raw) => Some(
            raw.trim()
                .to_ascii_uppercase()
                .parse::<Label>()
                .expect("SENTINEL_ORACLE_LABEL must be YES or NO"),
        ),
        Err(_) => {
            tracing::warn!("SENTINEL_ORACLE_LABEL not set, vision requests will fail");
            None
        }
    };
    let oracle = Arc::new(ScriptedOracle::new(fallback));

    tracing::info!(
        cameras = config.camera_count,
        "Starting simulation..."
    );
    let simulation = Simulation::new(config).expect("Failed to build simulation");

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = api::router(AppState::new(simulation, oracle))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = server.bind_address();
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app)
        .await
        .expect("Server failed");
}
