use std::sync::Arc;

use tokio::sync::Mutex;

use crate::simulation::Simulation;
use crate::vision::DetectionOracle;

/// Shared gateway state
///
/// The simulation sits behind a single mutex so that ticks, channel writes
/// and detection updates are applied one at a time.
#[derive(Clone)]
pub struct AppState {
    pub simulation: Arc<Mutex<Simulation>>,
    pub oracle: Arc<dyn DetectionOracle>,
}

impl AppState {
    pub fn new(simulation: Simulation, oracle: Arc<dyn DetectionOracle>) -> Self {
        Self {
            simulation: Arc::new(Mutex::new(simulation)),
            oracle,
        }
    }
}
