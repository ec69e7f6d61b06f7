// Agent coordination engine
//
// Reflex agents (guard, cameras, drone) that react to a shared broadcast
// channel through ordered rule tables.

pub mod camera;
pub mod drone;
pub mod errors;
pub mod guard;
pub mod messages;
pub mod rules;
pub mod state;
pub mod types;

// Re-export main types
pub use camera::{CameraAgent, CameraState};
pub use drone::{DroneAgent, DroneState};
pub use errors::{SimulationError, SimulationResult};
pub use guard::{GuardAgent, GuardPhase, GuardState};
pub use messages::{Channel, ChannelView, Message};
pub use rules::{Agent, RuleTable, TickContext};
pub use state::{AgentSnapshot, GuardSnapshot, SystemSnapshot};
pub use types::{AgentRef, Detection, Label, Position};
