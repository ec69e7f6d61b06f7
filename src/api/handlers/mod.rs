pub mod agents;
pub mod channel;
pub mod simulation;
pub mod vision;
