use thiserror::Error;

use crate::vision::OracleError;

/// Errors that can occur in the agent simulation
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Invalid channel write: {0}")]
    InvalidChannelWrite(String),

    #[error("Invalid detection label: {0}")]
    InvalidLabel(String),

    #[error("Invalid agent reference: {0}")]
    InvalidAgentRef(String),

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Oracle(#[from] OracleError),
}

pub type SimulationResult<T> = Result<T, SimulationError>;
