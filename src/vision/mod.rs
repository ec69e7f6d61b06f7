// Detection oracle interface
//
// The image classifier lives outside the simulation. The gateway calls it
// between ticks and feeds the resulting label in through
// `Simulation::set_detection`.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agents::types::{AgentRef, Label};

/// Errors reported by a detection oracle
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OracleError {
    #[error("{0}")]
    Unavailable(String),

    #[error("Unrecognized vision answer: {0}")]
    UnrecognizedAnswer(String),

    #[error("No image data provided")]
    EmptyImage,
}

/// One classification request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionRequest {
    pub agent: AgentRef,
    /// Base64-encoded JPEG frame
    pub image: String,
}

/// Turns an image into an intruder / no-intruder label
#[async_trait]
pub trait DetectionOracle: Send + Sync {
    async fn classify(&self, request: &VisionRequest) -> Result<Label, OracleError>;
}

/// Normalises a free-text classifier answer into a label
///
/// Accepts answers whose first word is `yes` or `no` in any case, ignoring
/// surrounding whitespace and trailing punctuation.
///
/// # Example
/// ```
/// use sentinel_api::agents::Label;
/// use sentinel_api::vision::parse_label;
///
/// assert_eq!(parse_label(" Yes.").unwrap(), Label::Yes);
/// assert_eq!(parse_label("NO, camera 2 is clear").unwrap(), Label::No);
/// assert!(parse_label("unclear").is_err());
/// ```
pub fn parse_label(answer: &str) -> Result<Label, OracleError> {
    let first = answer
        .split(|c: char| c.is_whitespace() || c == ',' || c == '.' || c == '!')
        .find(|word| !word.is_empty())
        .unwrap_or("");

    match first.to_ascii_uppercase().as_str() {
        "YES" => Ok(Label::Yes),
        "NO" => Ok(Label::No),
        _ => Err(OracleError::UnrecognizedAnswer(answer.trim().to_string())),
    }
}

/// Oracle that replays canned answers
///
/// Queued answers are consumed in order; once exhausted the fallback label
/// is returned, or `Unavailable` when there is none. Used for offline runs
/// and tests.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    answers: Mutex<VecDeque<Result<String, OracleError>>>,
    fallback: Option<Label>,
}

impl ScriptedOracle {
    pub fn new(fallback: Option<Label>) -> Self {
        Self {
            answers: Mutex::new(VecDeque::new()),
            fallback,
        }
    }

    /// Queues a raw classifier answer, parsed with [`parse_label`]
    pub fn push_answer(&self, answer: impl Into<String>) {
        self.queue(Ok(answer.into()));
    }

    pub fn push_error(&self, error: OracleError) {
        self.queue(Err(error));
    }

    fn queue(&self, item: Result<String, OracleError>) {
        match self.answers.lock() {
            Ok(mut answers) => answers.push_back(item),
            Err(poisoned) => poisoned.into_inner().push_back(item),
        }
    }

    fn next_answer(&self) -> Option<Result<String, OracleError>> {
        match self.answers.lock() {
            Ok(mut answers) => answers.pop_front(),
            Err(poisoned) => poisoned.into_inner().pop_front(),
        }
    }
}

#[async_trait]
impl DetectionOracle for ScriptedOracle {
    async fn classify(&self, request: &VisionRequest) -> Result<Label, OracleError> {
        if request.image.trim().is_empty() {
            return Err(OracleError::EmptyImage);
        }

        match self.next_answer() {
            Some(answer) => parse_label(&answer?),
            None => self
                .fallback
                .ok_or_else(|| OracleError::Unavailable("no classifier configured".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> VisionRequest {
        VisionRequest {
            agent: AgentRef::Camera(0),
            image: "aGVsbG8=".to_string(),
        }
    }

    #[test]
    fn parse_label_handles_chatty_answers() {
        assert_eq!(parse_label("YES").unwrap(), Label::Yes);
        assert_eq!(parse_label("yes! intruder near camera 1").unwrap(), Label::Yes);
        assert_eq!(parse_label("\nNo.").unwrap(), Label::No);
    }

    #[test]
    fn parse_label_rejects_other_words() {
        assert_eq!(
            parse_label("  nope "),
            Err(OracleError::UnrecognizedAnswer("nope".to_string()))
        );
        assert!(parse_label("").is_err());
        assert!(parse_label("yesterday").is_err());
    }

    #[tokio::test]
    async fn scripted_oracle_replays_then_falls_back() {
        let oracle = ScriptedOracle::new(Some(Label::No));
        oracle.push_answer("YES");
        oracle.push_error(OracleError::Unavailable("timeout".to_string()));

        assert_eq!(oracle.classify(&request()).await, Ok(Label::Yes));
        assert_eq!(
            oracle.classify(&request()).await,
            Err(OracleError::Unavailable("timeout".to_string()))
        );
        assert_eq!(oracle.classify(&request()).await, Ok(Label::No));
    }

    #[tokio::test]
    async fn scripted_oracle_without_fallback_is_unavailable() {
        let oracle = ScriptedOracle::default();
        let result = oracle.classify(&request()).await;
        assert!(matches!(result, Err(OracleError::Unavailable(_))));
    }

    #[tokio::test]
    async fn empty_image_is_rejected_before_classification() {
        let oracle = ScriptedOracle::new(Some(Label::Yes));
        oracle.push_answer("YES");
        let empty = VisionRequest {
            agent: AgentRef::Drone,
            image: "   ".to_string(),
        };

        assert_eq!(oracle.classify(&empty).await, Err(OracleError::EmptyImage));
        // the queued answer is still there
        assert_eq!(oracle.classify(&request()).await, Ok(Label::Yes));
    }
}
