// Shared broadcast channel
//
// A single-slot, last-write-wins mailbox. Every agent polls it during its
// own turn; a write replaces whatever was there, observed or not.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::errors::{SimulationError, SimulationResult};
use super::types::Label;

const VISION: &str = "vision";
const DRONE_BEGIN: &str = "drone";
const DRONE_FINAL: &str = "Drone";
const GUARD: &str = "Guard";
const VISION_RESULT: &str = "vision_result";

/// Every message kind that can occupy the channel
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// First-stage intrusion report from a camera
    VisionAlarm,
    /// First-stage intrusion report from the drone
    DroneBeginAlarm,
    /// Confirmed intrusion from the drone
    DroneFinalAlarm,
    /// Guard taking control of the drone
    DroneOverrideCommand,
    /// Oracle result addressed to one camera
    VisionResult { target_id: usize, label: Label },
    /// Anything written by the gateway that no agent reacts to
    Custom { subjects: Vec<String>, content: Value },
}

impl Message {
    /// Subjects as they appear on the wire
    pub fn subjects(&self) -> Vec<String> {
        let subject = match self {
            Message::VisionAlarm => VISION,
            Message::DroneBeginAlarm => DRONE_BEGIN,
            Message::DroneFinalAlarm => DRONE_FINAL,
            Message::DroneOverrideCommand => GUARD,
            Message::VisionResult { .. } => VISION_RESULT,
            Message::Custom { subjects, .. } => return subjects.clone(),
        };
        vec![subject.to_string()]
    }

    /// Content as it appears on the wire
    pub fn content(&self) -> Value {
        match self {
            Message::VisionAlarm | Message::DroneFinalAlarm => json!("intruder"),
            Message::DroneBeginAlarm => json!("intruder begin"),
            Message::DroneOverrideCommand => json!("drone_override"),
            Message::VisionResult { target_id, label } => {
                json!({ "id": target_id, "result": label.as_str() })
            }
            Message::Custom { content, .. } => content.clone(),
        }
    }

    /// Validates a raw `(subjects, content)` pair and maps it onto a message kind
    ///
    /// # Validation Rules
    /// - `subjects` must be a non-empty array of non-empty strings
    /// - `content` must be present and not null or empty
    /// - a `vision_result` write must carry an integer `id` and a `YES`/`NO` `result`
    pub fn from_wire(subjects: &Value, content: Option<&Value>) -> SimulationResult<Self> {
        let subjects = parse_subjects(subjects)?;
        let content = match content {
            Some(value) if !is_blank(value) => value,
            _ => {
                return Err(SimulationError::InvalidChannelWrite(
                    "missing 'content'".to_string(),
                ))
            }
        };

        let single = match subjects.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        };
        let text = content.as_str();

        let message = match (single, text) {
            (Some(VISION), Some("intruder")) => Message::VisionAlarm,
            (Some(DRONE_BEGIN), Some("intruder begin")) => Message::DroneBeginAlarm,
            (Some(DRONE_FINAL), Some("intruder")) => Message::DroneFinalAlarm,
            (Some(GUARD), Some("drone_override")) => Message::DroneOverrideCommand,
            (Some(VISION_RESULT), _) => parse_vision_result(content)?,
            _ => Message::Custom {
                subjects,
                content: content.clone(),
            },
        };

        Ok(message)
    }
}

fn parse_subjects(subjects: &Value) -> SimulationResult<Vec<String>> {
    let items = subjects.as_array().ok_or_else(|| {
        SimulationError::InvalidChannelWrite("'subject' must be a list".to_string())
    })?;

    if items.is_empty() {
        return Err(SimulationError::InvalidChannelWrite(
            "'subject' must not be empty".to_string(),
        ));
    }

    items
        .iter()
        .map(|item| match item.as_str() {
            Some(s) if !s.is_empty() => Ok(s.to_string()),
            _ => Err(SimulationError::InvalidChannelWrite(format!(
                "subject entries must be non-empty strings, got {}",
                item
            ))),
        })
        .collect()
}

fn parse_vision_result(content: &Value) -> SimulationResult<Message> {
    let target_id = content
        .get("id")
        .and_then(Value::as_u64)
        .ok_or_else(|| {
            SimulationError::InvalidChannelWrite("vision_result needs an integer 'id'".to_string())
        })?;
    let label = content
        .get("result")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            SimulationError::InvalidChannelWrite("vision_result needs a 'result'".to_string())
        })?
        .parse::<Label>()?;
    let target_id = usize::try_from(target_id).map_err(|_| {
        SimulationError::InvalidChannelWrite(format!(
            "vision_result id {} is out of range",
            target_id
        ))
    })?;

    Ok(Message::VisionResult { target_id, label })
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

/// Wire view of the channel slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelView {
    pub subject: Vec<String>,
    pub content: Value,
}

impl ChannelView {
    /// What an empty channel reads as
    pub fn empty() -> Self {
        Self {
            subject: vec![String::new()],
            content: json!(""),
        }
    }
}

impl From<&Message> for ChannelView {
    fn from(message: &Message) -> Self {
        Self {
            subject: message.subjects(),
            content: message.content(),
        }
    }
}

/// Single-slot broadcast mailbox shared by all agents
#[derive(Debug, Clone, Default)]
pub struct Channel {
    slot: Option<Message>,
}

impl Channel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the slot, discarding any unobserved message
    pub fn write(&mut self, message: Message) {
        if let Some(previous) = self.slot.replace(message) {
            tracing::trace!(?previous, "channel message overwritten");
        }
    }

    /// Non-destructive peek at the current message
    pub fn peek(&self) -> Option<&Message> {
        self.slot.as_ref()
    }

    pub fn read(&self) -> ChannelView {
        self.slot
            .as_ref()
            .map(ChannelView::from)
            .unwrap_or_else(ChannelView::empty)
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }

    pub fn holds(&self, message: &Message) -> bool {
        self.slot.as_ref() == Some(message)
    }
}
