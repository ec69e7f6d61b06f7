use serde::{Deserialize, Serialize};

use super::errors::{SimulationError, SimulationResult};

/// A point in the simulated site, `[x, y, z]`
pub type Position = [f64; 3];

/// Linear interpolation between two positions
pub fn lerp(from: Position, to: Position, t: f64) -> Position {
    [
        from[0] + (to[0] - from[0]) * t,
        from[1] + (to[1] - from[1]) * t,
        from[2] + (to[2] - from[2]) * t,
    ]
}

/// Binary answer produced by the detection oracle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Label {
    Yes,
    No,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Yes => "YES",
            Label::No => "NO",
        }
    }
}

impl std::str::FromStr for Label {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "YES" => Ok(Label::Yes),
            "NO" => Ok(Label::No),
            other => Err(SimulationError::InvalidLabel(format!(
                "expected YES or NO, got {:?}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detection state carried by cameras and the drone
///
/// Starts as `Unknown` until the oracle (or a vision-result broadcast)
/// delivers a label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Detection {
    #[default]
    Unknown,
    Yes,
    No,
}

impl Detection {
    pub fn is_yes(&self) -> bool {
        matches!(self, Detection::Yes)
    }
}

impl From<Label> for Detection {
    fn from(label: Label) -> Self {
        match label {
            Label::Yes => Detection::Yes,
            Label::No => Detection::No,
        }
    }
}

/// Reference to a single agent in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "agent_type", content = "id", rename_all = "lowercase")]
pub enum AgentRef {
    Guard,
    Camera(usize),
    Drone,
}

impl AgentRef {
    /// Builds a reference from the gateway's `(agent_type, id)` pair
    ///
    /// # Example
    /// ```
    /// use sentinel_api::agents::AgentRef;
    ///
    /// assert_eq!(AgentRef::from_parts("camera", Some(2)).unwrap(), AgentRef::Camera(2));
    /// assert_eq!(AgentRef::from_parts("drone", None).unwrap(), AgentRef::Drone);
    /// assert!(AgentRef::from_parts("camera", None).is_err());
    /// ```
    pub fn from_parts(agent_type: &str, id: Option<usize>) -> SimulationResult<Self> {
        match (agent_type.to_ascii_lowercase().as_str(), id) {
            ("guard", _) => Ok(AgentRef::Guard),
            ("drone", _) => Ok(AgentRef::Drone),
            ("camera", Some(id)) => Ok(AgentRef::Camera(id)),
            ("camera", None) => Err(SimulationError::InvalidAgentRef(
                "missing 'id' for camera agent".to_string(),
            )),
            (other, _) => Err(SimulationError::InvalidAgentRef(format!(
                "unknown agent type: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for AgentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentRef::Guard => write!(f, "guard"),
            AgentRef::Camera(id) => write!(f, "camera-{}", id),
            AgentRef::Drone => write!(f, "drone"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_endpoints_and_midpoint() {
        let a = [0.0, 40.0, -50.0];
        let b = [10.0, 40.0, 50.0];
        assert_eq!(lerp(a, b, 0.0), a);
        assert_eq!(lerp(a, b, 1.0), b);
        assert_eq!(lerp(a, b, 0.5), [5.0, 40.0, 0.0]);
    }

    #[test]
    fn label_parses_only_upper_case_words() {
        assert_eq!("YES".parse::<Label>().unwrap(), Label::Yes);
        assert_eq!("NO".parse::<Label>().unwrap(), Label::No);
        assert!("maybe".parse::<Label>().is_err());
    }

    #[test]
    fn detection_defaults_to_unknown() {
        assert_eq!(Detection::default(), Detection::Unknown);
        assert_eq!(Detection::from(Label::Yes), Detection::Yes);
        assert!(!Detection::No.is_yes());
    }

    #[test]
    fn agent_ref_rejects_unknown_type() {
        let err = AgentRef::from_parts("satellite", Some(1)).unwrap_err();
        assert!(matches!(err, SimulationError::InvalidAgentRef(_)));
    }

    #[test]
    fn agent_ref_display() {
        assert_eq!(AgentRef::Camera(3).to_string(), "camera-3");
        assert_eq!(AgentRef::Guard.to_string(), "guard");
    }
}
