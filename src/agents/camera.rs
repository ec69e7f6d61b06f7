use serde::Serialize;

use super::messages::Message;
use super::rules::{Agent, RuleTable, TickContext};
use super::types::{AgentRef, Detection, Label};

/// Fixed sensor state
///
/// # Invariants
/// - `locked` is a latch: once set it is never cleared
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraState {
    pub id: usize,
    pub detection: Detection,
    pub locked: bool,
    pub alert_checks: u32,
}

impl CameraState {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            detection: Detection::Unknown,
            locked: false,
            alert_checks: 0,
        }
    }
}

/// One fixed camera with its own rule table
#[derive(Debug)]
pub struct CameraAgent {
    pub state: CameraState,
    rules: RuleTable<CameraState>,
}

impl CameraAgent {
    pub fn new(id: usize) -> Self {
        Self {
            state: CameraState::new(id),
            rules: rule_table(),
        }
    }

    /// Oracle result delivered between ticks
    pub fn set_detection(&mut self, label: Label) {
        self.state.detection = label.into();
    }

    fn see(&mut self, ctx: &TickContext<'_>) {
        if ctx.channel.holds(&Message::DroneBeginAlarm) {
            self.state.alert_checks += 1;
        }
    }
}

impl Agent for CameraAgent {
    fn agent_ref(&self) -> AgentRef {
        AgentRef::Camera(self.state.id)
    }

    fn step(&mut self, ctx: &mut TickContext<'_>) -> Vec<&'static str> {
        self.see(ctx);
        self.rules.run(&mut self.state, ctx)
    }
}

fn rule_table() -> RuleTable<CameraState> {
    RuleTable::<CameraState>::new()
        .rule("update_vision_result", |_, _| true, update_vision_result)
        .rule(
            "lock_in",
            |s, _| !s.locked && (s.detection.is_yes() || s.alert_checks > 0),
            lock_in,
        )
        .rule(
            "alert_guard",
            |s, _| s.detection.is_yes() && s.locked,
            alert_guard,
        )
}

fn update_vision_result(state: &mut CameraState, ctx: &mut TickContext<'_>) {
    if let Some(Message::VisionResult { target_id, label }) = ctx.channel.peek() {
        if *target_id == state.id {
            state.detection = (*label).into();
        }
    }
}

fn lock_in(state: &mut CameraState, _ctx: &mut TickContext<'_>) {
    state.locked = true;
    tracing::info!(camera = state.id, "camera locked on target");
}

fn alert_guard(_state: &mut CameraState, ctx: &mut TickContext<'_>) {
    ctx.channel.write(Message::VisionAlarm);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::messages::Channel;

    fn step_with(camera: &mut CameraAgent, channel: &mut Channel) -> Vec<&'static str> {
        let mut ctx = TickContext::new(1, channel);
        camera.step(&mut ctx)
    }

    #[test]
    fn idle_camera_only_checks_vision_results() {
        let mut camera = CameraAgent::new(0);
        let mut channel = Channel::new();

        let fired = step_with(&mut camera, &mut channel);

        assert_eq!(fired, vec!["update_vision_result"]);
        assert!(!camera.state.locked);
        assert!(channel.peek().is_none());
    }

    #[test]
    fn positive_detection_locks_and_alerts_in_one_tick() {
        let mut camera = CameraAgent::new(1);
        let mut channel = Channel::new();
        camera.set_detection(Label::Yes);

        let fired = step_with(&mut camera, &mut channel);

        assert_eq!(fired, vec!["update_vision_result", "lock_in", "alert_guard"]);
        assert!(camera.state.locked);
        assert!(channel.holds(&Message::VisionAlarm));
    }

    #[test]
    fn vision_result_only_applies_to_addressed_camera() {
        let mut mine = CameraAgent::new(2);
        let mut other = CameraAgent::new(3);
        let mut channel = Channel::new();
        channel.write(Message::VisionResult {
            target_id: 2,
            label: Label::Yes,
        });

        step_with(&mut mine, &mut channel);
        // mine alerted and overwrote the slot, put the result back for the other
        channel.write(Message::VisionResult {
            target_id: 2,
            label: Label::Yes,
        });
        step_with(&mut other, &mut channel);

        assert_eq!(mine.state.detection, Detection::Yes);
        assert_eq!(other.state.detection, Detection::Unknown);
    }

    #[test]
    fn drone_begin_alarm_locks_without_alerting() {
        let mut camera = CameraAgent::new(0);
        let mut channel = Channel::new();
        channel.write(Message::DroneBeginAlarm);

        let fired = step_with(&mut camera, &mut channel);

        assert_eq!(camera.state.alert_checks, 1);
        assert!(camera.state.locked);
        assert_eq!(fired, vec!["update_vision_result", "lock_in"]);
        assert!(channel.holds(&Message::DroneBeginAlarm));
    }

    #[test]
    fn lock_is_monotonic() {
        let mut camera = CameraAgent::new(0);
        let mut channel = Channel::new();
        camera.set_detection(Label::Yes);
        step_with(&mut camera, &mut channel);
        assert!(camera.state.locked);

        let inputs = [
            Some(Label::No),
            None,
            Some(Label::Yes),
            Some(Label::No),
            None,
        ];
        for input in inputs {
            if let Some(label) = input {
                camera.set_detection(label);
            }
            channel.clear();
            step_with(&mut camera, &mut channel);
            assert!(camera.state.locked);
        }
    }

    #[test]
    fn locked_camera_with_negative_detection_stays_quiet() {
        let mut camera = CameraAgent::new(0);
        let mut channel = Channel::new();
        channel.write(Message::DroneBeginAlarm);
        step_with(&mut camera, &mut channel);
        channel.clear();
        camera.set_detection(Label::No);

        let fired = step_with(&mut camera, &mut channel);

        assert_eq!(fired, vec!["update_vision_result"]);
        assert!(channel.peek().is_none());
    }
}
