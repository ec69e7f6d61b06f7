use std::collections::VecDeque;

use serde::Serialize;

use super::messages::Message;
use super::rules::{Agent, RuleTable, TickContext};
use super::types::{lerp, AgentRef, Detection, Label, Position};
use crate::config::DroneConfig;

/// Patrol drone state
///
/// # Invariants
/// - `position_history` never holds more than `history_capacity` entries,
///   oldest first
/// - `target_pos` is only set while `guard_override` is set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroneState {
    #[serde(rename = "position")]
    pub pos: Position,
    pub detection: Detection,
    pub panoramic: bool,
    pub target_pos: Option<Position>,
    pub override_timer: u32,
    pub time_counter: u64,
    pub position_history: VecDeque<Position>,
    pub guard_override: bool,
    #[serde(skip)]
    motion: DroneConfig,
}

impl DroneState {
    pub fn new(motion: DroneConfig) -> Self {
        Self {
            pos: motion.start,
            detection: Detection::Unknown,
            panoramic: false,
            target_pos: None,
            override_timer: 0,
            time_counter: 0,
            position_history: VecDeque::with_capacity(motion.history_capacity + 1),
            guard_override: false,
            motion,
        }
    }

    /// Straight-line flight toward the override target
    fn fly_override(&mut self) {
        let target = match self.target_pos {
            Some(target) => target,
            None => {
                let target = self.motion.override_target;
                self.target_pos = Some(target);
                self.override_timer = 0;
                tracing::info!(?target, "drone flying guard override");
                target
            }
        };

        self.override_timer += 1;
        let progress =
            (self.override_timer as f64 / self.motion.override_duration as f64).min(1.0);
        self.pos = lerp(self.pos, target, progress);

        if self.override_timer >= self.motion.override_duration {
            self.guard_override = false;
            self.panoramic = false;
            self.target_pos = None;
            tracing::info!(position = ?self.pos, "drone override complete, resuming patrol");
        }
    }

    /// Piecewise-linear loop over the waypoints, driven by `time_counter`
    fn patrol(&mut self) {
        let waypoints = &self.motion.waypoints;
        let segment = self.motion.segment_duration;
        let t = self.time_counter % self.motion.patrol_period();

        let index = (t / segment) as usize;
        let from = waypoints[index];
        let to = waypoints[(index + 1) % waypoints.len()];
        let progress = (t % segment) as f64 / segment as f64;

        self.pos = lerp(from, to, progress);
    }

    fn record_position(&mut self) {
        self.position_history.push_back(self.pos);
        while self.position_history.len() > self.motion.history_capacity {
            self.position_history.pop_front();
        }
    }
}

/// The mobile patrol agent
#[derive(Debug)]
pub struct DroneAgent {
    pub state: DroneState,
    rules: RuleTable<DroneState>,
}

impl DroneAgent {
    pub fn new(motion: DroneConfig) -> Self {
        Self {
            state: DroneState::new(motion),
            rules: rule_table(),
        }
    }

    /// Oracle result delivered between ticks
    pub fn set_detection(&mut self, label: Label) {
        self.state.detection = label.into();
    }
}

impl Agent for DroneAgent {
    fn agent_ref(&self) -> AgentRef {
        AgentRef::Drone
    }

    fn step(&mut self, ctx: &mut TickContext<'_>) -> Vec<&'static str> {
        self.state.time_counter += 1;
        self.rules.run(&mut self.state, ctx)
    }
}

fn rule_table() -> RuleTable<DroneState> {
    RuleTable::<DroneState>::new()
        .rule(
            "alert_guard",
            |s, _| s.detection.is_yes() && !s.panoramic,
            alert_guard,
        )
        .rule("alert_guard_final", |s, _| s.detection.is_yes(), alert_guard_final)
        .rule(
            "check_guard_orders",
            |_, ctx| ctx.guard_override,
            check_guard_orders,
        )
        .rule("move", |_, _| true, move_drone)
}

fn alert_guard(_state: &mut DroneState, ctx: &mut TickContext<'_>) {
    ctx.channel.write(Message::DroneBeginAlarm);
}

fn alert_guard_final(_state: &mut DroneState, ctx: &mut TickContext<'_>) {
    ctx.channel.write(Message::DroneFinalAlarm);
}

fn check_guard_orders(state: &mut DroneState, ctx: &mut TickContext<'_>) {
    if !state.guard_override {
        tracing::info!(tick = ctx.tick, "drone accepted guard override");
    }
    state.guard_override = true;
    state.panoramic = true;
}

fn move_drone(state: &mut DroneState, _ctx: &mut TickContext<'_>) {
    if state.guard_override {
        state.fly_override();
    } else {
        state.patrol();
    }
    state.record_position();
}
