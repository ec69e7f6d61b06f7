use serde::Serialize;

use super::messages::Message;
use super::rules::{Agent, RuleTable, TickContext};
use super::types::AgentRef;
use crate::config::GuardConfig;

/// Supervisor state carried across ticks
///
/// # Invariants
/// - `drone_override_timer` is only non-zero while `drone_override` is set
/// - `call_cops` never reverts once raised
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuardState {
    pub alarm_count_begin: u32,
    pub alarm_count_end: u32,
    pub drone_override: bool,
    pub drone_override_timer: u32,
    pub initialize_panoramic_view: bool,
    pub personal_time: i32,
    pub alert_checks: u32,
    pub call_cops: bool,
    #[serde(skip)]
    limits: GuardConfig,
}

impl GuardState {
    pub fn new(limits: GuardConfig) -> Self {
        Self {
            alarm_count_begin: 0,
            alarm_count_end: 0,
            drone_override: false,
            drone_override_timer: 0,
            initialize_panoramic_view: false,
            personal_time: limits.personal_time,
            alert_checks: 0,
            call_cops: false,
            limits,
        }
    }

    /// Coarse phase, derived from the counters
    pub fn phase(&self) -> GuardPhase {
        if self.call_cops {
            GuardPhase::Escalated
        } else if self.drone_override {
            GuardPhase::Override
        } else if self.alarm_count_begin > 0 {
            GuardPhase::Escalating
        } else {
            GuardPhase::Normal
        }
    }

    fn escalated(&self) -> bool {
        self.alarm_count_begin >= self.limits.alarm_threshold
    }

    /// Starts an override episode with a fresh timer
    fn engage_override(&mut self) {
        self.initialize_panoramic_view = true;
        self.drone_override = true;
        self.drone_override_timer = 0;
    }

    /// Ends the current override episode and consumes its begin-alarms
    fn release_override(&mut self) {
        self.drone_override = false;
        self.initialize_panoramic_view = false;
        self.drone_override_timer = 0;
        self.alarm_count_begin = 0;
    }
}

/// Coarse guard phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardPhase {
    Normal,
    Escalating,
    Override,
    Escalated,
}

/// The supervising agent
#[derive(Debug)]
pub struct GuardAgent {
    pub state: GuardState,
    rules: RuleTable<GuardState>,
}

impl GuardAgent {
    pub fn new(limits: GuardConfig) -> Self {
        Self {
            state: GuardState::new(limits),
            rules: rule_table(),
        }
    }

    /// Engages the override between ticks, outside the rule table. The next
    /// guard turn re-evaluates it like any other override.
    pub fn trigger_panoramic(&mut self) {
        self.state.engage_override();
        tracing::info!(
            alarms = self.state.alarm_count_begin,
            "guard override triggered manually"
        );
    }

    /// Counts alarms on the channel. Once a drone confirmation has been
    /// counted the guard stops listening until it stands down.
    fn see(&mut self, ctx: &mut TickContext<'_>) {
        if self.state.alarm_count_end >= 1 {
            return;
        }

        match ctx.channel.peek().cloned() {
            Some(Message::VisionAlarm) => {
                self.state.alarm_count_begin += 1;
                ctx.channel.clear();
                tracing::debug!(
                    count = self.state.alarm_count_begin,
                    "guard counted begin-alarm"
                );
            }
            Some(Message::DroneFinalAlarm) => {
                self.state.alarm_count_end += 1;
                tracing::info!("guard counted drone confirmation");
            }
            _ => {}
        }
    }

    /// Override clock. Releases the override by itself when the window
    /// runs out, independently of `end_panoramic_analysis`.
    fn tick_override_clock(&mut self) {
        let state = &mut self.state;
        if !state.drone_override {
            return;
        }

        state.personal_time -= 1;
        state.drone_override_timer += 1;
        if state.drone_override_timer >= state.limits.override_window {
            state.release_override();
            tracing::info!(
                personal_time = state.personal_time,
                "drone override window elapsed"
            );
        }
    }
}

impl Agent for GuardAgent {
    fn agent_ref(&self) -> AgentRef {
        AgentRef::Guard
    }

    fn step(&mut self, ctx: &mut TickContext<'_>) -> Vec<&'static str> {
        self.see(ctx);
        self.tick_override_clock();
        self.rules.run(&mut self.state, ctx)
    }
}

fn rule_table() -> RuleTable<GuardState> {
    RuleTable::<GuardState>::new()
        .rule("basic_analysis", |s, _| !s.escalated(), basic_analysis)
        .rule(
            "panoramic_analysis",
            |s, _| s.escalated() && !s.drone_override,
            panoramic_analysis,
        )
        .rule(
            "end_panoramic_analysis",
            |s, _| {
                s.initialize_panoramic_view
                    && s.drone_override_timer >= s.limits.override_window
            },
            end_panoramic_analysis,
        )
        .rule(
            "start_drone_override",
            |s, _| s.escalated() && !s.drone_override,
            start_drone_override,
        )
        .rule(
            "check_drone_detection",
            |s, _| s.drone_override,
            check_drone_detection,
        )
        .rule(
            "stop_controlling_drone",
            |s, _| s.personal_time <= 0,
            stop_controlling_drone,
        )
        .rule(
            "call_cops",
            |s, _| s.personal_time == s.limits.call_cops_at,
            call_cops,
        )
}

fn basic_analysis(state: &mut GuardState, _ctx: &mut TickContext<'_>) {
    state.drone_override = false;
    state.initialize_panoramic_view = false;
    state.drone_override_timer = 0;
}

fn panoramic_analysis(state: &mut GuardState, ctx: &mut TickContext<'_>) {
    state.engage_override();
    tracing::info!(
        tick = ctx.tick,
        alarms = state.alarm_count_begin,
        "guard engaged drone override"
    );
}

fn end_panoramic_analysis(state: &mut GuardState, _ctx: &mut TickContext<'_>) {
    state.release_override();
    state.alert_checks = 0;
}

fn start_drone_override(state: &mut GuardState, ctx: &mut TickContext<'_>) {
    state.drone_override = true;
    ctx.channel.write(Message::DroneOverrideCommand);
}

fn check_drone_detection(_state: &mut GuardState, ctx: &mut TickContext<'_>) {
    if ctx.channel.holds(&Message::DroneFinalAlarm) {
        tracing::warn!(tick = ctx.tick, "intruder confirmed by drone");
    }
}

fn stop_controlling_drone(state: &mut GuardState, _ctx: &mut TickContext<'_>) {
    state.release_override();
    state.alarm_count_end = 0;
    state.personal_time = state.limits.personal_time;
    tracing::info!("guard stood down from drone control");
}

fn call_cops(state: &mut GuardState, ctx: &mut TickContext<'_>) {
    if !state.call_cops {
        tracing::warn!(tick = ctx.tick, "guard called the police");
    }
    state.call_cops = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::messages::Channel;

    fn step_with(guard: &mut GuardAgent, channel: &mut Channel, tick: u64) -> Vec<&'static str> {
        let mut ctx = TickContext::new(tick, channel);
        guard.step(&mut ctx)
    }

    fn escalate(guard: &mut GuardAgent, channel: &mut Channel) {
        for tick in 1..=3 {
            channel.write(Message::VisionAlarm);
            step_with(guard, channel, tick);
        }
    }

    #[test]
    fn rule_table_order() {
        let guard = GuardAgent::new(GuardConfig::default());
        assert_eq!(
            guard.rules.names(),
            vec![
                "basic_analysis",
                "panoramic_analysis",
                "end_panoramic_analysis",
                "start_drone_override",
                "check_drone_detection",
                "stop_controlling_drone",
                "call_cops",
            ]
        );
    }

    #[test]
    fn begin_alarm_is_counted_and_cleared() {
        let mut guard = GuardAgent::new(GuardConfig::default());
        let mut channel = Channel::new();
        channel.write(Message::VisionAlarm);

        let fired = step_with(&mut guard, &mut channel, 1);

        assert_eq!(guard.state.alarm_count_begin, 1);
        assert!(channel.peek().is_none());
        assert_eq!(fired, vec!["basic_analysis"]);
        assert_eq!(guard.state.phase(), GuardPhase::Escalating);
    }

    #[test]
    fn third_alarm_engages_override() {
        let mut guard = GuardAgent::new(GuardConfig::default());
        let mut channel = Channel::new();

        escalate(&mut guard, &mut channel);

        assert_eq!(guard.state.alarm_count_begin, 3);
        assert!(guard.state.drone_override);
        assert!(guard.state.initialize_panoramic_view);
        assert_eq!(guard.state.drone_override_timer, 0);
        assert_eq!(guard.state.personal_time, 30);
        assert_eq!(guard.state.phase(), GuardPhase::Override);
    }

    #[test]
    fn panoramic_analysis_shadows_start_drone_override() {
        let mut guard = GuardAgent::new(GuardConfig::default());
        let mut channel = Channel::new();
        channel.write(Message::VisionAlarm);
        step_with(&mut guard, &mut channel, 1);
        channel.write(Message::VisionAlarm);
        step_with(&mut guard, &mut channel, 2);
        channel.write(Message::VisionAlarm);

        let fired = step_with(&mut guard, &mut channel, 3);

        // override is already set by the time start_drone_override is reached
        assert_eq!(fired, vec!["panoramic_analysis", "check_drone_detection"]);
        assert!(channel.peek().is_none());
    }

    #[test]
    fn override_clears_after_window_without_input() {
        let mut guard = GuardAgent::new(GuardConfig::default());
        let mut channel = Channel::new();
        escalate(&mut guard, &mut channel);

        for tick in 4..=7 {
            step_with(&mut guard, &mut channel, tick);
            assert!(guard.state.drone_override, "released early at tick {}", tick);
            assert_eq!(guard.state.drone_override_timer, (tick - 3) as u32);
        }

        step_with(&mut guard, &mut channel, 8);
        assert!(!guard.state.drone_override);
        assert!(!guard.state.initialize_panoramic_view);
        assert_eq!(guard.state.drone_override_timer, 0);
        assert_eq!(guard.state.alarm_count_begin, 0);
        assert_eq!(guard.state.personal_time, 25);
    }

    #[test]
    fn timer_is_zero_whenever_override_is_off() {
        let mut guard = GuardAgent::new(GuardConfig::default());
        let mut channel = Channel::new();

        for tick in 1..=40 {
            if tick % 2 == 0 {
                channel.write(Message::VisionAlarm);
            }
            step_with(&mut guard, &mut channel, tick);
            if !guard.state.drone_override {
                assert_eq!(guard.state.drone_override_timer, 0);
            }
        }
    }

    #[test]
    fn drone_confirmation_latches_final_state() {
        let mut guard = GuardAgent::new(GuardConfig::default());
        let mut channel = Channel::new();
        channel.write(Message::DroneFinalAlarm);
        step_with(&mut guard, &mut channel, 1);
        assert_eq!(guard.state.alarm_count_end, 1);

        channel.write(Message::VisionAlarm);
        step_with(&mut guard, &mut channel, 2);

        assert_eq!(guard.state.alarm_count_begin, 0);
        assert!(channel.holds(&Message::VisionAlarm));
    }

    #[test]
    fn repeated_escalations_call_cops_then_stand_down() {
        let mut guard = GuardAgent::new(GuardConfig::default());
        let mut channel = Channel::new();
        let mut tick = 0;
        let mut cops_seen_at = None;
        let mut stood_down = false;

        // every override episode burns five ticks of personal time
        while tick < 200 && !stood_down {
            tick += 1;
            if !guard.state.drone_override {
                channel.write(Message::VisionAlarm);
            }
            let before = guard.state.personal_time;
            let fired = step_with(&mut guard, &mut channel, tick);
            if guard.state.call_cops && cops_seen_at.is_none() {
                cops_seen_at = Some(guard.state.personal_time);
            }
            if fired.contains(&"stop_controlling_drone") {
                assert_eq!(before, 1);
                stood_down = true;
            }
        }

        assert!(stood_down);
        assert_eq!(cops_seen_at, Some(3));
        assert!(guard.state.call_cops);
        // stop_controlling_drone fires on the tick personal time runs out
        assert_eq!(guard.state.personal_time, 30);
        assert_eq!(guard.state.alarm_count_begin, 0);
        assert!(!guard.state.drone_override);
    }

    #[test]
    fn manual_trigger_engages_until_next_turn() {
        let mut guard = GuardAgent::new(GuardConfig::default());
        let mut channel = Channel::new();

        guard.trigger_panoramic();
        assert!(guard.state.drone_override);
        assert!(guard.state.initialize_panoramic_view);
        assert_eq!(guard.state.phase(), GuardPhase::Override);

        // without enough alarms the baseline rule drops it again
        let fired = step_with(&mut guard, &mut channel, 1);
        assert_eq!(fired, vec!["basic_analysis"]);
        assert!(!guard.state.drone_override);
        assert_eq!(guard.state.drone_override_timer, 0);
        assert_eq!(guard.state.personal_time, 29);
    }

    #[test]
    fn snapshot_serializes_public_fields_only() {
        let guard = GuardAgent::new(GuardConfig::default());
        let json = serde_json::to_value(&guard.state).unwrap();
        assert_eq!(json["personal_time"], 30);
        assert_eq!(json["drone_override"], false);
        assert!(json.get("limits").is_none());
    }
}
