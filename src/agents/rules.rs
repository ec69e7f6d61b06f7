// Reflex rule engine
//
// Each agent owns an ordered table of (guard, action) records. Every tick
// the table is walked once in declaration order; an action runs as soon as
// its guard holds and its side effects are visible to every later guard.

use std::fmt;

use super::messages::Channel;
use super::types::AgentRef;

/// Per-tick view of shared state handed to each agent in turn
#[derive(Debug)]
pub struct TickContext<'a> {
    /// Tick number, starting at 1 for the first step
    pub tick: u64,
    pub channel: &'a mut Channel,
    /// Guard's `drone_override` flag as left by the guard's turn
    pub guard_override: bool,
}

impl<'a> TickContext<'a> {
    pub fn new(tick: u64, channel: &'a mut Channel) -> Self {
        Self {
            tick,
            channel,
            guard_override: false,
        }
    }
}

pub type RuleGuard<S> = fn(&S, &TickContext<'_>) -> bool;
pub type RuleAction<S> = fn(&mut S, &mut TickContext<'_>);

/// A named guard/action pair
pub struct Rule<S> {
    pub name: &'static str,
    pub guard: RuleGuard<S>,
    pub action: RuleAction<S>,
}

impl<S> fmt::Debug for Rule<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

/// Ordered rule table for one agent
pub struct RuleTable<S> {
    rules: Vec<Rule<S>>,
}

impl<S> RuleTable<S> {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Appends a rule; evaluation order is insertion order
    pub fn rule(mut self, name: &'static str, guard: RuleGuard<S>, action: RuleAction<S>) -> Self {
        self.rules.push(Rule {
            name,
            guard,
            action,
        });
        self
    }

    /// Walks the table once, firing every rule whose guard holds at the
    /// moment it is reached. Returns the names of the rules that fired.
    pub fn run(&self, state: &mut S, ctx: &mut TickContext<'_>) -> Vec<&'static str> {
        let mut fired = Vec::new();
        for rule in &self.rules {
            if (rule.guard)(state, ctx) {
                (rule.action)(state, ctx);
                fired.push(rule.name);
            }
        }
        fired
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<S> Default for RuleTable<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for RuleTable<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rules.iter().map(|r| r.name)).finish()
    }
}

/// An agent that observes and acts once per tick
pub trait Agent {
    fn agent_ref(&self) -> AgentRef;

    /// Observe, then run the rule table. Returns the fired rule names.
    fn step(&mut self, ctx: &mut TickContext<'_>) -> Vec<&'static str>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::messages::Message;

    #[derive(Default)]
    struct Counter {
        value: u32,
        doubled: bool,
    }

    fn counter_table() -> RuleTable<Counter> {
        RuleTable::<Counter>::new()
            .rule("bump", |s, _| s.value < 2, |s, _| s.value += 1)
            .rule(
                "double",
                |s, _| s.value >= 2 && !s.doubled,
                |s, _| {
                    s.value *= 2;
                    s.doubled = true;
                },
            )
            .rule("announce", |s, _| s.doubled, |_, ctx| {
                ctx.channel.write(Message::VisionAlarm)
            })
    }

    #[test]
    fn later_guards_see_earlier_effects_in_same_pass() {
        let table = counter_table();
        let mut channel = Channel::new();
        let mut state = Counter {
            value: 1,
            doubled: false,
        };

        let fired = table.run(&mut state, &mut TickContext::new(1, &mut channel));

        // bump takes value to 2, which immediately satisfies double, which
        // immediately satisfies announce
        assert_eq!(fired, vec!["bump", "double", "announce"]);
        assert_eq!(state.value, 4);
        assert!(channel.holds(&Message::VisionAlarm));
    }

    #[test]
    fn no_matching_guard_means_no_action() {
        let table = counter_table();
        let mut channel = Channel::new();
        let mut state = Counter {
            value: 3,
            doubled: true,
        };

        let fired = table.run(&mut state, &mut TickContext::new(1, &mut channel));

        assert_eq!(fired, vec!["announce"]);
        assert_eq!(state.value, 3);
    }

    #[test]
    fn order_is_declaration_order() {
        let table = counter_table();
        assert_eq!(table.names(), vec!["bump", "double", "announce"]);
        assert_eq!(table.len(), 3);
        assert!(!table.is_empty());
        assert!(RuleTable::<Counter>::default().is_empty());
    }

    #[test]
    fn earlier_rule_does_not_rerun_after_later_change() {
        // value starts at 0: bump fires once, double does not, so a single
        // pass never loops back to the top
        let table = counter_table();
        let mut channel = Channel::new();
        let mut state = Counter::default();

        let fired = table.run(&mut state, &mut TickContext::new(1, &mut channel));

        assert_eq!(fired, vec!["bump"]);
        assert_eq!(state.value, 1);
    }
}
