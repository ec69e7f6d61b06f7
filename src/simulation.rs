//! Tick orchestration and the external interface of the agent engine.
//!
//! One [`Simulation::step`] advances every agent exactly once, in a fixed
//! order: guard, cameras by ascending id, drone. Later agents observe the
//! channel as earlier agents left it within the same tick.

use serde_json::Value;

use crate::agents::camera::CameraAgent;
use crate::agents::drone::DroneAgent;
use crate::agents::errors::{SimulationError, SimulationResult};
use crate::agents::guard::GuardAgent;
use crate::agents::messages::{Channel, ChannelView, Message};
use crate::agents::rules::{Agent, TickContext};
use crate::agents::state::{AgentSnapshot, GuardSnapshot, SystemSnapshot};
use crate::agents::types::{AgentRef, Label};
use crate::config::SimulationConfig;

/// The surveillance scenario: one guard, N cameras, one drone and the
/// channel they share
#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    tick: u64,
    channel: Channel,
    guard: GuardAgent,
    cameras: Vec<CameraAgent>,
    drone: DroneAgent,
}

impl Simulation {
    /// Builds a fresh simulation after validating the configuration
    pub fn new(config: SimulationConfig) -> SimulationResult<Self> {
        config.validate()?;

        let cameras = (0..config.camera_count).map(CameraAgent::new).collect();
        Ok(Self {
            tick: 0,
            channel: Channel::new(),
            guard: GuardAgent::new(config.guard.clone()),
            cameras,
            drone: DroneAgent::new(config.drone.clone()),
            config,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Number of completed ticks
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Advances exactly one tick
    pub fn step(&mut self) {
        self.tick += 1;
        let span = tracing::debug_span!("tick", tick = self.tick);
        let _entered = span.enter();

        let mut ctx = TickContext::new(self.tick, &mut self.channel);

        run_agent(&mut self.guard, &mut ctx);
        ctx.guard_override = self.guard.state.drone_override;

        for camera in &mut self.cameras {
            run_agent(camera, &mut ctx);
        }

        run_agent(&mut self.drone, &mut ctx);
    }

    /// Advances `count` ticks
    pub fn step_many(&mut self, count: u32) {
        for _ in 0..count {
            self.step();
        }
    }

    /// Discards all agent state and the channel contents
    pub fn reset(&mut self) {
        self.tick = 0;
        self.channel = Channel::new();
        self.guard = GuardAgent::new(self.config.guard.clone());
        self.cameras = (0..self.config.camera_count).map(CameraAgent::new).collect();
        self.drone = DroneAgent::new(self.config.drone.clone());
        tracing::info!("simulation reset");
    }

    /// Operator-triggered panoramic analysis on the guard
    pub fn trigger_panoramic(&mut self) {
        self.guard.trigger_panoramic();
    }

    /// Validated broadcast write; the channel is untouched on error
    pub fn write_channel(
        &mut self,
        subjects: &Value,
        content: Option<&Value>,
    ) -> SimulationResult<ChannelView> {
        let message = Message::from_wire(subjects, content)?;
        self.broadcast(message);
        Ok(self.channel.read())
    }

    /// Typed broadcast write
    pub fn broadcast(&mut self, message: Message) {
        tracing::debug!(?message, "external channel write");
        self.channel.write(message);
    }

    pub fn read_channel(&self) -> ChannelView {
        self.channel.read()
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn clear_channel(&mut self) {
        self.channel.clear();
    }

    /// Stores an oracle label on a camera or the drone
    pub fn set_detection(&mut self, agent: AgentRef, label: Label) -> SimulationResult<()> {
        match agent {
            AgentRef::Camera(id) => self.camera_mut(id)?.set_detection(label),
            AgentRef::Drone => self.drone.set_detection(label),
            AgentRef::Guard => return Err(no_detector()),
        }
        tracing::info!(%agent, %label, "detection updated");
        Ok(())
    }

    /// Checks that `agent` exists and carries a detection sensor
    pub fn ensure_detector(&self, agent: AgentRef) -> SimulationResult<()> {
        match agent {
            AgentRef::Camera(id) => self.camera(id).map(|_| ()),
            AgentRef::Drone => Ok(()),
            AgentRef::Guard => Err(no_detector()),
        }
    }

    pub fn snapshot(&self, agent: AgentRef) -> SimulationResult<AgentSnapshot> {
        let snapshot = match agent {
            AgentRef::Guard => AgentSnapshot::Guard(GuardSnapshot::from(&self.guard.state)),
            AgentRef::Camera(id) => AgentSnapshot::Camera(self.camera(id)?.state.clone()),
            AgentRef::Drone => AgentSnapshot::Drone(self.drone.state.clone()),
        };
        Ok(snapshot)
    }

    pub fn system_snapshot(&self) -> SystemSnapshot {
        SystemSnapshot {
            tick: self.tick,
            channel: self.channel.read(),
            guard: GuardSnapshot::from(&self.guard.state),
            cameras: self.cameras.iter().map(|c| c.state.clone()).collect(),
            drone: self.drone.state.clone(),
        }
    }

    pub fn guard(&self) -> &GuardAgent {
        &self.guard
    }

    pub fn cameras(&self) -> &[CameraAgent] {
        &self.cameras
    }

    pub fn drone(&self) -> &DroneAgent {
        &self.drone
    }

    fn camera(&self, id: usize) -> SimulationResult<&CameraAgent> {
        self.cameras
            .get(id)
            .ok_or_else(|| SimulationError::AgentNotFound(format!("camera {}", id)))
    }

    fn camera_mut(&mut self, id: usize) -> SimulationResult<&mut CameraAgent> {
        self.cameras
            .get_mut(id)
            .ok_or_else(|| SimulationError::AgentNotFound(format!("camera {}", id)))
    }
}

fn no_detector() -> SimulationError {
    SimulationError::AgentNotFound("guard has no detection sensor".to_string())
}

fn run_agent<A: Agent>(agent: &mut A, ctx: &mut TickContext<'_>) {
    let fired = agent.step(ctx);
    if !fired.is_empty() {
        tracing::debug!(agent = %agent.agent_ref(), actions = ?fired, "rules fired");
    }
}
