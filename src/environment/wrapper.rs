//! Simulator wrapped with a sequence context.

use tracing::debug;

use super::simulator::Simulator;
use crate::config::ContextConfig;
use crate::context::{ContextWindow, SequenceContextBuffer};
use crate::error::{ContextError, Result};
use crate::observation::ObservationAdapter;

/// Result of a single [`ContextEnvironment`] step.
#[derive(Debug, Clone)]
pub struct ContextStep {
    /// Context window after the step.
    pub window: ContextWindow,
    /// Reward in return-to-go units.
    pub reward: f64,
    /// Reward as emitted by the simulator.
    pub raw_reward: f64,
    pub terminated: bool,
    pub truncated: bool,
}

impl ContextStep {
    pub fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// A [`Simulator`] whose observations are context windows.
///
/// Every step records the action in the buffer, forwards it to the simulator,
/// and advances the buffer with the resulting state and raw reward.
///
/// # Lifecycle
///
/// 1. Call [`ContextEnvironment::new`] with a simulator and configuration.
/// 2. Call [`ContextEnvironment::reset`] to start an episode.
/// 3. Repeatedly call [`ContextEnvironment::step`] until `done`.
#[derive(Debug)]
pub struct ContextEnvironment<S> {
    simulator: S,
    buffer: SequenceContextBuffer,
}

impl<S: Simulator> ContextEnvironment<S> {
    /// Wraps `simulator`.
    ///
    /// # Errors
    ///
    /// [`ContextError::Configuration`] if the configuration is invalid or its
    /// dimensions disagree with the simulator's.
    pub fn new(simulator: S, config: ContextConfig) -> Result<Self> {
        if simulator.state_dim() != config.state_dim || simulator.action_dim() != config.action_dim
        {
            return Err(ContextError::Configuration(format!(
                "simulator emits states of {} and takes actions of {}, configuration declares {} and {}",
                simulator.state_dim(),
                simulator.action_dim(),
                config.state_dim,
                config.action_dim
            )));
        }
        if let Some(limit) = simulator.timestep_limit() {
            if limit > config.timestep_cap {
                debug!(
                    limit,
                    timestep_cap = config.timestep_cap,
                    "episodes may outlast the timestep cap"
                );
            }
        }
        let buffer = SequenceContextBuffer::new(config)?;
        Ok(Self { simulator, buffer })
    }

    /// Starts an episode and returns its first window.
    pub fn reset(&mut self) -> Result<ContextWindow> {
        let state = self.simulator.reset()?;
        self.buffer.reset_from_config(&state)?;
        Ok(self.buffer.current_window())
    }

    /// Applies `action` to the current state.
    pub fn step(&mut self, action: &[f64]) -> Result<ContextStep> {
        self.buffer.record_action(action)?;
        let out = self.simulator.step(action)?;
        self.buffer.advance(&out.state, out.reward)?;
        Ok(ContextStep {
            window: self.buffer.current_window(),
            reward: self.buffer.normalizer().scale(out.reward),
            raw_reward: out.reward,
            terminated: out.terminated,
            truncated: out.truncated,
        })
    }

    /// [`reset`](Self::reset) returning a flat observation.
    pub fn reset_flat(&mut self) -> Result<Vec<f64>> {
        self.reset().map(|w| ObservationAdapter::flatten(&w))
    }

    /// [`step`](Self::step) returning a flat observation and
    /// `(reward, terminated, truncated)`.
    pub fn step_flat(&mut self, action: &[f64]) -> Result<(Vec<f64>, f64, bool, bool)> {
        let step = self.step(action)?;
        Ok((
            ObservationAdapter::flatten(&step.window),
            step.reward,
            step.terminated,
            step.truncated,
        ))
    }

    pub fn window(&self) -> ContextWindow {
        self.buffer.current_window()
    }

    pub fn buffer(&self) -> &SequenceContextBuffer {
        &self.buffer
    }

    pub fn config(&self) -> &ContextConfig {
        self.buffer.config()
    }

    pub fn simulator(&self) -> &S {
        &self.simulator
    }

    pub fn simulator_mut(&mut self) -> &mut S {
        &mut self.simulator
    }

    pub fn into_simulator(self) -> S {
        self.simulator
    }
}
