//! Interface to the single-step simulation collaborator.

use crate::error::Result;

/// Result of a single simulator step.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorStep {
    /// Observation after the step.
    pub state: Vec<f64>,
    /// Unscaled reward.
    pub reward: f64,
    /// The episode reached a terminal state.
    pub terminated: bool,
    /// The episode was cut off (time limit or similar).
    pub truncated: bool,
}

impl SimulatorStep {
    pub fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// A simulator that only understands "observe state, emit action, receive reward".
pub trait Simulator {
    /// Size of every emitted state.
    fn state_dim(&self) -> usize;

    /// Size of every accepted action.
    fn action_dim(&self) -> usize;

    /// Starts a new episode and returns its first state.
    fn reset(&mut self) -> Result<Vec<f64>>;

    /// Applies one action.
    fn step(&mut self, action: &[f64]) -> Result<SimulatorStep>;

    /// Maximum episode length, if the simulator enforces one.
    fn timestep_limit(&self) -> Option<u32> {
        None
    }
}

impl<S: Simulator + ?Sized> Simulator for Box<S> {
    fn state_dim(&self) -> usize {
        (**self).state_dim()
    }

    fn action_dim(&self) -> usize {
        (**self).action_dim()
    }

    fn reset(&mut self) -> Result<Vec<f64>> {
        (**self).reset()
    }

    fn step(&mut self, action: &[f64]) -> Result<SimulatorStep> {
        (**self).step(action)
    }

    fn timestep_limit(&self) -> Option<u32> {
        (**self).timestep_limit()
    }
}
