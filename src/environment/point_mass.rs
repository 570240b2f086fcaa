//! Point-mass reference simulator.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::simulator::{Simulator, SimulatorStep};
use crate::error::{ContextError, Result};
use crate::types::StreamField;

/// A point in `dims` dimensions steered towards a random goal.
///
/// State is `[position(dims)] ++ [goal(dims)]`; the action is a displacement
/// clipped to `max_step` per component. Reward is the negative distance to
/// the goal after moving. The episode terminates within `tolerance` of the
/// goal and is truncated after `horizon` steps.
#[derive(Debug)]
pub struct PointMassSimulator {
    dims: usize,
    /// Positions and goals are drawn from `[-extent, extent]`.
    pub extent: f64,
    pub max_step: f64,
    pub tolerance: f64,
    pub horizon: u32,
    position: Vec<f64>,
    goal: Vec<f64>,
    t: u32,
    rng: StdRng,
    seed: u64,
}

impl PointMassSimulator {
    /// Creates a simulator; each reset draws a fresh episode from `seed`, `seed + 1`, ...
    pub fn new(dims: usize, horizon: u32, seed: u64) -> Self {
        Self {
            dims,
            extent: 5.0,
            max_step: 1.0,
            tolerance: 0.25,
            horizon,
            position: vec![0.0; dims],
            goal: vec![0.0; dims],
            t: 0,
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn position(&self) -> &[f64] {
        &self.position
    }

    pub fn goal(&self) -> &[f64] {
        &self.goal
    }

    pub fn distance_to_goal(&self) -> f64 {
        self.position
            .iter()
            .zip(&self.goal)
            .map(|(p, g)| (p - g).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    /// `extent` and `max_step` are public; check them before sampling or clipping.
    fn check_parameters(&self) -> Result<()> {
        if !(self.extent.is_finite() && self.extent >= 0.0) {
            return Err(ContextError::Simulator(format!(
                "extent must be finite and non-negative (got {})",
                self.extent
            )));
        }
        if !(self.max_step.is_finite() && self.max_step >= 0.0) {
            return Err(ContextError::Simulator(format!(
                "max_step must be finite and non-negative (got {})",
                self.max_step
            )));
        }
        Ok(())
    }

    fn observe(&self) -> Vec<f64> {
        let mut state = Vec::with_capacity(2 * self.dims);
        state.extend_from_slice(&self.position);
        state.extend_from_slice(&self.goal);
        state
    }
}

impl Simulator for PointMassSimulator {
    fn state_dim(&self) -> usize {
        2 * self.dims
    }

    fn action_dim(&self) -> usize {
        self.dims
    }

    fn reset(&mut self) -> Result<Vec<f64>> {
        self.check_parameters()?;
        self.rng = StdRng::seed_from_u64(self.seed);
        self.seed += 1; // different episode each reset
        self.t = 0;

        let extent = self.extent;
        for i in 0..self.dims {
            self.position[i] = self.rng.gen_range(-extent..=extent);
            self.goal[i] = self.rng.gen_range(-extent..=extent);
        }
        Ok(self.observe())
    }

    fn step(&mut self, action: &[f64]) -> Result<SimulatorStep> {
        if action.len() != self.dims {
            return Err(ContextError::shape(
                StreamField::Action,
                self.dims,
                action.len(),
            ));
        }
        if action.iter().any(|a| !a.is_finite()) {
            return Err(ContextError::Simulator(format!(
                "non-finite action {action:?}"
            )));
        }
        self.check_parameters()?;

        for (p, a) in self.position.iter_mut().zip(action) {
            *p += a.clamp(-self.max_step, self.max_step);
        }
        self.t += 1;

        let distance = self.distance_to_goal();
        Ok(SimulatorStep {
            state: self.observe(),
            reward: -distance,
            terminated: distance <= self.tolerance,
            truncated: self.t >= self.horizon,
        })
    }

    fn timestep_limit(&self) -> Option<u32> {
        Some(self.horizon)
    }
}
