//! Random sequence model for testing and baselines.

use std::cell::RefCell;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::trait_::{ActionSequences, SequenceModel};
use crate::error::{ContextError, Result};
use crate::observation::WindowBatch;
use crate::types::{InferenceOptions, SelectionMode};

/// Uniformly random actions in `[low, high]` per dimension.
///
/// Ignores its input. In deterministic mode every action is the midpoint of
/// the range. Used for sanity checks and as a lower-bound baseline.
pub struct RandomSequenceModel {
    action_dim: usize,
    low: f64,
    high: f64,
    rng: RefCell<StdRng>,
}

impl RandomSequenceModel {
    /// Creates a new random model.
    ///
    /// # Arguments
    ///
    /// * `action_dim` - Size of each action.
    /// * `low`, `high` - Bounds of every action component.
    /// * `seed` - Random seed for reproducible rollouts.
    ///
    /// # Errors
    ///
    /// [`ContextError::Configuration`] if a bound is not finite or the range
    /// between them overflows.
    pub fn new(action_dim: usize, low: f64, high: f64, seed: u64) -> Result<Self> {
        if !(low.is_finite() && high.is_finite() && (high - low).is_finite()) {
            return Err(ContextError::Configuration(format!(
                "action bounds must be finite (got [{low}, {high}])"
            )));
        }
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        Ok(Self {
            action_dim,
            low,
            high,
            rng: RefCell::new(StdRng::seed_from_u64(seed)),
        })
    }
}

impl SequenceModel for RandomSequenceModel {
    fn predict(&self, batch: &WindowBatch, options: InferenceOptions) -> Result<ActionSequences> {
        let l = batch.shape.window_length;
        let n = batch.batch_size * l * self.action_dim;
        let values = match options.selection {
            SelectionMode::Deterministic => vec![(self.low + self.high) / 2.0; n],
            SelectionMode::Sample => {
                let mut rng = self.rng.borrow_mut();
                (0..n).map(|_| rng.gen_range(self.low..=self.high)).collect()
            }
        };
        ActionSequences::new(batch.batch_size, l, self.action_dim, values)
    }

    fn action_dim(&self) -> usize {
        self.action_dim
    }

    fn name(&self) -> &str {
        "random"
    }
}
