//! Reward rescaling into the model's return unit.

use crate::error::{ContextError, Result};

/// Divides raw rewards by a constant scale factor.
///
/// One instance per environment; the factor never changes after construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardNormalizer {
    scale_factor: f64,
}

impl RewardNormalizer {
    /// Creates a normalizer. Fails on a zero or non-finite factor.
    pub fn new(scale_factor: f64) -> Result<Self> {
        if !scale_factor.is_finite() || scale_factor == 0.0 {
            return Err(ContextError::Configuration(format!(
                "reward scale factor must be finite and non-zero (got {scale_factor})"
            )));
        }
        Ok(Self { scale_factor })
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// `raw_reward / scale_factor`.
    pub fn scale(&self, raw_reward: f64) -> f64 {
        raw_reward / self.scale_factor
    }

    /// Return-to-go the buffer is seeded with for a desired episode return.
    pub fn initial_return_to_go(&self, desired_target: f64) -> f64 {
        desired_target / self.scale_factor
    }
}
