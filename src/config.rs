//! Configuration for the sequence context and its adapters.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{ContextError, Result};
use crate::observation::ObservationAdapter;
use crate::types::WindowShape;

/// Configuration of a sequence context.
///
/// Supplied at construction and immutable for the lifetime of the buffer
/// built from it. Override individual fields with struct-update syntax:
///
/// ```
/// use seqctx::ContextConfig;
///
/// let config = ContextConfig {
///     window_length: 3,
///     state_dim: 2,
///     action_dim: 1,
///     ..ContextConfig::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContextConfig {
    // --- Window geometry ---
    /// Number of trailing steps exposed to the model (L).
    pub window_length: usize,
    /// Per-step state vector size (D_s).
    pub state_dim: usize,
    /// Per-step action vector size (D_a).
    pub action_dim: usize,

    // --- Positional index ---
    /// Size of the model's position table (T_max). Timesteps saturate at `T_max - 1`.
    pub timestep_cap: u32,

    // --- Return conditioning ---
    /// Initial return-to-go before scaling.
    pub desired_target_return: f64,
    /// Divisor applied to every raw reward and to the initial target.
    pub reward_scale_factor: f64,
}

impl ContextConfig {
    /// Checks the configuration invariants.
    pub fn validate(&self) -> Result<()> {
        if self.window_length == 0 {
            return Err(ContextError::Configuration(
                "window_length must be > 0".into(),
            ));
        }
        if self.state_dim == 0 || self.action_dim == 0 {
            return Err(ContextError::Configuration(format!(
                "state_dim and action_dim must be > 0 (got {} and {})",
                self.state_dim, self.action_dim
            )));
        }
        if self.timestep_cap == 0 {
            return Err(ContextError::Configuration(
                "timestep_cap must be > 0".into(),
            ));
        }
        if !self.reward_scale_factor.is_finite() || self.reward_scale_factor == 0.0 {
            return Err(ContextError::Configuration(format!(
                "reward_scale_factor must be finite and non-zero (got {})",
                self.reward_scale_factor
            )));
        }
        if !self.desired_target_return.is_finite() {
            return Err(ContextError::Configuration(
                "desired_target_return must be finite".into(),
            ));
        }
        Ok(())
    }

    /// Window shape implied by this configuration.
    pub fn shapes(&self) -> WindowShape {
        WindowShape::new(self.window_length, self.state_dim, self.action_dim)
    }

    /// Length of a flattened observation.
    pub fn flat_dim(&self) -> usize {
        ObservationAdapter::flat_dim(&self.shapes())
    }

    /// Largest timestep ever written to the buffer.
    pub fn max_timestep(&self) -> u32 {
        self.timestep_cap.saturating_sub(1)
    }

    /// Return-to-go seeded at reset.
    pub fn initial_return_to_go(&self) -> f64 {
        self.desired_target_return / self.reward_scale_factor
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        // Humanoid-sized defaults.
        Self {
            window_length: 20,
            state_dim: 376,
            action_dim: 17,
            timestep_cap: 1000,
            desired_target_return: 6000.0,
            reward_scale_factor: 1000.0,
        }
    }
}
