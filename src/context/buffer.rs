//! Per-episode history of the five synchronized streams.

use tracing::{debug, trace};

use super::window::{ContextStreams, ContextWindow, WindowView};
use crate::config::ContextConfig;
use crate::error::{ContextError, Result};
use crate::reward::RewardNormalizer;
use crate::types::StreamField;

/// Fill state of a [`SequenceContextBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferPhase {
    /// Freshly constructed or reset; no step has been taken.
    Empty,
    /// Fewer real entries than the window length.
    Filling,
    /// At least a full window of real entries.
    Full,
}

/// Growing history of one episode, exposing a fixed-length trailing window.
///
/// Streams start zero-filled to the window length, so the leading padding of
/// a short episode is just the untouched prefix. History is append-only;
/// `reset` clears the streams but keeps their allocation.
///
/// # Lifecycle
///
/// 1. [`reset`](Self::reset) with the first observation of the episode.
/// 2. Read [`current_window`](Self::current_window) and query the model.
/// 3. [`record_action`](Self::record_action) with the chosen action.
/// 4. [`advance`](Self::advance) with the next observation and raw reward.
/// 5. Repeat from 2 until the caller ends the episode.
#[derive(Debug, Clone)]
pub struct SequenceContextBuffer {
    config: ContextConfig,
    normalizer: RewardNormalizer,
    streams: ContextStreams,
    /// Entries with mask = 1.
    valid_entries: usize,
    /// `advance` calls since the last reset.
    steps: usize,
    /// `reset` has seeded the current episode.
    seeded: bool,
    /// An action was recorded for the newest state and its placeholder appended.
    action_recorded: bool,
    saturation_logged: bool,
}

impl SequenceContextBuffer {
    /// Creates a zero-filled buffer (all positions are padding).
    pub fn new(config: ContextConfig) -> Result<Self> {
        config.validate()?;
        let normalizer = RewardNormalizer::new(config.reward_scale_factor)?;
        let streams = ContextStreams::with_capacity(
            config.window_length * 2,
            config.state_dim,
            config.action_dim,
        );
        let mut buffer = Self {
            config,
            normalizer,
            streams,
            valid_entries: 0,
            steps: 0,
            seeded: false,
            action_recorded: false,
            saturation_logged: false,
        };
        buffer.zero_fill();
        Ok(buffer)
    }

    /// Starts a new episode.
    ///
    /// Zero-fills every stream to the window length and seeds the last slot
    /// with `initial_state`, `desired_target / scale`, mask 1 and timestep 0.
    /// `scale` stays in effect until the next reset; see
    /// [`normalizer`](Self::normalizer).
    ///
    /// # Errors
    ///
    /// [`ContextError::Configuration`] if `initial_state` does not have
    /// `state_dim` values or `scale` is zero / non-finite.
    pub fn reset(&mut self, initial_state: &[f64], desired_target: f64, scale: f64) -> Result<()> {
        if initial_state.len() != self.config.state_dim {
            return Err(ContextError::Configuration(format!(
                "initial state has {} values but state_dim is {}",
                initial_state.len(),
                self.config.state_dim
            )));
        }
        self.normalizer = RewardNormalizer::new(scale)?;

        self.zero_fill();
        let last = self.config.window_length - 1;
        let d = self.config.state_dim;
        self.streams.states[last * d..].copy_from_slice(initial_state);
        self.streams.returns_to_go[last] = self.normalizer.initial_return_to_go(desired_target);
        self.streams.mask[last] = true;
        self.valid_entries = 1;
        self.seeded = true;

        debug!(
            window_length = self.config.window_length,
            return_to_go = self.streams.returns_to_go[last],
            "context reset"
        );
        Ok(())
    }

    /// [`reset`](Self::reset) with the configured target return and scale.
    pub fn reset_from_config(&mut self, initial_state: &[f64]) -> Result<()> {
        self.reset(
            initial_state,
            self.config.desired_target_return,
            self.config.reward_scale_factor,
        )
    }

    /// Stores the action chosen for the newest state.
    ///
    /// The first call after a reset/advance writes the action into the newest
    /// slot and appends a zero placeholder for the next decision. A repeated
    /// call before the next `advance` overwrites the same slot.
    ///
    /// # Errors
    ///
    /// [`ContextError::NotReset`] before the first reset, or
    /// [`ContextError::ShapeMismatch`] if `action` does not have `action_dim`
    /// values.
    pub fn record_action(&mut self, action: &[f64]) -> Result<()> {
        if !self.seeded {
            return Err(ContextError::NotReset);
        }
        let d = self.config.action_dim;
        if action.len() != d {
            return Err(ContextError::shape(StreamField::Action, d, action.len()));
        }
        let slot = self.streams.entries() - 1;
        self.streams.actions[slot * d..(slot + 1) * d].copy_from_slice(action);
        if !self.action_recorded {
            self.streams.actions.extend(std::iter::repeat_n(0.0, d));
            self.action_recorded = true;
        }
        Ok(())
    }

    /// Appends the next step of the episode.
    ///
    /// Return-to-go drops by `raw_reward / scale`; the timestep grows by one
    /// and saturates at `timestep_cap - 1`. Nothing is appended on error.
    pub fn advance(&mut self, next_state: &[f64], raw_reward: f64) -> Result<()> {
        if !self.seeded {
            return Err(ContextError::NotReset);
        }
        let d = self.config.state_dim;
        if next_state.len() != d {
            return Err(ContextError::shape(StreamField::State, d, next_state.len()));
        }

        if !self.action_recorded {
            self.streams
                .actions
                .extend(std::iter::repeat_n(0.0, self.config.action_dim));
        }
        self.action_recorded = false;

        let rtg = self.last_return_to_go() - self.normalizer.scale(raw_reward);
        let cap = self.config.max_timestep();
        let timestep = (self.last_timestep() + 1).min(cap);

        self.streams.states.extend_from_slice(next_state);
        self.streams.returns_to_go.push(rtg);
        self.streams.timesteps.push(timestep);
        self.streams.mask.push(true);
        self.valid_entries += 1;
        self.steps += 1;

        trace!(step = self.steps, timestep, return_to_go = rtg, "context advanced");
        if timestep == cap && !self.saturation_logged {
            debug!(timestep_cap = self.config.timestep_cap, "timestep saturated");
            self.saturation_logged = true;
        }
        Ok(())
    }

    /// The last `window_length` entries of every stream.
    pub fn current_window(&self) -> ContextWindow {
        WindowView::extract(
            &self.streams,
            self.config.window_length,
            self.config.state_dim,
            self.config.action_dim,
        )
    }

    pub fn phase(&self) -> BufferPhase {
        if self.steps == 0 {
            BufferPhase::Empty
        } else if self.valid_entries < self.config.window_length {
            BufferPhase::Filling
        } else {
            BufferPhase::Full
        }
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Reward scaling of the current episode.
    ///
    /// Equals `config().reward_scale_factor` unless [`reset`](Self::reset)
    /// was given another scale.
    pub fn normalizer(&self) -> &RewardNormalizer {
        &self.normalizer
    }

    /// Whether an episode has been started with [`reset`](Self::reset).
    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    /// Full history, padding included.
    pub fn streams(&self) -> &ContextStreams {
        &self.streams
    }

    /// Real entries in the episode, the initial state included.
    pub fn episode_len(&self) -> usize {
        self.valid_entries
    }

    /// Number of `advance` calls since the last reset.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Synchronized entries stored, padding included.
    pub fn total_entries(&self) -> usize {
        self.streams.entries()
    }

    pub fn last_return_to_go(&self) -> f64 {
        self.streams.returns_to_go.last().copied().unwrap_or(0.0)
    }

    pub fn last_timestep(&self) -> u32 {
        self.streams.timesteps.last().copied().unwrap_or(0)
    }

    pub fn is_timestep_saturated(&self) -> bool {
        self.last_timestep() >= self.config.max_timestep()
    }

    fn zero_fill(&mut self) {
        let l = self.config.window_length;
        self.streams.clear();
        self.streams
            .states
            .extend(std::iter::repeat_n(0.0, l * self.config.state_dim));
        self.streams
            .actions
            .extend(std::iter::repeat_n(0.0, l * self.config.action_dim));
        self.streams.returns_to_go.extend(std::iter::repeat_n(0.0, l));
        self.streams.timesteps.extend(std::iter::repeat_n(0, l));
        self.streams.mask.extend(std::iter::repeat_n(false, l));
        self.valid_entries = 0;
        self.steps = 0;
        self.seeded = false;
        self.action_recorded = false;
        self.saturation_logged = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ContextConfig {
        ContextConfig {
            window_length: 3,
            state_dim: 2,
            action_dim: 1,
            timestep_cap: 5,
            desired_target_return: 9.0,
            reward_scale_factor: 3.0,
        }
    }

    #[test]
    fn new_buffer_is_all_padding() {
        let buf = SequenceContextBuffer::new(config()).unwrap();
        let w = buf.current_window();
        assert_eq!(w.valid_len(), 0);
        assert_eq!(buf.phase(), BufferPhase::Empty);
        assert_eq!(buf.total_entries(), 3);
    }

    #[test]
    fn new_rejects_invalid_config() {
        let cfg = ContextConfig {
            window_length: 0,
            ..config()
        };
        assert!(matches!(
            SequenceContextBuffer::new(cfg),
            Err(ContextError::Configuration(_))
        ));
    }

    #[test]
    fn unseeded_buffer_rejects_steps() {
        let mut buf = SequenceContextBuffer::new(config()).unwrap();
        assert!(!buf.is_seeded());
        assert_eq!(buf.record_action(&[5.0]).unwrap_err(), ContextError::NotReset);
        assert_eq!(
            buf.advance(&[1.0, 1.0], 3.0).unwrap_err(),
            ContextError::NotReset
        );

        let w = buf.current_window();
        assert_eq!(w.actions(), &[0.0, 0.0, 0.0]);
        assert_eq!(w.returns_to_go(), &[0.0, 0.0, 0.0]);
        assert_eq!(buf.total_entries(), 3);
        assert_eq!(buf.streams().actions().len(), 3);

        buf.reset_from_config(&[0.0, 0.0]).unwrap();
        buf.record_action(&[5.0]).unwrap();
        buf.advance(&[1.0, 1.0], 3.0).unwrap();
        let w = buf.current_window();
        assert_eq!(w.returns_to_go(), &[0.0, 3.0, 2.0]);
        assert_eq!(w.timesteps(), &[0, 0, 1]);
        assert_eq!(w.actions(), &[0.0, 5.0, 0.0]);
    }

    #[test]
    fn failed_reset_leaves_buffer_unseeded() {
        let mut buf = SequenceContextBuffer::new(config()).unwrap();
        assert!(buf.reset(&[1.0], 9.0, 3.0).is_err());
        assert!(!buf.is_seeded());
        assert_eq!(buf.advance(&[1.0, 1.0], 0.0).unwrap_err(), ContextError::NotReset);
    }

    #[test]
    fn reset_scale_drives_normalizer() {
        let mut buf = SequenceContextBuffer::new(config()).unwrap();
        buf.reset(&[0.0, 0.0], 10.0, 2.0).unwrap();
        assert_eq!(buf.normalizer().scale_factor(), 2.0);
        buf.advance(&[1.0, 1.0], 4.0).unwrap();
        assert_eq!(buf.current_window().returns_to_go(), &[0.0, 5.0, 3.0]);

        buf.reset_from_config(&[0.0, 0.0]).unwrap();
        assert_eq!(buf.normalizer().scale_factor(), 3.0);
    }

    #[test]
    fn reset_rejects_wrong_state_dim() {
        let mut buf = SequenceContextBuffer::new(config()).unwrap();
        let err = buf.reset(&[1.0, 2.0, 3.0], 9.0, 3.0).unwrap_err();
        assert!(matches!(err, ContextError::Configuration(_)));
    }

    #[test]
    fn reset_rejects_zero_scale() {
        let mut buf = SequenceContextBuffer::new(config()).unwrap();
        assert!(buf.reset(&[1.0, 2.0], 9.0, 0.0).is_err());
    }

    #[test]
    fn advance_rejects_wrong_state_dim_without_appending() {
        let mut buf = SequenceContextBuffer::new(config()).unwrap();
        buf.reset_from_config(&[0.0, 0.0]).unwrap();
        let err = buf.advance(&[1.0], 1.0).unwrap_err();
        assert_eq!(err, ContextError::shape(StreamField::State, 2, 1));
        assert_eq!(buf.total_entries(), 3);
        assert_eq!(buf.steps(), 0);
    }

    #[test]
    fn record_action_rejects_wrong_dim() {
        let mut buf = SequenceContextBuffer::new(config()).unwrap();
        buf.reset_from_config(&[0.0, 0.0]).unwrap();
        let err = buf.record_action(&[1.0, 2.0]).unwrap_err();
        assert_eq!(err, ContextError::shape(StreamField::Action, 1, 2));
    }

    #[test]
    fn phase_transitions() {
        let mut buf = SequenceContextBuffer::new(config()).unwrap();
        buf.reset_from_config(&[0.0, 0.0]).unwrap();
        assert_eq!(buf.phase(), BufferPhase::Empty);
        buf.advance(&[1.0, 1.0], 0.0).unwrap();
        assert_eq!(buf.phase(), BufferPhase::Filling);
        buf.advance(&[2.0, 2.0], 0.0).unwrap();
        assert_eq!(buf.phase(), BufferPhase::Full);
        buf.reset_from_config(&[0.0, 0.0]).unwrap();
        assert_eq!(buf.phase(), BufferPhase::Empty);
        assert_eq!(buf.episode_len(), 1);
    }

    #[test]
    fn repeated_record_action_overwrites() {
        let mut buf = SequenceContextBuffer::new(config()).unwrap();
        buf.reset_from_config(&[0.0, 0.0]).unwrap();
        buf.record_action(&[0.5]).unwrap();
        buf.record_action(&[0.7]).unwrap();
        buf.advance(&[1.0, 1.0], 0.0).unwrap();
        let w = buf.current_window();
        assert_eq!(w.actions(), &[0.0, 0.7, 0.0]);
        assert_eq!(buf.streams().actions().len(), 4);
    }

    #[test]
    fn advance_without_action_keeps_streams_aligned() {
        let mut buf = SequenceContextBuffer::new(config()).unwrap();
        buf.reset_from_config(&[0.0, 0.0]).unwrap();
        buf.advance(&[1.0, 1.0], 0.0).unwrap();
        buf.record_action(&[0.3]).unwrap();
        buf.advance(&[2.0, 2.0], 0.0).unwrap();
        let w = buf.current_window();
        assert_eq!(w.actions(), &[0.0, 0.3, 0.0]);
        assert_eq!(
            buf.streams().actions().len(),
            buf.total_entries() * buf.config().action_dim
        );
    }
}
