//! Trailing-window extraction from the context streams.

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ContextError, Result};
use crate::types::{StreamField, WindowShape};

/// Append-only storage of the five per-step streams.
///
/// States and actions are stored flat (`entries × D`). The action stream may
/// run one entry ahead of the others while a placeholder slot is reserved for
/// the next decision; windows are always aligned on the return-to-go stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextStreams {
    pub(crate) states: Vec<f64>,
    pub(crate) actions: Vec<f64>,
    pub(crate) returns_to_go: Vec<f64>,
    pub(crate) timesteps: Vec<u32>,
    pub(crate) mask: Vec<bool>,
}

impl ContextStreams {
    /// Empty streams with room for `entries` steps.
    pub fn with_capacity(entries: usize, state_dim: usize, action_dim: usize) -> Self {
        Self {
            states: Vec::with_capacity(entries * state_dim),
            actions: Vec::with_capacity((entries + 1) * action_dim),
            returns_to_go: Vec::with_capacity(entries),
            timesteps: Vec::with_capacity(entries),
            mask: Vec::with_capacity(entries),
        }
    }

    /// Number of synchronized entries (padding included).
    pub fn entries(&self) -> usize {
        self.returns_to_go.len()
    }

    pub fn states(&self) -> &[f64] {
        &self.states
    }

    pub fn actions(&self) -> &[f64] {
        &self.actions
    }

    pub fn returns_to_go(&self) -> &[f64] {
        &self.returns_to_go
    }

    pub fn timesteps(&self) -> &[u32] {
        &self.timesteps
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    pub(crate) fn clear(&mut self) {
        self.states.clear();
        self.actions.clear();
        self.returns_to_go.clear();
        self.timesteps.clear();
        self.mask.clear();
    }
}

/// The last L steps of every stream, copied out of the buffer.
///
/// Padding entries precede valid ones and are all zero with `mask = false`.
/// Deserialization goes through [`from_parts`](Self::from_parts).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ContextWindow {
    shape: WindowShape,
    states: Vec<f64>,
    actions: Vec<f64>,
    returns_to_go: Vec<f64>,
    timesteps: Vec<u32>,
    mask: Vec<bool>,
}

impl ContextWindow {
    /// Builds a window from per-field arrays.
    ///
    /// # Errors
    ///
    /// * [`ContextError::ShapeMismatch`] if a field does not have its stride.
    /// * [`ContextError::InvalidValue`] if a padding entry follows a valid one
    ///   or a timestep is smaller than the one before it.
    pub fn from_parts(
        shape: WindowShape,
        states: Vec<f64>,
        actions: Vec<f64>,
        returns_to_go: Vec<f64>,
        timesteps: Vec<u32>,
        mask: Vec<bool>,
    ) -> Result<Self> {
        let lens = [
            (StreamField::State, states.len()),
            (StreamField::Action, actions.len()),
            (StreamField::ReturnToGo, returns_to_go.len()),
            (StreamField::Timestep, timesteps.len()),
            (StreamField::Mask, mask.len()),
        ];
        for (field, actual) in lens {
            let expected = shape.stride(field);
            if actual != expected {
                return Err(ContextError::shape(field, expected, actual));
            }
        }
        check_layout(&timesteps, &mask)?;
        Ok(Self {
            shape,
            states,
            actions,
            returns_to_go,
            timesteps,
            mask,
        })
    }

    /// A window made only of padding.
    pub fn padding(shape: WindowShape) -> Self {
        Self {
            shape,
            states: vec![0.0; shape.stride(StreamField::State)],
            actions: vec![0.0; shape.stride(StreamField::Action)],
            returns_to_go: vec![0.0; shape.window_length],
            timesteps: vec![0; shape.window_length],
            mask: vec![false; shape.window_length],
        }
    }

    pub fn shape(&self) -> WindowShape {
        self.shape
    }

    pub fn len(&self) -> usize {
        self.shape.window_length
    }

    pub fn is_empty(&self) -> bool {
        self.shape.window_length == 0
    }

    pub fn states(&self) -> &[f64] {
        &self.states
    }

    pub fn actions(&self) -> &[f64] {
        &self.actions
    }

    pub fn returns_to_go(&self) -> &[f64] {
        &self.returns_to_go
    }

    pub fn timesteps(&self) -> &[u32] {
        &self.timesteps
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    /// State at window position `i`.
    pub fn state(&self, i: usize) -> &[f64] {
        let d = self.shape.state_dim;
        &self.states[i * d..(i + 1) * d]
    }

    /// Action at window position `i`.
    pub fn action(&self, i: usize) -> &[f64] {
        let d = self.shape.action_dim;
        &self.actions[i * d..(i + 1) * d]
    }

    /// Number of valid (non-padding) positions.
    pub fn valid_len(&self) -> usize {
        self.mask.iter().filter(|m| **m).count()
    }

    /// Index of the final valid position, if any.
    pub fn last_valid_index(&self) -> Option<usize> {
        self.mask.iter().rposition(|m| *m)
    }

    /// State at the final valid position.
    pub fn last_state(&self) -> Option<&[f64]> {
        self.last_valid_index().map(|i| self.state(i))
    }
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawContextWindow {
    shape: WindowShape,
    states: Vec<f64>,
    actions: Vec<f64>,
    returns_to_go: Vec<f64>,
    timesteps: Vec<u32>,
    mask: Vec<bool>,
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for ContextWindow {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawContextWindow::deserialize(deserializer)?;
        ContextWindow::from_parts(
            raw.shape,
            raw.states,
            raw.actions,
            raw.returns_to_go,
            raw.timesteps,
            raw.mask,
        )
        .map_err(serde::de::Error::custom)
    }
}

/// Valid entries form a trailing run and timesteps never decrease.
fn check_layout(timesteps: &[u32], mask: &[bool]) -> Result<()> {
    if let Some(first_valid) = mask.iter().position(|m| *m) {
        if let Some(offset) = mask[first_valid..].iter().position(|m| !*m) {
            return Err(ContextError::InvalidValue {
                field: StreamField::Mask,
                index: first_valid + offset,
                value: 0.0,
            });
        }
    }
    if let Some(i) = timesteps.windows(2).position(|p| p[1] < p[0]) {
        return Err(ContextError::InvalidValue {
            field: StreamField::Timestep,
            index: i + 1,
            value: timesteps[i + 1] as f64,
        });
    }
    Ok(())
}

/// Extracts trailing windows from context streams.
pub struct WindowView;

impl WindowView {
    /// Copies the last `window_length` entries of every stream.
    ///
    /// Streams shorter than the window are left-padded with zero / invalid
    /// entries. The action stream is cut at the same entry as the others, so a
    /// reserved placeholder slot past the last state is never exposed.
    pub fn extract(
        streams: &ContextStreams,
        window_length: usize,
        state_dim: usize,
        action_dim: usize,
    ) -> ContextWindow {
        let shape = WindowShape::new(window_length, state_dim, action_dim);
        let end = streams.entries();
        ContextWindow {
            shape,
            states: trailing(&streams.states, state_dim, end, window_length, 0.0),
            actions: trailing(&streams.actions, action_dim, end, window_length, 0.0),
            returns_to_go: trailing(&streams.returns_to_go, 1, end, window_length, 0.0),
            timesteps: trailing(&streams.timesteps, 1, end, window_length, 0),
            mask: trailing(&streams.mask, 1, end, window_length, false),
        }
    }
}

/// Entries `[end - len, end)` of a stream of `width`-sized records,
/// left-padded with `fill` where the stream has no data.
fn trailing<T: Copy>(stream: &[T], width: usize, end: usize, len: usize, fill: T) -> Vec<T> {
    let end = end.min(stream.len() / width.max(1));
    let start = end.saturating_sub(len);
    let missing = len - (end - start);

    let mut out = Vec::with_capacity(len * width);
    out.extend(std::iter::repeat_n(fill, missing * width));
    out.extend_from_slice(&stream[start * width..end * width]);
    out
}
