//! Core types shared by the context buffer, the observation adapter and
//! the action-prediction adapter.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One of the five synchronized per-step streams.
///
/// The declaration order is the serialization order used by
/// [`ObservationAdapter`](crate::observation::ObservationAdapter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StreamField {
    State,
    Action,
    ReturnToGo,
    Timestep,
    Mask,
}

impl StreamField {
    /// All fields in flattening order.
    pub const ORDER: [StreamField; 5] = [
        StreamField::State,
        StreamField::Action,
        StreamField::ReturnToGo,
        StreamField::Timestep,
        StreamField::Mask,
    ];
}

impl fmt::Display for StreamField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamField::State => write!(f, "state"),
            StreamField::Action => write!(f, "action"),
            StreamField::ReturnToGo => write!(f, "return-to-go"),
            StreamField::Timestep => write!(f, "timestep"),
            StreamField::Mask => write!(f, "attention mask"),
        }
    }
}

/// Static shape of a context window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WindowShape {
    /// Number of trailing steps L.
    pub window_length: usize,
    /// Per-step state size D_s.
    pub state_dim: usize,
    /// Per-step action size D_a.
    pub action_dim: usize,
}

impl WindowShape {
    /// Creates a new window shape.
    pub fn new(window_length: usize, state_dim: usize, action_dim: usize) -> Self {
        Self {
            window_length,
            state_dim,
            action_dim,
        }
    }

    /// Number of values a single step contributes to `field`.
    pub fn width(&self, field: StreamField) -> usize {
        match field {
            StreamField::State => self.state_dim,
            StreamField::Action => self.action_dim,
            StreamField::ReturnToGo | StreamField::Timestep | StreamField::Mask => 1,
        }
    }

    /// Number of values `field` occupies in a whole window (`L × D_field`).
    pub fn stride(&self, field: StreamField) -> usize {
        self.window_length * self.width(field)
    }
}

/// How the model turns its prediction into an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SelectionMode {
    /// Draw from the model's action distribution.
    Sample,
    /// Use the most likely action (mean / argmax).
    #[default]
    Deterministic,
}

/// Whether the model runs with training-time behaviour (e.g. dropout).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ModelPhase {
    Train,
    #[default]
    Eval,
}

impl ModelPhase {
    pub fn is_train(&self) -> bool {
        matches!(self, ModelPhase::Train)
    }
}

/// Flags threaded from the caller into every inference call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InferenceOptions {
    pub selection: SelectionMode,
    pub phase: ModelPhase,
}

impl InferenceOptions {
    /// Deterministic selection in evaluation phase.
    pub fn eval() -> Self {
        Self::default()
    }

    /// Sampled selection in evaluation phase.
    pub fn sampled() -> Self {
        Self {
            selection: SelectionMode::Sample,
            phase: ModelPhase::Eval,
        }
    }

    pub fn with_phase(self, phase: ModelPhase) -> Self {
        Self { phase, ..self }
    }
}
