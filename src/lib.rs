//! seqctx - sliding-window sequence context for return-conditioned policies.
//!
//! Lets a fixed-length sequence model (states, actions, returns-to-go,
//! timesteps, attention mask) drive a simulator that only understands
//! "observe state, emit action, receive reward".
//!
//! Per step: the simulator emits `(state, reward)`, [`SequenceContextBuffer`]
//! appends it, [`WindowView`] / [`ObservationAdapter`] produce the model input,
//! [`ActionPredictionAdapter`] extracts one action per window, and the action is
//! recorded before it goes back to the simulator.
//!
//! The neural model in [`network`] is behind the `rl-nn` feature; serde derives
//! are behind the `serde` feature.

pub mod config;
pub mod context;
pub mod environment;
pub mod error;
pub mod metrics;
pub mod observation;
pub mod policy;
pub mod reward;
pub mod types;

#[cfg(feature = "rl-nn")]
pub mod network;

pub use config::ContextConfig;
pub use context::{BufferPhase, ContextWindow, SequenceContextBuffer, WindowView};
pub use environment::{
    ContextEnvironment, ContextStep, PointMassSimulator, Simulator, SimulatorStep,
};
pub use error::{ContextError, Result};
pub use metrics::{EpisodeOutcome, EvaluationMetrics};
pub use observation::{ObservationAdapter, WindowBatch};
pub use policy::{
    ActionPredictionAdapter, ActionSequences, ContextActor, RandomSequenceModel, SequenceModel,
};
pub use reward::RewardNormalizer;
pub use types::{InferenceOptions, ModelPhase, SelectionMode, StreamField, WindowShape};

#[cfg(feature = "rl-nn")]
pub use network::MlpSequenceModel;
