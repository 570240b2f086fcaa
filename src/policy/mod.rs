//! Sequence models and action extraction.

pub mod actor;
pub mod adapter;
pub mod random;
pub mod trait_;

pub use actor::ContextActor;
pub use adapter::ActionPredictionAdapter;
pub use random::RandomSequenceModel;
pub use trait_::{ActionSequences, SequenceModel};
