//! Sliding-window sequence context.
//!
//! [`SequenceContextBuffer`] owns the history of one episode;
//! [`WindowView`] copies its trailing window out as a [`ContextWindow`].

pub mod buffer;
pub mod window;


pub use buffer::{BufferPhase, SequenceContextBuffer};
pub use window::{ContextStreams, ContextWindow, WindowView};
