//! Sequence model trait.

use crate::error::{ContextError, Result};
use crate::observation::WindowBatch;
use crate::types::{InferenceOptions, StreamField};

/// Per-position action predictions for a batch of windows.
///
/// Laid out `[batch][position][action]`, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionSequences {
    pub batch_size: usize,
    pub window_length: usize,
    pub action_dim: usize,
    pub values: Vec<f64>,
}

impl ActionSequences {
    /// Wraps raw model output, checking its length.
    pub fn new(
        batch_size: usize,
        window_length: usize,
        action_dim: usize,
        values: Vec<f64>,
    ) -> Result<Self> {
        let expected = batch_size * window_length * action_dim;
        if values.len() != expected {
            return Err(ContextError::shape(
                StreamField::Action,
                expected,
                values.len(),
            ));
        }
        Ok(Self {
            batch_size,
            window_length,
            action_dim,
            values,
        })
    }

    /// Predicted action for window `b` at `position`.
    pub fn action_at(&self, b: usize, position: usize) -> &[f64] {
        let start = (b * self.window_length + position) * self.action_dim;
        &self.values[start..start + self.action_dim]
    }
}

/// A model that predicts an action for every position of every window.
///
/// Inference takes `&self`: predicting never changes model parameters.
/// Train/eval behaviour and sampling come in through `options` on each call.
pub trait SequenceModel {
    /// Predicts actions for all five streams of `batch`.
    fn predict(&self, batch: &WindowBatch, options: InferenceOptions) -> Result<ActionSequences>;

    /// Size of one predicted action.
    fn action_dim(&self) -> usize;

    /// Returns a human-readable name for this model.
    fn name(&self) -> &str;
}

impl<M: SequenceModel + ?Sized> SequenceModel for Box<M> {
    fn predict(&self, batch: &WindowBatch, options: InferenceOptions) -> Result<ActionSequences> {
        (**self).predict(batch, options)
    }

    fn action_dim(&self) -> usize {
        (**self).action_dim()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_at_indexes_batch_major() {
        let values: Vec<f64> = (0..12).map(|v| v as f64).collect();
        let seqs = ActionSequences::new(2, 3, 2, values).unwrap();
        assert_eq!(seqs.action_at(0, 0), &[0.0, 1.0]);
        assert_eq!(seqs.action_at(1, 2), &[10.0, 11.0]);
    }

    #[test]
    fn new_rejects_wrong_length() {
        let err = ActionSequences::new(1, 3, 2, vec![0.0; 5]).unwrap_err();
        assert_eq!(err, ContextError::shape(StreamField::Action, 6, 5));
    }
}
