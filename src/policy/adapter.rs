//! Action extraction from sequence-model output.

use tracing::warn;

use super::trait_::SequenceModel;
use crate::context::ContextWindow;
use crate::error::{ContextError, Result};
use crate::observation::{ObservationAdapter, WindowBatch};
use crate::types::{InferenceOptions, StreamField, WindowShape};

/// Runs a [`SequenceModel`] on windows and returns one action per window.
///
/// The model predicts a whole sequence; only the prediction at each window's
/// final valid position is returned.
pub struct ActionPredictionAdapter<M> {
    model: M,
}

impl<M: SequenceModel> ActionPredictionAdapter<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Gives the model back, e.g. to hand it to an optimizer.
    pub fn into_inner(self) -> M {
        self.model
    }

    /// Predicts one action per window with a single model call.
    ///
    /// # Errors
    ///
    /// * [`ContextError::EmptyWindow`] if a window has no valid position.
    /// * [`ContextError::ShapeMismatch`] if windows disagree in shape or the
    ///   model output does not match `batch × L × D_a`.
    /// * Whatever the model returns; failures are not retried.
    pub fn predict(
        &self,
        windows: &[ContextWindow],
        options: InferenceOptions,
    ) -> Result<Vec<Vec<f64>>> {
        if windows.is_empty() {
            warn!(model = self.model.name(), "empty prediction batch");
            return Ok(Vec::new());
        }

        let positions = windows
            .iter()
            .map(|w| w.last_valid_index().ok_or(ContextError::EmptyWindow))
            .collect::<Result<Vec<_>>>()?;

        let batch = WindowBatch::stack(windows)?;
        let shape = batch.shape;
        if self.model.action_dim() != shape.action_dim {
            return Err(ContextError::shape(
                StreamField::Action,
                shape.action_dim,
                self.model.action_dim(),
            ));
        }

        let predicted = self.model.predict(&batch, options)?;
        if predicted.batch_size != batch.batch_size
            || predicted.window_length != shape.window_length
            || predicted.action_dim != shape.action_dim
        {
            return Err(ContextError::shape(
                StreamField::Action,
                batch.batch_size * shape.stride(StreamField::Action),
                predicted.values.len(),
            ));
        }

        Ok(positions
            .iter()
            .enumerate()
            .map(|(b, &pos)| predicted.action_at(b, pos).to_vec())
            .collect())
    }

    /// Batch-of-one form of [`predict`](Self::predict).
    pub fn predict_one(&self, window: &ContextWindow, options: InferenceOptions) -> Result<Vec<f64>> {
        self.predict(std::slice::from_ref(window), options)?
            .pop()
            .ok_or(ContextError::EmptyWindow)
    }

    /// Predicts from a batch of flat observations of shape `shapes`.
    pub fn predict_flat(
        &self,
        flat: &[f64],
        shapes: &WindowShape,
        options: InferenceOptions,
    ) -> Result<Vec<Vec<f64>>> {
        let windows = ObservationAdapter::unflatten_batch(flat, shapes)?;
        self.predict(&windows, options)
    }
}
