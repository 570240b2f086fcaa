//! Fixed-options actor used in rollouts.

use super::adapter::ActionPredictionAdapter;
use super::trait_::SequenceModel;
use crate::context::ContextWindow;
use crate::error::Result;
use crate::types::InferenceOptions;

/// Picks actions for context windows with a fixed set of inference options.
///
/// Rollout code holds one actor per episode loop; the options are chosen once
/// by the caller rather than toggled on the model.
pub struct ContextActor<M> {
    adapter: ActionPredictionAdapter<M>,
    options: InferenceOptions,
}

impl<M: SequenceModel> ContextActor<M> {
    pub fn new(model: M, options: InferenceOptions) -> Self {
        Self {
            adapter: ActionPredictionAdapter::new(model),
            options,
        }
    }

    pub fn options(&self) -> InferenceOptions {
        self.options
    }

    pub fn set_options(&mut self, options: InferenceOptions) {
        self.options = options;
    }

    pub fn adapter(&self) -> &ActionPredictionAdapter<M> {
        &self.adapter
    }

    /// Action for the newest valid position of `window`.
    pub fn act(&self, window: &ContextWindow) -> Result<Vec<f64>> {
        self.adapter.predict_one(window, self.options)
    }

    pub fn name(&self) -> &str {
        self.adapter.model().name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::RandomSequenceModel;
    use crate::types::WindowShape;

    #[test]
    fn act_returns_one_action() {
        let actor = ContextActor::new(
            RandomSequenceModel::new(2, -1.0, 1.0, 0).unwrap(),
            InferenceOptions::sampled(),
        );
        let shape = WindowShape::new(3, 4, 2);
        let mut mask = vec![false; 3];
        mask[2] = true;
        let w = ContextWindow::from_parts(
            shape,
            vec![0.0; 12],
            vec![0.0; 6],
            vec![1.0; 3],
            vec![0; 3],
            mask,
        )
        .unwrap();
        let action = actor.act(&w).unwrap();
        assert_eq!(action.len(), 2);
        assert_eq!(actor.name(), "random");
    }
}
