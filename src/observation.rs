//! Observation encoding for frameworks that only accept flat vectors.
//!
//! A window is flattened field by field in [`StreamField::ORDER`]:
//! ```text
//! [states(L×D_s)] ++ [actions(L×D_a)] ++ [returns_to_go(L)] ++ [timesteps(L)] ++ [mask(L)]
//! ```
//! Timesteps are written as their integer value, the mask as `0.0` / `1.0`.

use std::ops::Range;

use crate::context::ContextWindow;
use crate::error::{ContextError, Result};
use crate::types::{StreamField, WindowShape};

/// Converts between structured windows and flat observation vectors.
pub struct ObservationAdapter;

impl ObservationAdapter {
    /// Length of a flat observation for `shapes`.
    pub fn flat_dim(shapes: &WindowShape) -> usize {
        StreamField::ORDER.iter().map(|f| shapes.stride(*f)).sum()
    }

    /// Position of `field` inside a flat observation.
    pub fn field_range(field: StreamField, shapes: &WindowShape) -> Range<usize> {
        let mut start = 0;
        for f in StreamField::ORDER {
            let stride = shapes.stride(f);
            if f == field {
                return start..start + stride;
            }
            start += stride;
        }
        unreachable!("StreamField::ORDER lists every field")
    }

    fn field_slice<'a>(flat: &'a [f64], field: StreamField, shapes: &WindowShape) -> &'a [f64] {
        &flat[Self::field_range(field, shapes)]
    }

    /// Flattens a window into a single vector.
    pub fn flatten(window: &ContextWindow) -> Vec<f64> {
        let mut flat = Vec::with_capacity(Self::flat_dim(&window.shape()));
        Self::flatten_into(window, &mut flat);
        flat
    }

    /// Flattens several windows of the same shape back to back.
    pub fn flatten_batch(windows: &[ContextWindow]) -> Vec<f64> {
        let per_window = windows
            .first()
            .map(|w| Self::flat_dim(&w.shape()))
            .unwrap_or(0);
        let mut flat = Vec::with_capacity(per_window * windows.len());
        for w in windows {
            Self::flatten_into(w, &mut flat);
        }
        flat
    }

    fn flatten_into(window: &ContextWindow, out: &mut Vec<f64>) {
        out.extend_from_slice(window.states());
        out.extend_from_slice(window.actions());
        out.extend_from_slice(window.returns_to_go());
        out.extend(window.timesteps().iter().map(|t| *t as f64));
        out.extend(window.mask().iter().map(|m| if *m { 1.0 } else { 0.0 }));
    }

    /// Rebuilds a window from a flat observation.
    ///
    /// # Errors
    ///
    /// * [`ContextError::FlatLength`] if `flat` does not have `flat_dim` values.
    /// * [`ContextError::InvalidValue`] if a timestep is not a non-negative
    ///   integer, a mask entry is not 0 or 1, padding follows a valid entry,
    ///   or timesteps decrease.
    pub fn unflatten(flat: &[f64], shapes: &WindowShape) -> Result<ContextWindow> {
        let expected = Self::flat_dim(shapes);
        if flat.len() != expected {
            return Err(ContextError::FlatLength {
                expected,
                actual: flat.len(),
            });
        }

        let field = |f: StreamField| Self::field_slice(flat, f, shapes);

        let timesteps = field(StreamField::Timestep)
            .iter()
            .enumerate()
            .map(|(index, &value)| {
                let integral = value.is_finite() && value.fract() == 0.0;
                if integral && (0.0..=u32::MAX as f64).contains(&value) {
                    Ok(value as u32)
                } else {
                    Err(ContextError::InvalidValue {
                        field: StreamField::Timestep,
                        index,
                        value,
                    })
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let mask = field(StreamField::Mask)
            .iter()
            .enumerate()
            .map(|(index, &value)| {
                if value == 1.0 {
                    Ok(true)
                } else if value == 0.0 {
                    Ok(false)
                } else {
                    Err(ContextError::InvalidValue {
                        field: StreamField::Mask,
                        index,
                        value,
                    })
                }
            })
            .collect::<Result<Vec<_>>>()?;

        ContextWindow::from_parts(
            *shapes,
            field(StreamField::State).to_vec(),
            field(StreamField::Action).to_vec(),
            field(StreamField::ReturnToGo).to_vec(),
            timesteps,
            mask,
        )
    }

    /// Rebuilds every window of a batch of flat observations.
    pub fn unflatten_batch(flat: &[f64], shapes: &WindowShape) -> Result<Vec<ContextWindow>> {
        let per_window = Self::flat_dim(shapes);
        if per_window == 0 || flat.len() % per_window != 0 {
            return Err(ContextError::FlatLength {
                expected: per_window,
                actual: flat.len(),
            });
        }
        flat.chunks_exact(per_window)
            .map(|chunk| Self::unflatten(chunk, shapes))
            .collect()
    }

    /// State at the final window position of a flat observation.
    ///
    /// Reads the state block directly; used by value functions that only look
    /// at the newest state.
    pub fn last_state<'a>(flat: &'a [f64], shapes: &WindowShape) -> Result<&'a [f64]> {
        let expected = Self::flat_dim(shapes);
        if flat.len() != expected {
            return Err(ContextError::FlatLength {
                expected,
                actual: flat.len(),
            });
        }
        let states = Self::field_range(StreamField::State, shapes);
        Ok(&flat[states.end - shapes.state_dim..states.end])
    }
}

/// A batch of windows stacked field by field, as handed to a sequence model.
///
/// Every field is laid out `[batch][position][feature]`, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowBatch {
    pub batch_size: usize,
    pub shape: WindowShape,
    pub states: Vec<f64>,
    pub actions: Vec<f64>,
    pub returns_to_go: Vec<f64>,
    pub timesteps: Vec<u32>,
    pub mask: Vec<bool>,
}

impl WindowBatch {
    /// Stacks windows that all share one shape.
    pub fn stack(windows: &[ContextWindow]) -> Result<Self> {
        let Some(first) = windows.first() else {
            return Err(ContextError::EmptyWindow);
        };
        let shape = first.shape();
        let n = windows.len();

        let mut batch = Self {
            batch_size: n,
            shape,
            states: Vec::with_capacity(n * shape.stride(StreamField::State)),
            actions: Vec::with_capacity(n * shape.stride(StreamField::Action)),
            returns_to_go: Vec::with_capacity(n * shape.window_length),
            timesteps: Vec::with_capacity(n * shape.window_length),
            mask: Vec::with_capacity(n * shape.window_length),
        };

        for w in windows {
            let ws = w.shape();
            if ws != shape {
                let field = if ws.action_dim != shape.action_dim {
                    StreamField::Action
                } else {
                    StreamField::State
                };
                return Err(ContextError::shape(
                    field,
                    shape.stride(field),
                    ws.stride(field),
                ));
            }
            batch.states.extend_from_slice(w.states());
            batch.actions.extend_from_slice(w.actions());
            batch.returns_to_go.extend_from_slice(w.returns_to_go());
            batch.timesteps.extend_from_slice(w.timesteps());
            batch.mask.extend_from_slice(w.mask());
        }
        Ok(batch)
    }

    /// State at `(b, position)`.
    pub fn state(&self, b: usize, position: usize) -> &[f64] {
        let d = self.shape.state_dim;
        let start = (b * self.shape.window_length + position) * d;
        &self.states[start..start + d]
    }

    /// Scalar-field index of `(b, position)`.
    pub fn index(&self, b: usize, position: usize) -> usize {
        b * self.shape.window_length + position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContextConfig;
    use crate::context::SequenceContextBuffer;

    fn sample_window() -> ContextWindow {
        let config = ContextConfig {
            window_length: 4,
            state_dim: 3,
            action_dim: 2,
            timestep_cap: 10,
            desired_target_return: 12.0,
            reward_scale_factor: 4.0,
        };
        let mut buf = SequenceContextBuffer::new(config).unwrap();
        buf.reset_from_config(&[0.1, 0.2, 0.3]).unwrap();
        buf.record_action(&[1.0, -1.0]).unwrap();
        buf.advance(&[0.4, 0.5, 0.6], 2.0).unwrap();
        buf.current_window()
    }

    #[test]
    fn flatten_has_flat_dim() {
        let w = sample_window();
        let flat = ObservationAdapter::flatten(&w);
        assert_eq!(flat.len(), ObservationAdapter::flat_dim(&w.shape()));
        assert_eq!(flat.len(), 12 + 8 + 4 + 4 + 4);
    }

    #[test]
    fn flatten_field_order() {
        let w = sample_window();
        let shapes = w.shape();
        let flat = ObservationAdapter::flatten(&w);
        let mask = &flat[ObservationAdapter::field_range(StreamField::Mask, &shapes)];
        assert_eq!(mask, &[0.0, 0.0, 1.0, 1.0]);
        let ts = &flat[ObservationAdapter::field_range(StreamField::Timestep, &shapes)];
        assert_eq!(ts, &[0.0, 0.0, 0.0, 1.0]);
        let actions = &flat[ObservationAdapter::field_range(StreamField::Action, &shapes)];
        assert_eq!(actions, &[0.0, 0.0, 0.0, 0.0, 1.0, -1.0, 0.0, 0.0]);
        assert_eq!(&flat[..3], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn unflatten_inverts_flatten() {
        let w = sample_window();
        let flat = ObservationAdapter::flatten(&w);
        let restored = ObservationAdapter::unflatten(&flat, &w.shape()).unwrap();
        assert_eq!(restored, w);
    }

    #[test]
    fn unflatten_rejects_wrong_length() {
        let w = sample_window();
        let mut flat = ObservationAdapter::flatten(&w);
        flat.pop();
        let err = ObservationAdapter::unflatten(&flat, &w.shape()).unwrap_err();
        assert_eq!(
            err,
            ContextError::FlatLength {
                expected: 32,
                actual: 31
            }
        );
    }

    #[test]
    fn unflatten_rejects_fractional_mask() {
        let w = sample_window();
        let shapes = w.shape();
        let mut flat = ObservationAdapter::flatten(&w);
        let mask = ObservationAdapter::field_range(StreamField::Mask, &shapes);
        flat[mask.start] = 0.5;
        let err = ObservationAdapter::unflatten(&flat, &shapes).unwrap_err();
        assert!(matches!(
            err,
            ContextError::InvalidValue {
                field: StreamField::Mask,
                index: 0,
                ..
            }
        ));
    }

    #[test]
    fn unflatten_rejects_negative_timestep() {
        let w = sample_window();
        let shapes = w.shape();
        let mut flat = ObservationAdapter::flatten(&w);
        let ts = ObservationAdapter::field_range(StreamField::Timestep, &shapes);
        flat[ts.start + 1] = -1.0;
        assert!(ObservationAdapter::unflatten(&flat, &shapes).is_err());
    }

    #[test]
    fn unflatten_rejects_padding_after_valid_entry() {
        let w = sample_window();
        let shapes = w.shape();
        let mut flat = ObservationAdapter::flatten(&w);
        let mask = ObservationAdapter::field_range(StreamField::Mask, &shapes);
        flat[mask].copy_from_slice(&[1.0, 0.0, 1.0, 0.0]);
        let err = ObservationAdapter::unflatten(&flat, &shapes).unwrap_err();
        assert_eq!(
            err,
            ContextError::InvalidValue {
                field: StreamField::Mask,
                index: 1,
                value: 0.0
            }
        );
    }

    #[test]
    fn unflatten_rejects_decreasing_timesteps() {
        let w = sample_window();
        let shapes = w.shape();
        let mut flat = ObservationAdapter::flatten(&w);
        let ts = ObservationAdapter::field_range(StreamField::Timestep, &shapes);
        flat[ts].copy_from_slice(&[0.0, 0.0, 5.0, 2.0]);
        assert!(matches!(
            ObservationAdapter::unflatten(&flat, &shapes),
            Err(ContextError::InvalidValue {
                field: StreamField::Timestep,
                index: 3,
                ..
            })
        ));
    }

    #[test]
    fn batch_roundtrip() {
        let w = sample_window();
        let windows = vec![w.clone(), ContextWindow::padding(w.shape()), w];
        let flat = ObservationAdapter::flatten_batch(&windows);
        let restored = ObservationAdapter::unflatten_batch(&flat, &windows[0].shape()).unwrap();
        assert_eq!(restored, windows);
    }

    #[test]
    fn last_state_reads_final_position() {
        let w = sample_window();
        let flat = ObservationAdapter::flatten(&w);
        let last = ObservationAdapter::last_state(&flat, &w.shape()).unwrap();
        assert_eq!(last, &[0.4, 0.5, 0.6]);
    }

    #[test]
    fn stack_lays_out_batch_major() {
        let w = sample_window();
        let pad = ContextWindow::padding(w.shape());
        let batch = WindowBatch::stack(&[pad, w]).unwrap();
        assert_eq!(batch.batch_size, 2);
        assert_eq!(batch.state(1, 3), &[0.4, 0.5, 0.6]);
        assert_eq!(batch.state(0, 3), &[0.0, 0.0, 0.0]);
        assert!(batch.mask[batch.index(1, 3)]);
        assert!(!batch.mask[batch.index(0, 3)]);
    }

    #[test]
    fn stack_rejects_mixed_shapes() {
        let w = sample_window();
        let other = ContextWindow::padding(WindowShape::new(4, 3, 1));
        let err = WindowBatch::stack(&[w, other]).unwrap_err();
        assert_eq!(err, ContextError::shape(StreamField::Action, 8, 4));
    }

    #[test]
    fn stack_rejects_empty_batch() {
        assert_eq!(WindowBatch::stack(&[]), Err(ContextError::EmptyWindow));
    }
}
