//! Neural sequence model using tch-rs (PyTorch bindings).
//!
//! Provides a position-wise MLP that maps every window position to an
//! action. This module is only available with the `rl-nn` feature.

use std::path::Path;

use tch::{nn, nn::ModuleT, Device, Kind, Tensor};

use crate::config::ContextConfig;
use crate::error::Result;
use crate::observation::WindowBatch;
use crate::policy::{ActionSequences, SequenceModel};
use crate::types::{InferenceOptions, SelectionMode};

/// Position-wise MLP sequence model.
///
/// Architecture per position: `[state, return_to_go, timestep / T_max] →
/// hidden → hidden → action_dim` with ReLU activations, dropout after the
/// first layer, and a `tanh` output scaled by `action_scale`.
pub struct MlpSequenceModel {
    vs: nn::VarStore,
    net: nn::SequentialT,
    state_dim: usize,
    action_dim: usize,
    timestep_cap: u32,
    /// Output bound: actions lie in `[-action_scale, action_scale]`.
    pub action_scale: f64,
    /// Standard deviation of the Gaussian noise added in sample mode.
    pub exploration_std: f64,
    device: Device,
}

impl MlpSequenceModel {
    /// Creates a freshly initialised model sized for `config`.
    pub fn new(config: &ContextConfig, hidden: i64, dropout: f64, device: Device) -> Self {
        let vs = nn::VarStore::new(device);
        let p = &vs.root();
        let input_dim = config.state_dim as i64 + 2;
        let net = nn::seq_t()
            .add(nn::linear(p / "l1", input_dim, hidden, Default::default()))
            .add_fn(|x| x.relu())
            .add_fn_t(move |x, train| x.dropout(dropout, train))
            .add(nn::linear(p / "l2", hidden, hidden, Default::default()))
            .add_fn(|x| x.relu())
            .add(nn::linear(
                p / "l3",
                hidden,
                config.action_dim as i64,
                Default::default(),
            ));

        Self {
            vs,
            net,
            state_dim: config.state_dim,
            action_dim: config.action_dim,
            timestep_cap: config.timestep_cap,
            action_scale: 1.0,
            exploration_std: 0.1,
            device,
        }
    }

    /// Builds the `[B, L, D_s + 2]` input tensor.
    fn input(&self, batch: &WindowBatch) -> Tensor {
        let b = batch.batch_size as i64;
        let l = batch.shape.window_length as i64;
        let states = Tensor::from_slice(&batch.states).reshape([b, l, self.state_dim as i64]);
        let rtg = Tensor::from_slice(&batch.returns_to_go).reshape([b, l, 1]);
        let ts: Vec<f64> = batch
            .timesteps
            .iter()
            .map(|t| *t as f64 / self.timestep_cap as f64)
            .collect();
        let ts = Tensor::from_slice(&ts).reshape([b, l, 1]);
        Tensor::cat(&[states, rtg, ts], -1)
            .to_kind(Kind::Float)
            .to_device(self.device)
    }

    /// Forward pass: returns `[B, L, D_a]` mean actions.
    pub fn forward(&self, input: &Tensor, train: bool) -> Tensor {
        self.net.forward_t(input, train).tanh() * self.action_scale
    }

    /// Saves the parameters.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.vs.save(path)?;
        Ok(())
    }

    /// Loads parameters saved by [`save`](Self::save).
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.vs.load(path)?;
        Ok(())
    }

    /// Returns a mutable reference to the variable store for optimization.
    pub fn var_store_mut(&mut self) -> &mut nn::VarStore {
        &mut self.vs
    }

    /// Returns a reference to the variable store.
    pub fn var_store(&self) -> &nn::VarStore {
        &self.vs
    }
}

impl SequenceModel for MlpSequenceModel {
    fn predict(&self, batch: &WindowBatch, options: InferenceOptions) -> Result<ActionSequences> {
        let out = tch::no_grad(|| {
            let mean = self.forward(&self.input(batch), options.phase.is_train());
            match options.selection {
                SelectionMode::Deterministic => mean,
                SelectionMode::Sample => {
                    let noisy = &mean + mean.randn_like() * self.exploration_std;
                    noisy.clamp(-self.action_scale, self.action_scale)
                }
            }
        });
        let values = Vec::<f64>::try_from(
            &out.to_device(Device::Cpu)
                .to_kind(Kind::Double)
                .flatten(0, -1),
        )?;
        ActionSequences::new(
            batch.batch_size,
            batch.shape.window_length,
            self.action_dim,
            values,
        )
    }

    fn action_dim(&self) -> usize {
        self.action_dim
    }

    fn name(&self) -> &str {
        "mlp"
    }
}
