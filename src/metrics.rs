//! Episode evaluation for a context-driven actor.
//!
//! Runs full episodes and reports per-episode return and length along with
//! their mean and standard deviation.

use std::fmt;

use tracing::info;

use crate::environment::{ContextEnvironment, Simulator};
use crate::error::Result;
use crate::policy::{ContextActor, SequenceModel};

/// Outcome of one episode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeOutcome {
    /// Sum of raw (unscaled) rewards.
    pub total_reward: f64,
    /// Number of steps taken.
    pub length: usize,
    pub terminated: bool,
}

/// Aggregated evaluation metrics over multiple episodes.
#[derive(Debug, Clone)]
pub struct EvaluationMetrics {
    /// Per-episode outcomes, in order.
    pub episodes: Vec<EpisodeOutcome>,
    pub mean_return: f64,
    pub std_return: f64,
    pub mean_length: f64,
    pub std_length: f64,
}

impl EvaluationMetrics {
    /// Evaluates an actor over `n_episodes` full episodes.
    ///
    /// An episode ends when the simulator reports `terminated` or `truncated`,
    /// or after its `timestep_limit` if it has one. Errors abort the evaluation.
    pub fn evaluate<S, M>(
        env: &mut ContextEnvironment<S>,
        actor: &ContextActor<M>,
        n_episodes: usize,
    ) -> Result<Self>
    where
        S: Simulator,
        M: SequenceModel,
    {
        let limit = env.simulator().timestep_limit().map(|l| l as usize);
        let mut episodes = Vec::with_capacity(n_episodes);

        for episode in 0..n_episodes {
            let mut window = env.reset()?;
            let mut outcome = EpisodeOutcome {
                total_reward: 0.0,
                length: 0,
                terminated: false,
            };

            loop {
                let action = actor.act(&window)?;
                let step = env.step(&action)?;
                outcome.total_reward += step.raw_reward;
                outcome.length += 1;
                let done = step.done();
                let terminated = step.terminated;
                window = step.window;

                if done || limit.is_some_and(|l| outcome.length >= l) {
                    outcome.terminated = terminated;
                    break;
                }
            }

            info!(
                episode,
                actor = actor.name(),
                total_reward = outcome.total_reward,
                length = outcome.length,
                "episode finished"
            );
            episodes.push(outcome);
        }

        Ok(Self::from_outcomes(episodes))
    }

    /// Aggregates already collected outcomes (population standard deviation).
    pub fn from_outcomes(episodes: Vec<EpisodeOutcome>) -> Self {
        let returns: Vec<f64> = episodes.iter().map(|e| e.total_reward).collect();
        let lengths: Vec<f64> = episodes.iter().map(|e| e.length as f64).collect();
        let (mean_return, std_return) = mean_std(&returns);
        let (mean_length, std_length) = mean_std(&lengths);
        Self {
            episodes,
            mean_return,
            std_return,
            mean_length,
            std_length,
        }
    }

    pub fn n_episodes(&self) -> usize {
        self.episodes.len()
    }
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

impl fmt::Display for EvaluationMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "=== Evaluation Metrics ({} episodes) ===",
            self.n_episodes()
        )?;
        writeln!(
            f,
            "  Return:  {:.2} ± {:.2}",
            self.mean_return, self.std_return
        )?;
        write!(
            f,
            "  Length:  {:.1} ± {:.1}",
            self.mean_length, self.std_length
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContextConfig;
    use crate::environment::{PointMassSimulator, SimulatorStep};
    use crate::policy::RandomSequenceModel;
    use crate::types::InferenceOptions;

    #[test]
    fn evaluate_completes() {
        let sim = PointMassSimulator::new(2, 10, 42);
        let config = ContextConfig {
            window_length: 4,
            state_dim: 4,
            action_dim: 2,
            timestep_cap: 20,
            desired_target_return: 0.0,
            reward_scale_factor: 1.0,
        };
        let mut env = ContextEnvironment::new(sim, config).unwrap();
        let actor = ContextActor::new(
            RandomSequenceModel::new(2, -1.0, 1.0, 0).unwrap(),
            InferenceOptions::sampled(),
        );
        let metrics = EvaluationMetrics::evaluate(&mut env, &actor, 3).unwrap();
        assert_eq!(metrics.n_episodes(), 3);
        assert!(metrics.episodes.iter().all(|e| e.length >= 1 && e.length <= 10));
        assert!(metrics.mean_return <= 0.0);
    }

    /// Terminates after `len` steps with reward 1 per step.
    struct Fixed {
        t: u32,
        len: u32,
    }

    impl Simulator for Fixed {
        fn state_dim(&self) -> usize {
            1
        }

        fn action_dim(&self) -> usize {
            1
        }

        fn reset(&mut self) -> Result<Vec<f64>> {
            self.t = 0;
            Ok(vec![0.0])
        }

        fn step(&mut self, _action: &[f64]) -> Result<SimulatorStep> {
            self.t += 1;
            Ok(SimulatorStep {
                state: vec![self.t as f64],
                reward: 1.0,
                terminated: self.t >= self.len,
                truncated: false,
            })
        }
    }

    #[test]
    fn episode_ends_on_termination() {
        let config = ContextConfig {
            window_length: 2,
            state_dim: 1,
            action_dim: 1,
            timestep_cap: 10,
            desired_target_return: 3.0,
            reward_scale_factor: 1.0,
        };
        let mut env = ContextEnvironment::new(Fixed { t: 0, len: 3 }, config).unwrap();
        let actor = ContextActor::new(
            RandomSequenceModel::new(1, 0.0, 1.0, 0).unwrap(),
            InferenceOptions::eval(),
        );
        let metrics = EvaluationMetrics::evaluate(&mut env, &actor, 2).unwrap();
        let expected = EpisodeOutcome {
            total_reward: 3.0,
            length: 3,
            terminated: true,
        };
        assert_eq!(metrics.episodes, vec![expected, expected]);
        assert_eq!(env.buffer().steps(), 3);
    }

    #[test]
    fn mean_and_std_of_outcomes() {
        let outcomes = vec![
            EpisodeOutcome {
                total_reward: 1.0,
                length: 10,
                terminated: true,
            },
            EpisodeOutcome {
                total_reward: 3.0,
                length: 20,
                terminated: false,
            },
        ];
        let m = EvaluationMetrics::from_outcomes(outcomes);
        assert!((m.mean_return - 2.0).abs() < 1e-12);
        assert!((m.std_return - 1.0).abs() < 1e-12);
        assert!((m.mean_length - 15.0).abs() < 1e-12);
        assert!((m.std_length - 5.0).abs() < 1e-12);
    }

    #[test]
    fn display_mentions_episode_count() {
        let m = EvaluationMetrics::from_outcomes(vec![]);
        assert!(m.to_string().contains("(0 episodes)"));
    }
}
