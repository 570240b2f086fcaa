// Demonstration: drive the point-mass simulator through a sequence context.
//
// Build/run from this repo root:
//   cargo run --example context_rollout_demo -- --episodes 5 --window 10 --seed 42

use std::env;

use seqctx::{
    ContextActor, ContextConfig, ContextEnvironment, EvaluationMetrics, InferenceOptions,
    ObservationAdapter, PointMassSimulator, RandomSequenceModel, Simulator,
};

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = env::args().collect();
    let episodes: usize = arg_value(&args, "--episodes")
        .and_then(|s| s.parse().ok())
        .unwrap_or(5);
    let window_length: usize = arg_value(&args, "--window")
        .and_then(|s| s.parse().ok())
        .unwrap_or(10);
    let seed: u64 = arg_value(&args, "--seed")
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);

    let simulator = PointMassSimulator::new(2, 50, seed);
    let config = ContextConfig {
        window_length,
        state_dim: simulator.state_dim(),
        action_dim: simulator.action_dim(),
        timestep_cap: 50,
        desired_target_return: -20.0,
        reward_scale_factor: 10.0,
    };
    println!(
        "Window of {} steps, flat observation of {} values",
        config.window_length,
        ObservationAdapter::flat_dim(&config.shapes())
    );

    let mut env = match ContextEnvironment::new(simulator, config) {
        Ok(env) => env,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };
    let model = match RandomSequenceModel::new(2, -1.0, 1.0, seed) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("Invalid model: {e}");
            std::process::exit(2);
        }
    };
    let actor = ContextActor::new(model, InferenceOptions::sampled());

    match EvaluationMetrics::evaluate(&mut env, &actor, episodes) {
        Ok(metrics) => {
            println!("Model: {}", actor.name());
            println!("{}", metrics);
        }
        Err(e) => {
            eprintln!("Evaluation failed: {e}");
            std::process::exit(1);
        }
    }
}

fn arg_value<'a>(args: &'a [String], key: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}
