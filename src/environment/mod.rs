//! Simulator interface and its composition with the sequence context.
//!
//! Any concrete simulator implements [`Simulator`]; [`ContextEnvironment`]
//! turns it into an environment whose observations are context windows.

pub mod point_mass;
pub mod simulator;
pub mod wrapper;

pub use point_mass::PointMassSimulator;
pub use simulator::{Simulator, SimulatorStep};
pub use wrapper::{ContextEnvironment, ContextStep};
