/// Action vector layout and normalized-to-physical mapping.
pub mod action;
/// Simulation clock for timestep management.
pub mod clock;
pub mod environment;
pub mod observation;
/// Post-hoc episode report computation.
pub mod report;
pub mod reward;
pub mod safety;
pub mod types;

pub use environment::{EnvPhase, MicrogridEnv};
pub use types::{StepInfo, StepRecord, StepResult};
