pub mod engine;
pub mod quote;
pub mod sequencer;
pub mod steps;
pub mod validator;

pub use engine::{BvnComparison, StepOutcome, WizardEngine, WizardError};
pub use steps::Step;
