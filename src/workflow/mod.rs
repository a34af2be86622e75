pub mod controller;
pub mod stage;

pub use controller::WorkflowController;
pub use stage::{GradeState, Stage, SubmitPhase};
