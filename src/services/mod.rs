pub mod draft_store;
pub mod grade_poller;
pub mod identity_gate;
pub mod integrity;

pub use draft_store::{AnswerDraftStore, DraftRecord};
pub use grade_poller::{GradePollJob, GradePollOutcome, GradePoller, PollResult};
pub use identity_gate::{AuthState, IdentityGate};
pub use integrity::{IntegrityRecorder, QuestionTelemetry};
