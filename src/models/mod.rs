pub mod grade;
pub mod identity;
pub mod question;

pub use grade::{Grade, GradeReport, ScoreLevel};
pub use identity::Identity;
pub use question::{AnswerReceipt, AnswerSubmission, Question, Submission};
