pub mod question;

pub use question::{AnswerFeedback, Question};
