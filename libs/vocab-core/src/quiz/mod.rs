//! Quiz generation and session control.

pub mod generator;
pub mod session;

pub use generator::{generate_questions, DEFAULT_OPTION_COUNT, MIN_QUIZ_WORDS};
pub use session::QuizSession;
