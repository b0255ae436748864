//! Error types for vocab-core.

use thiserror::Error;

/// Result type alias using QuizError.
pub type Result<T> = std::result::Result<T, QuizError>;

/// Recoverable errors from quiz generation and session control.
///
/// The parser has no error channel: text without recognizable structure
/// yields an empty result, and whether that is worth reporting is up to the
/// caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error("no vocabulary words available")]
    EmptyInput,

    #[error("need at least {required} words, have {available}")]
    InsufficientWords { required: usize, available: usize },

    #[error("no incorrect words to review")]
    NoIncorrectWordsToReview,

    #[error("failed to generate quiz questions")]
    NoQuestionsGenerated,
}
