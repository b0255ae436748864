//! Multiple-choice question generation.
//!
//! Generation is pure with respect to session state: the whole question list
//! is built and shuffled before anything is published, so a host application
//! can run it on a worker thread (it is O(n²) in the word count) and install
//! the finished result in a single step.

use rand::seq::SliceRandom;
use rand::RngCore;

use crate::error::{QuizError, Result};
use crate::types::{QuizQuestion, VocabularyWord};

/// Options per question when the caller does not say otherwise.
pub const DEFAULT_OPTION_COUNT: usize = 4;

/// A quiz cannot be built from fewer words than this.
pub const MIN_QUIZ_WORDS: usize = 2;

/// Generate one question per word, in randomized order.
///
/// The requested option count is silently clamped to the word count.
/// Distractors are drawn from the definitions of the *other* words, keyed by
/// entity id rather than definition text: two words sharing identical text
/// are still distinct pool members, while a duplicated entity contributes
/// nothing against itself.
pub fn generate_questions(
    words: &[VocabularyWord],
    number_of_options: usize,
    rng: &mut dyn RngCore,
) -> Result<Vec<QuizQuestion>> {
    if words.is_empty() {
        return Err(QuizError::EmptyInput);
    }
    if words.len() < MIN_QUIZ_WORDS {
        return Err(QuizError::InsufficientWords {
            required: MIN_QUIZ_WORDS,
            available: words.len(),
        });
    }

    let effective_options = number_of_options.min(words.len());
    let mut questions = Vec::with_capacity(words.len());

    for word in words {
        let mut pool: Vec<&str> = words
            .iter()
            .filter(|other| other.id != word.id)
            .map(|other| other.definition.as_str())
            .collect();
        pool.shuffle(rng);

        let mut options: Vec<String> = pool
            .iter()
            .take(effective_options - 1)
            .map(|definition| definition.to_string())
            .collect();
        options.push(word.definition.clone());
        options.shuffle(rng);

        // First occurrence wins when duplicate texts are present.
        let correct_answer_index = match options.iter().position(|o| *o == word.definition) {
            Some(index) => index,
            None => {
                tracing::warn!(word = %word.word, "correct definition missing from options, skipping");
                continue;
            }
        };

        questions.push(QuizQuestion {
            word_text: word.word.clone(),
            correct_definition: word.definition.clone(),
            options,
            correct_answer_index,
            user_answer_index: None,
        });
    }

    // Input order must not leak quiz order.
    questions.shuffle(rng);

    if questions.is_empty() {
        return Err(QuizError::NoQuestionsGenerated);
    }

    tracing::debug!(count = questions.len(), "generated quiz questions");
    Ok(questions)
}
