//! Quiz session state machine.
//!
//! A session moves from idle (no questions) to in-progress once generation
//! succeeds, and to complete when the last question has been advanced past.
//! From there `reset` returns to idle and `start_second_chance_round`
//! regenerates from the words answered incorrectly.
//!
//! The session is single-owner: every mutator takes `&mut self` and runs
//! synchronously, and generation results are installed wholesale, so readers
//! can never observe a partially built question list or a mix of two
//! generations — a later install supersedes the previous one entirely.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::error::{QuizError, Result};
use crate::quiz::generator::{generate_questions, DEFAULT_OPTION_COUNT};
use crate::types::{QuizQuestion, VocabularyWord};

/// Interactive quiz session: question list, cursor, score, and the
/// bookkeeping behind the second-chance round.
pub struct QuizSession {
    questions: Vec<QuizQuestion>,
    current_question_index: usize,
    score: u32,
    incorrect_words: Vec<VocabularyWord>,
    is_complete: bool,
    is_second_chance_round: bool,
    generation_error: Option<QuizError>,
    rng: Box<dyn RngCore + Send>,
}

impl QuizSession {
    /// New idle session with an entropy-seeded generator.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// New idle session with a caller-supplied generator, seeded in tests to
    /// make shuffles deterministic.
    pub fn with_rng(rng: impl RngCore + Send + 'static) -> Self {
        Self {
            questions: Vec::new(),
            current_question_index: 0,
            score: 0,
            incorrect_words: Vec::new(),
            is_complete: false,
            is_second_chance_round: false,
            generation_error: None,
            rng: Box::new(rng),
        }
    }

    /// Build a fresh quiz from `words`, replacing any previous questions.
    ///
    /// On a validation failure the question list is cleared so a stale quiz
    /// cannot be displayed; the error is kept in [`generation_error`] for
    /// observation as well as returned. `is_second_chance_round` is left
    /// alone — only [`start_second_chance_round`] manages that flag.
    ///
    /// [`generation_error`]: Self::generation_error
    /// [`start_second_chance_round`]: Self::start_second_chance_round
    pub fn generate_quiz(
        &mut self,
        words: &[VocabularyWord],
        number_of_options: usize,
    ) -> Result<()> {
        self.generation_error = None;

        match generate_questions(words, number_of_options, &mut *self.rng) {
            Ok(questions) => {
                self.install(questions);
                Ok(())
            }
            Err(err) => {
                if matches!(
                    err,
                    QuizError::EmptyInput | QuizError::InsufficientWords { .. }
                ) {
                    self.questions.clear();
                }
                tracing::debug!(error = %err, "quiz generation failed");
                self.generation_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Regenerate from the words answered incorrectly so far.
    ///
    /// The minimum-word validation applies again: with exactly one incorrect
    /// word the round flag is set but regeneration fails, leaving no
    /// questions.
    pub fn start_second_chance_round(&mut self) -> Result<()> {
        self.generation_error = None;

        if self.incorrect_words.is_empty() {
            let err = QuizError::NoIncorrectWordsToReview;
            self.generation_error = Some(err.clone());
            return Err(err);
        }

        self.is_second_chance_round = true;
        let review_words = self.incorrect_words.clone();
        self.generate_quiz(&review_words, DEFAULT_OPTION_COUNT)
    }

    /// Record an answer for the current question and update `word`'s lifetime
    /// counters. `word` must be the caller's persisted entity so the counter
    /// mutation lands where every other reader looks.
    ///
    /// No-op when no question is current.
    pub fn submit_answer(&mut self, answer_index: usize, word: &mut VocabularyWord) {
        let question = match self.questions.get_mut(self.current_question_index) {
            Some(question) => question,
            None => return,
        };

        question.user_answer_index = Some(answer_index);

        // Correctness is an index comparison, never a text comparison.
        if answer_index == question.correct_answer_index {
            self.score += 1;
            word.times_correct += 1;
        } else {
            word.times_incorrect += 1;
            self.incorrect_words.push(word.clone());
        }
    }

    /// Advance to the next question, or mark the session complete when
    /// already on the last one. Idempotent once complete.
    pub fn next_question(&mut self) {
        if self.current_question_index + 1 < self.questions.len() {
            self.current_question_index += 1;
        } else {
            self.is_complete = true;
        }
    }

    /// Return to the idle state. Word entities keep their historical
    /// counters.
    pub fn reset(&mut self) {
        self.questions.clear();
        self.current_question_index = 0;
        self.score = 0;
        self.incorrect_words.clear();
        self.is_complete = false;
        self.is_second_chance_round = false;
        self.generation_error = None;
    }

    fn install(&mut self, questions: Vec<QuizQuestion>) {
        self.questions = questions;
        self.current_question_index = 0;
        self.score = 0;
        self.incorrect_words.clear();
        self.is_complete = false;
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn current_question(&self) -> Option<&QuizQuestion> {
        self.questions.get(self.current_question_index)
    }

    pub fn current_question_index(&self) -> usize {
        self.current_question_index
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Words answered incorrectly so far, in answer order. Duplicates are
    /// kept when a word is missed more than once across rounds.
    pub fn incorrect_words(&self) -> &[VocabularyWord] {
        &self.incorrect_words
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub fn is_second_chance_round(&self) -> bool {
        self.is_second_chance_round
    }

    pub fn generation_error(&self) -> Option<&QuizError> {
        self.generation_error.as_ref()
    }
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn seeded_session() -> QuizSession {
        QuizSession::with_rng(ChaCha8Rng::seed_from_u64(9))
    }

    fn sample_words(n: usize) -> Vec<VocabularyWord> {
        (0..n)
            .map(|i| VocabularyWord::new(format!("word{i}"), format!("definition{i}")))
            .collect()
    }

    /// Current question's correct index, option count, and word text.
    fn current_info(session: &QuizSession) -> (usize, usize, String) {
        let question = session.current_question().unwrap();
        (
            question.correct_answer_index,
            question.options.len(),
            question.word_text.clone(),
        )
    }

    /// Answer every question in the running quiz, wrong for words named in
    /// `miss`, right otherwise.
    fn play_round(session: &mut QuizSession, words: &mut [VocabularyWord], miss: &[&str]) {
        while !session.is_complete() {
            let (correct, option_count, word_text) = current_info(session);
            let answer = if miss.contains(&word_text.as_str()) {
                (correct + 1) % option_count
            } else {
                correct
            };
            let word = words.iter_mut().find(|w| w.word == word_text).unwrap();
            session.submit_answer(answer, word);
            session.next_question();
        }
    }

    #[test]
    fn generate_quiz_populates_session() {
        let mut session = seeded_session();
        let words = sample_words(4);

        session.generate_quiz(&words, 4).unwrap();

        assert_eq!(session.questions().len(), 4);
        assert_eq!(session.current_question_index(), 0);
        assert_eq!(session.score(), 0);
        assert!(session.incorrect_words().is_empty());
        assert!(!session.is_complete());
        assert!(!session.is_second_chance_round());
        assert!(session.generation_error().is_none());
    }

    #[test]
    fn generate_quiz_rejects_empty_and_single_word() {
        let mut session = seeded_session();

        let err = session.generate_quiz(&[], 4).unwrap_err();
        assert_eq!(err, QuizError::EmptyInput);
        assert_eq!(session.generation_error(), Some(&QuizError::EmptyInput));

        let err = session.generate_quiz(&sample_words(1), 4).unwrap_err();
        assert_eq!(
            err,
            QuizError::InsufficientWords {
                required: 2,
                available: 1
            }
        );
    }

    #[test]
    fn failed_regeneration_clears_stale_questions() {
        let mut session = seeded_session();
        let words = sample_words(3);
        session.generate_quiz(&words, 4).unwrap();
        assert!(!session.questions().is_empty());

        assert!(session.generate_quiz(&words[..1], 4).is_err());

        assert!(session.questions().is_empty());
        assert!(session.generation_error().is_some());
    }

    #[test]
    fn generation_error_clears_on_next_attempt() {
        let mut session = seeded_session();
        session.generate_quiz(&[], 4).unwrap_err();
        assert!(session.generation_error().is_some());

        session.generate_quiz(&sample_words(2), 4).unwrap();
        assert!(session.generation_error().is_none());
    }

    #[test]
    fn correct_answer_updates_score_and_word_counters() {
        let mut session = seeded_session();
        let mut words = sample_words(3);
        session.generate_quiz(&words, 4).unwrap();

        let (correct, _, word_text) = current_info(&session);
        let word = words.iter_mut().find(|w| w.word == word_text).unwrap();
        session.submit_answer(correct, word);

        assert_eq!(session.score(), 1);
        assert_eq!(word.times_correct, 1);
        assert_eq!(word.times_incorrect, 0);
        assert!(session.incorrect_words().is_empty());
        assert_eq!(
            session.current_question().unwrap().user_answer_index,
            Some(correct)
        );
    }

    #[test]
    fn incorrect_answer_records_word_for_review() {
        let mut session = seeded_session();
        let mut words = sample_words(3);
        session.generate_quiz(&words, 4).unwrap();

        let (correct, option_count, word_text) = current_info(&session);
        let wrong = (correct + 1) % option_count;
        let word = words.iter_mut().find(|w| w.word == word_text).unwrap();
        session.submit_answer(wrong, word);

        assert_eq!(session.score(), 0);
        assert_eq!(word.times_correct, 0);
        assert_eq!(word.times_incorrect, 1);
        assert_eq!(session.incorrect_words().len(), 1);
        assert_eq!(session.incorrect_words()[0].id, word.id);
    }

    #[test]
    fn submit_answer_without_current_question_is_a_no_op() {
        let mut session = seeded_session();
        let mut word = VocabularyWord::new("stray".to_string(), "not in any quiz".to_string());

        session.submit_answer(0, &mut word);

        assert_eq!(session.score(), 0);
        assert_eq!(word.times_correct, 0);
        assert_eq!(word.times_incorrect, 0);
        assert!(session.incorrect_words().is_empty());
    }

    #[test]
    fn next_question_advances_then_completes() {
        let mut session = seeded_session();
        session.generate_quiz(&sample_words(3), 4).unwrap();

        session.next_question();
        assert_eq!(session.current_question_index(), 1);
        session.next_question();
        assert_eq!(session.current_question_index(), 2);
        assert!(!session.is_complete());

        session.next_question();
        assert!(session.is_complete());
        assert_eq!(session.current_question_index(), 2);

        session.next_question();
        assert!(session.is_complete());
        assert_eq!(session.current_question_index(), 2);
    }

    #[test]
    fn second_chance_requires_incorrect_words() {
        let mut session = seeded_session();

        let err = session.start_second_chance_round().unwrap_err();

        assert_eq!(err, QuizError::NoIncorrectWordsToReview);
        assert!(!session.is_second_chance_round());
        assert_eq!(
            session.generation_error(),
            Some(&QuizError::NoIncorrectWordsToReview)
        );
    }

    #[test]
    fn second_chance_with_single_incorrect_word_sets_flag_but_fails() {
        let mut session = seeded_session();
        let mut words = sample_words(2);
        session.generate_quiz(&words, 4).unwrap();

        let missed = words[0].word.clone();
        play_round(&mut session, &mut words, &[missed.as_str()]);
        assert_eq!(session.incorrect_words().len(), 1);

        let err = session.start_second_chance_round().unwrap_err();

        assert_eq!(
            err,
            QuizError::InsufficientWords {
                required: 2,
                available: 1
            }
        );
        assert!(session.is_second_chance_round());
        assert!(session.questions().is_empty());
    }

    #[test]
    fn second_chance_regenerates_from_incorrect_words() {
        let mut session = seeded_session();
        let mut words = sample_words(4);
        session.generate_quiz(&words, 4).unwrap();

        let all: Vec<String> = words.iter().map(|w| w.word.clone()).collect();
        let all: Vec<&str> = all.iter().map(String::as_str).collect();
        play_round(&mut session, &mut words, &all);
        assert_eq!(session.incorrect_words().len(), 4);

        session.start_second_chance_round().unwrap();

        assert!(session.is_second_chance_round());
        assert_eq!(session.questions().len(), 4);
        assert_eq!(session.score(), 0);
        assert_eq!(session.current_question_index(), 0);
        assert!(session.incorrect_words().is_empty());
        assert!(!session.is_complete());
    }

    #[test]
    fn generate_quiz_leaves_second_chance_flag_alone() {
        let mut session = seeded_session();
        let mut words = sample_words(2);
        session.generate_quiz(&words, 4).unwrap();

        let missed = words[0].word.clone();
        play_round(&mut session, &mut words, &[missed.as_str()]);
        session.start_second_chance_round().unwrap_err();
        assert!(session.is_second_chance_round());

        // A plain regeneration does not manage the round flag.
        session.generate_quiz(&sample_words(3), 4).unwrap();
        assert!(session.is_second_chance_round());
    }

    #[test]
    fn reset_returns_to_idle_but_keeps_word_counters() {
        let mut session = seeded_session();
        let mut words = sample_words(2);
        session.generate_quiz(&words, 4).unwrap();

        let missed = words[1].word.clone();
        play_round(&mut session, &mut words, &[missed.as_str()]);
        session.start_second_chance_round().unwrap_err();

        session.reset();

        assert!(session.questions().is_empty());
        assert_eq!(session.current_question_index(), 0);
        assert_eq!(session.score(), 0);
        assert!(session.incorrect_words().is_empty());
        assert!(!session.is_complete());
        assert!(!session.is_second_chance_round());
        assert!(session.generation_error().is_none());

        // Historical statistics survive the reset.
        let missed_word = words.iter().find(|w| w.word == missed).unwrap();
        assert_eq!(missed_word.times_incorrect, 1);
        let other = words.iter().find(|w| w.word != missed).unwrap();
        assert_eq!(other.times_correct, 1);
    }
}
