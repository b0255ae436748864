//! Core types for the vocabulary-quiz pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Word/definition pair produced by the text parser.
///
/// Transient: carries no identity and is converted into a [`VocabularyWord`]
/// when a set adopts it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordDefinitionPair {
    pub word: String,
    pub definition: String,
}

/// Persisted vocabulary word with lifetime answer statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyWord {
    pub id: Uuid,
    pub word: String,
    pub definition: String,
    pub date_added: DateTime<Utc>,
    pub times_correct: u32,
    pub times_incorrect: u32,
    /// Back-reference to the owning set, for lookup only. The set owns the
    /// word's lifecycle, never the other way around.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_id: Option<Uuid>,
}

impl VocabularyWord {
    pub fn new(word: String, definition: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            word,
            definition,
            date_added: Utc::now(),
            times_correct: 0,
            times_incorrect: 0,
            set_id: None,
        }
    }

    pub fn from_pair(pair: WordDefinitionPair) -> Self {
        Self::new(pair.word, pair.definition)
    }
}

/// Named collection of vocabulary words, typically sourced from one document.
///
/// The set owns its words outright: dropping the set (or removing a word
/// from it) drops the word entities with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularySet {
    pub id: Uuid,
    pub name: String,
    pub date_created: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file_name: Option<String>,
    pub words: Vec<VocabularyWord>,
}

impl VocabularySet {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            date_created: Utc::now(),
            source_file_name: None,
            words: Vec::new(),
        }
    }

    /// Create a set that remembers which file its text came from.
    pub fn with_source(name: String, source_file_name: String) -> Self {
        let mut set = Self::new(name);
        set.source_file_name = Some(source_file_name);
        set
    }

    /// Adopt a parse result as a new word of this set. Returns the new id.
    pub fn add_pair(&mut self, pair: WordDefinitionPair) -> Uuid {
        let mut word = VocabularyWord::from_pair(pair);
        word.set_id = Some(self.id);
        let id = word.id;
        self.words.push(word);
        id
    }

    /// Adopt an existing word, rewiring its back-reference to this set.
    pub fn add_word(&mut self, mut word: VocabularyWord) {
        word.set_id = Some(self.id);
        self.words.push(word);
    }

    pub fn word(&self, id: Uuid) -> Option<&VocabularyWord> {
        self.words.iter().find(|w| w.id == id)
    }

    pub fn word_mut(&mut self, id: Uuid) -> Option<&mut VocabularyWord> {
        self.words.iter_mut().find(|w| w.id == id)
    }

    /// Remove (and drop) the word with the given id. Returns whether a word
    /// was removed.
    pub fn remove_word(&mut self, id: Uuid) -> bool {
        let before = self.words.len();
        self.words.retain(|w| w.id != id);
        self.words.len() != before
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// A single multiple-choice question.
///
/// Invariant: `options[correct_answer_index] == correct_definition` for every
/// successfully constructed question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub word_text: String,
    pub correct_definition: String,
    pub options: Vec<String>,
    pub correct_answer_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_answer_index: Option<usize>,
}

impl QuizQuestion {
    pub fn is_answered(&self) -> bool {
        self.user_answer_index.is_some()
    }

    /// Correctness is decided by index, never by comparing definition text,
    /// so duplicate definition texts resolve deterministically.
    pub fn answered_correctly(&self) -> bool {
        self.user_answer_index == Some(self.correct_answer_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_pair_adopts_and_back_references() {
        let mut set = VocabularySet::new("Chapter 1".to_string());
        let id = set.add_pair(WordDefinitionPair {
            word: "Abundant".to_string(),
            definition: "Present in great quantity".to_string(),
        });

        let word = set.word(id).unwrap();
        assert_eq!(word.word, "Abundant");
        assert_eq!(word.set_id, Some(set.id));
        assert_eq!(word.times_correct, 0);
        assert_eq!(word.times_incorrect, 0);
    }

    #[test]
    fn add_word_rewires_back_reference() {
        let mut set = VocabularySet::new("Imported".to_string());
        let word = VocabularyWord::new("Candid".to_string(), "Truthful".to_string());
        let id = word.id;
        set.add_word(word);
        assert_eq!(set.word(id).unwrap().set_id, Some(set.id));
    }

    #[test]
    fn remove_word_drops_the_entity() {
        let mut set = VocabularySet::new("Chapter 1".to_string());
        let id = set.add_pair(WordDefinitionPair {
            word: "Fleeting".to_string(),
            definition: "Lasting a short time".to_string(),
        });

        assert!(set.remove_word(id));
        assert!(set.word(id).is_none());
        assert!(set.is_empty());
        assert!(!set.remove_word(id));
    }

    #[test]
    fn answered_correctly_is_index_based() {
        // Both slots hold the same text; only the index decides.
        let question = QuizQuestion {
            word_text: "Set".to_string(),
            correct_definition: "A collection".to_string(),
            options: vec!["A collection".to_string(), "A collection".to_string()],
            correct_answer_index: 1,
            user_answer_index: Some(0),
        };
        assert!(question.is_answered());
        assert!(!question.answered_correctly());
    }
}
