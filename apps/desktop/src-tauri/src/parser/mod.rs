//! Markdown flashcard parser
//!
//! Parses markdown files with the following format:
//!
//! ```markdown
//! ID: 1
//! Q: Question text
//! A: Answer text
//!
//! ID: 2
//! Q: Another question
//! A: Another answer
//! ```
