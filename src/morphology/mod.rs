//! Morphology module: turning text into lemmas
//!
//! The [`Lemmatizer`] tokenizes Russian text, drops function words and maps every
//! remaining token to its normal form. The actual word analysis is pluggable
//! through [`MorphologyAnalyzer`]:
//!
//! - [`DictionaryAnalyzer`] reads a word-form dictionary and falls back to the
//!   stemmer for unknown words
//! - [`StemmerAnalyzer`] uses the Snowball Russian stemmer and a built-in list of
//!   function words

mod dictionary;
mod lemmatizer;
mod stemmer;

pub use dictionary::DictionaryAnalyzer;
pub use lemmatizer::{Lemmatizer, FUNCTION_WORD_TAGS};
pub use stemmer::StemmerAnalyzer;

use thiserror::Error;

/// Errors raised while building an analyzer
#[derive(Debug, Error)]
pub enum MorphologyError {
    #[error("Failed to read dictionary: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed dictionary line {line}: {message}")]
    Dictionary { line: usize, message: String },
}

/// A morphological analyzer for single lowercase words
pub trait MorphologyAnalyzer: Send + Sync {
    /// Grammatical tag strings of every known reading of `word`
    ///
    /// Tags use the conventional Russian abbreviations, e.g. `С мр,ед,им` or `ПРЕДЛ`.
    fn morph_info(&self, word: &str) -> Vec<String>;

    /// Normal forms of `word`, most likely reading first
    fn normal_forms(&self, word: &str) -> Vec<String>;
}
