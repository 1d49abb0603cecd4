use crate::config::MorphologyConfig;
use crate::morphology::{DictionaryAnalyzer, MorphologyAnalyzer, MorphologyError, StemmerAnalyzer};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Grammatical tags of words that never become lemmas:
/// interjections, prepositions and conjunctions
pub const FUNCTION_WORD_TAGS: &[&str] = &["МЕЖД", "ПРЕДЛ", "СОЮЗ"];

/// Tokens shorter than this are ignored
const MIN_TOKEN_CHARS: usize = 3;

/// Turns text into lemma counts using a pluggable analyzer
#[derive(Clone)]
pub struct Lemmatizer {
    analyzer: Arc<dyn MorphologyAnalyzer>,
}

impl Lemmatizer {
    pub fn new(analyzer: Arc<dyn MorphologyAnalyzer>) -> Self {
        Self { analyzer }
    }

    /// Builds the analyzer selected by configuration
    ///
    /// A dictionary path selects [`DictionaryAnalyzer`]; otherwise the stemmer is
    /// used alone.
    pub fn from_config(config: &MorphologyConfig) -> Result<Self, MorphologyError> {
        let analyzer: Arc<dyn MorphologyAnalyzer> = match &config.dictionary_path {
            Some(path) => {
                info!("Using morphology dictionary {}", path);
                Arc::new(DictionaryAnalyzer::load(Path::new(path))?)
            }
            None => {
                info!("No morphology dictionary configured, using the Russian stemmer");
                Arc::new(StemmerAnalyzer::new())
            }
        };
        Ok(Self::new(analyzer))
    }

    /// Splits text into lowercase Cyrillic words of at least three letters
    ///
    /// Every character other than а-я and ё acts as a separator.
    ///
    /// # Examples
    ///
    /// ```
    /// use sitesearch::morphology::Lemmatizer;
    ///
    /// assert_eq!(
    ///     Lemmatizer::tokenize("Кот, сидит на окне! cat 42"),
    ///     vec!["кот", "сидит", "окне"]
    /// );
    /// ```
    pub fn tokenize(text: &str) -> Vec<String> {
        let cleaned: String = text
            .to_lowercase()
            .chars()
            .map(|c| if is_russian_letter(c) { c } else { ' ' })
            .collect();

        cleaned
            .split_whitespace()
            .filter(|word| word.chars().count() >= MIN_TOKEN_CHARS)
            .map(str::to_string)
            .collect()
    }

    /// Returns true if the analyzer tags `token` as a function word
    pub fn is_function_word(&self, token: &str) -> bool {
        self.analyzer.morph_info(token).iter().any(|info| {
            let info = info.to_uppercase();
            FUNCTION_WORD_TAGS.iter().any(|tag| info.contains(tag))
        })
    }

    /// First normal form reported by the analyzer
    pub fn normal_form(&self, token: &str) -> Option<String> {
        self.analyzer.normal_forms(token).into_iter().next()
    }

    /// Normal form of a token that may be indexed, or None for function words
    pub fn lemma_of(&self, token: &str) -> Option<String> {
        if self.is_function_word(token) {
            return None;
        }
        self.normal_form(token)
    }

    /// Counts the occurrences of every lemma in `text`
    ///
    /// The count of a lemma is its rank in the posting of the page.
    pub fn lemmas_with_counts(&self, text: &str) -> HashMap<String, u32> {
        let mut counts = HashMap::new();
        for token in Self::tokenize(text) {
            if let Some(lemma) = self.lemma_of(&token) {
                *counts.entry(lemma).or_insert(0) += 1;
            }
        }
        counts
    }
}

fn is_russian_letter(c: char) -> bool {
    ('а'..='я').contains(&c) || c == 'ё'
}

#[cfg(test)]
mod tests {
    use super::*;

    const DICTIONARY: &str = "
кот|кот|С мр,ед,им
кота|кот|С мр,ед,рд
сидит|сидеть|Г дст,нст,3л,ед
на|на|ПРЕДЛ
окне|окно|С ср,ед,пр
или|или|СОЮЗ
";

    fn lemmatizer() -> Lemmatizer {
        Lemmatizer::new(Arc::new(DictionaryAnalyzer::parse(DICTIONARY).unwrap()))
    }

    #[test]
    fn test_tokenize_drops_short_and_foreign_words() {
        assert_eq!(
            Lemmatizer::tokenize("Я и ты — hello, мир!"),
            vec!["мир".to_string()]
        );
    }

    #[test]
    fn test_tokenize_keeps_yo() {
        assert_eq!(Lemmatizer::tokenize("Ёлка"), vec!["ёлка".to_string()]);
    }

    #[test]
    fn test_tokenize_splits_on_digits_and_hyphens() {
        assert_eq!(
            Lemmatizer::tokenize("северо-запад2024год"),
            vec!["северо", "запад", "год"]
        );
    }

    #[test]
    fn test_function_words() {
        let lemmatizer = lemmatizer();
        assert!(lemmatizer.is_function_word("или"));
        assert!(lemmatizer.is_function_word("на"));
        assert!(!lemmatizer.is_function_word("кот"));
    }

    #[test]
    fn test_simple_sentence_lemmas() {
        let counts = lemmatizer().lemmas_with_counts("кот сидит на окне");
        let mut expected = HashMap::new();
        expected.insert("кот".to_string(), 1);
        expected.insert("сидеть".to_string(), 1);
        expected.insert("окно".to_string(), 1);
        assert_eq!(counts, expected);
    }

    #[test]
    fn test_counts_accumulate_per_normal_form() {
        let counts = lemmatizer().lemmas_with_counts("Кот! Кота или кот?");
        assert_eq!(counts.get("кот"), Some(&3));
        assert_eq!(counts.len(), 1);
    }

    #[test]
    fn test_empty_text() {
        assert!(lemmatizer().lemmas_with_counts("").is_empty());
        assert!(lemmatizer().lemmas_with_counts("12 34 !!").is_empty());
    }

    #[test]
    fn test_from_config_without_dictionary() {
        let lemmatizer = Lemmatizer::from_config(&MorphologyConfig::default()).unwrap();
        assert!(lemmatizer.is_function_word("для"));
        assert!(lemmatizer.normal_form("кошки").is_some());
    }
}
