use crate::morphology::MorphologyAnalyzer;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashMap;

const PREPOSITIONS: &[&str] = &[
    "без", "безо", "близ", "в", "во", "вместо", "вне", "для", "до", "за", "из", "изо", "к",
    "ко", "кроме", "между", "меж", "на", "над", "надо", "о", "об", "обо", "от", "ото", "перед",
    "передо", "пред", "по", "под", "подо", "при", "про", "ради", "с", "со", "сквозь", "среди",
    "у", "через", "около", "возле", "вокруг", "после", "против", "мимо", "вдоль", "внутри",
    "напротив", "согласно", "благодаря", "вследствие", "ввиду", "сверх", "средь",
];

const CONJUNCTIONS: &[&str] = &[
    "и", "а", "но", "или", "либо", "да", "что", "чтобы", "если", "когда", "будто", "словно",
    "хотя", "хоть", "потому", "поэтому", "также", "тоже", "зато", "однако", "ибо", "пока",
    "едва", "лишь", "чем", "нежели", "причем", "притом", "коли", "ежели", "итак", "дабы",
];

const INTERJECTIONS: &[&str] = &[
    "ах", "ох", "эх", "ух", "увы", "ой", "ай", "ого", "ура", "эй", "ну", "браво", "алло", "ага",
    "фу", "тьфу", "ахти", "ишь", "батюшки", "эге", "ау",
];

/// Analyzer backed by the Snowball Russian stemmer
///
/// Normal forms are stems, so different words may collide and stems are not
/// dictionary words. Function words come from a fixed list.
pub struct StemmerAnalyzer {
    stemmer: Stemmer,
    function_words: HashMap<&'static str, &'static str>,
}

impl StemmerAnalyzer {
    pub fn new() -> Self {
        let mut function_words = HashMap::new();
        for word in PREPOSITIONS {
            function_words.insert(*word, "ПРЕДЛ");
        }
        for word in CONJUNCTIONS {
            function_words.insert(*word, "СОЮЗ");
        }
        for word in INTERJECTIONS {
            function_words.insert(*word, "МЕЖД");
        }

        Self {
            stemmer: Stemmer::create(Algorithm::Russian),
            function_words,
        }
    }
}

impl Default for StemmerAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl MorphologyAnalyzer for StemmerAnalyzer {
    fn morph_info(&self, word: &str) -> Vec<String> {
        match self.function_words.get(word) {
            Some(tag) => vec![tag.to_string()],
            None => Vec::new(),
        }
    }

    fn normal_forms(&self, word: &str) -> Vec<String> {
        if word.is_empty() {
            return Vec::new();
        }
        vec![self.stemmer.stem(word).into_owned()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_words_are_tagged() {
        let analyzer = StemmerAnalyzer::new();
        assert_eq!(analyzer.morph_info("для"), vec!["ПРЕДЛ".to_string()]);
        assert_eq!(analyzer.morph_info("или"), vec!["СОЮЗ".to_string()]);
        assert_eq!(analyzer.morph_info("увы"), vec!["МЕЖД".to_string()]);
        assert!(analyzer.morph_info("кошка").is_empty());
    }

    #[test]
    fn test_inflected_forms_share_a_stem() {
        let analyzer = StemmerAnalyzer::new();
        let a = analyzer.normal_forms("кошки");
        let b = analyzer.normal_forms("кошкой");
        assert_eq!(a.len(), 1);
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_word_has_no_forms() {
        assert!(StemmerAnalyzer::new().normal_forms("").is_empty());
    }
}
