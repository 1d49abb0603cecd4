use crate::morphology::{MorphologyAnalyzer, MorphologyError, StemmerAnalyzer};
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;
use tracing::debug;

/// One reading of a word form
#[derive(Debug, Clone)]
struct Reading {
    normal_form: String,
    tags: String,
}

/// Analyzer backed by a word-form dictionary
///
/// The dictionary is UTF-8 text with one `form|normal_form|tags` entry per line.
/// Blank lines and lines starting with `#` are skipped. Words missing from the
/// dictionary are handed to a [`StemmerAnalyzer`].
pub struct DictionaryAnalyzer {
    forms: HashMap<String, Vec<Reading>>,
    fallback: StemmerAnalyzer,
}

impl DictionaryAnalyzer {
    /// Loads a dictionary file
    pub fn load(path: &Path) -> Result<Self, MorphologyError> {
        let file = std::fs::File::open(path)?;
        let analyzer = Self::from_reader(std::io::BufReader::new(file))?;
        debug!(
            "Loaded {} word forms from {}",
            analyzer.len(),
            path.display()
        );
        Ok(analyzer)
    }

    /// Parses dictionary text held in memory
    pub fn parse(content: &str) -> Result<Self, MorphologyError> {
        Self::from_reader(content.as_bytes())
    }

    /// Parses a dictionary line by line
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, MorphologyError> {
        let mut forms: HashMap<String, Vec<Reading>> = HashMap::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.splitn(3, '|');
            let form = fields.next().unwrap_or("").trim().to_lowercase();
            let normal_form = fields.next().unwrap_or("").trim().to_lowercase();
            let tags = fields.next().unwrap_or("").trim().to_string();

            if form.is_empty() || normal_form.is_empty() {
                return Err(MorphologyError::Dictionary {
                    line: index + 1,
                    message: format!("expected form|normal_form|tags, got '{}'", line),
                });
            }

            forms.entry(form).or_default().push(Reading { normal_form, tags });
        }

        Ok(Self {
            forms,
            fallback: StemmerAnalyzer::new(),
        })
    }

    /// Number of distinct word forms
    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

impl MorphologyAnalyzer for DictionaryAnalyzer {
    fn morph_info(&self, word: &str) -> Vec<String> {
        match self.forms.get(word) {
            Some(readings) => readings.iter().map(|r| r.tags.clone()).collect(),
            None => self.fallback.morph_info(word),
        }
    }

    fn normal_forms(&self, word: &str) -> Vec<String> {
        match self.forms.get(word) {
            Some(readings) => {
                let mut normal_forms: Vec<String> = Vec::with_capacity(readings.len());
                for reading in readings {
                    if !normal_forms.contains(&reading.normal_form) {
                        normal_forms.push(reading.normal_form.clone());
                    }
                }
                normal_forms
            }
            None => self.fallback.normal_forms(word),
        }
    }
}
