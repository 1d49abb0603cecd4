//! Snippet extraction around query matches

use crate::morphology::Lemmatizer;
use std::collections::HashSet;

/// Words kept before a match
pub const OFFSET_BEFORE: usize = 10;

/// Words kept after a match
pub const OFFSET_AFTER: usize = 10;

/// No new window is opened once the snippet is longer than this (in characters)
pub const MAX_SNIPPET_LENGTH: usize = 300;

const WINDOW_SEPARATOR: &str = " ... ";

/// Builds a snippet of `text` around the words whose lemma is in `lemmas`
///
/// Each window spans up to [`OFFSET_BEFORE`] words before a match and
/// [`OFFSET_AFTER`] after it; windows never overlap. Every matching word is
/// wrapped in `<b>`. Once the snippet exceeds [`MAX_SNIPPET_LENGTH`] characters
/// no further window is started. Without any match the leading words of the
/// text are returned.
pub fn build_snippet(text: &str, lemmatizer: &Lemmatizer, lemmas: &HashSet<String>) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let matches: Vec<bool> = words
        .iter()
        .map(|word| is_match(word, lemmatizer, lemmas))
        .collect();

    let mut fragments: Vec<String> = Vec::new();
    let mut length = 0;
    let mut covered = 0;

    for (i, matched) in matches.iter().enumerate() {
        if !matched || i < covered {
            continue;
        }
        if length > MAX_SNIPPET_LENGTH {
            break;
        }

        let start = i.saturating_sub(OFFSET_BEFORE).max(covered);
        let end = (i + OFFSET_AFTER + 1).min(words.len());
        let fragment = render(&words[start..end], &matches[start..end]);

        length += fragment.chars().count();
        fragments.push(fragment);
        covered = end;
    }

    if fragments.is_empty() {
        let end = words.len().min(OFFSET_BEFORE + OFFSET_AFTER + 1);
        return words[..end].join(" ");
    }

    fragments.join(WINDOW_SEPARATOR)
}

fn is_match(word: &str, lemmatizer: &Lemmatizer, lemmas: &HashSet<String>) -> bool {
    Lemmatizer::tokenize(word)
        .iter()
        .filter_map(|token| lemmatizer.lemma_of(token))
        .any(|lemma| lemmas.contains(&lemma))
}

fn render(words: &[&str], matches: &[bool]) -> String {
    words
        .iter()
        .zip(matches)
        .map(|(word, matched)| {
            if *matched {
                format!("<b>{}</b>", word)
            } else {
                word.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
