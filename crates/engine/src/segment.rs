//! Sentence segmentation.
//!
//! A sentence ends at `.`, `!` or `?` immediately followed by whitespace. The
//! terminator stays attached to its sentence and the whitespace run is
//! dropped. Abbreviations and decimals are not special-cased, so "Dr. Smith"
//! yields two sentences.

use std::iter::FusedIterator;

/// Lazy iterator over the sentences of a text.
///
/// Finite and restartable: clone it before consuming for a second pass, or
/// call [`split_sentences`] again.
#[derive(Debug, Clone)]
pub struct Sentences<'a> {
    rest: &'a str,
}

/// Split `text` into non-empty, whitespace-trimmed sentences.
pub fn split_sentences(text: &str) -> Sentences<'_> {
    Sentences { rest: text.trim() }
}

/// Number of non-empty sentences in `text`.
pub fn count_sentences(text: &str) -> usize {
    split_sentences(text).count()
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

impl<'a> Iterator for Sentences<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.rest.is_empty() {
                return None;
            }

            let mut boundary = None;
            let mut chars = self.rest.char_indices().peekable();
            while let Some((i, c)) = chars.next() {
                if is_terminator(c) {
                    if let Some(&(next_i, next_c)) = chars.peek() {
                        if next_c.is_whitespace() {
                            boundary = Some((i + c.len_utf8(), next_i));
                            break;
                        }
                    }
                }
            }

            let sentence = match boundary {
                Some((end, ws_start)) => {
                    let sentence = &self.rest[..end];
                    self.rest = self.rest[ws_start..].trim_start();
                    sentence
                }
                None => std::mem::take(&mut self.rest),
            };

            let sentence = sentence.trim();
            if !sentence.is_empty() {
                return Some(sentence);
            }
        }
    }
}

impl FusedIterator for Sentences<'_> {}
