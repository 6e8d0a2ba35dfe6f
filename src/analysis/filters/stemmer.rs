use std::borrow::Cow;
use rust_stemmers::{Algorithm, Stemmer};

/// Snowball stemming.
pub struct StemmerFilter {
    stemmer: Stemmer,
}

impl StemmerFilter {
    pub fn new(algorithm: Algorithm) -> Self {
        StemmerFilter {
            stemmer: Stemmer::create(algorithm),
        }
    }

    pub fn stem<'a>(&self, word: &'a str) -> Cow<'a, str> {
        // Digits-only words (chromosomes, years, ids) are kept verbatim
        if word.bytes().all(|b| b.is_ascii_digit()) {
            return Cow::Borrowed(word);
        }
        self.stemmer.stem(word)
    }
}
