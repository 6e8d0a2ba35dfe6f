use crate::analysis::analyzer::Analyzer;
use crate::analysis::filters::stemmer::StemmerFilter;
use crate::index::document::Document;
use rust_stemmers::Algorithm;

/// Prefix of the stemmed companion terms.
pub const STEM_PREFIX: &str = "Z";

/// Position gap left between successive text fields of one document,
/// so phrases never match across field boundaries.
const FIELD_GAP: u32 = 100;

/// Turns free text into index terms. One generator per worker; call
/// [`TermGenerator::reset`] before each document.
pub struct TermGenerator {
    analyzer: Analyzer,
    stemmer: StemmerFilter,
    termpos: u32,
}

impl TermGenerator {
    pub fn new(analyzer: Analyzer, algorithm: Algorithm) -> Self {
        TermGenerator {
            analyzer,
            stemmer: StemmerFilter::new(algorithm),
            termpos: 0,
        }
    }

    pub fn english() -> Self {
        TermGenerator::new(Analyzer::standard(), Algorithm::English)
    }

    pub fn reset(&mut self) {
        self.termpos = 0;
    }

    /// Index `text` with positional information, so phrase queries work.
    pub fn index_text(&mut self, doc: &mut Document, text: &str, prefix: &str) {
        let tokens = self.analyzer.analyze(text);
        if tokens.is_empty() {
            return;
        }

        let base = self.termpos;
        let mut last = base;
        for token in &tokens {
            let position = base + token.position + 1;
            doc.add_posting(&format!("{}{}", prefix, token.text), position);
            doc.add_term(&self.stemmed(prefix, &token.text), 1);
            last = position;
        }
        self.termpos = last + FIELD_GAP;
    }

    /// Index `text` as bare terms, for filtering only.
    pub fn index_text_without_positions(&mut self, doc: &mut Document, text: &str, prefix: &str) {
        for token in self.analyzer.analyze(text) {
            doc.add_term(&format!("{}{}", prefix, token.text), 1);
            doc.add_term(&self.stemmed(prefix, &token.text), 1);
        }
    }

    fn stemmed(&self, prefix: &str, word: &str) -> String {
        format!("{}{}{}", STEM_PREFIX, prefix, self.stemmer.stem(word))
    }
}
