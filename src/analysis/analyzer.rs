use crate::analysis::tokenizer::{StandardTokenizer, Token, Tokenizer};

/// Text analysis front end used by the term generator.
pub struct Analyzer {
    pub tokenizer: Box<dyn Tokenizer>,
}

impl Analyzer {
    pub fn new(tokenizer: Box<dyn Tokenizer>) -> Self {
        Analyzer { tokenizer }
    }

    pub fn analyze(&self, text: &str) -> Vec<Token> {
        self.tokenizer.tokenize(text)
    }

    /// Lowercased words, as indexed verbatim
    pub fn standard() -> Self {
        Analyzer::new(Box::new(StandardTokenizer::default()))
    }
}
