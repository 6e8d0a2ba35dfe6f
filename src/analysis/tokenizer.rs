use unicode_segmentation::UnicodeSegmentation;

/// One word cut from a piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub position: u32,     // Word index within the analyzed text
    pub offset: usize,     // Byte offset in the source text
}

impl Token {
    pub fn new(text: impl Into<String>, position: u32, offset: usize) -> Self {
        Token {
            text: text.into(),
            position,
            offset,
        }
    }
}

pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<Token>;
}

/// Standard Unicode tokenizer
#[derive(Debug, Clone)]
pub struct StandardTokenizer {
    pub lowercase: bool,
    pub max_token_length: usize,
}

impl Default for StandardTokenizer {
    fn default() -> Self {
        StandardTokenizer {
            lowercase: true,
            max_token_length: 245, // Longest term the segment format accepts, minus prefix room
        }
    }
}

impl Tokenizer for StandardTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut position = 0u32;

        // UAX#29 word boundaries; punctuation and whitespace are dropped
        for (offset, word) in text.unicode_word_indices() {
            if word.len() > self.max_token_length {
                continue;
            }

            let token_text = if self.lowercase {
                word.to_lowercase()
            } else {
                word.to_string()
            };

            tokens.push(Token::new(token_text, position, offset));
            position += 1;
        }

        tokens
    }
}
