pub mod tokenizer;
pub mod filters;
pub mod analyzer;
