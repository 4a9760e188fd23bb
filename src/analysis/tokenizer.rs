//! Splitting raw text into word tokens.
//!
//! Only one tokenizer ships: [`RegexTokenizer`], which keeps runs of word
//! characters and drops punctuation, so "heart-disease" yields two tokens.

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for tokenizers that convert text into tokens.
pub trait Tokenizer: Send + Sync {
    /// Tokenize the given text into a stream of tokens.
    fn tokenize(&self, text: &str) -> Result<TokenStream>;

    /// Short identifier, used in analyzer names.
    fn name(&self) -> &'static str;
}

pub mod regex;

pub use regex::RegexTokenizer;
