//! Lowercase filter implementation.
//!
//! # Examples
//!
//! ```
//! use medirank::analysis::token_filter::Filter;
//! use medirank::analysis::token_filter::lowercase::LowercaseFilter;
//! use medirank::analysis::token::Token;
//!
//! let filter = LowercaseFilter::new();
//! let tokens = vec![Token::new("Hypertension", 0), Token::new("COPD", 1)];
//! let filtered: Vec<_> = filter.filter(Box::new(tokens.into_iter()))
//!     .unwrap()
//!     .collect();
//!
//! assert_eq!(filtered[0].text, "hypertension");
//! assert_eq!(filtered[1].text, "copd");
//! ```

use crate::analysis::token::TokenStream;
use crate::analysis::token_filter::Filter;
use crate::error::Result;

/// A filter that converts tokens to lowercase.
///
/// Stopped tokens pass through untouched. ASCII tokens take the cheap
/// in-place path; anything else goes through Unicode lowercasing.
#[derive(Clone, Debug, Default)]
pub struct LowercaseFilter;

impl LowercaseFilter {
    /// Create a new lowercase filter.
    pub fn new() -> Self {
        LowercaseFilter
    }
}

impl Filter for LowercaseFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let filtered = tokens.map(|mut token| {
            if token.is_stopped() {
                return token;
            }
            if token.text.is_ascii() {
                token.text.make_ascii_lowercase();
                token
            } else {
                let lowered = token.text.to_lowercase();
                token.with_text(lowered)
            }
        });

        Ok(Box::new(filtered.collect::<Vec<_>>().into_iter()))
    }

    fn name(&self) -> &'static str {
        "lowercase"
    }
}
