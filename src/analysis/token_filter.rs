//! Filters that rewrite or stop tokens after tokenization.
//!
//! Rewriting filters pass tokens marked as stopped through untouched;
//! [`StopFilter`] drops them along with the stop words it knows.

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for filters that transform token streams.
pub trait Filter: Send + Sync {
    /// Apply this filter to a token stream.
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream>;

    /// Short identifier, reported by [`PipelineAnalyzer::filter_names`].
    ///
    /// [`PipelineAnalyzer::filter_names`]: crate::analysis::analyzer::PipelineAnalyzer::filter_names
    fn name(&self) -> &'static str;
}

pub mod lemma;
pub mod lowercase;
pub mod stop;

pub use lemma::LemmaFilter;
pub use lowercase::LowercaseFilter;
pub use stop::StopFilter;
