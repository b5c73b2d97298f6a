//! Query routing core components
//!
//! Provides:
//! - Source catalog with stable 1-based option numbering
//! - Ordered response filter chain
//! - Index parsing and validation
//! - Fallback policies for failed routing attempts
//! - The language-model query router itself

mod catalog;
mod fallback;
mod filter;
mod parser;
mod router;

pub use catalog::{Query, SourceCatalog};
pub use fallback::FallbackStrategy;
pub use filter::{CodeFenceFilter, FilterChain, FilterFn, ReasoningTagFilter, ResponseFilter};
pub use router::{LlmQueryRouter, LlmQueryRouterBuilder, QueryRouter};
