//! LLM Query Router
//!
//! A decision component for retrieval-augmented-generation pipelines:
//! given a user query and a catalog of retrieval sources with
//! human-readable descriptions, it asks a chat model to pick the
//! relevant sources by number, parses the free-form answer into
//! validated indices, and applies a configurable fallback policy when
//! the model call fails or its output cannot be parsed.
//!
//! ```no_run
//! use std::sync::Arc;
//! use llm_query_router::{
//!     FallbackStrategy, LlmQueryRouter, MockChatModel, Query, QueryRouter,
//! };
//!
//! # async fn example() -> llm_query_router::Result<()> {
//! let model = Arc::new(MockChatModel::responding("2"));
//! let router = LlmQueryRouter::builder()
//!     .chat_model(model)
//!     .source("cat-articles", "articles about cats")
//!     .source("dog-articles", "articles about dogs")
//!     .fallback_strategy(FallbackStrategy::RouteToAll)
//!     .build()?;
//!
//! let sources = router.route(&Query::from("Do Labradors shed?")).await?;
//! assert_eq!(sources, vec!["dog-articles"]);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod errors;
pub mod metrics;
pub mod model;
pub mod prompt;
pub mod routing;

// Re-export commonly used types
pub use config::{LlmConfig, RouterConfig};
pub use errors::{ParseReason, Result, RouterError};
pub use model::{create_chat_model, ChatModel, MockChatModel, OpenAiChatModel};
pub use prompt::{PromptTemplate, DEFAULT_ROUTING_TEMPLATE};
pub use routing::{
    CodeFenceFilter, FallbackStrategy, FilterChain, FilterFn, LlmQueryRouter,
    LlmQueryRouterBuilder, Query, QueryRouter, ReasoningTagFilter, ResponseFilter, SourceCatalog,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default chat model
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
