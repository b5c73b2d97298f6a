//! Language-model query routing
//!
//! The router owns the source catalog, builds the classification
//! prompt, invokes the chat model, pipes the response through the
//! filter chain and index parser, and applies the fallback strategy on
//! any failure.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use super::catalog::{Query, SourceCatalog};
use super::fallback::FallbackStrategy;
use super::filter::{FilterChain, ResponseFilter};
use super::parser::parse_selection;
use crate::errors::{Result, RouterError};
use crate::metrics;
use crate::model::ChatModel;
use crate::prompt::PromptTemplate;

/// Decides which retrieval sources should serve a query
#[async_trait]
pub trait QueryRouter<S>: Send + Sync {
    /// Route a query to a subset of the known sources
    async fn route(&self, query: &Query) -> Result<Vec<S>>;
}

/// Query router that delegates source selection to a chat model
///
/// The model is shown the enumerated source descriptions and asked to
/// answer with one or more option numbers. The catalog, template and
/// fallback strategy are fixed at construction; `route` holds no
/// per-call state, so one instance serves concurrent callers.
pub struct LlmQueryRouter<S> {
    model: Arc<dyn ChatModel>,
    catalog: SourceCatalog<S>,
    template: PromptTemplate,
    fallback_strategy: FallbackStrategy,
    filters: FilterChain,
}

impl<S> LlmQueryRouter<S>
where
    S: Clone + Eq + Hash + Send + Sync,
{
    /// Create a router with the default prompt template, the default
    /// fallback strategy and an empty filter chain
    pub fn new(model: Arc<dyn ChatModel>, sources: Vec<(S, String)>) -> Result<Self> {
        Ok(Self {
            model,
            catalog: SourceCatalog::new(sources)?,
            template: PromptTemplate::default(),
            fallback_strategy: FallbackStrategy::default(),
            filters: FilterChain::new(),
        })
    }

    pub fn builder() -> LlmQueryRouterBuilder<S> {
        LlmQueryRouterBuilder::default()
    }

    /// Append a response filter to the chain
    pub fn add_filter(&self, filter: Arc<dyn ResponseFilter>) {
        self.filters.add_filter(filter);
    }

    /// The filter chain applied to raw model responses
    pub fn filter_chain(&self) -> &FilterChain {
        &self.filters
    }

    /// The source catalog
    pub fn catalog(&self) -> &SourceCatalog<S> {
        &self.catalog
    }

    /// Filter the raw response and map the parsed indices back to
    /// catalog sources
    fn select(&self, response: &str) -> Result<Vec<S>> {
        let filtered = self.filters.apply(response)?;
        let selection = parse_selection(&filtered, self.catalog.len())?;

        Ok(selection
            .into_iter()
            .filter_map(|index| self.catalog.source_at(index).cloned())
            .collect())
    }

    fn recover(&self, started: Instant, cause: RouterError) -> Result<Vec<S>> {
        tracing::warn!(
            strategy = self.fallback_strategy.as_str(),
            error = %cause,
            "Query routing failed, applying fallback"
        );
        metrics::record_fallback(
            started.elapsed().as_secs_f64(),
            self.fallback_strategy.as_str(),
        );

        self.fallback_strategy.recover(&self.catalog, cause)
    }
}

#[async_trait]
impl<S> QueryRouter<S> for LlmQueryRouter<S>
where
    S: Clone + Eq + Hash + Send + Sync,
{
    async fn route(&self, query: &Query) -> Result<Vec<S>> {
        let started = Instant::now();

        let options = self.catalog.option_listing();
        let prompt = self.template.render(query.text(), &options);

        tracing::debug!(
            model = self.model.model_name(),
            options = self.catalog.len(),
            "Routing query"
        );

        let response = match self.model.chat(&prompt).await {
            Ok(response) => response,
            Err(e) => return self.recover(started, e),
        };

        match self.select(&response) {
            Ok(sources) => {
                metrics::record_route(started.elapsed().as_secs_f64(), sources.len());
                Ok(sources)
            }
            Err(e) => self.recover(started, e),
        }
    }
}

/// Builder for [`LlmQueryRouter`]
pub struct LlmQueryRouterBuilder<S> {
    model: Option<Arc<dyn ChatModel>>,
    sources: Vec<(S, String)>,
    template: PromptTemplate,
    fallback_strategy: FallbackStrategy,
    filters: Vec<Arc<dyn ResponseFilter>>,
}

impl<S> Default for LlmQueryRouterBuilder<S> {
    fn default() -> Self {
        Self {
            model: None,
            sources: Vec::new(),
            template: PromptTemplate::default(),
            fallback_strategy: FallbackStrategy::default(),
            filters: Vec::new(),
        }
    }
}

impl<S> LlmQueryRouterBuilder<S>
where
    S: Clone + Eq + Hash + Send + Sync,
{
    pub fn chat_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Add one catalog entry; insertion order becomes option order
    pub fn source(mut self, source: S, description: impl Into<String>) -> Self {
        self.sources.push((source, description.into()));
        self
    }

    /// Add catalog entries in bulk
    pub fn sources(mut self, sources: impl IntoIterator<Item = (S, String)>) -> Self {
        self.sources.extend(sources);
        self
    }

    pub fn prompt_template(mut self, template: impl Into<PromptTemplate>) -> Self {
        self.template = template.into();
        self
    }

    pub fn fallback_strategy(mut self, strategy: FallbackStrategy) -> Self {
        self.fallback_strategy = strategy;
        self
    }

    /// Add a response filter to the initial chain
    pub fn filter(mut self, filter: Arc<dyn ResponseFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn build(self) -> Result<LlmQueryRouter<S>> {
        let model = self.model.ok_or_else(|| RouterError::Configuration {
            message: "chat model is required".to_string(),
        })?;

        Ok(LlmQueryRouter {
            model,
            catalog: SourceCatalog::new(self.sources)?,
            template: self.template,
            fallback_strategy: self.fallback_strategy,
            filters: FilterChain::with_filters(self.filters),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MockChatModel;
    use crate::routing::filter::ReasoningTagFilter;

    const CAT_ARTICLES: &str = "cat-articles";
    const DOG_ARTICLES: &str = "dog-articles";

    fn entries() -> Vec<(&'static str, String)> {
        vec![
            (CAT_ARTICLES, "articles about cats".to_string()),
            (DOG_ARTICLES, "articles about dogs".to_string()),
        ]
    }

    fn router_with(
        model: Arc<MockChatModel>,
        strategy: FallbackStrategy,
    ) -> LlmQueryRouter<&'static str> {
        LlmQueryRouter::builder()
            .chat_model(model)
            .sources(entries())
            .fallback_strategy(strategy)
            .build()
            .unwrap()
    }

    const EXPECTED_PROMPT: &str =
        "Based on the user query, determine the most suitable data source(s) \
         to retrieve relevant information from the following options:\n\
         1: articles about cats\n\
         2: articles about dogs\n\
         It is very important that your answer consists of either a single number \
         or multiple numbers separated by commas and nothing else!\n\
         User query: Do Labradors shed?";

    #[tokio::test]
    async fn test_routes_to_single_source() {
        let model = Arc::new(MockChatModel::responding("2"));
        let router = LlmQueryRouter::new(model.clone(), entries()).unwrap();

        let sources = router.route(&Query::from("Do Labradors shed?")).await.unwrap();

        assert_eq!(sources, vec![DOG_ARTICLES]);
        assert_eq!(model.last_prompt().as_deref(), Some(EXPECTED_PROMPT));
    }

    #[tokio::test]
    async fn test_routes_to_single_source_via_builder() {
        let model = Arc::new(MockChatModel::responding("2"));
        let router = router_with(model.clone(), FallbackStrategy::Default);

        let sources = router.route(&Query::from("Do Labradors shed?")).await.unwrap();

        assert_eq!(sources, vec![DOG_ARTICLES]);
        assert_eq!(model.last_prompt().as_deref(), Some(EXPECTED_PROMPT));
    }

    #[tokio::test]
    async fn test_routes_to_multiple_sources() {
        let model = Arc::new(MockChatModel::responding("1, 2"));
        let router = LlmQueryRouter::new(model, entries()).unwrap();

        let mut sources = router
            .route(&Query::from("Which animal is the fluffiest?"))
            .await
            .unwrap();
        sources.sort();

        let mut expected = vec![CAT_ARTICLES, DOG_ARTICLES];
        expected.sort();
        assert_eq!(sources, expected);
    }

    #[tokio::test]
    async fn test_custom_prompt_template() {
        let model = Arc::new(MockChatModel::responding("1, 2"));
        let router = LlmQueryRouter::builder()
            .chat_model(model.clone())
            .sources(entries())
            .prompt_template(
                "Which source should I use to get answer for '{{query}}'? Options: {{options}}'",
            )
            .fallback_strategy(FallbackStrategy::Fail)
            .build()
            .unwrap();

        let sources = router
            .route(&Query::from("Which animal is the fluffiest?"))
            .await
            .unwrap();

        assert_eq!(sources.len(), 2);
        assert_eq!(
            model.last_prompt().as_deref(),
            Some(
                "Which source should I use to get answer for \
                 'Which animal is the fluffiest?'? Options: \
                 1: articles about cats\n2: articles about dogs'"
            )
        );
    }

    #[tokio::test]
    async fn test_duplicate_indices_collapse() {
        let model = Arc::new(MockChatModel::responding("2, 2"));
        let router = LlmQueryRouter::new(model, entries()).unwrap();

        let sources = router.route(&Query::from("Do Labradors shed?")).await.unwrap();

        assert_eq!(sources, vec![DOG_ARTICLES]);
    }

    #[tokio::test]
    async fn test_invalid_response_defaults_to_empty_set() {
        let model = Arc::new(MockChatModel::responding("Sorry, I don't know"));
        let router = LlmQueryRouter::new(model, entries()).unwrap();

        let sources = router.route(&Query::from("Hey what's up?")).await.unwrap();

        assert!(sources.is_empty());
    }

    #[tokio::test]
    async fn test_failed_invocation_defaults_to_empty_set() {
        let model = Arc::new(MockChatModel::failing());
        let router = LlmQueryRouter::new(model, entries()).unwrap();

        let sources = router.route(&Query::from("Hey what's up?")).await.unwrap();

        assert!(sources.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_response_routes_to_all() {
        let model = Arc::new(MockChatModel::responding("Sorry, I don't know"));
        let router = router_with(model, FallbackStrategy::RouteToAll);

        let sources = router.route(&Query::from("Hey what's up?")).await.unwrap();

        assert_eq!(sources, vec![CAT_ARTICLES, DOG_ARTICLES]);
    }

    #[tokio::test]
    async fn test_failed_invocation_routes_to_all() {
        let model = Arc::new(MockChatModel::failing());
        let router = router_with(model, FallbackStrategy::RouteToAll);

        let sources = router.route(&Query::from("Hey what's up?")).await.unwrap();

        assert_eq!(sources, vec![CAT_ARTICLES, DOG_ARTICLES]);
    }

    #[tokio::test]
    async fn test_invalid_response_fails_with_parse_cause() {
        let model = Arc::new(MockChatModel::responding("Sorry, I don't know"));
        let router = router_with(model, FallbackStrategy::Fail);

        let err = router
            .route(&Query::from("Hey what's up?"))
            .await
            .unwrap_err();

        assert!(matches!(err, RouterError::Routing { .. }));
        assert!(err.root_cause().is_parse());
    }

    #[tokio::test]
    async fn test_failed_invocation_fails_with_original_message() {
        let model = Arc::new(MockChatModel::failing_with("Something went wrong"));
        let router = router_with(model, FallbackStrategy::Fail);

        let err = router
            .route(&Query::from("Hey what's up?"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Something went wrong"));
        assert!(err.root_cause().is_invocation());
    }

    const REASONING_RESPONSE: &str = "<think>\n\
        The user asks which new products were added today. The order \
        knowledge base covers purchase history and order status, while \
        the product knowledge base stores product listings and updates. \
        New products are product data, so the product knowledge base is \
        the right source.\n\
        </think>\n\n2";

    #[tokio::test]
    async fn test_reasoning_block_is_stripped_before_parsing() {
        let model = Arc::new(MockChatModel::responding(REASONING_RESPONSE));
        let router = router_with(model, FallbackStrategy::Fail);
        router.add_filter(Arc::new(ReasoningTagFilter::new()));

        let sources = router
            .route(&Query::from("What new products were added today?"))
            .await
            .unwrap();

        assert_eq!(sources, vec![DOG_ARTICLES]);
    }

    #[tokio::test]
    async fn test_reasoning_block_without_filter_is_a_parse_failure() {
        let model = Arc::new(MockChatModel::responding(REASONING_RESPONSE));
        let router = router_with(model, FallbackStrategy::Fail);

        let err = router
            .route(&Query::from("What new products were added today?"))
            .await
            .unwrap_err();

        assert!(err.root_cause().is_parse());
    }

    #[test]
    fn test_builder_requires_chat_model() {
        let result = LlmQueryRouter::<&str>::builder().sources(entries()).build();
        assert!(matches!(result, Err(RouterError::Configuration { .. })));
    }

    #[test]
    fn test_empty_catalog_is_a_construction_error() {
        let model = Arc::new(MockChatModel::responding("1"));
        let result = LlmQueryRouter::<&str>::new(model, vec![]);
        assert!(matches!(result, Err(RouterError::Configuration { .. })));
    }
}
