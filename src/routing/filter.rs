//! Response filtering pipeline
//!
//! Chat models frequently wrap the numeric answer in noise: delimited
//! reasoning blocks, markdown fences, stray prose. Filters are small
//! ordered text transforms applied to the raw response before index
//! parsing, so vendor-specific cleanup stays out of the parser.

use std::sync::{Arc, RwLock};

use regex_lite::Regex;

use crate::errors::{Result, RouterError};

/// A single named text transform with an ordering key
///
/// Filters must treat absence of their target pattern as a no-op.
pub trait ResponseFilter: Send + Sync {
    /// Sort key; lower orders run first. Ties keep insertion order.
    fn order(&self) -> i32 {
        0
    }

    /// Transform the response text
    fn apply(&self, response: &str) -> Result<String>;
}

/// Ordered pipeline of response filters
///
/// Filters may be appended while routing calls are in flight; each
/// application works on a snapshot of the list taken under the read
/// lock, sorted ascending by order (stable for equal orders). An empty
/// chain is the identity function.
#[derive(Default)]
pub struct FilterChain {
    filters: RwLock<Vec<Arc<dyn ResponseFilter>>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a chain from an initial filter list
    pub fn with_filters(filters: Vec<Arc<dyn ResponseFilter>>) -> Self {
        Self {
            filters: RwLock::new(filters),
        }
    }

    /// Append a single filter
    pub fn add_filter(&self, filter: Arc<dyn ResponseFilter>) {
        self.add_filters([filter]);
    }

    /// Append filters to the collection
    pub fn add_filters(&self, filters: impl IntoIterator<Item = Arc<dyn ResponseFilter>>) {
        let mut guard = self
            .filters
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.extend(filters);
    }

    pub fn len(&self) -> usize {
        self.filters
            .read()
            .map(|guard| guard.len())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply every filter in ascending order, piping each output into
    /// the next filter's input
    pub fn apply(&self, response: &str) -> Result<String> {
        let mut snapshot = {
            let guard = self
                .filters
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            guard.clone()
        };
        snapshot.sort_by_key(|filter| filter.order());

        let mut text = response.to_string();
        for filter in &snapshot {
            text = filter.apply(&text)?;
        }
        Ok(text)
    }
}

/// Strips delimited reasoning blocks such as `<think>...</think>`
///
/// Matching is case-insensitive and spans newlines. Models that expose
/// intermediate reasoning (DeepSeek-style) emit these blocks before the
/// actual answer.
pub struct ReasoningTagFilter {
    pattern: Regex,
}

impl ReasoningTagFilter {
    pub fn new() -> Self {
        Self::with_tag("think").expect("static tag pattern")
    }

    /// Strip a custom tag name instead of `think`
    pub fn with_tag(tag: &str) -> Result<Self> {
        let pattern = Regex::new(&format!(r"(?si)<{tag}\b[^>]*>.*?</{tag}>")).map_err(|e| {
            RouterError::Configuration {
                message: format!("invalid reasoning tag {tag:?}: {e}"),
            }
        })?;
        Ok(Self { pattern })
    }
}

impl Default for ReasoningTagFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseFilter for ReasoningTagFilter {
    fn apply(&self, response: &str) -> Result<String> {
        Ok(self.pattern.replace_all(response, "").into_owned())
    }
}

/// Strips markdown code-fence markers, keeping the fenced content
pub struct CodeFenceFilter {
    pattern: Regex,
}

impl CodeFenceFilter {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"```[A-Za-z0-9_-]*").expect("static fence pattern"),
        }
    }
}

impl Default for CodeFenceFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseFilter for CodeFenceFilter {
    fn apply(&self, response: &str) -> Result<String> {
        Ok(self.pattern.replace_all(response, "").into_owned())
    }
}

/// Adapter turning a closure plus an order into a filter
pub struct FilterFn<F> {
    order: i32,
    f: F,
}

impl<F> FilterFn<F>
where
    F: Fn(&str) -> String + Send + Sync,
{
    pub fn new(order: i32, f: F) -> Self {
        Self { order, f }
    }
}

impl<F> ResponseFilter for FilterFn<F>
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn order(&self) -> i32 {
        self.order
    }

    fn apply(&self, response: &str) -> Result<String> {
        Ok((self.f)(response))
    }
}
