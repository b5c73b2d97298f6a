//! Fallback policy for failed routing decisions

use serde::{Deserialize, Serialize};

use super::catalog::SourceCatalog;
use crate::errors::{Result, RouterError};

/// Recovery behavior applied when model invocation or response parsing
/// fails
///
/// Fixed at router construction. The policy never distinguishes the two
/// failure situations; the underlying cause is preserved for
/// diagnostics either way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackStrategy {
    /// Return an empty source set; the failure is swallowed
    #[default]
    Default,

    /// Surface a routing failure wrapping the underlying cause
    Fail,

    /// Return every source in the catalog, ignoring the failure
    RouteToAll,
}

impl FallbackStrategy {
    /// Stable label for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackStrategy::Default => "default",
            FallbackStrategy::Fail => "fail",
            FallbackStrategy::RouteToAll => "route_to_all",
        }
    }

    /// Decide the resulting source set for a failed routing attempt
    pub fn recover<S: Clone>(&self, catalog: &SourceCatalog<S>, cause: RouterError) -> Result<Vec<S>> {
        match self {
            FallbackStrategy::Default => Ok(Vec::new()),
            FallbackStrategy::RouteToAll => Ok(catalog.sources().cloned().collect()),
            FallbackStrategy::Fail => Err(RouterError::Routing {
                cause: Box::new(cause),
            }),
        }
    }
}
