//! Job sources and the registry that dispatches searches to them.
//!
//! Each upstream provider implements [`JobSource`] and is registered under
//! its [`SourceId`]. The [`SourceRegistry`] is built once at startup and is
//! shared read-only between all user tasks.
//!
//! ```text
//! engine ──► SourceRegistry::fetch(id, query, page)
//!                 │  lookup adapter by id
//!                 │  bound the call with the request timeout
//!                 ▼
//!            JobSource::search ──► SearchPage { listings, page }
//! ```

pub mod demo;
pub mod upwork;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

pub use demo::DemoSource;
pub use upwork::UpworkSource;

/// Identifier of a job source, e.g. `upwork`.
///
/// Always stored lowercase so that `UpWork` typed by a user and `upwork`
/// in callback data address the same adapter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name shown to users: the id with its first letter capitalized.
    pub fn display_name(&self) -> String {
        let mut chars = self.0.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One job listing as produced by a source adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub posted_at: Option<DateTime<Utc>>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub skills: Vec<String>,
}

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    pub listings: Vec<Listing>,
    pub page: u32,
}

/// An upstream provider of job listings.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Identifier this source is registered under.
    fn id(&self) -> SourceId;

    /// Fetch one page of listings for `query`. Pages are 1-based.
    async fn search(&self, query: &str, page: u32) -> Result<SearchPage, FetchError>;
}

/// Typed mapping from source ids to adapters.
pub struct SourceRegistry {
    /// Registration order is the order shown in the source picker.
    sources: Vec<(SourceId, Arc<dyn JobSource>)>,
    request_timeout: Duration,
}

impl SourceRegistry {
    /// Create an empty registry whose fetches are bounded by `request_timeout`.
    pub fn new(request_timeout: Duration) -> Self {
        Self {
            sources: Vec::new(),
            request_timeout,
        }
    }

    /// Register an adapter, replacing any previous one with the same id.
    pub fn register(&mut self, source: Arc<dyn JobSource>) {
        let id = source.id();
        if let Some(slot) = self.sources.iter_mut().find(|(existing, _)| *existing == id) {
            tracing::debug!(source = %id, "Replacing registered job source");
            slot.1 = source;
        } else {
            tracing::debug!(source = %id, "Registered job source");
            self.sources.push((id, source));
        }
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_source(mut self, source: Arc<dyn JobSource>) -> Self {
        self.register(source);
        self
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> Vec<SourceId> {
        self.sources.iter().map(|(id, _)| id.clone()).collect()
    }

    pub fn contains(&self, id: &SourceId) -> bool {
        self.sources.iter().any(|(existing, _)| existing == id)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Fetch one page from the source registered under `id`.
    ///
    /// Timeouts become [`FetchError::UpstreamUnavailable`]. A response for a
    /// different page than requested is [`FetchError::UpstreamMalformed`].
    pub async fn fetch(
        &self,
        id: &SourceId,
        query: &str,
        page: u32,
    ) -> Result<SearchPage, FetchError> {
        let source = self
            .sources
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, source)| Arc::clone(source))
            .ok_or_else(|| FetchError::UnknownSource(id.clone()))?;

        let result = tokio::time::timeout(self.request_timeout, source.search(query, page))
            .await
            .map_err(|_| FetchError::UpstreamUnavailable {
                source_id: id.clone(),
                reason: format!("timed out after {:?}", self.request_timeout),
            })??;

        if result.page != page {
            return Err(FetchError::UpstreamMalformed {
                source_id: id.clone(),
                reason: format!("asked for page {page}, got page {}", result.page),
            });
        }

        Ok(result)
    }
}

impl fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("sources", &self.ids())
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
