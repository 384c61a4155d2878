//! Upwork job source.
//!
//! Talks to the scraper API that fronts Upwork search
//! (`GET {base}?q=<query>&page=<n>`), which answers with a JSON array of
//! job tiles.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::FetchError;
use crate::sources::{JobSource, Listing, SearchPage, SourceId};

/// Markers the scraper emits instead of leaving a field out.
const SCRAPER_MISSING_MARKERS: &[&str] = &[
    "N/A",
    "No job title",
    "No relative link",
    "No description",
];

/// One job tile as returned by the scraper API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireListing {
    /// Unix milliseconds, or a text marker when the scraper could not parse it.
    #[serde(default)]
    posting_timestamp: serde_json::Value,
    #[serde(default)]
    job_title: Option<String>,
    #[serde(default)]
    job_href: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    skills: Vec<String>,
}

impl From<WireListing> for Listing {
    fn from(wire: WireListing) -> Self {
        Listing {
            posted_at: timestamp_from_millis(&wire.posting_timestamp),
            title: present(wire.job_title),
            url: present(wire.job_href),
            description: present(wire.description),
            skills: wire
                .skills
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

/// Drop empty values and scraper placeholders.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !SCRAPER_MISSING_MARKERS.contains(&v.as_str()))
}

/// Interpret a JSON value as Unix milliseconds. Non-numeric values yield `None`.
fn timestamp_from_millis(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    let millis = match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
        _ => return None,
    };
    if millis <= 0 {
        return None;
    }
    DateTime::<Utc>::from_timestamp_millis(millis)
}

/// Parse a scraper response body into listings.
pub(crate) fn parse_listings(source_id: &SourceId, body: &str) -> Result<Vec<Listing>, FetchError> {
    let wire: Vec<WireListing> =
        serde_json::from_str(body).map_err(|e| FetchError::UpstreamMalformed {
            source_id: source_id.clone(),
            reason: format!("invalid JSON: {e}"),
        })?;
    Ok(wire.into_iter().map(Listing::from).collect())
}

/// Job source backed by the Upwork scraper API.
pub struct UpworkSource {
    base_url: String,
    client: reqwest::Client,
}

impl UpworkSource {
    /// Source id this adapter registers under.
    pub const ID: &'static str = "upwork";

    /// Create a source hitting `base_url` with the given per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::UpstreamUnavailable {
                source_id: SourceId::new(Self::ID),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    fn unavailable(&self, reason: impl Into<String>) -> FetchError {
        FetchError::UpstreamUnavailable {
            source_id: self.id(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl JobSource for UpworkSource {
    fn id(&self) -> SourceId {
        SourceId::new(Self::ID)
    }

    async fn search(&self, query: &str, page: u32) -> Result<SearchPage, FetchError> {
        let page_param = page.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", query), ("page", page_param.as_str())])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    self.unavailable(format!("request timed out: {e}"))
                } else {
                    self.unavailable(format!("request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.unavailable(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            tracing::warn!(%status, page, "Upwork scraper returned an error status");
            return Err(self.unavailable(format!("HTTP {status}")));
        }

        let listings = parse_listings(&self.id(), &body)?;
        tracing::debug!(page, count = listings.len(), "Fetched Upwork listings");
        Ok(SearchPage { listings, page })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn id() -> SourceId {
        SourceId::new(UpworkSource::ID)
    }

    #[test]
    fn parses_full_tile() {
        let body = r#"[{
            "postingTimestamp": 1743811200000,
            "jobTitle": "Rust backend developer",
            "jobHref": "https://www.upwork.com/jobs/~01",
            "description": "Build an API",
            "skills": ["Rust", " Tokio ", ""]
        }]"#;

        let listings = parse_listings(&id(), body).unwrap();
        assert_eq!(listings.len(), 1);
        let listing = &listings[0];
        assert_eq!(listing.title.as_deref(), Some("Rust backend developer"));
        assert_eq!(listing.url.as_deref(), Some("https://www.upwork.com/jobs/~01"));
        assert_eq!(listing.description.as_deref(), Some("Build an API"));
        assert_eq!(listing.skills, vec!["Rust".to_string(), "Tokio".to_string()]);
        assert_eq!(
            listing.posted_at,
            DateTime::<Utc>::from_timestamp_millis(1_743_811_200_000)
        );
    }

    #[test]
    fn scraper_markers_become_missing_fields() {
        let body = r#"[{
            "postingTimestamp": "N/A",
            "jobTitle": "No job title",
            "jobHref": "No relative link",
            "description": "No description",
            "skills": []
        }]"#;

        let listings = parse_listings(&id(), body).unwrap();
        assert_eq!(listings[0], Listing::default());
    }

    #[test]
    fn absent_fields_are_tolerated() {
        let listings = parse_listings(&id(), "[{}]").unwrap();
        assert_eq!(listings, vec![Listing::default()]);
    }

    #[test]
    fn empty_array_is_empty_page() {
        assert!(parse_listings(&id(), "[]").unwrap().is_empty());
    }

    #[test]
    fn non_array_body_is_malformed() {
        let err = parse_listings(&id(), r#"{"msg": "Error getting jobs"}"#).unwrap_err();
        assert!(matches!(err, FetchError::UpstreamMalformed { .. }));
    }

    #[test]
    fn fractional_timestamp_is_accepted() {
        let ts = timestamp_from_millis(&serde_json::json!(1743811200000.5));
        assert!(ts.is_some());
        assert!(timestamp_from_millis(&serde_json::json!(null)).is_none());
        assert!(timestamp_from_millis(&serde_json::json!(-5)).is_none());
    }
}
