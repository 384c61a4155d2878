//! In-process source that fabricates one listing per page.
//!
//! Useful for trying the bot without the scraper API running.

use std::sync::Arc;

use async_trait::async_trait;

use crate::clock::Clock;
use crate::error::FetchError;
use crate::sources::{JobSource, Listing, SearchPage, SourceId};

pub struct DemoSource {
    clock: Arc<dyn Clock>,
}

impl DemoSource {
    pub const ID: &'static str = "demo";

    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl JobSource for DemoSource {
    fn id(&self) -> SourceId {
        SourceId::new(Self::ID)
    }

    async fn search(&self, query: &str, page: u32) -> Result<SearchPage, FetchError> {
        let listing = Listing {
            posted_at: Some(self.clock.now()),
            title: Some(format!("Mock Job for '{query}'")),
            url: Some(format!("https://example.com/job/{page}")),
            description: Some(format!("This is a test job for query: {query}\nPage: {page}")),
            skills: vec![
                "Rust".to_string(),
                "Testing".to_string(),
                "Telegram Bots".to_string(),
            ],
        };
        Ok(SearchPage {
            listings: vec![listing],
            page,
        })
    }
}
