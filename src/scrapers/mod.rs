//! Fetching and parsing of external content.
//!
//! # Sources
//!
//! | Source | Module | Method |
//! |--------|--------|--------|
//! | AI news feeds | [`rss`] | RSS 2.0 / Atom via `quick-xml` |
//! | Naver blog | [`naver`] | RSS listing + mobile post page via `scraper` |
//!
//! All network access goes through [`FetchText`], so every parser in here is
//! a pure function over a string and the pipelines can be driven by stubs.

pub mod naver;
pub mod rss;

use crate::error::PostResult;
use std::time::Duration;
use tracing::{debug, instrument};

/// Per-request timeout for feed and page fetches.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Trait for fetching a document body over the network.
pub trait FetchText {
    async fn fetch_text(&self, url: &str) -> PostResult<String>;
}

/// [`FetchText`] over a `reqwest` client with a fixed timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher; `user_agent` overrides reqwest's default header.
    pub fn new(user_agent: Option<&str>) -> PostResult<Self> {
        let mut builder = reqwest::Client::builder().timeout(FETCH_TIMEOUT);
        if let Some(ua) = user_agent {
            builder = builder.user_agent(ua);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl FetchText for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch_text(&self, url: &str) -> PostResult<String> {
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        debug!(bytes = body.len(), "Fetched document");
        Ok(body)
    }
}
