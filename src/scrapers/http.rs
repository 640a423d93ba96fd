use crate::cache::{CacheKey, ResultCache};
use crate::models::Listing;
use crate::scrapers::extract::{extract_all, BOOKING_ORIGIN};
use crate::scrapers::session::random_user_agent;
use crate::scrapers::traits::HotelProvider;
use crate::scrapers::types::{ScrapeOptions, SearchParams, BOOKING_SEARCH_URL};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Local;
use reqwest::header::ACCEPT_LANGUAGE;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Booking.com search read from the server-rendered page, without a browser.
///
/// Cheaper than [`super::BookingBrowserProvider`] but only sees whatever the
/// page carries before any script runs.
pub struct BookingHttpProvider {
    client: Client,
    search_url: String,
    options: ScrapeOptions,
    cache: Arc<ResultCache>,
}

impl BookingHttpProvider {
    pub const ID: &'static str = "booking_http";

    pub fn new(options: ScrapeOptions, cache: Arc<ResultCache>) -> Result<Self> {
        Self::with_search_url(BOOKING_SEARCH_URL, options, cache)
    }

    /// Provider that queries `search_url` instead of the live site
    pub fn with_search_url(
        search_url: &str,
        options: ScrapeOptions,
        cache: Arc<ResultCache>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(random_user_agent())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            search_url: search_url.to_string(),
            options,
            cache,
        })
    }

    async fn fetch(&self, query: &str) -> Result<Vec<Listing>> {
        let url = SearchParams::for_query(query, Local::now().date_naive(), &self.options.market)
            .to_url(&self.search_url)?;
        debug!("Fetching URL: {}", url);

        let response = self
            .client
            .get(url)
            .header(ACCEPT_LANGUAGE, "fr-FR,fr;q=0.9")
            .send()
            .await
            .context("Failed to fetch Booking page")?;

        if !response.status().is_success() {
            warn!("Booking returned status: {}", response.status());
            anyhow::bail!("Failed to fetch Booking page: {}", response.status());
        }

        let html = response.text().await.context("Failed to read response body")?;
        debug!("Downloaded {} bytes of HTML", html.len());

        let limit = self.options.listing_limit;
        let listings =
            tokio::task::spawn_blocking(move || extract_all(&html, limit, BOOKING_ORIGIN))
                .await
                .context("Extraction task panicked")?;

        if listings.is_empty() {
            warn!("No hotels in server-rendered page for {}", query);
        } else {
            info!("Scraped {} hotels from static page", listings.len());
        }
        Ok(listings)
    }
}

#[async_trait]
impl HotelProvider for BookingHttpProvider {
    async fn search(&self, query: &str) -> Result<Vec<Listing>> {
        info!("Starting HTTP search for: {}", query);
        let key = CacheKey::new(Self::ID, query);
        self.cache
            .get_or_build(&key, || async {
                self.fetch(query)
                    .await
                    .inspect_err(|e| error!("Booking HTTP search failed for {}: {:#}", query, e))
            })
            .await
    }

    fn source_name(&self) -> &'static str {
        Self::ID
    }
}
