use crate::cache::{CacheKey, ResultCache};
use crate::models::Listing;
use crate::scrapers::extract::{extract_all, BOOKING_ORIGIN, CARD_SELECTOR};
use crate::scrapers::session::{SessionFactory, SessionManager, SessionSettings};
use crate::scrapers::traits::HotelProvider;
use crate::scrapers::types::{ScrapeOptions, SearchParams, BOOKING_SEARCH_URL};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Local;
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{error, info, warn};
use url::Url;

/// Booking.com search rendered in a headless browser
pub struct BookingBrowserProvider {
    factory: Arc<dyn SessionFactory>,
    settings: SessionSettings,
    options: ScrapeOptions,
    cache: Arc<ResultCache>,
}

impl BookingBrowserProvider {
    pub const ID: &'static str = "booking_chrome";

    pub fn new(
        factory: Arc<dyn SessionFactory>,
        settings: SessionSettings,
        options: ScrapeOptions,
        cache: Arc<ResultCache>,
    ) -> Self {
        Self {
            factory,
            settings,
            options,
            cache,
        }
    }

    async fn scrape(&self, query: &str) -> Result<Vec<Listing>> {
        let started = Instant::now();
        let url = SearchParams::for_query(query, Local::now().date_naive(), &self.options.market)
            .to_url(BOOKING_SEARCH_URL)?;

        let factory = self.factory.clone();
        let settings = self.settings.clone();
        let options = self.options.clone();

        let listings = tokio::task::spawn_blocking(move || {
            scrape_with_browser(factory, settings, &url, &options)
        })
        .await
        .context("Browser task panicked")?
        .inspect_err(|e| error!("Booking browser search failed for {}: {:#}", query, e))?;

        info!(
            "Search finished in {:.2} seconds, {} hotels found",
            started.elapsed().as_secs_f64(),
            listings.len()
        );
        Ok(listings)
    }
}

#[async_trait]
impl HotelProvider for BookingBrowserProvider {
    async fn search(&self, query: &str) -> Result<Vec<Listing>> {
        info!("Starting browser search for: {}", query);
        let key = CacheKey::new(Self::ID, query);
        self.cache.get_or_build(&key, || self.scrape(query)).await
    }

    fn source_name(&self) -> &'static str {
        Self::ID
    }
}

/// Run one page load in a fresh session. The session is released whatever
/// the outcome.
pub fn scrape_with_browser(
    factory: Arc<dyn SessionFactory>,
    settings: SessionSettings,
    url: &Url,
    options: &ScrapeOptions,
) -> Result<Vec<Listing>> {
    let mut manager = SessionManager::new(factory, settings);
    let outcome = load_listings(&mut manager, url, options);
    manager.release();
    outcome
}

fn load_listings(
    manager: &mut SessionManager,
    url: &Url,
    options: &ScrapeOptions,
) -> Result<Vec<Listing>> {
    let session = manager.acquire()?;

    info!("Opening URL: {}", url);
    session.navigate(url.as_str())?;
    thread::sleep(options.settle_delay);

    info!("Page loaded, waiting for property cards...");
    if !session.wait_for(CARD_SELECTOR, options.listing_wait)? {
        warn!("No hotels found within {:?}", options.listing_wait);
        return Ok(Vec::new());
    }

    let html = session.content()?;
    Ok(extract_all(&html, options.listing_limit, BOOKING_ORIGIN))
}
