use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::time::Duration as StdDuration;
use url::Url;

pub const BOOKING_SEARCH_URL: &str = "https://www.booking.com/searchresults.fr.html";

/// Market the result page is requested in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    pub lang: String,
    pub currency: String,
}

impl Default for Market {
    fn default() -> Self {
        Self {
            lang: "fr".to_string(),
            currency: "EUR".to_string(),
        }
    }
}

/// Tunables for loading and reading one result page
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    /// Cards read per page
    pub listing_limit: usize,
    /// Pause after navigation before polling for cards
    pub settle_delay: StdDuration,
    /// How long to wait for the first card to render
    pub listing_wait: StdDuration,
    pub market: Market,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            listing_limit: 5,
            settle_delay: StdDuration::from_millis(500),
            listing_wait: StdDuration::from_secs(3),
            market: Market::default(),
        }
    }
}

/// Search parameters for one hotel query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParams {
    /// Destination as typed by the user
    pub query: String,
    pub checkin: NaiveDate,
    pub checkout: NaiveDate,
    pub market: Market,
}

impl SearchParams {
    /// One night starting tomorrow, relative to `today`
    pub fn for_query(query: &str, today: NaiveDate, market: &Market) -> Self {
        Self {
            query: query.to_string(),
            checkin: today + Duration::days(1),
            checkout: today + Duration::days(2),
            market: market.clone(),
        }
    }

    /// Result page URL; spaces in the query are encoded as `+`
    pub fn to_url(&self, base: &str) -> Result<Url> {
        let checkin = self.checkin.format("%Y-%m-%d").to_string();
        let checkout = self.checkout.format("%Y-%m-%d").to_string();

        Url::parse_with_params(
            base,
            &[
                ("ss", self.query.as_str()),
                ("checkin", checkin.as_str()),
                ("checkout", checkout.as_str()),
                ("lang", self.market.lang.as_str()),
                ("selected_currency", self.market.currency.as_str()),
            ],
        )
        .with_context(|| format!("Failed to build search URL from {base}"))
    }
}
