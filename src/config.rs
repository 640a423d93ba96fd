use crate::cache::ResultCache;
use crate::scrapers::session::{SessionFactory, SessionSettings};
use crate::scrapers::types::ScrapeOptions;
use crate::scrapers::{
    BookingBrowserProvider, BookingHttpProvider, ChromeSessionFactory, HotelProvider,
};
use anyhow::{ensure, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

/// Providers that can be registered with the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderKind {
    /// Result page rendered in headless Chrome
    BookingBrowser,
    /// Server-rendered result page fetched over plain HTTP
    BookingHttp,
}

/// Hotel Scout: aggregated hotel search over scraped result pages
#[derive(Parser, Debug, Clone)]
#[command(name = "hotel-scout")]
#[command(version)]
#[command(about = "Aggregated hotel search over scraped result pages", long_about = None)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Chrome/Chromium binary to launch instead of the auto-detected one
    #[arg(long, env = "CHROME_BIN")]
    pub chrome_bin: Option<PathBuf>,

    /// Providers to query, comma separated
    #[arg(long, value_enum, value_delimiter = ',', default_value = "booking-browser")]
    pub providers: Vec<ProviderKind>,

    /// Result cards read per provider and search
    #[arg(long, default_value_t = 5)]
    pub listing_limit: usize,

    /// Seconds a cached search stays fresh
    #[arg(long, default_value_t = 3600)]
    pub cache_ttl_secs: u32,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            (1..=25).contains(&self.listing_limit),
            "listing limit must be between 1 and 25, got {}",
            self.listing_limit
        );
        ensure!(!self.providers.is_empty(), "at least one provider is required");
        Ok(())
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            browser_path: self.chrome_bin.clone(),
            ..SessionSettings::default()
        }
    }

    pub fn scrape_options(&self) -> ScrapeOptions {
        ScrapeOptions {
            listing_limit: self.listing_limit,
            ..ScrapeOptions::default()
        }
    }

    pub fn result_cache(&self) -> ResultCache {
        ResultCache::new(chrono::Duration::seconds(i64::from(self.cache_ttl_secs)))
    }

    /// Instantiate the configured providers, in order, sharing `cache`
    pub fn build_providers(&self, cache: Arc<ResultCache>) -> Result<Vec<Arc<dyn HotelProvider>>> {
        let mut kinds: Vec<ProviderKind> = Vec::new();
        for kind in &self.providers {
            if !kinds.contains(kind) {
                kinds.push(*kind);
            }
        }

        let mut providers: Vec<Arc<dyn HotelProvider>> = Vec::with_capacity(kinds.len());
        for kind in kinds {
            let provider: Arc<dyn HotelProvider> = match kind {
                ProviderKind::BookingBrowser => {
                    let factory: Arc<dyn SessionFactory> = Arc::new(ChromeSessionFactory);
                    Arc::new(BookingBrowserProvider::new(
                        factory,
                        self.session_settings(),
                        self.scrape_options(),
                        cache.clone(),
                    ))
                }
                ProviderKind::BookingHttp => Arc::new(BookingHttpProvider::new(
                    self.scrape_options(),
                    cache.clone(),
                )?),
            };
            providers.push(provider);
        }
        Ok(providers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["hotel-scout"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults() {
        let config = parse(&["--port", "8080"]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.providers, vec![ProviderKind::BookingBrowser]);
        assert_eq!(config.listing_limit, 5);
        assert_eq!(config.cache_ttl_secs, 3600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn provider_list_is_comma_separated() {
        let config = parse(&["--providers", "booking-http,booking-browser"]);
        assert_eq!(
            config.providers,
            vec![ProviderKind::BookingHttp, ProviderKind::BookingBrowser]
        );
    }

    #[test]
    fn rejects_unknown_provider() {
        assert!(Config::try_parse_from(["hotel-scout", "--providers", "expedia"]).is_err());
    }

    #[test]
    fn rejects_out_of_range_limit() {
        assert!(parse(&["--listing-limit", "0"]).validate().is_err());
        assert!(parse(&["--listing-limit", "10"]).validate().is_ok());
    }

    #[test]
    fn duplicate_providers_are_registered_once() {
        let config = parse(&["--providers", "booking-http,booking-http"]);
        let providers = config
            .build_providers(Arc::new(ResultCache::default()))
            .unwrap();
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].source_name(), BookingHttpProvider::ID);
    }

    #[test]
    fn chrome_bin_reaches_session_settings() {
        let config = parse(&["--chrome-bin", "/opt/chrome/chrome"]);
        assert_eq!(
            config.session_settings().browser_path,
            Some(PathBuf::from("/opt/chrome/chrome"))
        );
    }
}
