//! Hotel Scout scrapes hotel search-result pages and serves the aggregated,
//! rating-sorted listings over a small JSON API.

pub mod aggregator;
pub mod api;
pub mod cache;
pub mod config;
pub mod models;
pub mod scrapers;
