use crate::models::Listing;
use anyhow::Result;
use async_trait::async_trait;

/// Common trait for all hotel search providers
#[async_trait]
pub trait HotelProvider: Send + Sync {
    /// Search hotels matching `query`, using cached results when fresh
    async fn search(&self, query: &str) -> Result<Vec<Listing>>;

    /// Identifier of the provider, also used to key its cache entries
    fn source_name(&self) -> &'static str;
}
