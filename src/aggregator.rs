use crate::models::Listing;
use crate::scrapers::HotelProvider;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Fans one query out to every registered provider and merges the results
pub struct Aggregator {
    providers: Vec<Arc<dyn HotelProvider>>,
}

impl Aggregator {
    pub fn new(providers: Vec<Arc<dyn HotelProvider>>) -> Self {
        Self { providers }
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.source_name()).collect()
    }

    /// Merged listings, best rated first.
    ///
    /// A failing provider contributes nothing. Never empty: when nothing was
    /// found a single placeholder listing is returned.
    pub async fn search_all(&self, query: &str) -> Vec<Listing> {
        let searches = self.providers.iter().map(|provider| async move {
            info!("Searching via provider: {}", provider.source_name());
            match provider.search(query).await {
                Ok(listings) => listings,
                Err(e) => {
                    error!("Provider {} failed: {:#}", provider.source_name(), e);
                    Vec::new()
                }
            }
        });

        // join_all keeps registration order, and sort_by is stable
        let mut merged: Vec<Listing> = join_all(searches).await.into_iter().flatten().collect();
        merged.sort_by(|a, b| b.rating.total_cmp(&a.rating));
        info!("Sorted results, {} hotels in total", merged.len());

        if merged.is_empty() {
            warn!("No results found for {}", query);
            return vec![Listing::no_results()];
        }
        merged
    }
}
