use serde::{Deserialize, Serialize};

pub const LOCATION_PLACEHOLDER: &str = "Address not available";
pub const PRICE_PLACEHOLDER: &str = "Price not available";

/// Source label attached to every listing scraped from Booking.com
pub const BOOKING_SOURCE: &str = "Booking.com";

/// One hotel search result.
///
/// `name` is always non-empty. Every other field degrades to a placeholder
/// when the upstream card does not carry it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    pub name: String,
    /// Score rescaled to 0-5, 0 when unknown
    pub rating: f64,
    pub location: String,
    pub price: String,
    #[serde(rename = "image")]
    pub image_url: String,
    #[serde(rename = "booking_url")]
    pub detail_url: String,
    pub source: String,
}

impl Listing {
    /// A listing with only a name; all other fields at their placeholders
    pub fn named(name: impl Into<String>, source: &str) -> Self {
        Self {
            name: name.into(),
            rating: 0.0,
            location: LOCATION_PLACEHOLDER.to_string(),
            price: PRICE_PLACEHOLDER.to_string(),
            image_url: String::new(),
            detail_url: String::new(),
            source: source.to_string(),
        }
    }

    /// Synthetic record returned when no provider produced anything
    pub fn no_results() -> Self {
        Self {
            name: "No results found".to_string(),
            rating: 0.0,
            location: "Please try another search".to_string(),
            price: "N/A".to_string(),
            image_url: String::new(),
            detail_url: String::new(),
            source: "System".to_string(),
        }
    }
}
