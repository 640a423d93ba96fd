use crate::models::{Listing, BOOKING_SOURCE};
use crate::scrapers::rating;
use anyhow::{bail, Result};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

pub const BOOKING_ORIGIN: &str = "https://www.booking.com";

/// Marks one result card on the Booking.com search page
pub const CARD_SELECTOR: &str = r#"div[data-testid="property-card"]"#;

/// Selectors for each field of a result card, primary first
struct CardSelectors {
    card: Selector,
    name: Selector,
    location: Vec<Selector>,
    price: Vec<Selector>,
    rating: Vec<Selector>,
    image: Vec<Selector>,
    link: Vec<Selector>,
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css}: {e}"))
}

static SELECTORS: LazyLock<CardSelectors> = LazyLock::new(|| CardSelectors {
    card: selector(CARD_SELECTOR),
    name: selector(r#"div[data-testid="title"]"#),
    location: vec![selector(r#"span[data-testid="address"]"#)],
    price: vec![
        selector(r#"span[data-testid="price-and-discounted-price"]"#),
        selector(r#"span[data-testid="price"]"#),
    ],
    rating: vec![selector(r#"div[data-testid="review-score"]"#)],
    image: vec![selector(r#"img[data-testid="image"]"#)],
    link: vec![
        selector(r#"a[data-testid="title-link"]"#),
        selector("a.e13098a59f"),
    ],
});

fn first_match<'a>(card: ElementRef<'a>, selectors: &[Selector]) -> Option<ElementRef<'a>> {
    selectors.iter().find_map(|s| card.select(s).next())
}

fn trimmed_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn non_empty_text(card: ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
    first_match(card, selectors)
        .map(trimmed_text)
        .filter(|text| !text.is_empty())
}

fn attribute(card: ElementRef<'_>, selectors: &[Selector], name: &str) -> Option<String> {
    first_match(card, selectors)
        .and_then(|el| el.value().attr(name))
        .map(|value| value.trim().to_string())
}

/// Make a card link absolute against `origin`
pub fn absolutize_link(href: &str, origin: &str) -> String {
    if let Some(rest) = href.strip_prefix("//") {
        format!("https://{rest}")
    } else if href.starts_with('/') {
        format!("{}{}", origin.trim_end_matches('/'), href)
    } else {
        href.to_string()
    }
}

fn is_web_url(link: &str) -> bool {
    let lower = link.to_ascii_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://")
}

/// Extract one listing from a result card.
///
/// Fails only when the card has no usable name; the caller skips it.
pub fn extract_listing(card: ElementRef<'_>, origin: &str) -> Result<Listing> {
    let Some(title) = card.select(&SELECTORS.name).next() else {
        bail!("no title element");
    };
    let name = trimmed_text(title);
    if name.is_empty() {
        bail!("empty name");
    }

    debug!("Extracting fields for hotel: {}", name);
    let mut listing = Listing::named(name, BOOKING_SOURCE);

    if let Some(location) = non_empty_text(card, &SELECTORS.location) {
        listing.location = location;
    }
    if let Some(price) = non_empty_text(card, &SELECTORS.price) {
        listing.price = price;
    }
    if let Some(score) = first_match(card, &SELECTORS.rating) {
        listing.rating = rating::normalize(&trimmed_text(score));
    }
    if let Some(src) = attribute(card, &SELECTORS.image, "src") {
        listing.image_url = src;
    }
    if let Some(href) = attribute(card, &SELECTORS.link, "href") {
        let link = absolutize_link(&href, origin);
        if is_web_url(&link) {
            listing.detail_url = link;
        } else {
            debug!("Ignoring non-web link {:?}", href);
        }
    }

    Ok(listing)
}

/// Locate result cards in a page snapshot and extract the first `limit`,
/// keeping page order. Cards without a name are skipped.
pub fn extract_all(html: &str, limit: usize, origin: &str) -> Vec<Listing> {
    let document = Html::parse_document(html);
    let cards: Vec<_> = document.select(&SELECTORS.card).collect();
    info!("Found {} property cards in HTML", cards.len());

    let total = cards.len().min(limit);
    let mut listings = Vec::with_capacity(total);

    for (idx, card) in cards.into_iter().take(limit).enumerate() {
        match extract_listing(card, origin) {
            Ok(listing) => {
                debug!("Hotel {}/{} extracted", idx + 1, total);
                listings.push(listing);
            }
            Err(e) => warn!("Skipped hotel {}/{}: {}", idx + 1, total, e),
        }
    }

    listings
}
