use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static SCORE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+[,.]\d+)").expect("score pattern is valid"));

/// Parse a review score such as "Note 8,9" (out of 10) into a 0-5 rating.
///
/// Returns 0 when the text holds no decimal number.
pub fn normalize(text: &str) -> f64 {
    let Some(found) = SCORE_PATTERN.captures(text).and_then(|c| c.get(1)) else {
        debug!("No score found in {:?}", text);
        return 0.0;
    };

    match found.as_str().replace(',', ".").parse::<f64>() {
        Ok(score) => {
            let rating = (score / 2.0).clamp(0.0, 5.0);
            debug!("Rating extracted: {}/5 (raw: {:?})", rating, text);
            rating
        }
        Err(e) => {
            debug!("Unparseable score {:?}: {}", found.as_str(), e);
            0.0
        }
    }
}
