use crate::aggregator::Aggregator;
use crate::models::Listing;
use actix_cors::Cors;
use actix_web::{get, post, web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const INDEX_HTML: &str = include_str!("../static/index.html");

pub const EMPTY_QUERY_ERROR: &str = "Please enter a search term";

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<Listing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[get("/")]
async fn index() -> impl Responder {
    info!("Serving search page");
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

#[get("/healthz")]
async fn healthz() -> impl Responder {
    HttpResponse::Ok().body("ok")
}

/// Always answers 200 with a well-formed body; scraping failures show up as
/// the placeholder listing.
#[post("/api/search")]
async fn search(
    aggregator: web::Data<Aggregator>,
    body: Option<web::Json<SearchRequest>>,
) -> impl Responder {
    let query = body.map(|b| b.into_inner().query).unwrap_or_default();
    let query = query.trim();
    info!("New search received: {:?}", query);

    if query.is_empty() {
        warn!("Empty search received");
        return HttpResponse::Ok().json(SearchResponse {
            results: Vec::new(),
            error: Some(EMPTY_QUERY_ERROR.to_string()),
        });
    }

    let results = aggregator.search_all(query).await;
    info!("Sending {} results to client", results.len());
    HttpResponse::Ok().json(SearchResponse {
        results,
        error: None,
    })
}

/// Cross-origin access to the API, so the page can also be hosted elsewhere
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST"])
        .allow_any_header()
        .max_age(3600)
}

/// Register every route on an actix `App`
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(index).service(healthz).service(search);
}
