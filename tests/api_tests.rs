//! End-to-end tests for the JSON API, with stub providers behind the
//! aggregator.

use actix_web::{test, web, App};
use anyhow::{bail, Result};
use async_trait::async_trait;
use hotel_scout::aggregator::Aggregator;
use hotel_scout::api::{self, SearchResponse, EMPTY_QUERY_ERROR};
use hotel_scout::models::{Listing, BOOKING_SOURCE};
use hotel_scout::scrapers::HotelProvider;
use serde_json::json;
use std::sync::Arc;

struct FixedProvider(Vec<Listing>);

#[async_trait]
impl HotelProvider for FixedProvider {
    async fn search(&self, _query: &str) -> Result<Vec<Listing>> {
        Ok(self.0.clone())
    }

    fn source_name(&self) -> &'static str {
        "fixed"
    }
}

struct BrokenProvider;

#[async_trait]
impl HotelProvider for BrokenProvider {
    async fn search(&self, _query: &str) -> Result<Vec<Listing>> {
        bail!("Chrome failed to start")
    }

    fn source_name(&self) -> &'static str {
        "broken"
    }
}

fn hotel(name: &str, rating: f64) -> Listing {
    Listing {
        rating,
        ..Listing::named(name, BOOKING_SOURCE)
    }
}

fn aggregator(providers: Vec<Arc<dyn HotelProvider>>) -> web::Data<Aggregator> {
    web::Data::new(Aggregator::new(providers))
}

#[actix_web::test]
async fn empty_query_returns_error_and_no_results() {
    let app = test::init_service(
        App::new()
            .app_data(aggregator(vec![Arc::new(BrokenProvider)]))
            .configure(api::routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/search")
        .set_json(json!({ "query": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: SearchResponse = test::read_body_json(resp).await;
    assert!(body.results.is_empty());
    assert_eq!(body.error.as_deref(), Some(EMPTY_QUERY_ERROR));
}

#[actix_web::test]
async fn missing_query_field_is_treated_as_empty() {
    let app = test::init_service(
        App::new()
            .app_data(aggregator(vec![]))
            .configure(api::routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/search")
        .set_json(json!({}))
        .to_request();
    let body: SearchResponse = test::call_and_read_body_json(&app, req).await;

    assert!(body.results.is_empty());
    assert!(body.error.is_some());
}

#[actix_web::test]
async fn results_are_sorted_by_rating() {
    let app = test::init_service(
        App::new()
            .app_data(aggregator(vec![
                Arc::new(FixedProvider(vec![hotel("Ibis", 3.6)])),
                Arc::new(BrokenProvider),
                Arc::new(FixedProvider(vec![hotel("Plaza Athénée", 4.7)])),
            ]))
            .configure(api::routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/search")
        .set_json(json!({ "query": "Paris" }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert!(body.get("error").is_none());
    let names: Vec<_> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Plaza Athénée", "Ibis"]);
    assert_eq!(body["results"][0]["source"], BOOKING_SOURCE);
}

#[actix_web::test]
async fn scraping_failure_returns_placeholder_with_200() {
    let app = test::init_service(
        App::new()
            .app_data(aggregator(vec![Arc::new(BrokenProvider)]))
            .configure(api::routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/search")
        .set_json(json!({ "query": "Lyon" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: SearchResponse = test::read_body_json(resp).await;
    assert_eq!(body.results, vec![Listing::no_results()]);
    assert!(body.error.is_none());
}

#[actix_web::test]
async fn serves_search_page_and_health() {
    let app = test::init_service(
        App::new()
            .app_data(aggregator(vec![]))
            .configure(api::routes),
    )
    .await;

    let page = test::call_and_read_body(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert!(std::str::from_utf8(&page).unwrap().contains("/api/search"));

    let health =
        test::call_and_read_body(&app, test::TestRequest::get().uri("/healthz").to_request()).await;
    assert_eq!(health, "ok");
}

#[actix_web::test]
async fn cross_origin_requests_are_allowed() {
    let app = test::init_service(
        App::new()
            .wrap(api::cors())
            .app_data(aggregator(vec![Arc::new(FixedProvider(vec![hotel("Ibis", 3.6)]))]))
            .configure(api::routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/search")
        .insert_header(("Origin", "http://localhost:3000"))
        .set_json(json!({ "query": "Paris" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp.status().is_success());
    assert!(resp
        .headers()
        .contains_key(actix_web::http::header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
