use actix_web::{web, App, HttpServer};
use clap::Parser;
use hotel_scout::aggregator::Aggregator;
use hotel_scout::api;
use hotel_scout::config::Config;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn setup_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    setup_logging(config.verbose);
    config.validate()?;

    info!("🏨 Hotel Scout");

    let cache = Arc::new(config.result_cache());
    let providers = config.build_providers(cache)?;
    let aggregator = web::Data::new(Aggregator::new(providers));
    info!("Registered providers: {:?}", aggregator.provider_names());

    info!("Starting server on {}:{}", config.host, config.port);
    HttpServer::new(move || {
        App::new()
            .wrap(api::cors())
            .app_data(aggregator.clone())
            .configure(api::routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
