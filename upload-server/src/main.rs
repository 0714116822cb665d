mod errors;
mod params;
mod services;
mod storage;

use actix_web::{middleware, web, App, HttpServer};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use crate::errors::ServerErr;
use crate::params::Args;
use crate::services::AppState;

#[actix_web::main]
async fn main() -> Result<(), ServerErr> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("starting server...");

    // A store that cannot be built is fatal: nothing is served.
    let store = storage::build_store(&args).await.map_err(|e| {
        tracing::error!(error = ?e, "Cannot create object storage");
        e
    })?;

    let state = web::Data::new(AppState::new(store, args.greeting_name()));

    tracing::info!("listening on port {}", args.port);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .configure(services::routes)
    })
        .bind(("0.0.0.0", args.port))?
        .run()
        .await?;
    Ok(())
}
