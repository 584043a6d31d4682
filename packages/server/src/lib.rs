#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the traffic watch dashboard.
//!
//! Hosts the single shared [`MapView`]: the frontend posts each settled
//! viewport to `/api/viewport`, which runs a refresh cycle against the
//! Overpass API and returns the redrawn road and signal layers. Also
//! serves the camera roster, a pass-through video feed proxy for roster
//! streams, and the static frontend from `app/dist`.

mod handlers;
pub mod interactive;

use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use traffic_watch_geodata::overpass::OverpassClient;
use traffic_watch_overlay::MapView;
use traffic_watch_overlay::style::RandomStyler;

/// Shared application state.
pub struct AppState {
    /// The map view whose layers every client sees.
    pub view: Arc<MapView>,
    /// HTTP client for the video feed proxy.
    pub http: reqwest::Client,
}

impl AppState {
    /// Builds state around an Overpass client configured from the
    /// environment and the random congestion styler.
    ///
    /// # Errors
    ///
    /// Returns an error if the Overpass configuration is invalid or an
    /// HTTP client cannot be built.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let overpass = OverpassClient::from_env()?;
        log::info!(
            "Overpass endpoint: {} (server timeout {}s)",
            overpass.config().endpoint,
            overpass.config().server_timeout_secs
        );
        let server_timeout = overpass.config().server_timeout_secs;
        let view = MapView::new(Arc::new(overpass), Arc::new(RandomStyler::new()))
            .with_server_timeout(server_timeout);

        Ok(Self {
            view: Arc::new(view),
            http: reqwest::Client::builder().build()?,
        })
    }
}

/// Registers the API routes and the video feed proxy.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/cameras", web::get().to(handlers::cameras))
            .route("/cameras/{id}/player", web::get().to(handlers::camera_player))
            .route("/viewport", web::post().to(handlers::viewport))
            .route("/overlay", web::get().to(handlers::overlay))
            .route("/overlay.geojson", web::get().to(handlers::overlay_geojson))
            .route("/query", web::get().to(handlers::query)),
    )
    .route("/video_feed", web::get().to(handlers::video_feed));
}

/// Starts the traffic watch API server.
///
/// Reads `BIND_ADDR` (default `127.0.0.1`) and `PORT` (default `8080`)
/// from the environment. The caller provides the async runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the state cannot be built, the
/// HTTP server fails to bind, or it encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    let state = web::Data::new(AppState::from_env().map_err(std::io::Error::other)?);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
            // Serve frontend static files (production)
            .service(Files::new("/", "app/dist").index_file("index.html"))
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
