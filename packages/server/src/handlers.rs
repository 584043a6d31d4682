//! HTTP handler functions for the traffic watch API.

use actix_web::{HttpResponse, web};
use futures::StreamExt as _;
use reqwest::Url;
use traffic_watch_cameras::hls::PLAYLIST_CONTENT_TYPE;
use traffic_watch_cameras::{
    all_cameras, find_camera, is_playlist, is_relayable_stream, player_for, rewrite_playlist,
};
use traffic_watch_geodata_models::{BoundingBox, Viewport};
use traffic_watch_overlay::CycleOutcome;
use traffic_watch_overlay::geojson_export::to_feature_collection;
use traffic_watch_server_models::{
    ApiCycle, ApiError, ApiHealth, FeedParams, QueryParams, ViewportRequest, ViewportResponse,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/cameras`
///
/// Returns the camera roster unchanged.
pub async fn cameras() -> HttpResponse {
    HttpResponse::Ok().json(all_cameras())
}

/// `GET /api/cameras/{id}/player`
pub async fn camera_player(id: web::Path<String>) -> HttpResponse {
    match find_camera(&id) {
        Ok(camera) => HttpResponse::Ok().json(player_for(&camera)),
        Err(e) => HttpResponse::NotFound().json(ApiError::new(e.to_string())),
    }
}

/// `POST /api/viewport`
///
/// Runs one refresh cycle for the settled viewport and returns the
/// resulting layers. A failed fetch answers 502 with the (empty) layers.
pub async fn viewport(
    state: web::Data<AppState>,
    body: web::Json<ViewportRequest>,
) -> HttpResponse {
    let viewport = match body.into_inner().to_viewport() {
        Ok(v) => v,
        Err(message) => return HttpResponse::BadRequest().json(ApiError::new(message)),
    };

    let outcome = state.view.refresh(viewport).await;
    let response = ViewportResponse {
        cycle: ApiCycle::from(&outcome),
        overlay: state.view.snapshot(),
    };

    match outcome {
        CycleOutcome::Failed { .. } => HttpResponse::BadGateway().json(response),
        CycleOutcome::Committed { .. } | CycleOutcome::Superseded { .. } => {
            HttpResponse::Ok().json(response)
        }
    }
}

/// `GET /api/overlay`
pub async fn overlay(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.view.snapshot())
}

/// `GET /api/overlay.geojson`
pub async fn overlay_geojson(state: web::Data<AppState>) -> HttpResponse {
    let collection = to_feature_collection(&state.view.snapshot());
    HttpResponse::Ok()
        .content_type("application/geo+json")
        .body(collection.to_string())
}

/// `GET /api/query`
///
/// Returns the Overpass query a cycle would send for `bbox` and `zoom`.
pub async fn query(state: web::Data<AppState>, params: web::Query<QueryParams>) -> HttpResponse {
    let Some(bounds) = BoundingBox::parse(&params.bbox) else {
        return HttpResponse::BadRequest().json(ApiError::new(
            "bbox must be south,west,north,east",
        ));
    };
    let text = state.view.query_for(&Viewport::new(bounds, params.zoom));
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(text)
}

/// `GET /video_feed?url=<encoded>`
///
/// Relays an HLS roster camera's playlist, or a variant playlist or
/// segment beside it. Playlists are rewritten so every URI they name comes
/// back through this endpoint. Other URLs are refused so the proxy cannot
/// be pointed at arbitrary hosts.
pub async fn video_feed(
    state: web::Data<AppState>,
    params: web::Query<FeedParams>,
) -> HttpResponse {
    let Some(url) = params
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
    else {
        log::warn!("Video feed requested without a URL");
        return HttpResponse::BadRequest().json(ApiError::new("Missing url parameter"));
    };

    let source = match Url::parse(url) {
        Ok(source) if is_relayable_stream(&source) => source,
        _ => {
            log::warn!("Refusing to relay {url}");
            return HttpResponse::BadRequest()
                .json(ApiError::new("Stream is not an HLS camera in the roster"));
        }
    };

    let resp = match state.http.get(source.clone()).send().await {
        Ok(resp) => resp,
        Err(e) => {
            log::error!("Error starting video stream for {url}: {e}");
            return HttpResponse::BadGateway().json(ApiError::new("Failed to open stream"));
        }
    };

    if !resp.status().is_success() {
        log::error!("Video stream {url} returned status {}", resp.status());
        return HttpResponse::BadGateway().json(ApiError::new(format!(
            "Stream returned status {}",
            resp.status().as_u16()
        )));
    }

    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    if is_playlist(&source, Some(&content_type)) {
        return match resp.text().await {
            Ok(body) => {
                log::debug!("Rewriting playlist {url}");
                HttpResponse::Ok()
                    .content_type(PLAYLIST_CONTENT_TYPE)
                    .append_header(("Cache-Control", "no-cache"))
                    .body(rewrite_playlist(&source, &body))
            }
            Err(e) => {
                log::error!("Error reading playlist {url}: {e}");
                HttpResponse::BadGateway().json(ApiError::new("Failed to read playlist"))
            }
        };
    }

    log::info!("Relaying video stream {url} ({content_type})");
    let stream = async_stream::stream! {
        let mut upstream = resp.bytes_stream();
        while let Some(chunk) = upstream.next().await {
            match chunk {
                Ok(bytes) => yield Ok::<web::Bytes, actix_web::Error>(bytes),
                Err(e) => {
                    log::warn!("Stream ended or failed for {source}: {e}");
                    break;
                }
            }
        }
    };

    HttpResponse::Ok()
        .content_type(content_type)
        .append_header(("Cache-Control", "no-cache"))
        .streaming(stream)
}
