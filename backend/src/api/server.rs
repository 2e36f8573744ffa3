//! HTTP server for the cleaning service.
//!
//! # API Endpoints
//!
//! | Method | Path                   | Description                              |
//! |--------|------------------------|------------------------------------------|
//! | GET    | `/health`              | Health check                             |
//! | POST   | `/api/clean/{entity}`  | Upload a CSV/JSON table and clean it     |
//! | GET    | `/api/logs`            | SSE stream of pipeline logs              |

use axum::{
    extract::{Multipart, Path},
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, log_info, LOG_BROADCASTER};
use super::types::{error_response, CleanResponse};
use crate::error::{ServerError, ServerResult};
use crate::extract::SourceFormat;
use crate::models::Entity;
use crate::pipeline::clean_bytes;

type ApiError = (StatusCode, Json<Value>);

fn bad_request(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(error_response(message)))
}

/// Build the router. Split out from [`start_server`] so it can be served on
/// any listener.
pub fn router() -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/clean/{entity}", post(clean_upload))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
}

/// Start the HTTP server
pub async fn start_server(port: u16) -> ServerResult<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Centralise server running on http://localhost:{}", port);
    println!("   POST /api/clean/{{entity}} - Upload a table to clean");
    println!("   GET  /api/logs            - SSE log stream");
    println!("   GET  /health              - Health check");
    println!();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router()).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    let entities: Vec<String> = Entity::ALL.iter().map(|e| e.to_string()).collect();
    Json(json!({
        "status": "ok",
        "service": "centralise",
        "version": env!("CARGO_PKG_VERSION"),
        "entities": entities,
        "endpoints": {
            "clean": "POST /api/clean/{entity}",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        // lagged receivers just miss entries
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Clean an uploaded table
async fn clean_upload(
    Path(entity): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<CleanResponse>, ApiError> {
    let entity = Entity::from_name(&entity)
        .ok_or_else(|| bad_request(&format!("Unknown entity '{}'", entity)))?;

    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(&format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            file_name = field.file_name().map(|s| s.to_string());
            file_data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(&format!("Read error: {}", e)))?
                    .to_vec(),
            );
        }
    }

    let bytes = file_data.ok_or_else(|| bad_request("No file provided"))?;
    let format = upload_format(file_name.as_deref()).map_err(|e| bad_request(&e.to_string()))?;

    log_info(format!(
        "Upload for {}: {} ({} bytes)",
        entity,
        file_name.as_deref().unwrap_or("unnamed"),
        bytes.len()
    ));

    let output = clean_bytes(entity, &bytes, format).map_err(|e| {
        log_error(format!("Cleaning {} failed: {}", entity, e));
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(error_response(&e.to_string())),
        )
    })?;

    Ok(Json(CleanResponse::from(output)))
}

/// Format of an upload, from its file name. Unnamed uploads are read as CSV.
fn upload_format(file_name: Option<&str>) -> ServerResult<SourceFormat> {
    match file_name {
        None => Ok(SourceFormat::Csv),
        Some(name) => {
            SourceFormat::from_location(name).map_err(|e| ServerError::BadRequest(e.to_string()))
        }
    }
}
