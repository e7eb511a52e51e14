use crate::error::Result;
use crate::model::{ShortUrlResponse, UploadRequest};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use burrow_core::ShortCode;
use burrow_resolver::ShortenParams;
use tracing::info;

/// `POST /`
pub async fn shorten_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<UploadRequest>, JsonRejection>,
) -> Result<Json<ShortUrlResponse>> {
    let Json(request) = payload?;

    let code = state
        .resolver()
        .shorten(ShortenParams::new(request.url, request.expire_at))
        .await?;
    info!(code = %code, "Shortened URL");

    Ok(Json(ShortUrlResponse {
        short_url: state.short_url(&code),
        id: code.to_string(),
    }))
}

/// `GET /{url_id}`, answered with a 302 to the original URL.
pub async fn resolve_handler(
    State(state): State<AppState>,
    Path(url_id): Path<String>,
) -> Result<Response> {
    let code = ShortCode::new(&url_id)?;
    let record = state.resolver().resolve(&code).await?;

    Ok((StatusCode::FOUND, [(header::LOCATION, record.original_url)]).into_response())
}

/// `DELETE /{url_id}`
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(url_id): Path<String>,
) -> Result<StatusCode> {
    let code = ShortCode::new(&url_id)?;
    state.resolver().delete(&code).await?;
    info!(code = %code, "Deleted URL");

    Ok(StatusCode::OK)
}
