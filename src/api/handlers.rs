// Config endpoint handlers

use http_body_util::BodyExt;
use hyper::body::Body;
use hyper::{HeaderMap, Request, StatusCode};

use super::response::{self, Rejection};
use super::types::decode_update;
use crate::config::AppState;
use crate::http::{self, HttpResponse};
use crate::logger;

/// GET: current document
pub async fn handle_get(state: &AppState) -> HttpResponse {
    match state.store.load().await {
        Ok(doc) => http::build_json_response(StatusCode::OK, &doc),
        Err(e) => {
            logger::log_error(&format!("Failed to read configuration: {e}"));
            Rejection::Internal.into_response()
        }
    }
}

/// POST: authorize, merge `free` / `order`, persist
pub async fn handle_post<B>(req: Request<B>, state: &AppState) -> HttpResponse
where
    B: Body,
    B::Error: std::fmt::Display,
{
    match apply_post(req, state).await {
        Ok(()) => response::ok(),
        Err(rejection) => rejection.into_response(),
    }
}

async fn apply_post<B>(req: Request<B>, state: &AppState) -> Result<(), Rejection>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let length = declared_length(req.headers()).ok_or(Rejection::BadRequest)?;
    if length > state.config.http.max_body_size {
        return Err(Rejection::PayloadTooLarge);
    }

    let body = req
        .into_body()
        .collect()
        .await
        .map_err(|e| {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            Rejection::BadRequest
        })?
        .to_bytes();

    let update = decode_update(&body, &state.config.store.vip_key)?;

    state.store.update(update).await.map_err(|e| {
        logger::log_error(&format!("Failed to persist configuration: {e}"));
        Rejection::Internal
    })?;

    Ok(())
}

/// `Content-Length` as a number; absent or unparseable is `None`
fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(hyper::header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
