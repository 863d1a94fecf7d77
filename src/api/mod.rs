// API module entry
// Key-gated read/write endpoint for the configuration document

mod handlers;
mod response;
mod types;

use hyper::body::Body;
use hyper::{Method, Request};

use crate::config::AppState;
use crate::http::HttpResponse;

/// Route served by this module
pub const CONFIG_PATH: &str = "/api/config";

/// Dispatch a request for [`CONFIG_PATH`] by method
pub async fn handle_api_config<B>(req: Request<B>, state: &AppState) -> HttpResponse
where
    B: Body,
    B::Error: std::fmt::Display,
{
    match *req.method() {
        Method::GET => handlers::handle_get(state).await,
        Method::POST => handlers::handle_post(req, state).await,
        _ => response::method_not_allowed(),
    }
}
