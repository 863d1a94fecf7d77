//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: the config API route is matched
//! on its exact path, every other GET/HEAD falls through to static files.

use crate::api;
use crate::config::AppState;
use crate::handler::static_files;
use crate::http::{self, HttpResponse};
use crate::logger::{self, AccessLogEntry};
use hyper::body::Body;
use hyper::header::{HeaderMap, HeaderValue, IF_NONE_MATCH, RANGE, REFERER, SERVER, USER_AGENT};
use hyper::{Method, Request};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request data needed by the static file responder
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub is_head: bool,
    pub if_none_match: Option<&'a str>,
    pub range_header: Option<&'a str>,
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<HttpResponse, Infallible>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let started = Instant::now();
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = format_version(req.version());
    entry.referer = header_str(req.headers(), REFERER).map(ToString::to_string);
    entry.user_agent = header_str(req.headers(), USER_AGENT).map(ToString::to_string);

    let mut response = route_request(req, &state).await;
    if let Ok(server_name) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, server_name);
    }

    if state.config.logging.access_log {
        entry.status = response.status().as_u16();
        entry.body_bytes = usize::try_from(response.body().size_hint().lower()).unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

async fn route_request<B>(req: Request<B>, state: &AppState) -> HttpResponse
where
    B: Body,
    B::Error: std::fmt::Display,
{
    if req.uri().path() == api::CONFIG_PATH {
        return api::handle_api_config(req, state).await;
    }

    let method = req.method();
    if method != Method::GET && method != Method::HEAD {
        return http::build_405_response("GET, HEAD");
    }

    let headers = req.headers();
    let ctx = RequestContext {
        path: req.uri().path(),
        query: req.uri().query(),
        is_head: method == Method::HEAD,
        if_none_match: header_str(headers, IF_NONE_MATCH),
        range_header: header_str(headers, RANGE),
    };

    static_files::serve_static(&ctx, &state.config.static_files).await
}

fn header_str(headers: &HeaderMap, name: hyper::header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn format_version(version: hyper::Version) -> String {
    let text = format!("{version:?}");
    text.trim_start_matches("HTTP/").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, LegacyEnv};
    use http_body_util::{BodyExt, Full};
    use hyper::body::Bytes;
    use hyper::StatusCode;
    use serde_json::{json, Value};

    struct TestSite {
        _dir: tempfile::TempDir,
        store_path: std::path::PathBuf,
        state: Arc<AppState>,
    }

    fn test_site() -> TestSite {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("static");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(root.join("index.html"), "<p>lists</p>").unwrap();
        std::fs::write(root.join("app.js"), "console.log(1)").unwrap();
        std::fs::create_dir_all(root.join("assets").join("fonts")).unwrap();
        std::fs::write(root.join("assets").join("main site.css"), "body{}").unwrap();
        std::fs::write(root.join("assets").join("<b>.txt"), "b").unwrap();

        let store_path = dir.path().join("data/config.json");
        let env = LegacyEnv {
            config_file: Some(store_path.display().to_string()),
            ..LegacyEnv::default()
        };
        let mut config = Config::load_with_env("/nonexistent/listkeeper-router-test", &env).unwrap();
        config.static_files.root = root;
        config.logging.access_log = false;

        TestSite {
            state: Arc::new(AppState::new(&config)),
            store_path,
            _dir: dir,
        }
    }

    fn post(body: &str) -> Request<Full<Bytes>> {
        Request::post(api::CONFIG_PATH)
            .header("content-length", body.len())
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap()
    }

    fn get(path: &str) -> Request<Full<Bytes>> {
        Request::get(path).body(Full::new(Bytes::new())).unwrap()
    }

    async fn send(site: &TestSite, req: Request<Full<Bytes>>) -> (StatusCode, Bytes) {
        let peer: SocketAddr = "127.0.0.1:40000".parse().unwrap();
        let resp = handle_request(req, Arc::clone(&site.state), peer).await.unwrap();
        let status = resp.status();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        (status, body)
    }

    async fn send_json(site: &TestSite, req: Request<Full<Bytes>>) -> (StatusCode, Value) {
        let (status, body) = send(site, req).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_fresh_deployment_returns_empty_lists() {
        let site = test_site();
        let (status, body) = send_json(&site, get("/api/config")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"free": [], "order": []}));
    }

    #[tokio::test]
    async fn test_post_then_get_reflects_update() {
        let site = test_site();
        let (status, body) = send_json(&site, post(r#"{"key":"VIP","free":["a","b"]}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true}));

        let (_, body) = send_json(&site, get("/api/config")).await;
        assert_eq!(body, json!({"free": ["a", "b"], "order": []}));
    }

    #[tokio::test]
    async fn test_partial_updates_leave_other_list() {
        let site = test_site();
        send(&site, post(r#"{"key":"VIP","order":["z","y","x"]}"#)).await;
        send(&site, post(r#"{"key":"VIP","free":["f"]}"#)).await;

        let (_, body) = send_json(&site, get("/api/config")).await;
        assert_eq!(body, json!({"free": ["f"], "order": ["z", "y", "x"]}));

        send(&site, post(r#"{"key":"VIP","order":[]}"#)).await;
        let (_, body) = send_json(&site, get("/api/config")).await;
        assert_eq!(body, json!({"free": ["f"], "order": []}));
    }

    #[tokio::test]
    async fn test_wrong_key_is_forbidden_and_changes_nothing() {
        let site = test_site();
        send(&site, post(r#"{"key":"VIP","order":["keep"]}"#)).await;

        let (status, body) = send_json(&site, post(r#"{"key":"wrong","order":["x"]}"#)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({"error": "forbidden"}));

        let (status, _) = send_json(&site, post(r#"{"free":["x"]}"#)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (_, body) = send_json(&site, get("/api/config")).await;
        assert_eq!(body, json!({"free": [], "order": ["keep"]}));
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let site = test_site();
        let (status, body) = send_json(&site, post(r#"{"key":"VIP","free":["#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "bad request"}));

        let (_, body) = send_json(&site, get("/api/config")).await;
        assert_eq!(body, json!({"free": [], "order": []}));
        assert!(!site.store_path.exists());
    }

    #[tokio::test]
    async fn test_missing_content_length_is_bad_request() {
        let site = test_site();
        let req = Request::post(api::CONFIG_PATH)
            .body(Full::new(Bytes::from_static(br#"{"key":"VIP","free":["a"]}"#)))
            .unwrap();
        let (status, _) = send_json(&site, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let site = test_site();
        let req = Request::post(api::CONFIG_PATH)
            .header("content-length", "99999999")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let (status, body) = send_json(&site, req).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body, json!({"error": "payload too large"}));
    }

    #[tokio::test]
    async fn test_other_methods_on_api_route() {
        let site = test_site();
        for method in [Method::PUT, Method::DELETE, Method::PATCH, Method::HEAD] {
            let req = Request::builder()
                .method(method)
                .uri(api::CONFIG_PATH)
                .body(Full::new(Bytes::new()))
                .unwrap();
            let (status, body) = send_json(&site, req).await;
            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(body, json!({"error": "method not allowed"}));
        }
    }

    #[tokio::test]
    async fn test_extra_persisted_keys_survive_updates() {
        let site = test_site();
        std::fs::create_dir_all(site.store_path.parent().unwrap()).unwrap();
        std::fs::write(&site.store_path, r#"{"free": [], "order": [], "motd": "hello"}"#).unwrap();

        send(&site, post(r#"{"key":"VIP","free":["n"]}"#)).await;
        let (_, body) = send_json(&site, get("/api/config")).await;
        assert_eq!(body, json!({"free": ["n"], "order": [], "motd": "hello"}));
    }

    #[tokio::test]
    async fn test_unreadable_store_is_internal_error() {
        let site = test_site();
        // A directory where the file should be fails with EISDIR
        std::fs::create_dir_all(&site.store_path).unwrap();

        let (status, body) = send(&site, get("/api/config")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(&body[..], br#"{"error":"internal server error"}"#);

        let (status, body) = send(&site, post(r#"{"key":"VIP","free":["a"]}"#)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(&body[..], br#"{"error":"internal server error"}"#);
        assert!(site.store_path.is_dir());
    }

    #[tokio::test]
    async fn test_api_route_ignores_query_string() {
        let site = test_site();
        let body = r#"{"key":"VIP","order":"ab"}"#;
        let req = Request::post("/api/config?v=1")
            .header("content-length", body.len())
            .body(Full::new(Bytes::from_static(body.as_bytes())))
            .unwrap();
        let (status, body) = send_json(&site, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true}));

        let (status, body) = send_json(&site, get("/api/config?v=1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"free": [], "order": ["a", "b"]}));
    }

    #[tokio::test]
    async fn test_api_headers() {
        let site = test_site();
        let peer: SocketAddr = "127.0.0.1:40000".parse().unwrap();
        let resp = handle_request(get("/api/config"), Arc::clone(&site.state), peer)
            .await
            .unwrap();
        assert_eq!(resp.headers()["content-type"], "application/json");
        assert_eq!(resp.headers()["cache-control"], "no-cache");
        assert_eq!(resp.headers()["server"], "listkeeper");
        assert!(resp.headers().contains_key("content-length"));
    }

    #[tokio::test]
    async fn test_static_paths() {
        let site = test_site();
        let (status, body) = send(&site, get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], b"<p>lists</p>");

        let (status, _) = send(&site, get("/missing.html")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // Query strings are ignored for file lookup
        let (status, _) = send(&site, get("/app.js?v=3")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_directory_without_index_is_listed() {
        let site = test_site();
        let peer: SocketAddr = "127.0.0.1:40000".parse().unwrap();
        let resp = handle_request(get("/assets/"), Arc::clone(&site.state), peer)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "text/html; charset=utf-8");

        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("<title>Directory listing for /assets/</title>"));
        assert!(html.contains(r#"<a href="fonts/">fonts/</a>"#));
        assert!(html.contains(r#"<a href="main%20site.css">main site.css</a>"#));
        assert!(html.contains(r#"<a href="%3Cb%3E.txt">&lt;b&gt;.txt</a>"#));

        let (status, _) = send(&site, get("/assets")).await;
        assert_eq!(status, StatusCode::MOVED_PERMANENTLY);
    }

    #[tokio::test]
    async fn test_post_to_static_path_not_allowed() {
        let site = test_site();
        let req = Request::post("/index.html")
            .header("content-length", "2")
            .body(Full::new(Bytes::from_static(b"{}")))
            .unwrap();
        let (status, _) = send(&site, req).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_static_etag_and_range() {
        let site = test_site();
        let peer: SocketAddr = "127.0.0.1:40000".parse().unwrap();
        let resp = handle_request(get("/app.js"), Arc::clone(&site.state), peer)
            .await
            .unwrap();
        let etag = resp.headers()["etag"].to_str().unwrap().to_string();

        let req = Request::get("/app.js")
            .header("if-none-match", etag)
            .body(Full::new(Bytes::new()))
            .unwrap();
        let (status, _) = send(&site, req).await;
        assert_eq!(status, StatusCode::NOT_MODIFIED);

        let req = Request::get("/app.js")
            .header("range", "bytes=0-6")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let (status, body) = send(&site, req).await;
        assert_eq!(status, StatusCode::PARTIAL_CONTENT);
        assert_eq!(&body[..], b"console");
    }

    #[test]
    fn test_format_version() {
        assert_eq!(format_version(hyper::Version::HTTP_11), "1.1");
        assert_eq!(format_version(hyper::Version::HTTP_10), "1.0");
    }
}
