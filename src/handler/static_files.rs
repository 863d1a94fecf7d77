//! Static file serving module
//!
//! Maps request paths onto the static root, resolves directory index files
//! (or lists directories that have none) and builds cached / ranged responses.

use crate::config::StaticConfig;
use crate::handler::router::RequestContext;
use crate::http::{self, cache, mime, ByteRange, HttpResponse};
use crate::logger;
use hyper::body::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Where a request path landed under the static root
#[derive(Debug, PartialEq, Eq)]
pub enum Resolved {
    File(PathBuf),
    /// Directory with no index file, served as a listing
    Directory(PathBuf),
    /// Directory requested without its trailing slash
    DirectoryRedirect(String),
    NotFound,
}

/// Serve a GET/HEAD request from the static root
pub async fn serve_static(ctx: &RequestContext<'_>, cfg: &StaticConfig) -> HttpResponse {
    match resolve_path(&cfg.root, ctx.path, &cfg.index_files).await {
        Resolved::File(path) => serve_file(ctx, &path).await,
        Resolved::Directory(path) => serve_listing(ctx, &path).await,
        Resolved::DirectoryRedirect(location) => {
            let location = match ctx.query {
                Some(q) => format!("{location}?{q}"),
                None => location,
            };
            http::build_301_response(&location)
        }
        Resolved::NotFound => http::build_404_response(),
    }
}

/// Resolve a URL path to a file under `root`
///
/// The path is percent-decoded; `..` segments and symlinks leaving the root
/// resolve to [`Resolved::NotFound`].
pub async fn resolve_path(root: &Path, url_path: &str, index_files: &[String]) -> Resolved {
    let Ok(decoded) = urlencoding::decode(url_path) else {
        return Resolved::NotFound;
    };

    let mut candidate = root.to_path_buf();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                logger::log_warning(&format!("Path traversal attempt blocked: {url_path}"));
                return Resolved::NotFound;
            }
            s if s.contains('\0') || s.contains('\\') => return Resolved::NotFound,
            s => candidate.push(s),
        }
    }

    let Ok(meta) = fs::metadata(&candidate).await else {
        return Resolved::NotFound;
    };

    let mut listing = false;
    if meta.is_dir() {
        if !url_path.ends_with('/') {
            return Resolved::DirectoryRedirect(format!("{url_path}/"));
        }
        let mut index = None;
        for name in index_files {
            let path = candidate.join(name);
            if fs::metadata(&path).await.is_ok_and(|m| m.is_file()) {
                index = Some(path);
                break;
            }
        }
        match index {
            Some(path) => candidate = path,
            None => listing = true,
        }
    }

    let root_canonical = match fs::canonicalize(root).await {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Static directory not found or inaccessible '{}': {e}",
                root.display()
            ));
            return Resolved::NotFound;
        }
    };
    let Ok(file_canonical) = fs::canonicalize(&candidate).await else {
        return Resolved::NotFound;
    };
    if !file_canonical.starts_with(&root_canonical) {
        logger::log_warning(&format!(
            "Path escapes static root: {url_path} -> {}",
            file_canonical.display()
        ));
        return Resolved::NotFound;
    }

    if listing {
        Resolved::Directory(candidate)
    } else {
        Resolved::File(candidate)
    }
}

async fn serve_file(ctx: &RequestContext<'_>, path: &Path) -> HttpResponse {
    let content = match fs::read(path).await {
        Ok(c) => Bytes::from(c),
        Err(e) => {
            logger::log_error(&format!("Failed to read file '{}': {e}", path.display()));
            return http::build_404_response();
        }
    };

    let content_type = mime::content_type_for(path);
    let etag = cache::generate_etag(&content);
    if cache::check_etag_match(ctx.if_none_match, &etag) {
        return http::build_304_response(&etag);
    }

    let total_size = content.len();
    match http::parse_range_header(ctx.range_header, total_size) {
        ByteRange::Partial(range) => {
            let (start, end) = (*range.start(), *range.end());
            http::response::build_partial_response(
                content.slice(range),
                content_type,
                &etag,
                (start, end),
                total_size,
                ctx.is_head,
            )
        }
        ByteRange::NotSatisfiable => http::build_416_response(total_size),
        ByteRange::Full => {
            http::response::build_file_response(content, content_type, &etag, ctx.is_head)
        }
    }
}

struct ListingEntry {
    name: String,
    is_dir: bool,
    is_symlink: bool,
}

async fn serve_listing(ctx: &RequestContext<'_>, dir: &Path) -> HttpResponse {
    let entries = match read_listing(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            logger::log_warning(&format!("Cannot list directory '{}': {e}", dir.display()));
            return http::build_404_response();
        }
    };

    let display_path = urlencoding::decode(ctx.path)
        .map_or_else(|_| ctx.path.to_string(), |p| p.into_owned());
    let html = render_listing(&display_path, &entries);
    http::response::build_html_response(html, ctx.is_head)
}

/// Entries sorted case-insensitively; symlinks are followed for `is_dir`
async fn read_listing(dir: &Path) -> std::io::Result<Vec<ListingEntry>> {
    let mut reader = fs::read_dir(dir).await?;
    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        let is_symlink = entry.file_type().await?.is_symlink();
        let is_dir = fs::metadata(entry.path()).await.is_ok_and(|m| m.is_dir());
        entries.push(ListingEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir,
            is_symlink,
        });
    }
    entries.sort_by_key(|e| e.name.to_lowercase());
    Ok(entries)
}

fn render_listing(display_path: &str, entries: &[ListingEntry]) -> String {
    let title = format!("Directory listing for {}", escape_html(display_path));
    let mut html = format!(
        "<!DOCTYPE HTML>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n<hr>\n<ul>\n"
    );

    for entry in entries {
        let slash = if entry.is_dir { "/" } else { "" };
        let href = format!("{}{slash}", urlencoding::encode(&entry.name));
        let label = if entry.is_symlink {
            format!("{}@", entry.name)
        } else {
            format!("{}{slash}", entry.name)
        };
        html.push_str(&format!("<li><a href=\"{href}\">{}</a></li>\n", escape_html(&label)));
    }

    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    html
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_files() -> Vec<String> {
        vec!["index.html".to_string(), "index.htm".to_string()]
    }

    fn site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs").join("index.htm"), "docs").unwrap();
        std::fs::create_dir(dir.path().join("empty")).unwrap();
        std::fs::write(dir.path().join("my file.txt"), "spaced").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_root_resolves_index() {
        let dir = site();
        let resolved = resolve_path(dir.path(), "/", &index_files()).await;
        assert_eq!(resolved, Resolved::File(dir.path().join("index.html")));
    }

    #[tokio::test]
    async fn test_second_index_name_is_tried() {
        let dir = site();
        let resolved = resolve_path(dir.path(), "/docs/", &index_files()).await;
        assert_eq!(resolved, Resolved::File(dir.path().join("docs").join("index.htm")));
    }

    #[tokio::test]
    async fn test_directory_without_slash_redirects() {
        let dir = site();
        let resolved = resolve_path(dir.path(), "/docs", &index_files()).await;
        assert_eq!(resolved, Resolved::DirectoryRedirect("/docs/".to_string()));
    }

    #[tokio::test]
    async fn test_directory_without_index_is_listed() {
        let dir = site();
        let resolved = resolve_path(dir.path(), "/empty/", &index_files()).await;
        assert_eq!(resolved, Resolved::Directory(dir.path().join("empty")));
    }

    #[tokio::test]
    async fn test_listing_sorts_and_marks_entries() {
        let dir = site();
        std::fs::create_dir(dir.path().join("empty").join("Zeta")).unwrap();
        std::fs::write(dir.path().join("empty").join("alpha & beta.txt"), "").unwrap();

        let entries = read_listing(&dir.path().join("empty")).await.unwrap();
        let html = render_listing("/empty/", &entries);

        let alpha = html.find("alpha%20%26%20beta.txt").unwrap();
        let zeta = html.find(r#"<a href="Zeta/">Zeta/</a>"#).unwrap();
        assert!(alpha < zeta);
        assert!(html.contains(">alpha &amp; beta.txt</a>"));
        assert!(html.contains("<h1>Directory listing for /empty/</h1>"));
    }

    #[test]
    fn test_empty_listing() {
        let html = render_listing("/a<b>/", &[]);
        assert!(html.contains("<title>Directory listing for /a&lt;b&gt;/</title>"));
        assert!(html.contains("<ul>\n</ul>"));
    }

    #[tokio::test]
    async fn test_percent_encoded_path() {
        let dir = site();
        let resolved = resolve_path(dir.path(), "/my%20file.txt", &index_files()).await;
        assert_eq!(resolved, Resolved::File(dir.path().join("my file.txt")));
    }

    #[tokio::test]
    async fn test_traversal_and_missing_are_not_found() {
        let dir = site();
        for path in ["/../etc/passwd", "/%2e%2e/secret", "/missing.html"] {
            assert_eq!(resolve_path(dir.path(), path, &index_files()).await, Resolved::NotFound);
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_out_of_root_is_not_found() {
        let outside = tempfile::tempdir().unwrap();
        std::fs::write(outside.path().join("secret.txt"), "x").unwrap();
        let dir = site();
        std::os::unix::fs::symlink(outside.path().join("secret.txt"), dir.path().join("link.txt"))
            .unwrap();

        let resolved = resolve_path(dir.path(), "/link.txt", &index_files()).await;
        assert_eq!(resolved, Resolved::NotFound);
    }
}
