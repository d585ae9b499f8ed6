//! Paths the identity layer never touches.
//!
//! Static assets and internal framework routes are excluded before the
//! route matcher runs.

/// Path prefixes of framework internals.
const EXCLUDED_PREFIXES: &[&str] = &["/_next/static/", "/_next/image", "/_next/data/"];

/// Well-known files.
const EXCLUDED_PATHS: &[&str] = &["/favicon.ico", "/robots.txt", "/sitemap.xml"];

/// File extensions of static assets.
const STATIC_EXTENSIONS: &[&str] = &[
    "avif", "bmp", "css", "eot", "gif", "ico", "jpeg", "jpg", "js", "map", "mjs", "mp3", "mp4",
    "otf", "pdf", "png", "svg", "ttf", "txt", "wasm", "wav", "webm", "webp", "woff", "woff2",
    "zip",
];

/// Returns `true` if the path skips identity resolution.
///
/// # Example
///
/// ```
/// use tessera_middleware::exclusion::is_excluded;
///
/// assert!(is_excluded("/_next/static/chunks/main.js"));
/// assert!(is_excluded("/images/logo.PNG"));
/// assert!(!is_excluded("/products/42"));
/// ```
#[must_use]
pub fn is_excluded(path: &str) -> bool {
    EXCLUDED_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
        || EXCLUDED_PATHS.contains(&path)
        || has_static_extension(path)
}

fn has_static_extension(path: &str) -> bool {
    let segment = path.rsplit('/').next().unwrap_or(path);

    segment
        .rsplit_once('.')
        .filter(|(stem, _)| !stem.is_empty())
        .is_some_and(|(_, extension)| {
            STATIC_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(extension))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framework_routes() {
        assert!(is_excluded("/_next/static/css/app.css"));
        assert!(is_excluded("/_next/image?url=%2Fhero.png&w=640"));
        assert!(is_excluded("/_next/data/build/index.json"));
        assert!(!is_excluded("/_next/other"));
    }

    #[test]
    fn test_well_known_files() {
        assert!(is_excluded("/favicon.ico"));
        assert!(is_excluded("/robots.txt"));
        assert!(is_excluded("/sitemap.xml"));
    }

    #[test]
    fn test_static_extensions() {
        assert!(is_excluded("/fonts/inter.woff2"));
        assert!(is_excluded("/docs/guide.PDF"));
        assert!(!is_excluded("/api/users.json"));
        assert!(!is_excluded("/v1.2/products"));
        assert!(!is_excluded("/.well-known"));
        assert!(!is_excluded("/"));
    }
}
