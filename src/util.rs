//! Utility functions with platform-specific implementations.

use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};

/// Get a time-based seed value for marker tokens.
///
/// On native platforms, uses `SystemTime::now()`.
/// On WASM, uses `js_sys::Date::now()`.
#[cfg(not(target_arch = "wasm32"))]
pub fn time_seed_nanos() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(12345)
}

#[cfg(target_arch = "wasm32")]
pub fn time_seed_nanos() -> u64 {
    // js_sys::Date::now() returns milliseconds as f64
    (js_sys::Date::now() * 1_000_000.0) as u64
}

/// Get current time as seconds since Unix epoch.
#[cfg(not(target_arch = "wasm32"))]
pub fn time_now_secs() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(target_arch = "wasm32")]
pub fn time_now_secs() -> u64 {
    // js_sys::Date::now() returns milliseconds as f64
    (js_sys::Date::now() / 1000.0) as u64
}

/// Decode bytes to a string.
///
/// Tries UTF-8 first (BOM handled by encoding_rs), then the hint encoding,
/// then falls back to Windows-1252. Uses `Cow<str>` to avoid allocation when
/// the input is valid UTF-8.
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    // Fallback: Windows-1252 (superset of ISO-8859-1, common for legacy pages)
    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Resolve an `href` relative to the file that references it.
///
/// Returns `None` for anything that is not a local path (`http://…`,
/// protocol-relative `//host/…`, `data:`). Query strings and fragments are
/// dropped, and a leading `/` is resolved against the page's directory.
pub fn resolve_path(base: &Path, href: &str) -> Option<PathBuf> {
    if href.contains("://") || href.starts_with("//") || href.starts_with("data:") {
        return None;
    }
    let rel = href.split(['?', '#']).next().unwrap_or(href);
    if rel.is_empty() {
        return None;
    }

    let mut out = base.parent().map(Path::to_path_buf).unwrap_or_default();
    for component in Path::new(rel.trim_start_matches('/')).components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(c) => out.push(c),
            _ => {}
        }
    }
    Some(out)
}

fn utc(secs: u64) -> DateTime<Utc> {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_default()
}

/// `YYYY-MM-DD` (UTC) for a Unix timestamp.
pub fn iso_date(secs: u64) -> String {
    utc(secs).format("%Y-%m-%d").to_string()
}

/// `YYYY-MM-DDTHH:MM:SSZ` (UTC) for a Unix timestamp.
pub fn iso_timestamp(secs: u64) -> String {
    utc(secs).to_rfc3339_opts(SecondsFormat::Secs, true)
}

// ============================================================================
// Tests
// ============================================================================
