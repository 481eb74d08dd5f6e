pub mod create_upload;
pub mod download;
pub mod file_info;

use axum::http::HeaderMap;
use std::net::IpAddr;

/// Best-effort client IP for forwarding to the bot check. Proxy headers are
/// validated as real addresses; absent or garbage headers yield `None` and
/// the bot check proceeds without an IP.
pub(crate) fn client_ip(headers: &HeaderMap) -> Option<String> {
    for header in ["cf-connecting-ip", "x-real-ip"] {
        if let Some(value) = headers.get(header).and_then(|v| v.to_str().ok()) {
            let trimmed = value.trim();
            if trimmed.parse::<IpAddr>().is_ok() {
                return Some(trimmed.to_string());
            }
        }
    }

    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|chain| {
            chain
                .split(',')
                .map(str::trim)
                .find(|ip| ip.parse::<IpAddr>().is_ok())
                .map(str::to_string)
        })
}
