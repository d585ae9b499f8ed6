//! Client IP detection.

use std::net::SocketAddr;

use crate::Request;

/// Header set by proxies with the chain of client addresses.
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Header set by proxies with the client address.
pub const REAL_IP_HEADER: &str = "x-real-ip";

/// Returns the client IP, if it can be determined.
///
/// Looks at the first `x-forwarded-for` entry, then `x-real-ip`, then the
/// peer address the server stored in the request extensions.
#[must_use]
pub fn resolve_client_ip(request: &Request) -> Option<String> {
    let header = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
    };

    header(FORWARDED_FOR_HEADER)
        .or_else(|| header(REAL_IP_HEADER))
        .map(str::to_string)
        .or_else(|| {
            request
                .extensions()
                .get::<SocketAddr>()
                .map(|addr| addr.ip().to_string())
        })
}
