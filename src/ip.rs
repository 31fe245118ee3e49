/// Client address extraction, used to key rate limits.
use actix_web::HttpRequest;
use std::net::IpAddr;

/// Extract the client IP address from an HTTP request.
///
/// Forwarding headers are client-controlled, so they are consulted only when
/// `security.trust_proxy_headers` is set. Otherwise the peer address is used.
pub fn extract_client_ip(req: &HttpRequest) -> Option<String> {
    extract_client_ip_with(req, crate::app_config::security().trust_proxy_headers)
}

/// With `trust_proxy` set, checks headers in order of preference:
/// 1. X-Forwarded-For (first IP in the list)
/// 2. X-Real-IP
/// 3. Remote peer address
pub fn extract_client_ip_with(req: &HttpRequest, trust_proxy: bool) -> Option<String> {
    if !trust_proxy {
        return req.peer_addr().map(|addr| addr.ip().to_string());
    }

    // Check X-Forwarded-For header (proxy chains)
    if let Some(xff) = req.headers().get("x-forwarded-for") {
        if let Ok(xff_str) = xff.to_str() {
            // Take the first IP in the chain (the original client)
            if let Some(first_ip) = xff_str.split(',').next() {
                let trimmed = first_ip.trim();
                if trimmed.parse::<IpAddr>().is_ok() {
                    return Some(trimmed.to_string());
                }
            }
        }
    }

    // Check X-Real-IP header (nginx, etc.)
    if let Some(xri) = req.headers().get("x-real-ip") {
        if let Ok(xri_str) = xri.to_str() {
            let trimmed = xri_str.trim();
            if trimmed.parse::<IpAddr>().is_ok() {
                return Some(trimmed.to_string());
            }
        }
    }

    req.peer_addr().map(|addr| addr.ip().to_string())
}

pub fn client_ip_or_unknown(req: &HttpRequest) -> String {
    extract_client_ip(req).unwrap_or_else(|| "unknown".to_string())
}
