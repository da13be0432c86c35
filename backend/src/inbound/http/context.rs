//! Request-context extraction for audit entries.

use actix_web::HttpRequest;
use actix_web::http::header;

use crate::domain::RequestContext;

fn header_value(req: &HttpRequest, name: impl header::AsHeaderName) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

/// Capture the caller's IP, user agent, and correlation id.
///
/// The first `X-Forwarded-For` hop wins over the raw peer address so entries
/// stay meaningful behind a reverse proxy.
pub fn request_context(req: &HttpRequest) -> RequestContext {
    let forwarded_ip = header_value(req, "x-forwarded-for")
        .and_then(|raw| raw.split(',').next().map(|hop| hop.trim().to_owned()))
        .filter(|hop| !hop.is_empty());
    let ip_address =
        forwarded_ip.or_else(|| req.peer_addr().map(|address| address.ip().to_string()));

    RequestContext {
        ip_address,
        user_agent: header_value(req, header::USER_AGENT),
        request_id: header_value(req, "x-request-id"),
    }
}
