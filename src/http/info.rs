//! Informational page served when no target URL is given.

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;

use crate::config::RelayConfig;
use crate::http::request::CallerInfo;
use crate::security::HeaderOverlay;

/// Everything the page shows about the current caller.
#[derive(Debug, Clone, Default)]
pub struct InfoContext {
    /// `scheme://host` the relay was reached at.
    pub own_origin: String,
    pub origin: Option<String>,
    pub caller: CallerInfo,
    pub overlay: Option<HeaderOverlay>,
}

/// Render the page text.
pub fn render(config: &RelayConfig, ctx: &InfoContext) -> String {
    let mut page = String::new();
    page.push_str(&config.info.banner);
    page.push_str("\n\n");
    page.push_str(&format!("Source:\n{}\n\n", config.info.source_url));
    page.push_str(&format!("Usage:\n{}/?uri\n\n", ctx.own_origin));

    let mut limits = config.limits.advertised.iter();
    if let Some(first) = limits.next() {
        page.push_str(&format!("Limits: {}\n", first));
        for line in limits {
            page.push_str(&format!("        {}\n", line));
        }
        page.push('\n');
    }

    if let Some(origin) = &ctx.origin {
        page.push_str(&format!("Origin: {}\n", origin));
    }
    page.push_str(&format!(
        "IP: {}\n",
        ctx.caller.ip.as_deref().unwrap_or("unknown")
    ));
    if let Some(country) = &ctx.caller.country {
        page.push_str(&format!("Country: {}\n", country));
    }
    if let Some(colo) = &ctx.caller.datacenter {
        page.push_str(&format!("Datacenter: {}\n", colo));
    }
    page.push('\n');

    if let Some(overlay) = &ctx.overlay {
        page.push_str(&format!("x-cors-headers: {}\n", overlay.to_json()));
    }

    page
}

/// Build the 200 response. CORS headers are added by the caller.
pub fn info_response(config: &RelayConfig, ctx: &InfoContext) -> Response {
    let mut response = Response::new(Body::from(render(config, ctx)));
    *response.status_mut() = StatusCode::OK;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
