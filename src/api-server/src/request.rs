//! Builds the transport-neutral [`RequestContext`] from an HTTP request

use authx_core::RequestContext;
use axum::http::{header, request::Parts};
use cookie::Cookie;
use tracing::trace;

/// Collect method, path, path parameters, headers and cookies.
///
/// Non-UTF-8 header values and malformed cookies are skipped.
pub fn request_context<'a, I>(parts: &Parts, params: I) -> RequestContext
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut ctx = RequestContext::new(parts.method.as_str(), parts.uri.path());

    for (name, value) in params {
        ctx.params.insert(name.to_string(), value.to_string());
    }

    for (name, value) in &parts.headers {
        if let Ok(value) = value.to_str() {
            ctx.append_header(name.as_str(), value.to_string());
        }
    }

    for value in parts.headers.get_all(header::COOKIE) {
        let Ok(value) = value.to_str() else { continue };
        for cookie in Cookie::split_parse_encoded(value) {
            match cookie {
                Ok(cookie) => {
                    ctx.cookies
                        .insert(cookie.name().to_string(), cookie.value().to_string());
                }
                Err(e) => trace!(error = %e, "Skipping malformed cookie"),
            }
        }
    }

    ctx
}
