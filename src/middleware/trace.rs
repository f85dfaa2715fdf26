//! Request span for `TraceLayer`.
//!
//! Only the method and path are recorded. Query strings and headers stay out
//! of the span, so bearer tokens and trusted identity headers never reach
//! the logs.

use axum::http::Request;
use tower_http::trace::MakeSpan;
use tracing::Span;

#[derive(Clone, Debug, Default)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        tracing::info_span!(
            "http",
            method = %request.method(),
            path = %request.uri().path(),
        )
    }
}
