//! Span builder helpers for mock server instrumentation.

/// Create a tracing span for one dispatched mock request.
///
/// Usage: `let span = mock_request_span!(request_id, method, path);`
///
/// Fields recorded later by the dispatch pipeline:
/// - `route`: `METHOD pattern` of the matched route definition
/// - `status`: the status code sent back to the client
#[macro_export]
macro_rules! mock_request_span {
    ($request_id:expr, $method:expr, $path:expr) => {
        tracing::info_span!(
            "mock_request",
            request_id = %$request_id,
            method = %$method,
            path = %$path,
            route = tracing::field::Empty,
            status = tracing::field::Empty,
        )
    };
}
