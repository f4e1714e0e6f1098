//! Request dispatch engine.
//!
//! Each incoming request goes through the same pipeline:
//!
//! 1. Resolve the route: linear scan in declaration order, first match wins
//! 2. Authorize: header presence check when the route requires it
//! 3. Build the canned response with `Content-Type: application/json` forced
//!
//! The route table is immutable after construction and shared by every
//! request, so dispatching needs no locking and carries no state between
//! calls.

use std::sync::Arc;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request, StatusCode};
use bytes::Bytes;

use crate::config::RouteDefinition;

/// The view of an HTTP request the engine needs.
pub trait IncomingRequest {
    /// Request method exactly as received.
    fn method(&self) -> &str;

    /// Request path without the query string.
    fn path(&self) -> &str;

    /// Raw value of the named header, if present.
    fn header(&self, name: &str) -> Option<&[u8]>;
}

impl<B> IncomingRequest for Request<B> {
    fn method(&self) -> &str {
        Request::method(self).as_str()
    }

    fn path(&self) -> &str {
        self.uri().path()
    }

    fn header(&self, name: &str) -> Option<&[u8]> {
        self.headers().get(name).map(HeaderValue::as_bytes)
    }
}

/// A fully built canned response.
#[derive(Debug, Clone, PartialEq)]
pub struct MockResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// `None` when the route configures no body or the body failed to
    /// serialize.
    pub body: Option<Bytes>,
}

/// Result of dispatching one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Respond(MockResponse),
    NotFound,
    Unauthorized,
}

/// Matches requests against the configured routes.
#[derive(Debug, Clone)]
pub struct DispatchEngine {
    routes: Arc<[RouteDefinition]>,
}

impl DispatchEngine {
    pub fn new(routes: Vec<RouteDefinition>) -> Self {
        Self {
            routes: routes.into(),
        }
    }

    pub fn routes(&self) -> &[RouteDefinition] {
        &self.routes
    }

    /// Find the first route whose method and path pattern match.
    pub fn find_route(&self, method: &str, path: &str) -> Option<&RouteDefinition> {
        self.routes
            .iter()
            .find(|route| route.method.as_str() == method && path_matches(&route.path, path))
    }

    /// Run the match → authorize → respond pipeline for one request.
    pub fn dispatch(&self, request: &impl IncomingRequest) -> Outcome {
        let Some(route) = self.find_route(request.method(), request.path()) else {
            tracing::info!("No route matched");
            return Outcome::NotFound;
        };

        tracing::Span::current().record(
            "route",
            format!("{} {}", route.method, route.path).as_str(),
        );
        tracing::info!(
            route_method = %route.method,
            route_path = %route.path,
            "Matched route"
        );

        if route.requires_auth {
            let present = request
                .header(&route.auth_header)
                .is_some_and(|value| !value.is_empty());
            if !present {
                tracing::warn!(
                    auth_header = %route.auth_header,
                    "Auth failed: missing header"
                );
                return Outcome::Unauthorized;
            }
            tracing::info!(auth_header = %route.auth_header, "Auth header present");
        }

        Outcome::Respond(build_response(route))
    }
}

fn build_response(route: &RouteDefinition) -> MockResponse {
    let mut headers = HeaderMap::new();
    for (name, value) in &route.response.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::warn!(header = %name, "Skipping invalid response header"),
        }
    }
    // Configured content types are always overridden.
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let status =
        StatusCode::from_u16(route.response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let body = route
        .response
        .body
        .as_ref()
        .and_then(|value| match serde_json::to_vec(value) {
            Ok(mut bytes) => {
                bytes.push(b'\n');
                Some(Bytes::from(bytes))
            }
            Err(e) => {
                tracing::error!(error = %e, "Error encoding response body");
                None
            }
        });

    MockResponse {
        status,
        headers,
        body,
    }
}

/// Check whether a request path matches a route pattern.
///
/// Pattern segments of the form `{name}` match any single non-empty path
/// segment. One leading and one trailing `/` are ignored on both sides.
/// Consecutive slashes yield empty segments, which only an empty literal
/// segment matches.
pub fn path_matches(pattern: &str, path: &str) -> bool {
    if pattern == path {
        return true;
    }

    if !pattern.contains('{') {
        return false;
    }

    let pattern_segments: Vec<&str> = trim_slashes(pattern).split('/').collect();
    let path_segments: Vec<&str> = trim_slashes(path).split('/').collect();

    if pattern_segments.len() != path_segments.len() {
        return false;
    }

    pattern_segments
        .iter()
        .zip(&path_segments)
        .all(|(expected, actual)| {
            if is_param_segment(expected) {
                !actual.is_empty()
            } else {
                expected == actual
            }
        })
}

fn trim_slashes(s: &str) -> &str {
    let s = s.strip_prefix('/').unwrap_or(s);
    s.strip_suffix('/').unwrap_or(s)
}

fn is_param_segment(segment: &str) -> bool {
    segment.starts_with('{') && segment.ends_with('}')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn route(value: serde_json::Value) -> RouteDefinition {
        serde_json::from_value(value).unwrap()
    }

    fn get(path: &str) -> Request<()> {
        Request::builder().method("GET").uri(path).body(()).unwrap()
    }

    fn engine() -> DispatchEngine {
        DispatchEngine::new(vec![
            route(json!({
                "path": "/api/users",
                "method": "GET",
                "response": {
                    "status": 200,
                    "headers": { "X-Total-Count": "2", "Content-Type": "text/plain" },
                    "body": [{ "id": 1 }, { "id": 2 }]
                }
            })),
            route(json!({
                "path": "/api/users",
                "method": "POST",
                "requiresAuth": true,
                "authHeader": "Authorization",
                "response": { "status": 201, "body": { "created": true } }
            })),
            route(json!({
                "path": "/api/products/{id}",
                "method": "GET",
                "response": { "status": 200, "body": { "name": "Widget" } }
            })),
            route(json!({
                "path": "/api/orders/{orderId}/items/{itemId}",
                "method": "GET",
                "response": { "status": 200, "body": { "qty": 3 } }
            })),
            route(json!({
                "path": "/api/nothing",
                "method": "GET",
                "response": { "status": 200, "body": null }
            })),
            route(json!({
                "path": "/api/items/1",
                "method": "DELETE",
                "response": { "status": 204 }
            })),
        ])
    }

    fn respond(outcome: Outcome) -> MockResponse {
        match outcome {
            Outcome::Respond(response) => response,
            other => panic!("expected a response, got {other:?}"),
        }
    }

    #[test]
    fn test_exact_static_match() {
        assert!(path_matches("/api/users", "/api/users"));
        assert!(!path_matches("/api/users", "/api/user"));
        assert!(!path_matches("/api/users", "/api/users/"));
    }

    #[test]
    fn test_param_segment_matching() {
        assert!(path_matches("/api/products/{id}", "/api/products/101"));
        assert!(path_matches("/api/products/{id}", "/api/products/abc"));
        assert!(!path_matches("/api/products/{id}", "/api/products"));
        assert!(!path_matches("/api/products/{id}", "/api/products/101/extra"));
        assert!(!path_matches("/api/products/{id}", "/api/orders/101"));
    }

    #[test]
    fn test_multi_param_matching() {
        let pattern = "/api/orders/{orderId}/items/{itemId}";
        assert!(path_matches(pattern, "/api/orders/12345/items/67890"));
        assert!(path_matches(pattern, "/api/orders/ANY/items/ANY"));
        assert!(!path_matches(pattern, "/api/orders/12345/lines/67890"));
    }

    #[test]
    fn test_trailing_slash_equivalence() {
        assert!(path_matches("/api/products/{id}", "/api/products/101/"));
        assert!(path_matches("/api/products/{id}/", "/api/products/101"));
        assert!(path_matches("api/products/{id}", "/api/products/101"));
    }

    #[test]
    fn test_empty_paths() {
        assert!(path_matches("/", "/"));
        assert!(!path_matches("/", ""));
        assert!(!path_matches("/{id}", "/"));
        assert!(!path_matches("/{id}", ""));
        assert!(path_matches("/{id}", "/x"));
    }

    #[test]
    fn test_empty_segment_never_matches_param() {
        assert!(!path_matches("/api/{id}/foo", "/api//foo"));
        assert!(path_matches("/api//{id}", "/api//foo"));
        assert!(!path_matches("/api/{a}/{b}", "/api/x//"));
    }

    #[test]
    fn test_only_one_slash_trimmed() {
        assert!(!path_matches("/a/{id}", "/a/b//"));
        assert!(!path_matches("/{id}", "//a"));
    }

    #[test]
    fn test_partial_braces_are_literal() {
        assert!(!path_matches("/a/{id", "/a/1"));
        assert!(path_matches("/a/{id", "/a/{id"));
        assert!(!path_matches("/a/x{id}", "/a/x1"));
        assert!(path_matches("/a/{id}x/{b}", "/a/{id}x/1"));
    }

    #[test]
    fn test_static_route_response() {
        let response = respond(engine().dispatch(&get("/api/users")));

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.headers["x-total-count"], "2");
        assert_eq!(response.headers[CONTENT_TYPE], "application/json");
        assert_eq!(response.headers.get_all(CONTENT_TYPE).iter().count(), 1);
        assert_eq!(
            response.body.as_deref(),
            Some(&b"[{\"id\":1},{\"id\":2}]\n"[..])
        );
    }

    #[test]
    fn test_unmatched_request_is_not_found() {
        let engine = engine();

        assert_eq!(engine.dispatch(&get("/api/missing")), Outcome::NotFound);

        let wrong_method = Request::builder()
            .method("PUT")
            .uri("/api/users")
            .header("Authorization", "Bearer x")
            .body(())
            .unwrap();
        assert_eq!(engine.dispatch(&wrong_method), Outcome::NotFound);
    }

    #[test]
    fn test_method_compared_case_sensitively() {
        let lowercase = Request::builder()
            .method("get")
            .uri("/api/users")
            .body(())
            .unwrap();
        assert_eq!(engine().dispatch(&lowercase), Outcome::NotFound);
    }

    #[test]
    fn test_auth_required() {
        let engine = engine();
        let post = |auth: Option<&str>| {
            let mut builder = Request::builder().method("POST").uri("/api/users");
            if let Some(value) = auth {
                builder = builder.header("authorization", value);
            }
            builder.body(()).unwrap()
        };

        assert_eq!(engine.dispatch(&post(None)), Outcome::Unauthorized);
        assert_eq!(engine.dispatch(&post(Some(""))), Outcome::Unauthorized);

        let ok = respond(engine.dispatch(&post(Some("anything at all"))));
        assert_eq!(ok.status, StatusCode::CREATED);
        assert_eq!(ok.body.as_deref(), Some(&b"{\"created\":true}\n"[..]));

        let other = respond(engine.dispatch(&post(Some("Bearer valid-looking"))));
        assert_eq!(ok, other);
    }

    #[test]
    fn test_param_routes_dispatch() {
        let engine = engine();

        for path in ["/api/products/101", "/api/products/abc", "/api/products/101/"] {
            let response = respond(engine.dispatch(&get(path)));
            assert_eq!(response.body.as_deref(), Some(&b"{\"name\":\"Widget\"}\n"[..]));
        }
        assert_eq!(engine.dispatch(&get("/api/products")), Outcome::NotFound);
        assert_eq!(
            engine.dispatch(&get("/api/products/101/extra")),
            Outcome::NotFound
        );

        let a = engine.dispatch(&get("/api/orders/12345/items/67890"));
        let b = engine.dispatch(&get("/api/orders/ANY/items/ANY"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_first_match_wins() {
        let engine = DispatchEngine::new(vec![
            route(json!({
                "path": "/api/users/{id}",
                "method": "GET",
                "response": { "status": 200, "body": { "kind": "user" } }
            })),
            route(json!({
                "path": "/api/users/admin",
                "method": "GET",
                "response": { "status": 200, "body": { "kind": "admin" } }
            })),
        ]);

        let matched = engine.find_route("GET", "/api/users/admin").unwrap();
        assert_eq!(matched.path, "/api/users/{id}");

        let response = respond(engine.dispatch(&get("/api/users/admin")));
        assert_eq!(response.body.as_deref(), Some(&b"{\"kind\":\"user\"}\n"[..]));
    }

    #[test]
    fn test_null_body_vs_absent_body() {
        let engine = engine();

        let null_body = respond(engine.dispatch(&get("/api/nothing")));
        assert_eq!(null_body.body.as_deref(), Some(&b"null\n"[..]));

        let delete = Request::builder()
            .method("DELETE")
            .uri("/api/items/1")
            .body(())
            .unwrap();
        let no_body = respond(engine.dispatch(&delete));
        assert_eq!(no_body.status, StatusCode::NO_CONTENT);
        assert_eq!(no_body.body, None);
        assert_eq!(no_body.headers[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_dispatch_is_idempotent() {
        let engine = engine();
        let first = engine.dispatch(&get("/api/users"));
        for _ in 0..10 {
            assert_eq!(engine.dispatch(&get("/api/users")), first);
        }
    }

    #[test]
    fn test_empty_table_matches_nothing() {
        let engine = DispatchEngine::new(Vec::new());
        assert_eq!(engine.dispatch(&get("/")), Outcome::NotFound);
        assert!(engine.routes().is_empty());
    }
}
