//! HTTP request metrics

use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::infrastructure::observability::record_http_request;

/// Record count and latency per method, route, and status
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let path = route_label(&request);
    let start = Instant::now();
    let method = request.method().clone();

    let response = next.run(request).await;

    record_http_request(
        method.as_str(),
        &path,
        response.status().as_u16(),
        start.elapsed(),
    );

    response
}

/// Matched route pattern when available, raw path otherwise
fn route_label(request: &Request<Body>) -> String {
    match request.extensions().get::<MatchedPath>() {
        Some(matched) => matched.as_str().to_string(),
        None => request.uri().path().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_label_without_match() {
        let request = Request::builder()
            .uri("/api/predict?debug=1")
            .body(Body::empty())
            .unwrap();

        assert_eq!(route_label(&request), "/api/predict");
    }
}
