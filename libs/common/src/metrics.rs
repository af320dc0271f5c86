//! HTTP request metrics
//!
//! [`HttpMetrics`] owns its own Prometheus registry so each service builds
//! one at startup and hands it to the router; nothing is registered globally.

use axum::{
    extract::{MatchedPath, Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::Instant;
use tracing::error;

/// Label used for requests that did not match any route
const UNMATCHED_PATH: &str = "unmatched";

/// Request counters and latency histogram for one service
#[derive(Clone)]
pub struct HttpMetrics {
    registry: Registry,
    total_requests: IntCounterVec,
    response_status: IntCounterVec,
    http_duration: HistogramVec,
}

impl HttpMetrics {
    /// Create the collectors and register them in a fresh registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let total_requests = IntCounterVec::new(
            Opts::new("http_requests_total", "Number of requests by route."),
            &["path"],
        )?;
        let response_status = IntCounterVec::new(
            Opts::new("response_status", "Status of HTTP responses."),
            &["status"],
        )?;
        let http_duration = HistogramVec::new(
            HistogramOpts::new(
                "http_response_time_seconds",
                "Duration of HTTP requests in seconds.",
            ),
            &["path"],
        )?;

        registry.register(Box::new(total_requests.clone()))?;
        registry.register(Box::new(response_status.clone()))?;
        registry.register(Box::new(http_duration.clone()))?;

        Ok(Self {
            registry,
            total_requests,
            response_status,
            http_duration,
        })
    }

    /// Record one finished request
    pub fn observe(&self, path: &str, status: StatusCode, seconds: f64) {
        self.total_requests.with_label_values(&[path]).inc();
        self.response_status
            .with_label_values(&[status.as_str()])
            .inc();
        self.http_duration
            .with_label_values(&[path])
            .observe(seconds);
    }

    /// Render every collector in the Prometheus text exposition format
    pub fn render(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Middleware recording route, status and latency of every request
///
/// The route template (`/api/v1/users/:id`) is used as label rather than the
/// raw URI to keep label cardinality bounded.
pub async fn track_metrics(
    State(metrics): State<HttpMetrics>,
    req: Request,
    next: Next,
) -> Response {
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_PATH.to_owned());

    let start = Instant::now();
    let response = next.run(req).await;
    metrics.observe(&path, response.status(), start.elapsed().as_secs_f64());

    response
}

/// `GET /metrics` endpoint
pub async fn metrics_handler(State(metrics): State<HttpMetrics>) -> Response {
    match metrics.render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, TextEncoder::new().format_type().to_owned())],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, middleware, routing::get};
    use tower::ServiceExt;

    #[test]
    fn test_observe_is_rendered() {
        let metrics = HttpMetrics::new().unwrap();
        metrics.observe("/ping", StatusCode::OK, 0.01);
        metrics.observe("/ping", StatusCode::OK, 0.02);

        let rendered = metrics.render().unwrap();
        assert!(rendered.contains(r#"http_requests_total{path="/ping"} 2"#));
        assert!(rendered.contains(r#"response_status{status="200"} 2"#));
        assert!(rendered.contains("http_response_time_seconds_bucket"));
    }

    #[test]
    fn test_registries_are_independent() {
        let first = HttpMetrics::new().unwrap();
        let second = HttpMetrics::new().unwrap();
        first.observe("/a", StatusCode::OK, 0.0);

        assert!(!second.render().unwrap().contains(r#"path="/a""#));
    }

    #[tokio::test]
    async fn test_middleware_labels_by_route_template() {
        let metrics = HttpMetrics::new().unwrap();
        let app = Router::new()
            .route("/users/:id", get(|| async { "ok" }))
            .route("/metrics", get(metrics_handler))
            .layer(middleware::from_fn_with_state(metrics.clone(), track_metrics))
            .with_state(metrics.clone());

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/users/42").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::builder().uri("/nowhere").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let rendered = metrics.render().unwrap();
        assert!(rendered.contains(r#"http_requests_total{path="/users/:id"} 1"#));
        assert!(rendered.contains(r#"response_status{status="404"} 1"#));
    }
}
