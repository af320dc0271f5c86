//! CORS policy shared by the services

use axum::http::{HeaderValue, Method, header::InvalidHeaderValue};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

/// Parse a comma separated origin list, ignoring empty entries
pub fn parse_origins(raw: &str) -> Result<Vec<HeaderValue>, InvalidHeaderValue> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(HeaderValue::from_str)
        .collect()
}

/// CORS with credentials; an empty list mirrors the request origin
pub fn cors_layer(origins: &[HeaderValue]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(origins.iter().cloned())
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{Request, header},
        routing::get,
    };
    use tower::ServiceExt;

    #[test]
    fn test_parse_origins() {
        let origins = parse_origins(" http://localhost:5173, ,https://speedrun.example").unwrap();
        assert_eq!(origins, vec!["http://localhost:5173", "https://speedrun.example"]);
        assert!(parse_origins("").unwrap().is_empty());
        assert!(parse_origins("bad\norigin").is_err());
    }

    async fn allowed_origin(origins: &[HeaderValue], origin: &str) -> Option<HeaderValue> {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(cors_layer(origins));
        let response = app
            .oneshot(
                Request::get("/")
                    .header(header::ORIGIN, origin)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .cloned()
    }

    #[tokio::test]
    async fn test_mirrors_origin_by_default() {
        assert_eq!(
            allowed_origin(&[], "http://anywhere.test").await.unwrap(),
            "http://anywhere.test"
        );
    }

    #[tokio::test]
    async fn test_list_restricts_origins() {
        let origins = parse_origins("http://allowed.test").unwrap();
        assert!(allowed_origin(&origins, "http://allowed.test").await.is_some());
        assert!(allowed_origin(&origins, "http://other.test").await.is_none());
    }
}
