use axum::http::{header, HeaderMap};
use serde::Deserialize;

use crate::app::errors::ApiError;

pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Query string of `GET /products`. Only one filter is ever applied.
#[derive(Debug, Default, Deserialize)]
pub struct ListProductsQuery {
    pub name: Option<String>,
    pub category: Option<String>,
    pub available: Option<String>,
}

/// Reject write requests whose `Content-Type` is missing or not exactly JSON.
///
/// Runs before the body is looked at.
pub fn require_json(headers: &HeaderMap) -> Result<(), ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    if content_type != Some(JSON_MEDIA_TYPE) {
        return Err(ApiError::UnsupportedMediaType(format!(
            "Content-Type must be {JSON_MEDIA_TYPE}"
        )));
    }
    Ok(())
}

/// Parse a raw body into an untyped JSON record for entity deserialization.
pub fn parse_record(body: &[u8]) -> Result<serde_json::Value, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::MalformedBody(format!("Invalid JSON body: {e}")))
}

/// Absolute URL of a product resource, preferring the request's `Host`.
pub fn product_location(headers: &HeaderMap, public_base_url: &str, id: impl core::fmt::Display) -> String {
    match headers.get(header::HOST).and_then(|v| v.to_str().ok()) {
        Some(host) => format!("http://{host}/products/{id}"),
        None => format!("{public_base_url}/products/{id}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn require_json_accepts_exact_media_type_only() {
        let mut headers = HeaderMap::new();
        assert!(require_json(&headers).is_err());

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert!(matches!(require_json(&headers), Err(ApiError::UnsupportedMediaType(_))));

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert!(require_json(&headers).is_ok());
    }

    #[test]
    fn location_prefers_host_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(
            product_location(&headers, "http://localhost:8080", 3),
            "http://localhost:8080/products/3"
        );

        headers.insert(header::HOST, HeaderValue::from_static("shop.local:9000"));
        assert_eq!(
            product_location(&headers, "http://localhost:8080", 3),
            "http://shop.local:9000/products/3"
        );
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(parse_record(b"{not json"), Err(ApiError::MalformedBody(_))));
        assert!(parse_record(b"{\"name\": \"x\"}").is_ok());
    }
}
