//! API client for Kartverket's `eiendom/v1` REST API.
//!
//! `ApiClient` wraps a shared `reqwest::Client` with the base URL, user agent
//! and coordinate system taken from [`Config`].

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::models::Feature;

use super::ApiError;

/// Value of the `omrade` flag: ask for area polygons instead of points.
const AREA_GEOMETRY: &str = "true";

/// Anything that can turn a normalized matrikkel identifier into features.
///
/// The enrichment pipeline only talks to this trait, so tests can substitute
/// a recording double for the network.
#[async_trait]
pub trait GeometrySource: Send + Sync {
    /// Look up every feature the remote side has for `matrikkel_id`.
    async fn lookup(&self, matrikkel_id: &str) -> Result<Vec<Feature>, ApiError>;
}

#[derive(Debug, Deserialize)]
struct GeokodingResponse {
    #[serde(default)]
    features: Option<Vec<Feature>>,
}

/// Raw upstream answer for a point lookup, passed through by the proxy route.
#[derive(Debug, Clone)]
pub struct PointLookup {
    pub status: u16,
    pub body: String,
}

/// Kartverket API client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    coordinate_system: u32,
}

impl ApiClient {
    /// Create a new API client from configuration
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_str(&config.user_agent)
                .map_err(|e| ApiError::InvalidConfig(format!("user agent: {}", e)))?,
        );

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            coordinate_system: config.coordinate_system,
        })
    }

    /// Fetch area features for one normalized matrikkel identifier.
    pub async fn geokoding(&self, matrikkel_id: &str) -> Result<Vec<Feature>, ApiError> {
        let url = format!("{}/geokoding", self.base_url);
        let crs = self.coordinate_system.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("matrikkelnummer", matrikkel_id),
                ("utkoordsys", crs.as_str()),
                ("omrade", AREA_GEOMETRY),
            ])
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let text = response.text().await?;
        let parsed: GeokodingResponse = serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("geokoding for {}: {}", matrikkel_id, e)))?;

        let features = parsed.features.unwrap_or_default();
        debug!(matrikkel_id, count = features.len(), "Geokoding response received");
        Ok(features)
    }

    /// Look up the property areas covering a point. The upstream status and
    /// body are returned as-is, whatever the status.
    pub async fn point_areas(&self, lat: &str, lon: &str) -> Result<PointLookup, ApiError> {
        let url = format!("{}/punkt/omrader", self.base_url);
        let crs = self.coordinate_system.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[("ost", lon), ("nord", lat), ("koordsys", crs.as_str())])
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(lat, lon, status, "Point lookup response received");
        Ok(PointLookup { status, body })
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }
}

#[async_trait]
impl GeometrySource for ApiClient {
    async fn lookup(&self, matrikkel_id: &str) -> Result<Vec<Feature>, ApiError> {
        self.geokoding(matrikkel_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_geokoding_response() {
        let json = r#"{"type": "FeatureCollection", "features": [{"type": "Feature", "geometry": {"type": "Polygon", "coordinates": [[[10.1, 59.1], [10.2, 59.1], [10.2, 59.2], [10.1, 59.1]]]}, "properties": {"matrikkelnummertekst": "123/2", "kommunenummer": "3236"}}]}"#;

        let resp: GeokodingResponse = serde_json::from_str(json)
            .expect("Failed to parse geokoding test JSON");
        let features = resp.features.unwrap_or_default();
        assert_eq!(features.len(), 1);
        assert_eq!(
            features[0].property("kommunenummer").and_then(|v| v.as_str()),
            Some("3236")
        );
    }

    #[test]
    fn test_parse_geokoding_without_features() {
        let resp: GeokodingResponse = serde_json::from_str(r#"{"features": null}"#).unwrap();
        assert!(resp.features.unwrap_or_default().is_empty());

        let resp: GeokodingResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(resp.features.is_none());
    }

    #[test]
    fn test_new_trims_base_url() {
        let config = Config {
            api_base_url: "https://example.test/eiendom/v1/".to_string(),
            ..Config::default()
        };
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(client.base_url, "https://example.test/eiendom/v1");
    }

    #[test]
    fn test_new_rejects_invalid_user_agent() {
        let config = Config {
            user_agent: "MapperApp\n1.0".to_string(),
            ..Config::default()
        };
        assert!(matches!(ApiClient::new(&config), Err(ApiError::InvalidConfig(_))));
    }
}
