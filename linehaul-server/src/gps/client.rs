//! GPS provider HTTP client.
//!
//! Fetches live arrival estimates for power units from the fleet telematics
//! provider. Units the provider does not track answer 404, which is reported
//! as no estimate rather than an error.

use std::time::Duration;

use chrono::NaiveDateTime;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;

use crate::domain::{TerminalCode, UnitNumber, parse_timestamp};

use super::error::GpsError;

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration for the GPS client.
#[derive(Debug, Clone)]
pub struct GpsConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl GpsConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// A live arrival estimate for one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct GpsEta {
    pub unit: UnitNumber,
    pub destination: TerminalCode,
    pub eta: NaiveDateTime,
    pub miles_remaining: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EtaResponse {
    eta: String,
    #[serde(default)]
    miles_remaining: Option<f64>,
}

/// GPS provider client.
#[derive(Debug, Clone)]
pub struct GpsClient {
    http: reqwest::Client,
    base_url: String,
}

impl GpsClient {
    pub fn new(config: GpsConfig) -> Result<Self, GpsError> {
        let mut headers = HeaderMap::new();
        let api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| GpsError::InvalidConfig("API key is not a valid header value".into()))?;
        headers.insert("x-apikey", api_key);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn eta_url(&self, unit: &UnitNumber) -> String {
        format!("{}/units/{}/eta", self.base_url, unit.as_str())
    }

    /// Live ETA for `unit` heading to `destination`, if the provider has one.
    pub async fn unit_eta(
        &self,
        unit: &UnitNumber,
        destination: &TerminalCode,
    ) -> Result<Option<GpsEta>, GpsError> {
        let response = self
            .http
            .get(self.eta_url(unit))
            .query(&[("destination", destination.as_str())])
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(GpsError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => return Err(GpsError::RateLimited),
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(GpsError::Api {
                    status: status.as_u16(),
                    message: body,
                });
            }
            _ => {}
        }

        let body = response.text().await?;
        parse_eta(&body, unit, destination).map(Some)
    }
}

/// Decode a provider ETA document.
fn parse_eta(
    body: &str,
    unit: &UnitNumber,
    destination: &TerminalCode,
) -> Result<GpsEta, GpsError> {
    let parsed: EtaResponse = serde_json::from_str(body).map_err(|e| GpsError::Json {
        message: e.to_string(),
    })?;
    let eta = parse_timestamp(&parsed.eta).map_err(|e| GpsError::Json {
        message: format!("eta '{}': {e}", parsed.eta),
    })?;
    Ok(GpsEta {
        unit: unit.clone(),
        destination: *destination,
        eta,
        miles_remaining: parsed.miles_remaining,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use axum::Router;
    use axum::extract::{Path, Query};
    use axum::routing::get;
    use chrono::NaiveDate;

    fn den() -> TerminalCode {
        TerminalCode::parse("DEN").unwrap()
    }

    /// Stand-in provider: the unit number picks the response.
    async fn provider_eta(
        Path(unit): Path<String>,
        Query(query): Query<HashMap<String, String>>,
        headers: HeaderMap,
    ) -> (StatusCode, String) {
        if headers.get("x-apikey").and_then(|v| v.to_str().ok()) != Some("key") {
            return (StatusCode::UNAUTHORIZED, String::new());
        }
        if query.get("destination").map(String::as_str) != Some("DEN") {
            return (StatusCode::BAD_REQUEST, "unknown destination".into());
        }
        match unit.as_str() {
            "LOST" => (StatusCode::NOT_FOUND, String::new()),
            "BANNED" => (StatusCode::FORBIDDEN, String::new()),
            "BUSY" => (StatusCode::TOO_MANY_REQUESTS, String::new()),
            "DOWN" => (StatusCode::SERVICE_UNAVAILABLE, "maintenance".into()),
            "GARBLED" => (StatusCode::OK, "<html>".into()),
            _ => (
                StatusCode::OK,
                r#"{"eta": "2026-03-03T12:10:00", "milesRemaining": 320.5}"#.into(),
            ),
        }
    }

    /// Serve the stand-in provider on a free local port and return its base URL.
    async fn provider() -> String {
        let app = Router::new().route("/units/:unit/eta", get(provider_eta));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    async fn gps_client(api_key: &str) -> GpsClient {
        GpsClient::new(GpsConfig::new(provider().await, api_key)).unwrap()
    }

    #[tokio::test]
    async fn success_is_decoded() {
        let client = gps_client("key").await;
        let eta = client.unit_eta(&"tr10".into(), &den()).await.unwrap().unwrap();
        assert_eq!(eta.unit.as_str(), "TR10");
        assert_eq!(eta.destination, den());
        assert_eq!(eta.miles_remaining, Some(320.5));
    }

    #[tokio::test]
    async fn untracked_unit_has_no_estimate() {
        let client = gps_client("key").await;
        assert_eq!(client.unit_eta(&"LOST".into(), &den()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn rejected_key_is_unauthorized() {
        let client = gps_client("wrong").await;
        let err = client.unit_eta(&"TR10".into(), &den()).await.unwrap_err();
        assert!(matches!(err, GpsError::Unauthorized));

        let client = gps_client("key").await;
        let err = client.unit_eta(&"BANNED".into(), &den()).await.unwrap_err();
        assert!(matches!(err, GpsError::Unauthorized));
    }

    #[tokio::test]
    async fn too_many_requests_is_rate_limited() {
        let client = gps_client("key").await;
        let err = client.unit_eta(&"BUSY".into(), &den()).await.unwrap_err();
        assert!(matches!(err, GpsError::RateLimited));
    }

    #[tokio::test]
    async fn other_failures_keep_status_and_body() {
        let client = gps_client("key").await;
        let err = client.unit_eta(&"DOWN".into(), &den()).await.unwrap_err();
        let GpsError::Api { status, message } = err else {
            panic!("expected an API error, got {err:?}");
        };
        assert_eq!(status, 503);
        assert_eq!(message, "maintenance");

        let slc = TerminalCode::parse("SLC").unwrap();
        let err = client.unit_eta(&"TR10".into(), &slc).await.unwrap_err();
        assert!(matches!(err, GpsError::Api { status: 400, .. }));
    }

    #[tokio::test]
    async fn garbled_success_is_a_json_error() {
        let client = gps_client("key").await;
        let err = client.unit_eta(&"GARBLED".into(), &den()).await.unwrap_err();
        assert!(matches!(err, GpsError::Json { .. }));
    }

    #[test]
    fn parses_eta_document() {
        let eta = parse_eta(
            r#"{"eta": "2026-03-03T12:10:00", "milesRemaining": 320.5}"#,
            &"TR10".into(),
            &den(),
        )
        .unwrap();
        assert_eq!(
            eta.eta,
            NaiveDate::from_ymd_opt(2026, 3, 3)
                .unwrap()
                .and_hms_opt(12, 10, 0)
                .unwrap()
        );
        assert_eq!(eta.miles_remaining, Some(320.5));
        assert_eq!(eta.unit.as_str(), "TR10");
    }

    #[test]
    fn bad_documents_are_json_errors() {
        let err = parse_eta("{}", &"TR10".into(), &den()).unwrap_err();
        assert!(matches!(err, GpsError::Json { .. }));

        let err = parse_eta(r#"{"eta": "soon"}"#, &"TR10".into(), &den()).unwrap_err();
        assert!(err.to_string().contains("soon"));
    }

    #[test]
    fn url_trims_trailing_slash() {
        let client = GpsClient::new(GpsConfig::new("http://gps.local/api/", "key")).unwrap();
        assert_eq!(
            client.eta_url(&"tr10".into()),
            "http://gps.local/api/units/TR10/eta"
        );
    }

    #[test]
    fn invalid_api_key_is_rejected() {
        let err = GpsClient::new(GpsConfig::new("http://gps.local", "bad\nkey")).unwrap_err();
        assert!(matches!(err, GpsError::InvalidConfig(_)));
    }
}
