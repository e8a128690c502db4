use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    config::{ApiConfig, NetworkConfig},
    error::GatewayError,
    models::{HistoryRecord, Location, Occasion, PredictionRequest, PredictionResult, Season, TimePeriod},
    traits::PredictionGateway,
};

/// Body of `POST /predict`. Location ids travel as integers.
#[derive(Debug, Clone, Serialize)]
pub struct PredictRequestBody {
    pub start_location_id: i64,
    pub end_location_id: i64,
    pub time_period: TimePeriod,
    pub occasion: Occasion,
    pub season: Season,
}

impl From<PredictionRequest> for PredictRequestBody {
    fn from(request: PredictionRequest) -> Self {
        Self {
            start_location_id: request.start_location_id,
            end_location_id: request.end_location_id,
            time_period: request.time_period,
            occasion: request.occasion,
            season: request.season,
        }
    }
}

/// FastAPI-style error body.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// HTTP client for the prediction service.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    history_limit: Option<u32>,
}

impl ApiClient {
    /// Create a new API client with configurable timeouts.
    ///
    /// A `request_timeout_secs` of 0 leaves requests without a deadline.
    pub fn new(api_config: &ApiConfig, network_config: &NetworkConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(network_config.connect_timeout_secs));
        if network_config.request_timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(network_config.request_timeout_secs));
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: api_config.base_url.trim_end_matches('/').to_string(),
            history_limit: api_config.history_limit,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Check the status, then decode the body into `T`.
    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
        what: &str,
    ) -> Result<T, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .map(|err| match err.detail {
                    serde_json::Value::String(text) => text,
                    other => other.to_string(),
                });
            let message = match detail {
                Some(detail) => format!("{what} failed with status {status}: {detail}"),
                None => format!("{what} failed with status {status}"),
            };
            return Err(GatewayError::Network(message));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Network(format!("{what}: failed to read body: {e}")))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| GatewayError::MalformedResponse(format!("{what}: {e}")))
    }

    fn transport_error(what: &str, error: reqwest::Error) -> GatewayError {
        GatewayError::Network(format!("{what}: {error}"))
    }
}

impl PredictionGateway for ApiClient {
    async fn list_locations(&self) -> Result<Vec<Location>, GatewayError> {
        let url = self.endpoint("locations");
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Self::transport_error("Fetching locations", e))?;

        let locations: Vec<Location> = Self::decode(response, "Fetching locations").await?;
        tracing::info!("Loaded {} locations", locations.len());
        Ok(locations)
    }

    async fn submit_prediction(
        &self,
        request: PredictionRequest,
    ) -> Result<PredictionResult, GatewayError> {
        let url = self.endpoint("predict");
        let body = PredictRequestBody::from(request);
        tracing::debug!(
            "POST {} ({} -> {}, {}, {}, {})",
            url,
            body.start_location_id,
            body.end_location_id,
            body.time_period.as_str(),
            body.occasion,
            body.season
        );

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::transport_error("Requesting prediction", e))?;

        let result: PredictionResult = Self::decode(response, "Requesting prediction").await?;
        tracing::info!(
            "Received prediction with {} time slots",
            result.predictions.len()
        );
        Ok(result)
    }

    async fn list_history(&self) -> Result<Vec<HistoryRecord>, GatewayError> {
        let url = match self.history_limit {
            Some(limit) => format!("{}?limit={}", self.endpoint("predictions/history"), limit),
            None => self.endpoint("predictions/history"),
        };
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Self::transport_error("Fetching prediction history", e))?;

        let history: Vec<HistoryRecord> =
            Self::decode(response, "Fetching prediction history").await?;
        tracing::info!("Loaded {} history records", history.len());
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_config(base_url: &str) -> ApiConfig {
        ApiConfig {
            base_url: base_url.to_string(),
            history_limit: None,
        }
    }

    // ==================== Request Body Tests ====================

    #[test]
    fn test_request_body_serializes_ids_as_integers() {
        let body = PredictRequestBody::from(PredictionRequest {
            start_location_id: 3,
            end_location_id: 7,
            time_period: TimePeriod::FullDay,
            occasion: Occasion::SpecialEvent,
            season: Season::Fall,
        });
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["start_location_id"], serde_json::json!(3));
        assert_eq!(json["end_location_id"], serde_json::json!(7));
        assert_eq!(json["time_period"], "Full_Day");
        assert_eq!(json["occasion"], "Special Event");
        assert_eq!(json["season"], "Fall");
    }

    // ==================== ApiClient Construction Tests ====================

    #[test]
    fn test_api_client_creation() {
        let result = ApiClient::new(
            &api_config("http://localhost:8000/api"),
            &NetworkConfig::default(),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_api_client_without_request_timeout() {
        let network = NetworkConfig {
            request_timeout_secs: 0,
            connect_timeout_secs: 5,
        };
        let result = ApiClient::new(&api_config("http://localhost:8000/api"), &network);
        assert!(result.is_ok());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new(
            &api_config("http://localhost:8000/api/"),
            &NetworkConfig::default(),
        )
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000/api");
        assert_eq!(
            client.endpoint("/predictions/history"),
            "http://localhost:8000/api/predictions/history"
        );
    }
}
