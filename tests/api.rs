//! Integration tests for the API client.
//!
//! These tests use wiremock to simulate the prediction service
//! and verify request shapes, response parsing and error handling.

use bus_demand::{
    ApiClient, GatewayError, Occasion, PredictionGateway, PredictionRequest, Season, TimePeriod,
    config::{ApiConfig, NetworkConfig},
};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, method, path, query_param},
};

fn network() -> NetworkConfig {
    NetworkConfig {
        request_timeout_secs: 10,
        connect_timeout_secs: 5,
    }
}

fn client_for(server: &MockServer) -> ApiClient {
    let api = ApiConfig {
        base_url: format!("{}/api", server.uri()),
        history_limit: None,
    };
    ApiClient::new(&api, &network()).expect("Client creation should succeed")
}

fn request() -> PredictionRequest {
    PredictionRequest {
        start_location_id: 1,
        end_location_id: 2,
        time_period: TimePeriod::FullDay,
        occasion: Occasion::SpecialEvent,
        season: Season::Winter,
    }
}

fn prediction_body() -> serde_json::Value {
    json!({
        "route": {
            "start": {"id": 1, "name": "Austin"},
            "end": {"id": 2, "name": "Dallas"}
        },
        "time_period": "Full_Day",
        "occasion": "Special Event",
        "season": "Winter",
        "predictions": [
            {"time_slot": "Afternoon", "predicted_demand": 150, "buses_needed": 3},
            {"time_slot": "Night", "predicted_demand": 120, "buses_needed": 3},
            {"time_slot": "Morning", "predicted_demand": 100, "buses_needed": 2},
            {"time_slot": "Evening", "predicted_demand": 80, "buses_needed": 2}
        ],
        "total_predicted_demand": 450,
        "total_buses_needed": 10
    })
}

// ==================== Locations ====================

/// Test successful locations response parsing.
#[tokio::test]
async fn test_list_locations_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/locations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "Austin", "description": "Capital"},
            {"id": 2, "name": "Dallas", "description": null}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let locations = client_for(&mock_server).list_locations().await.unwrap();

    assert_eq!(locations.len(), 2);
    assert_eq!(locations[0].name, "Austin");
    assert_eq!(locations[0].description.as_deref(), Some("Capital"));
    assert_eq!(locations[1].description, None);
}

/// Test handling of HTTP 500 errors.
#[tokio::test]
async fn test_list_locations_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/locations"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server).list_locations().await.unwrap_err();

    let GatewayError::Network(message) = &err else {
        panic!("expected network error, got {err:?}");
    };
    assert!(message.contains("500"), "Error should mention status code");
}

/// Test handling of malformed JSON response.
#[tokio::test]
async fn test_list_locations_invalid_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/locations"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not valid json"))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server).list_locations().await.unwrap_err();

    assert!(matches!(err, GatewayError::MalformedResponse(_)));
}

/// Test connection failure when nothing is listening.
#[tokio::test]
async fn test_unreachable_service_is_network_error() {
    let api = ApiConfig {
        base_url: "http://127.0.0.1:9/api".to_string(),
        history_limit: None,
    };
    let client = ApiClient::new(&api, &network()).unwrap();

    let err = client.list_locations().await.unwrap_err();

    assert!(matches!(err, GatewayError::Network(_)));
}

// ==================== Predict ====================

/// The body carries integer ids and the enum labels verbatim.
#[tokio::test]
async fn test_submit_prediction_sends_expected_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/predict"))
        .and(body_json(json!({
            "start_location_id": 1,
            "end_location_id": 2,
            "time_period": "Full_Day",
            "occasion": "Special Event",
            "season": "Winter"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(prediction_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server)
        .submit_prediction(request())
        .await
        .unwrap();

    assert_eq!(result.route.end.name, "Dallas");
    assert_eq!(result.total_predicted_demand, 450);
    let slots: Vec<&str> = result
        .predictions
        .iter()
        .map(|p| p.time_slot.as_str())
        .collect();
    assert_eq!(slots, vec!["Afternoon", "Night", "Morning", "Evening"]);
}

/// FastAPI `detail` text is surfaced in the error.
#[tokio::test]
async fn test_submit_prediction_error_detail() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/predict"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"detail": "Start location with ID 1 not found"})),
        )
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server)
        .submit_prediction(request())
        .await
        .unwrap_err();

    let GatewayError::Network(message) = &err else {
        panic!("expected network error, got {err:?}");
    };
    assert!(message.contains("404"));
    assert!(message.contains("Start location with ID 1 not found"));
}

/// Negative demand does not fit the schema.
#[tokio::test]
async fn test_submit_prediction_rejects_negative_demand() {
    let mock_server = MockServer::start().await;

    let mut body = prediction_body();
    body["predictions"][0]["predicted_demand"] = json!(-3);

    Mock::given(method("POST"))
        .and(path("/api/predict"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server)
        .submit_prediction(request())
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::MalformedResponse(_)));
}

// ==================== History ====================

#[tokio::test]
async fn test_list_history_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/predictions/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 2,
                "start_location_id": 1,
                "start_location_name": "Austin",
                "end_location_id": 2,
                "end_location_name": "Dallas",
                "time_period": "Evening",
                "occasion": "Regular",
                "season": "Summer",
                "total_predicted_demand": 80,
                "total_buses_needed": 2,
                "timestamp": "2024-06-15 18:00:00"
            },
            {
                "id": 1,
                "start_location_id": 2,
                "start_location_name": "Dallas",
                "end_location_id": 1,
                "end_location_name": "Austin",
                "time_period": "Full_Day",
                "occasion": "Holiday",
                "season": "Winter",
                "total_predicted_demand": 450,
                "total_buses_needed": 10,
                "timestamp": "2024-06-15T09:00:00Z"
            }
        ])))
        .mount(&mock_server)
        .await;

    let history = client_for(&mock_server).list_history().await.unwrap();

    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, 2);
    assert_eq!(history[1].time_period, TimePeriod::FullDay);
    assert!(history[0].timestamp > history[1].timestamp);
}

#[tokio::test]
async fn test_list_history_sends_configured_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/predictions/history"))
        .and(query_param("limit", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let api = ApiConfig {
        base_url: format!("{}/api", mock_server.uri()),
        history_limit: Some(25),
    };
    let client = ApiClient::new(&api, &network()).unwrap();

    let history = client.list_history().await.unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn test_list_history_bad_timestamp_is_malformed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/predictions/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 1,
            "start_location_name": "Austin",
            "end_location_name": "Dallas",
            "time_period": "Morning",
            "occasion": "Regular",
            "season": "Summer",
            "total_predicted_demand": 10,
            "total_buses_needed": 1,
            "timestamp": "last tuesday"
        }])))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server).list_history().await.unwrap_err();

    assert!(matches!(err, GatewayError::MalformedResponse(_)));
}
