//! Integration tests for HTTP outcome classification against a mock API

use geo_bulk_fetcher::fetcher::reverse::{Coordinate, ResponseFormat, ResultType};
use geo_bulk_fetcher::fetcher::{
    ApiClient, FetchOutcome, FetchUnit, GeocodeFetcher, ReverseGeocodeFetcher,
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test-api-key-0123";

fn client(server: &MockServer) -> ApiClient {
    ApiClient::new(
        server.uri(),
        API_KEY,
        Duration::from_secs(2),
        Duration::from_secs(2),
    )
    .unwrap()
}

async fn geocode_with_status(status: u16) -> FetchOutcome<serde_json::Value> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/geocode/search"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;

    GeocodeFetcher::new(client(&server))
        .geocode("Brandenburger Tor, Berlin")
        .await
}

#[tokio::test]
async fn test_first_result_is_returned() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/geocode/search"))
        .and(query_param("text", "Brandenburger Tor, Berlin"))
        .and(query_param("format", "json"))
        .and(query_param("limit", "1"))
        .and(query_param("apiKey", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"formatted": "Brandenburger Tor, Pariser Platz, Berlin", "lat": 52.5163, "lon": 13.3777},
                {"formatted": "Second", "lat": 0.0, "lon": 0.0}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = GeocodeFetcher::new(client(&server))
        .geocode("Brandenburger Tor, Berlin")
        .await;

    let result = outcome.as_success().unwrap();
    assert_eq!(
        result["formatted"],
        "Brandenburger Tor, Pariser Platz, Berlin"
    );
}

#[tokio::test]
async fn test_country_filter_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/geocode/search"))
        .and(query_param("filter", "countrycode:de"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"formatted": "Berlin"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = GeocodeFetcher::new(client(&server))
        .with_country_code(Some(" DE ".to_string()))
        .geocode("Berlin")
        .await;
    assert!(outcome.is_success());
}

#[tokio::test]
async fn test_empty_result_list_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/geocode/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .mount(&server)
        .await;

    let outcome = GeocodeFetcher::new(client(&server)).geocode("nowhere").await;
    assert_eq!(outcome, FetchOutcome::NotFound);
}

#[tokio::test]
async fn test_status_codes_are_classified() {
    assert_eq!(geocode_with_status(404).await, FetchOutcome::NotFound);
    assert_eq!(geocode_with_status(429).await, FetchOutcome::RateLimited);
    assert_eq!(geocode_with_status(500).await, FetchOutcome::ServerError(500));
    assert_eq!(geocode_with_status(503).await, FetchOutcome::ServerError(503));
    assert_eq!(geocode_with_status(401).await, FetchOutcome::ClientError(401));
    assert_eq!(geocode_with_status(400).await, FetchOutcome::ClientError(400));
}

#[tokio::test]
async fn test_malformed_body_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/geocode/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let outcome = GeocodeFetcher::new(client(&server)).geocode("Berlin").await;
    match outcome {
        FetchOutcome::TransportError(message) => assert!(message.contains("malformed")),
        other => panic!("expected TransportError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/geocode/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"results": []}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = ApiClient::new(
        server.uri(),
        API_KEY,
        Duration::from_secs(1),
        Duration::from_millis(100),
    )
    .unwrap();
    let outcome = GeocodeFetcher::new(client).geocode("Berlin").await;
    assert!(matches!(outcome, FetchOutcome::TransportError(_)));
    assert!(outcome.is_transient());
}

#[tokio::test]
async fn test_unreachable_host_is_a_transport_error() {
    let client = ApiClient::new(
        "http://127.0.0.1:9",
        API_KEY,
        Duration::from_millis(200),
        Duration::from_millis(500),
    )
    .unwrap();
    let outcome = GeocodeFetcher::new(client).geocode("Berlin").await;
    assert!(matches!(outcome, FetchOutcome::TransportError(_)));
}

#[tokio::test]
async fn test_blank_address_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let fetcher = GeocodeFetcher::new(client(&server));
    assert_eq!(fetcher.fetch(&"   ".to_string()).await, FetchOutcome::NotFound);
}

#[tokio::test]
async fn test_reverse_query_and_first_feature() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/geocode/reverse"))
        .and(query_param("lat", "52.5163"))
        .and(query_param("lon", "13.3777"))
        .and(query_param("format", "geojson"))
        .and(query_param("result_type", "street"))
        .and(query_param("apiKey", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "FeatureCollection",
            "features": [{"type": "Feature", "properties": {"street": "Pariser Platz"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = ReverseGeocodeFetcher::new(client(&server))
        .with_format(ResponseFormat::Geojson)
        .with_result_type(Some(ResultType::Street));
    let point = Coordinate::new(52.5163, 13.3777).unwrap();

    let outcome = fetcher.fetch(&Some(point)).await;
    assert_eq!(
        outcome.as_success().unwrap()["properties"]["street"],
        "Pariser Platz"
    );
}

#[tokio::test]
async fn test_reverse_without_coordinate_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let fetcher = ReverseGeocodeFetcher::new(client(&server));
    assert_eq!(fetcher.fetch(&None).await, FetchOutcome::NotFound);
}
