//! Integration tests for `Geocoder` against a wiremock Nominatim.

use std::time::Duration;

use hotleads_osm::{Geocoder, OsmError};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_geocoder(base_url: &str) -> Geocoder {
    Geocoder::new(base_url, 5, "hotleads-test/0.1").expect("geocoder construction should not fail")
}

fn tempe_place() -> serde_json::Value {
    json!([{
        "lat": "33.4255",
        "lon": "-111.9400",
        "boundingbox": ["33.3200", "33.4600", "-111.9800", "-111.8800"],
        "display_name": "Tempe, Maricopa County, Arizona, 85281, United States"
    }])
}

#[tokio::test]
async fn resolves_postal_code_with_bounding_box() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("postalcode", "85281"))
        .and(query_param("format", "jsonv2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tempe_place()))
        .mount(&server)
        .await;

    let result = test_geocoder(&server.uri())
        .resolve("85281")
        .await
        .expect("should resolve");

    assert!((result.point.lat - 33.4255).abs() < 1e-9);
    assert!((result.point.lon + 111.94).abs() < 1e-9);
    let bbox = result.bounding_box.expect("bbox expected");
    assert!((bbox.north - 33.46).abs() < 1e-9);
    assert!((bbox.south - 33.32).abs() < 1e-9);
    assert!(result.display_name.unwrap().contains("Tempe"));
}

#[tokio::test]
async fn resolves_free_text_address() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Mill Ave, Tempe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "lat": "33.42", "lon": "-111.94" }
        ])))
        .mount(&server)
        .await;

    let result = test_geocoder(&server.uri())
        .resolve("Mill Ave, Tempe")
        .await
        .expect("should resolve");
    assert!(result.bounding_box.is_none());
}

#[tokio::test]
async fn empty_result_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let err = test_geocoder(&server.uri())
        .resolve("Atlantis")
        .await
        .unwrap_err();
    assert!(matches!(err, OsmError::NotFound { ref query } if query == "Atlantis"));
    assert!(!err.is_upstream());
}

#[tokio::test]
async fn server_error_is_upstream_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = test_geocoder(&server.uri())
        .resolve("85281")
        .await
        .unwrap_err();
    assert!(
        matches!(err, OsmError::UnexpectedStatus { status: 503, .. }),
        "got {err:?}"
    );
    assert!(err.is_upstream());
}

#[tokio::test]
async fn malformed_body_is_deserialize_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = test_geocoder(&server.uri())
        .resolve("85281")
        .await
        .unwrap_err();
    assert!(matches!(err, OsmError::Deserialize { .. }));
}

#[tokio::test]
async fn repeated_hint_hits_upstream_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tempe_place()))
        .expect(1)
        .mount(&server)
        .await;

    let geocoder = test_geocoder(&server.uri()).with_cache(8, Duration::from_secs(60));
    let first = geocoder.resolve("85281").await.unwrap();
    let second = geocoder.resolve("85281").await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn failures_are_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tempe_place()))
        .mount(&server)
        .await;

    let geocoder = test_geocoder(&server.uri());
    assert!(geocoder.resolve("85281").await.is_err());
    assert!(geocoder.resolve("85281").await.is_ok());
}
