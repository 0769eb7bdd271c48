//! End-to-end pipeline tests against wiremock Nominatim and Overpass.

use chrono::{DateTime, TimeZone, Utc};
use hotleads_core::{BoundingBox, CategoryFilter, GeoPoint, NichesFile, SearchArea};
use hotleads_leads::{
    LeadPipeline, LeadProcessor, LocationSpec, PipelineError, Scorer, SearchParams, SearchStatus,
};
use hotleads_osm::{Geocoder, OverpassClient, QueryBuilder};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const UA: &str = "hotleads-test/0.1";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 8, 12, 0, 0).unwrap()
}

fn pipeline(server: &MockServer) -> LeadPipeline {
    let niches = NichesFile::builtin();
    LeadPipeline::new(
        Geocoder::new(&server.uri(), 5, UA).unwrap(),
        OverpassClient::new(&format!("{}/api/interpreter", server.uri()), UA).unwrap(),
        QueryBuilder::new(30, 500, 8),
        LeadProcessor::new(Scorer::from_niches(&niches).unwrap()),
    )
    .with_radius_limits(50_000, 200_000)
}

fn params(location: LocationSpec) -> SearchParams {
    SearchParams {
        location,
        radius_m: None,
        categories: vec![
            CategoryFilter::exact("shop", "hairdresser"),
            CategoryFilter::exact("amenity", "cafe"),
        ],
        recency_days: 7,
        exclusion_list: NichesFile::builtin().blacklist,
        require_no_website: true,
        enrich_contacts: false,
        probe_websites: false,
    }
}

fn overpass_body() -> serde_json::Value {
    json!({
        "elements": [
            {
                "type": "node", "id": 10, "lat": 33.41, "lon": -111.93,
                "timestamp": "2025-05-07T10:00:00Z",
                "tags": {
                    "name": "Mill Ave Cuts", "shop": "hairdresser", "phone": "480-555-0100",
                    "addr:housenumber": "700", "addr:street": "S Mill Ave", "addr:city": "Tempe"
                }
            },
            {
                "type": "node", "id": 11, "lat": 33.42, "lon": -111.92,
                "timestamp": "2025-05-08T09:00:00Z",
                "tags": { "name": "Starbucks", "amenity": "cafe", "phone": "480-555-0111" }
            },
            {
                "type": "way", "id": 12, "center": { "lat": 33.43, "lon": -111.91 },
                "timestamp": "2025-05-08T08:00:00Z",
                "tags": { "name": "Sonoran Brews", "amenity": "cafe", "phone": "480-555-0122" }
            }
        ]
    })
}

async fn mount_tempe(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "lat": "33.4255", "lon": "-111.9400",
            "boundingbox": ["33.3200", "33.4600", "-111.9800", "-111.8800"],
            "display_name": "Tempe, Arizona"
        }])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn hint_search_returns_ranked_leads_within_geocoded_box() {
    let server = MockServer::start().await;
    mount_tempe(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/interpreter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(overpass_body()))
        .expect(1)
        .mount(&server)
        .await;

    let report = pipeline(&server)
        .search(&params(LocationSpec::Hint("85281".to_owned())), now())
        .await;

    assert_eq!(report.status, SearchStatus::Found);
    assert!(!report.widened);
    assert!(matches!(report.area, Some(SearchArea::Within(_))));
    let names: Vec<&str> = report.leads.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["Sonoran Brews", "Mill Ave Cuts"]);
    assert_eq!(report.leads[1].address, "700, S Mill Ave, Tempe");
    assert_eq!(report.leads[1].days_since_listed, 1);
}

#[tokio::test]
async fn empty_first_attempt_widens_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("around%3A10000"))
        .and(body_string_contains("2025-05-01T12%3A00%3A00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "elements": [] })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("around%3A20000"))
        .and(body_string_contains("2025-04-24T12%3A00%3A00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(overpass_body()))
        .expect(1)
        .mount(&server)
        .await;

    let mut p = params(LocationSpec::Point(GeoPoint::new(33.4255, -111.94)));
    p.radius_m = Some(10_000);
    let report = pipeline(&server).search(&p, now()).await;

    assert_eq!(report.status, SearchStatus::Found);
    assert!(report.widened);
    assert_eq!(
        report.area,
        Some(SearchArea::Around {
            center: GeoPoint::new(33.4255, -111.94),
            radius_m: 20_000
        })
    );
    assert_eq!(report.leads.len(), 2);
}

#[tokio::test]
async fn widened_retry_admits_listings_within_doubled_lookback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("2025-05-01T12%3A00%3A00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "elements": [] })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("2025-04-24T12%3A00%3A00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "elements": [{
                "type": "node", "id": 20, "lat": 33.41, "lon": -111.93,
                "timestamp": "2025-04-28T12:00:00Z",
                "tags": { "name": "Old Town Cafe", "amenity": "cafe", "phone": "480-555-0133" }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let report = pipeline(&server)
        .search(&params(LocationSpec::Point(GeoPoint::new(33.4255, -111.94))), now())
        .await;

    assert_eq!(report.status, SearchStatus::Found);
    assert!(report.widened);
    assert_eq!(report.leads.len(), 1);
    assert_eq!(report.leads[0].name, "Old Town Cafe");
    assert_eq!(report.leads[0].days_since_listed, 10);
}

#[tokio::test]
async fn still_empty_after_widening_is_no_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "elements": [] })))
        .expect(2)
        .mount(&server)
        .await;

    let bbox = BoundingBox {
        south: 33.32,
        north: 33.46,
        west: -111.98,
        east: -111.88,
    };
    let report = pipeline(&server)
        .search(&params(LocationSpec::Bounds(bbox)), now())
        .await;

    assert_eq!(report.status, SearchStatus::NoResults);
    assert_eq!(report.status.reason_code(), Some("no-results"));
    assert!(report.leads.is_empty());
    assert!(report.widened);
    assert_eq!(report.area, Some(SearchArea::Within(bbox.expanded(2.0))));
}

#[tokio::test]
async fn unknown_location_is_reported_without_querying_overpass() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(overpass_body()))
        .expect(0)
        .mount(&server)
        .await;

    let pipeline = pipeline(&server);
    let p = params(LocationSpec::Hint("Atlantis".to_owned()));

    let report = pipeline.search(&p, now()).await;
    assert_eq!(report.status, SearchStatus::LocationNotFound);
    assert!(report.area.is_none());

    let err = pipeline.run(&p, now()).await.unwrap_err();
    assert!(matches!(err, PipelineError::LocationNotFound { .. }));
    assert!(!err.is_upstream());
}

#[tokio::test]
async fn upstream_failure_is_not_widened() {
    let server = MockServer::start().await;
    mount_tempe(&server).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(504))
        .expect(1)
        .mount(&server)
        .await;

    let report = pipeline(&server)
        .search(&params(LocationSpec::Hint("85281".to_owned())), now())
        .await;

    assert!(matches!(report.status, SearchStatus::UpstreamError(_)));
    assert_eq!(report.status.reason_code(), Some("upstream-error"));
    assert!(report.leads.is_empty());
}

#[tokio::test]
async fn identical_searches_are_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "lat": "33.4255", "lon": "-111.9400"
        }])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(overpass_body()))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = pipeline(&server);
    let p = params(LocationSpec::Hint("Tempe, AZ".to_owned()));
    let first = pipeline.search(&p, now()).await;
    let second = pipeline.search(&p, now()).await;

    assert_eq!(first, second);
    assert_eq!(
        first.area,
        Some(SearchArea::Around {
            center: GeoPoint::new(33.4255, -111.94),
            radius_m: 50_000
        })
    );
}

#[tokio::test]
async fn empty_categories_send_catch_all_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("office"))
        .and(body_string_contains("leisure"))
        .respond_with(ResponseTemplate::new(200).set_body_json(overpass_body()))
        .expect(1)
        .mount(&server)
        .await;

    let mut p = params(LocationSpec::Point(GeoPoint::new(33.4255, -111.94)));
    p.categories.clear();
    let report = pipeline(&server).search(&p, now()).await;
    assert_eq!(report.status, SearchStatus::Found);
}

#[tokio::test]
async fn plan_renders_queries_without_fetching() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(overpass_body()))
        .expect(0)
        .mount(&server)
        .await;

    let p = params(LocationSpec::Point(GeoPoint::new(33.4255, -111.94)));
    let (area, specs) = pipeline(&server).plan(&p, now()).await.unwrap();

    assert_eq!(
        area,
        SearchArea::Around {
            center: GeoPoint::new(33.4255, -111.94),
            radius_m: 50_000
        }
    );
    assert_eq!(specs.len(), 1);
    assert_eq!(specs[0].clause_count, 2);
    assert!(specs[0].text.contains("(newer:\"2025-05-01T12:00:00Z\")"));
    assert!(specs[0].text.contains("[!\"website\"]"));
}
