//! End-to-end query tests: pipeline over HTTP against a mock server

use entsoe_client::query::QueryError;
use entsoe_client::{reports, ExecutionMode, ParamsBuilder, QueryClient, QueryOptions};
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{config, zip_archive, ACTUAL_LOAD, NO_DATA, REJECTED};

fn client(server: &MockServer) -> QueryClient {
    QueryClient::new(&config(&server.uri())).unwrap()
}

async fn requests(server: &MockServer) -> usize {
    server.received_requests().await.map_or(0, |requests| requests.len())
}

#[tokio::test]
async fn test_zip_payload_yields_one_document_per_entry() {
    let server = MockServer::start().await;
    let archive = zip_archive(&[("first.xml", ACTUAL_LOAD), ("second.xml", ACTUAL_LOAD)]);
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(archive, "application/zip"))
        .mount(&server)
        .await;

    let params = ParamsBuilder::new("A65")
        .period(202401010000, 202401020000)
        .build();
    let documents = client(&server)
        .query(params, QueryOptions::default())
        .await
        .unwrap();

    assert_eq!(documents.len(), 2);
    assert!(documents
        .iter()
        .all(|document| document.schema_name() == "GL_MarketDocument"));
}

#[tokio::test]
async fn test_no_data_is_an_empty_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(NO_DATA, "text/xml"))
        .mount(&server)
        .await;

    let params = ParamsBuilder::new("A65")
        .period(202401010000, 202401020000)
        .build();
    let documents = client(&server)
        .query(params, QueryOptions::default())
        .await
        .unwrap();

    assert!(documents.is_empty());
    assert_eq!(requests(&server).await, 1);
}

#[tokio::test]
async fn test_service_unavailable_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(ACTUAL_LOAD, "text/xml"))
        .mount(&server)
        .await;

    let params = ParamsBuilder::new("A65")
        .period(202401010000, 202401020000)
        .build();
    let documents = client(&server)
        .query(params, QueryOptions::default())
        .await
        .unwrap();

    assert_eq!(documents.len(), 1);
    assert_eq!(requests(&server).await, 3);
}

#[tokio::test]
async fn test_retries_exhausted_surface_last_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = QueryClient::new(&config(&server.uri()).with_retries(3).unwrap()).unwrap();
    let result = client
        .query(ParamsBuilder::new("A65").build(), QueryOptions::default())
        .await;

    assert!(matches!(result, Err(QueryError::ServiceUnavailable)));
    assert_eq!(requests(&server).await, 3);
}

#[tokio::test]
async fn test_rejected_query_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400).set_body_raw(REJECTED, "text/xml"))
        .mount(&server)
        .await;

    let result = client(&server)
        .query(ParamsBuilder::new("A65").build(), QueryOptions::default())
        .await;

    match result {
        Err(QueryError::Acknowledgement(reason)) => {
            assert!(reason.contains("exceeds allowed limit"));
        }
        other => panic!("expected acknowledgement error, got {other:?}"),
    }
    assert_eq!(requests(&server).await, 1);
}

#[tokio::test]
async fn test_long_window_split_into_chunks() {
    let server = MockServer::start().await;
    let preset = reports::find("6.1.A").unwrap();
    let params = preset
        .builder()
        .period(202201010000, 202401010000)
        .out_bidding_zone_domain("10YCZ-CEPS-----N")
        .build();

    for mode in [
        ExecutionMode::Sequential,
        ExecutionMode::Concurrent { max_workers: 2 },
    ] {
        server.reset().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(ACTUAL_LOAD, "text/xml"))
            .mount(&server)
            .await;

        let client = client(&server).with_mode(mode);
        let documents = client.query(params.clone(), preset.options()).await.unwrap();
        assert_eq!(documents.len(), 2, "{mode:?}");

        let received = server.received_requests().await.unwrap();
        let mut starts: Vec<String> = received
            .iter()
            .filter_map(|request| {
                request
                    .url
                    .query_pairs()
                    .find(|(key, _)| key == "periodStart")
                    .map(|(_, value)| value.into_owned())
            })
            .collect();
        starts.sort();
        assert_eq!(starts, vec!["202201010000", "202301010000"], "{mode:?}");
    }
}

#[tokio::test]
async fn test_pagination_stops_on_empty_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(ACTUAL_LOAD, "text/xml"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("offset", "200"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(NO_DATA, "text/xml"))
        .mount(&server)
        .await;

    let preset = reports::find("15.1.A_B").unwrap();
    let params = preset
        .builder()
        .period(202401010000, 202401020000)
        .bidding_zone_domain("10YNL----------L")
        .build();
    let documents = client(&server)
        .query(params, preset.options())
        .await
        .unwrap();

    assert_eq!(documents.len(), 1);
    assert_eq!(requests(&server).await, 2);
}
