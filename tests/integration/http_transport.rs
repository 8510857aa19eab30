//! Integration tests for the HTTP transport against a mock server

use std::time::Duration;

use entsoe_client::query::{HttpTransport, NetworkErrorKind, QueryError, Transport};
use entsoe_client::{ParamsBuilder, QueryClient, QueryOptions};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{config, zip_archive, ACTUAL_LOAD, TOKEN};

#[tokio::test]
async fn test_security_token_appended_to_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api"))
        .and(query_param("securityToken", TOKEN))
        .and(query_param("documentType", "A65"))
        .and(query_param("periodStart", "202401010000"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(ACTUAL_LOAD, "text/xml"))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&config(&format!("{}/api", server.uri()))).unwrap();
    let params = ParamsBuilder::new("A65")
        .period(202401010000, 202401020000)
        .build();

    let payload = transport.send(&params).await.unwrap();
    assert_eq!(payload.status, 200);
    assert!(payload.content_type.starts_with("text/xml"));
    assert!(!payload.is_zip());
    assert!(payload.text().unwrap().contains("GL_MarketDocument"));

    // The token is sent but never kept with the payload
    assert!(!payload.request.params.contains("securityToken"));
    assert_eq!(payload.request.params, params);
}

#[tokio::test]
async fn test_service_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&config(&server.uri())).unwrap();
    let result = transport.send(&ParamsBuilder::new("A65").build()).await;

    match result {
        Err(QueryError::ServiceUnavailable) => {}
        other => panic!("expected ServiceUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn test_other_statuses_are_returned() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400).set_body_raw("<bad/>", "application/xml"))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&config(&server.uri())).unwrap();
    let payload = transport
        .send(&ParamsBuilder::new("A65").build())
        .await
        .unwrap();

    assert_eq!(payload.status, 400);
    assert_eq!(payload.text().unwrap(), "<bad/>");
}

#[tokio::test]
async fn test_zip_content_type_detected() {
    let server = MockServer::start().await;
    let archive = zip_archive(&[("load.xml", ACTUAL_LOAD)]);
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(archive.clone(), "application/zip"))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&config(&server.uri())).unwrap();
    let payload = transport
        .send(&ParamsBuilder::new("A65").build())
        .await
        .unwrap();

    assert!(payload.is_zip());
    assert_eq!(payload.content.as_ref(), archive.as_slice());
}

#[tokio::test]
async fn test_connection_failure_is_transient_and_hides_token() {
    // Nothing listens on the discard port
    let transport = HttpTransport::new(&config("http://127.0.0.1:9/api")).unwrap();
    let err = transport
        .send(&ParamsBuilder::new("A65").build())
        .await
        .unwrap_err();

    assert!(err.is_transient(), "unexpected error: {err:?}");
    assert!(!err.to_string().contains(TOKEN));
}

#[tokio::test]
async fn test_slow_response_times_out_after_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(ACTUAL_LOAD, "text/xml")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let config = config(&server.uri())
        .with_timeout(Duration::from_millis(200))
        .with_retries(2)
        .unwrap();

    let transport = HttpTransport::new(&config).unwrap();
    let err = transport
        .send(&ParamsBuilder::new("A65").build())
        .await
        .unwrap_err();
    assert!(
        matches!(err, QueryError::Network { kind: NetworkErrorKind::Timeout, .. }),
        "unexpected error: {err:?}"
    );
    server.reset().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(ACTUAL_LOAD, "text/xml")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let result = QueryClient::new(&config)
        .unwrap()
        .query(ParamsBuilder::new("A65").build(), QueryOptions::default())
        .await;
    assert!(
        matches!(result, Err(QueryError::Network { kind: NetworkErrorKind::Timeout, .. })),
        "unexpected result: {result:?}"
    );
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
}
