use super::*;
use crate::clock::ManualClock;
use crate::dates::parse_lenient;
use crate::domain::{CertificateDto, CertificateId, Location};
use crate::ports::CertificateApi;
use crate::testing::{MockBackend, Reply, enveloped, record};
use axum::http::{Method, StatusCode};
use serde_json::json;
use shared::Error;
use std::sync::Arc;
use std::time::Duration;

const SEARCH_BY_NAME: &str = "/Services/searchByName";
const SEARCH_BY_SERIAL: &str = "/Services/searchByS_N";
const LIST: &str = "/Services";

fn client_for(backend: &MockBackend) -> CachedCertificateClient {
    CachedCertificateClient::new(&ClientConfig::new(backend.base_url())).unwrap()
}

fn dto(serial: &str) -> CertificateDto {
    CertificateDto {
        name: "Ali Hassan".to_string(),
        serial_number: serial.to_string(),
        method: 1,
        start_date: parse_lenient("2024-01-01").unwrap(),
        end_date: parse_lenient("2026-01-01").unwrap(),
        location: Location::head_office(),
    }
}

#[tokio::test]
async fn test_search_by_name_is_served_from_cache_within_ttl() {
    let backend = MockBackend::spawn().await;
    backend.reply_json(
        Method::GET,
        SEARCH_BY_NAME,
        json!({"$values": [{"id": 7, "name": "Ali Hassan", "s_N": "CERT-001"}]}),
    );
    let client = client_for(&backend);

    let first = client.search_by_name("Ali").await.unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].id, CertificateId(7));

    // The remote changes its answer, but the cached entry is still fresh
    backend.reply_json(
        Method::GET,
        SEARCH_BY_NAME,
        enveloped(vec![record(8, "Ali Other", "CERT-002"), record(9, "Ali Third", "CERT-003")]),
    );
    let second = client.search_by_name("Ali").await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(backend.hits(Method::GET, SEARCH_BY_NAME), 1);

    let request = &backend.requests(Method::GET, SEARCH_BY_NAME)[0];
    assert_eq!(request.query.as_deref(), Some("search=Ali"));
}

#[tokio::test]
async fn test_read_after_ttl_refetches_and_restamps() {
    let backend = MockBackend::spawn().await;
    backend.reply_json(Method::GET, LIST, json!([record(1, "A", "S-1")]));
    let clock = ManualClock::new();
    let client =
        CachedCertificateClient::with_clock(&ClientConfig::new(backend.base_url()), Arc::new(clock.clone()))
            .unwrap();

    client.get_all().await.unwrap();
    let first_stamp = client.cache().entry("getAllServices").unwrap().stored_at;

    backend.reply_json(Method::GET, LIST, json!([record(1, "A", "S-1"), record(2, "B", "S-2")]));
    clock.advance(Duration::from_secs(5 * 60));

    let refreshed = client.get_all().await.unwrap();
    assert_eq!(refreshed.len(), 2);
    assert_eq!(backend.hits(Method::GET, LIST), 2);
    assert!(client.cache().entry("getAllServices").unwrap().stored_at > first_stamp);
}

#[tokio::test]
async fn test_distinct_operations_use_distinct_keys() {
    let backend = MockBackend::spawn().await;
    backend.reply_json(Method::GET, SEARCH_BY_NAME, json!([record(1, "Ali", "S-1")]));
    backend.reply_json(Method::GET, SEARCH_BY_SERIAL, json!([]));
    let client = client_for(&backend);

    assert_eq!(client.search_by_name("Ali").await.unwrap().len(), 1);
    assert!(client.search_by_serial_number("Ali").await.unwrap().is_empty());
    client.search_by_name("Mona").await.unwrap();

    assert_eq!(backend.hits(Method::GET, SEARCH_BY_NAME), 2);
    assert_eq!(backend.hits(Method::GET, SEARCH_BY_SERIAL), 1);
}

#[tokio::test]
async fn test_create_invalidates_cached_searches() {
    let backend = MockBackend::spawn().await;
    backend.reply_json(Method::GET, SEARCH_BY_NAME, json!([record(7, "Ali Hassan", "CERT-001")]));
    backend.reply_json(Method::GET, LIST, json!([record(7, "Ali Hassan", "CERT-001")]));
    backend.reply_json(Method::POST, "/Services/create", record(8, "Ali Hassan", "CERT-009"));
    let client = client_for(&backend);

    client.search_by_name("Ali").await.unwrap();
    client.get_all().await.unwrap();

    let created = client.create(&dto("CERT-009")).await.unwrap();
    assert_eq!(created.map(|c| c.id), Some(CertificateId(8)));
    assert!(client.cache().is_empty());

    backend.reply_json(
        Method::GET,
        SEARCH_BY_NAME,
        json!([record(7, "Ali Hassan", "CERT-001"), record(8, "Ali Hassan", "CERT-009")]),
    );
    let after = client.search_by_name("Ali").await.unwrap();
    assert_eq!(after.len(), 2);
    assert_eq!(backend.hits(Method::GET, SEARCH_BY_NAME), 2);

    let sent = backend.requests(Method::POST, "/Services/create")[0]
        .json_body()
        .unwrap();
    assert_eq!(sent["s_N"], "CERT-009");
    assert_eq!(sent["location"]["country"], "Egypt");
}

#[tokio::test]
async fn test_read_in_flight_during_write_is_not_cached() {
    let backend = MockBackend::spawn().await;
    backend.reply_json(Method::GET, SEARCH_BY_NAME, json!([record(7, "Ali Hassan", "CERT-001")]));
    backend.reply_json(Method::POST, "/Services/create", record(8, "Ali Hassan", "CERT-009"));
    backend.set_delay(Duration::from_millis(400));
    let client = client_for(&backend);

    let (stale, _) = tokio::join!(client.search_by_name("Ali"), async {
        // Let the search reach the backend before the write goes out
        tokio::time::sleep(Duration::from_millis(100)).await;
        backend.set_delay(Duration::ZERO);
        client.create(&dto("CERT-009")).await.unwrap();
    });
    assert_eq!(stale.unwrap().len(), 1);
    assert!(client.cache().is_empty());

    backend.reply_json(
        Method::GET,
        SEARCH_BY_NAME,
        json!([record(7, "Ali Hassan", "CERT-001"), record(8, "Ali Hassan", "CERT-009")]),
    );
    let fresh = client.search_by_name("Ali").await.unwrap();
    assert_eq!(fresh.len(), 2);
    assert_eq!(backend.hits(Method::GET, SEARCH_BY_NAME), 2);
}

#[tokio::test]
async fn test_failed_write_leaves_cache_untouched() {
    let backend = MockBackend::spawn().await;
    backend.reply_json(Method::GET, SEARCH_BY_NAME, json!([record(7, "Ali Hassan", "CERT-001")]));
    backend.reply_status(Method::POST, "/Services/create", StatusCode::INTERNAL_SERVER_ERROR);
    backend.reply_status(Method::DELETE, "/Services/delete/7", StatusCode::NOT_FOUND);
    let client = client_for(&backend);

    let cached = client.search_by_name("Ali").await.unwrap();

    let err = client.create(&dto("CERT-009")).await.unwrap_err();
    assert!(matches!(err, Error::Status(500)));
    let err = client.delete(CertificateId(7)).await.unwrap_err();
    assert!(matches!(err, Error::Status(404)));

    let again = client.search_by_name("Ali").await.unwrap();
    assert!(Arc::ptr_eq(&cached, &again));
    assert_eq!(backend.hits(Method::GET, SEARCH_BY_NAME), 1);
}

#[tokio::test]
async fn test_update_and_delete_hit_expected_routes_and_invalidate() {
    let backend = MockBackend::spawn().await;
    backend.reply_json(Method::GET, "/Services/getById", record(7, "Ali Hassan", "CERT-001"));
    backend.reply(
        Method::PUT,
        "/Services/update/7",
        Reply::Text(StatusCode::OK, "Updated".to_string()),
    );
    backend.reply(Method::DELETE, "/Services/delete/7", Reply::Text(StatusCode::NO_CONTENT, String::new()));
    let client = client_for(&backend);

    client.get_by_id(CertificateId(7)).await.unwrap();
    assert_eq!(client.cache().len(), 1);

    // A plain-text acknowledgement is a success with no echoed record
    let echoed = client.update(CertificateId(7), &dto("CERT-001")).await.unwrap();
    assert!(echoed.is_none());
    assert!(client.cache().is_empty());

    client.get_by_id(CertificateId(7)).await.unwrap();
    client.delete(CertificateId(7)).await.unwrap();
    assert!(client.cache().is_empty());

    assert_eq!(backend.hits(Method::PUT, "/Services/update/7"), 1);
    assert_eq!(backend.hits(Method::DELETE, "/Services/delete/7"), 1);
    assert_eq!(backend.hits(Method::GET, "/Services/getById"), 2);
}

#[tokio::test]
async fn test_get_by_id_unwraps_bare_object() {
    let backend = MockBackend::spawn().await;
    backend.reply_json(Method::GET, "/Services/getById", record(12, "Mona Adel", "CERT-012"));
    let client = client_for(&backend);

    let cert = client.get_by_id(CertificateId(12)).await.unwrap().unwrap();
    assert_eq!(cert.name, "Mona Adel");

    let request = &backend.requests(Method::GET, "/Services/getById")[0];
    assert_eq!(request.query.as_deref(), Some("id=12"));
}

#[tokio::test]
async fn test_empty_success_is_not_a_failure() {
    let backend = MockBackend::spawn().await;
    backend.reply_json(Method::GET, SEARCH_BY_SERIAL, json!({"$id": "1", "$values": []}));
    backend.reply_json(Method::GET, "/Services/getById", json!([]));
    let client = client_for(&backend);

    let results = client.search_by_serial_number("NOPE").await.unwrap();
    assert!(results.is_empty());
    assert!(client.get_by_id(CertificateId(404)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_error_status_is_typed_and_not_cached() {
    let backend = MockBackend::spawn().await;
    backend.reply_status(Method::GET, LIST, StatusCode::SERVICE_UNAVAILABLE);
    let client = client_for(&backend);

    let err = client.get_all().await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert!(client.cache().is_empty());

    backend.reply_json(Method::GET, LIST, json!([record(1, "A", "S-1")]));
    assert_eq!(client.get_all().await.unwrap().len(), 1);
    assert_eq!(backend.hits(Method::GET, LIST), 2);
}

#[tokio::test]
async fn test_slow_read_resolves_as_timeout() {
    let backend = MockBackend::spawn().await;
    backend.reply_json(Method::GET, SEARCH_BY_NAME, json!([record(1, "Ali", "S-1")]));
    backend.set_delay(Duration::from_millis(800));
    let config = ClientConfig::new(backend.base_url()).with_timeout(Duration::from_millis(100));
    let client = CachedCertificateClient::new(&config).unwrap();

    let err = client.search_by_name("Ali").await.unwrap_err();
    assert!(err.is_timeout());
    assert!(client.cache().is_empty());
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client =
        CachedCertificateClient::new(&ClientConfig::new(format!("http://{}/api", addr))).unwrap();

    let err = client.get_all().await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}
