// HTTP-level tests for `ApiClient` using wiremock.

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use taxdeck_api::{ApiClient, Error, Tax};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    (server, client)
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_list_taxes() {
    let (server, client) = setup().await;

    let body = json!([
        { "id": "1", "name": "VAT", "country": "France", "rate": 0.2 },
        { "id": "2", "name": "GST", "country": "Canada" },
    ]);

    Mock::given(method("GET"))
        .and(path("/taxes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let taxes = client.list_taxes().await.unwrap();

    assert_eq!(taxes.len(), 2);
    assert_eq!(taxes[0].id, "1");
    assert_eq!(taxes[0].name, "VAT");
    assert_eq!(taxes[0].country, "France");
    assert_eq!(taxes[0].extra.get("rate"), Some(&json!(0.2)));
    assert_eq!(taxes[1].name, "GST");
    assert!(taxes[1].extra.is_empty());
}

#[tokio::test]
async fn test_list_taxes_empty() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/taxes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let taxes = client.list_taxes().await.unwrap();
    assert!(taxes.is_empty());
}

#[tokio::test]
async fn test_get_tax() {
    let (server, client) = setup().await;

    let body = json!({
        "id": "9",
        "name": "Sales Tax",
        "country": "USA",
        "rate": 0.07,
        "createdAt": "2024-01-15T08:30:00Z"
    });

    Mock::given(method("GET"))
        .and(path("/taxes/9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let tax = client.get_tax("9").await.unwrap();

    assert_eq!(tax.id, "9");
    assert_eq!(tax.name, "Sales Tax");
    assert_eq!(tax.extra.get("rate"), Some(&json!(0.07)));
    assert_eq!(
        tax.extra.get("createdAt"),
        Some(&json!("2024-01-15T08:30:00Z"))
    );
}

#[tokio::test]
async fn test_update_tax_sends_full_record() {
    let (server, client) = setup().await;

    let payload: Tax = serde_json::from_value(json!({
        "id": "1",
        "name": "VAT2",
        "country": "Germany",
        "rate": 0.2
    }))
    .unwrap();

    // The PUT body must carry every field of the payload, including the
    // `rate` field this client never interprets.
    Mock::given(method("PUT"))
        .and(path("/taxes/1"))
        .and(body_json(json!({
            "id": "1",
            "name": "VAT2",
            "country": "Germany",
            "rate": 0.2
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "1",
            "name": "VAT2",
            "country": "Germany",
            "rate": 0.2,
            "updatedAt": "2024-06-01T00:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let saved = client.update_tax("1", &payload).await.unwrap();

    assert_eq!(saved.name, "VAT2");
    assert_eq!(saved.country, "Germany");
    assert_eq!(saved.extra.get("rate"), Some(&json!(0.2)));
    assert_eq!(
        saved.extra.get("updatedAt"),
        Some(&json!("2024-06-01T00:00:00Z"))
    );
}

#[tokio::test]
async fn test_list_countries() {
    let (server, client) = setup().await;

    let body = json!([
        { "id": "1", "name": "France", "flag": "🇫🇷" },
        { "id": "2", "name": "Germany" },
    ]);

    Mock::given(method("GET"))
        .and(path("/countries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let countries = client.list_countries().await.unwrap();

    assert_eq!(countries.len(), 2);
    assert_eq!(countries[0].name, "France");
    assert_eq!(countries[1].id, "2");
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_error_500_list() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/taxes"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = client.list_taxes().await;

    match result {
        Err(Error::Api { status, ref message }) => {
            assert_eq!(status, 500);
            assert!(!message.is_empty());
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_error_404_get() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/taxes/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("\"Not found\""))
        .mount(&server)
        .await;

    let err = client.get_tax("missing").await.unwrap_err();

    assert!(err.is_not_found(), "expected not-found, got: {err:?}");
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_error_400_update() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/taxes/1"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .mount(&server)
        .await;

    let tax = Tax::new("1", "VAT", "France");
    let result = client.update_tax("1", &tax).await;

    match result {
        Err(Error::Api { status, ref message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "bad request");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_decode_error_on_invalid_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/taxes"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let result = client.list_taxes().await;

    match result {
        Err(Error::Deserialization { ref body, .. }) => {
            assert_eq!(body, "not json");
        }
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}
