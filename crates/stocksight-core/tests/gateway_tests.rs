//! Request gateway behavior against a wiremock server

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use stocksight_core::api::{ApiClient, ApiError, Period, RankBy, ReorderPolicy};
use stocksight_core::{CredentialStore, Route, RouteHistory};
use wiremock::{
    matchers::{header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn client(server: &MockServer) -> (ApiClient, Arc<CredentialStore>, Arc<RouteHistory>) {
    let credentials = Arc::new(CredentialStore::in_memory());
    let history = Arc::new(RouteHistory::new());
    let client = ApiClient::new(
        &server.uri(),
        Duration::from_secs(2),
        Arc::clone(&credentials),
        history.clone(),
    )
    .unwrap();
    (client, credentials, history)
}

#[tokio::test]
async fn test_bearer_token_is_attached_when_present() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dashboard/stock_status"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "low_stock": 3 })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, credentials, _) = client(&server);
    credentials.set(Some("abc".to_string()));

    let status = client.stock_status().await.unwrap();
    assert_eq!(status["low_stock"], 3);
}

#[tokio::test]
async fn test_requests_without_credential_are_unauthenticated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health/app"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .mount(&server)
        .await;

    let (client, _, _) = client(&server);
    client.health_app().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("authorization"));
}

#[tokio::test]
async fn test_query_parameters_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dashboard/sales_trends"))
        .and(query_param("period", "weekly"))
        .and(query_param("days", "14"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dashboard/top_products"))
        .and(query_param("metric", "revenue"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ai/replenishment/with_rop"))
        .and(query_param("default_lead_time_days", "7"))
        .and(query_param("safety_stock_days", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/kpi/comparison"))
        .and(query_param("product_ids", "1,2,3"))
        .and(query_param("metrics", "revenue,quantity"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _, _) = client(&server);
    client.sales_trends(Period::Weekly, 14).await.unwrap();
    client.top_products(RankBy::Revenue, 30, 5).await.unwrap();
    client
        .replenishment(Some(ReorderPolicy::default()))
        .await
        .unwrap();
    client
        .compare_products(&[1, 2, 3], &["revenue", "quantity"], 30)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_caller_supplied_segments_stay_in_their_route() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/..%2Fauth%2Flogout"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1 })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/kpi/metric/gross%20margin"))
        .and(query_param("days", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ai/forecast/17"))
        .and(query_param("horizon_days", "30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _, _) = client(&server);
    client.product("../auth/logout").await.unwrap();
    client.kpi_metric("gross margin", 7).await.unwrap();
    client.forecast("17", 30, 180).await.unwrap();
}

#[tokio::test]
async fn test_unauthorized_clears_credential_and_redirects() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/kpi/catalog"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let (client, credentials, history) = client(&server);
    credentials.set(Some("stale".to_string()));

    let err = client.kpi_catalog().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
    assert!(!credentials.is_present());
    assert_eq!(history.visited(), vec![Route::Login]);

    // A second 401 does not stack another redirect
    let _ = client.kpi_catalog().await;
    assert_eq!(history.visited(), vec![Route::Login]);
}

#[tokio::test]
async fn test_other_errors_propagate_without_clearing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/999"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "Product not found" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health/odoo"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "detail": "Admin access required" })))
        .mount(&server)
        .await;

    let (client, credentials, history) = client(&server);
    credentials.set(Some("tok".to_string()));

    let err = client.product("999").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(ref m) if m == "Product not found"));

    let err = client.health_odoo().await.unwrap_err();
    assert!(matches!(err, ApiError::AccessDenied(_)));

    assert_eq!(credentials.get().as_deref(), Some("tok"));
    assert!(history.visited().is_empty());
}

#[tokio::test]
async fn test_failures_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ai/alerts"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ai/segmentation"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _, _) = client(&server);
    assert!(matches!(client.alerts().await, Err(ApiError::ServerError(_))));
    assert!(matches!(client.segmentation(60).await, Err(ApiError::RateLimited)));
}

#[tokio::test]
async fn test_rejected_exchange_is_not_session_expiry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/demo/viewer"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "Demo user not found" })))
        .mount(&server)
        .await;

    let (client, credentials, history) = client(&server);
    credentials.set(Some("keep-me".to_string()));

    let err = client.demo_login(stocksight_core::Role::Viewer).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidCredentials(ref m) if m == "Demo user not found"));
    assert_eq!(credentials.get().as_deref(), Some("keep-me"));
    assert!(history.visited().is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let (client, credentials, _) = client(&server);
    credentials.set(Some("tok".to_string()));

    let err = client.me().await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidResponse(ref m) if m.contains("/auth/me")));
}
