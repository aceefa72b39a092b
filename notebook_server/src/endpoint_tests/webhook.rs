use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::Utc;
use notebook_engine::{
    api::OrderFlowApi,
    db_types::PaidEventOutcome,
    traits::PipelineError,
};
use sng_common::Secret;

use super::{
    helpers::{post_request, signature_header},
    mocks::MockPipelineStore,
};
use crate::{
    config::{DispatchConfig, ServerConfig},
    dispatch::JobDispatcher,
    webhook_routes::PaymentWebhookRoute,
};

const WEBHOOK_SECRET: &str = "whsec_endpoint_test";

fn event_body(event_type: &str, metadata: &str) -> String {
    format!(
        r#"{{"id":"evt_1","type":"{event_type}","data":{{"object":{{"id":"cs_1","metadata":{metadata},"customer_email":"buyer@example.com"}}}}}}"#
    )
}

fn complete_metadata() -> &'static str {
    r#"{"userId":"u1","calendarId":"c1","fiscalYear":"2025"}"#
}

fn signed_headers(body: &str) -> Vec<(&'static str, String)> {
    vec![("x-payment-signature", signature_header(WEBHOOK_SECRET, Utc::now().timestamp(), body))]
}

fn base_config() -> ServerConfig {
    ServerConfig { webhook_secret: Some(Secret::new(WEBHOOK_SECRET.to_string())), ..Default::default() }
}

fn register(cfg: &mut ServiceConfig, store: MockPipelineStore, config: ServerConfig) {
    cfg.service(PaymentWebhookRoute::<MockPipelineStore>::new())
        .app_data(web::Data::new(OrderFlowApi::new(store)))
        .app_data(web::Data::new(JobDispatcher::new(config.dispatch.clone())))
        .app_data(web::Data::new(config));
}

#[actix_web::test]
async fn unconfigured_secret_is_a_server_error() {
    let _ = env_logger::try_init().ok();
    let body = event_body("checkout.session.completed", complete_metadata());
    let headers = signed_headers(&body);
    let (status, response) = post_request("/webhook/payment", &headers, &body, |cfg| {
        register(cfg, MockPipelineStore::new(), ServerConfig::default());
    })
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.contains("not configured"));
}

#[actix_web::test]
async fn missing_or_forged_signature_is_rejected() {
    let _ = env_logger::try_init().ok();
    let body = event_body("checkout.session.completed", complete_metadata());
    let configure: fn(&mut ServiceConfig) = |cfg| register(cfg, MockPipelineStore::new(), base_config());

    let (status, response) = post_request("/webhook/payment", &[], &body, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response.contains("Invalid signature"));

    let forged = vec![("x-payment-signature", signature_header("wrong_secret", Utc::now().timestamp(), &body))];
    let (status, _) = post_request("/webhook/payment", &forged, &body, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let stale = vec![("x-payment-signature", signature_header(WEBHOOK_SECRET, Utc::now().timestamp() - 301, &body))];
    let (status, _) = post_request("/webhook/payment", &stale, &body, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn garbage_payload_is_a_bad_request() {
    let _ = env_logger::try_init().ok();
    let body = "this is not json";
    let headers = signed_headers(body);
    let (status, response) = post_request("/webhook/payment", &headers, body, |cfg| {
        register(cfg, MockPipelineStore::new(), base_config());
    })
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response.contains("Invalid payload"));
}

#[actix_web::test]
async fn unsupported_event_type_is_acknowledged_without_processing() {
    let _ = env_logger::try_init().ok();
    let body = event_body("invoice.paid", complete_metadata());
    let headers = signed_headers(&body);
    // No expectations set: any call into the store would panic.
    let (status, response) = post_request("/webhook/payment", &headers, &body, |cfg| {
        register(cfg, MockPipelineStore::new(), base_config());
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, r#"{"received":true}"#);
}

#[actix_web::test]
async fn missing_metadata_is_a_bad_request() {
    let _ = env_logger::try_init().ok();
    let body = event_body("checkout.session.completed", r#"{"calendarId":"c1"}"#);
    let headers = signed_headers(&body);
    let (status, response) = post_request("/webhook/payment", &headers, &body, |cfg| {
        register(cfg, MockPipelineStore::new(), base_config());
    })
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response.contains("Missing metadata"));
}

#[actix_web::test]
async fn applied_event_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let body = event_body("checkout.session.completed", complete_metadata());
    let headers = signed_headers(&body);
    let (status, response) = post_request("/webhook/payment", &headers, &body, |cfg| {
        let mut store = MockPipelineStore::new();
        store
            .expect_apply_paid_event()
            .withf(|e| e.event_id == "evt_1" && e.user_id.as_str() == "u1")
            .once()
            .returning(|_| Ok(PaidEventOutcome::Applied));
        register(cfg, store, base_config());
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, r#"{"received":true}"#);
}

#[actix_web::test]
async fn duplicate_event_is_acknowledged_without_dispatch() {
    let _ = env_logger::try_init().ok();
    let body = event_body("checkout.session.completed", complete_metadata());
    let headers = signed_headers(&body);
    let (status, response) = post_request("/webhook/payment", &headers, &body, |cfg| {
        let mut store = MockPipelineStore::new();
        store.expect_apply_paid_event().once().returning(|_| Ok(PaidEventOutcome::Duplicate));
        // A configured-but-unreachable worker URL proves dispatch is never attempted.
        let config = ServerConfig {
            dispatch: DispatchConfig { worker_url: Some("http://127.0.0.1:1/generate".to_string()), worker_token: None },
            ..base_config()
        };
        register(cfg, store, config);
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, r#"{"received":true}"#);
}

#[actix_web::test]
async fn store_failure_is_a_server_error() {
    let _ = env_logger::try_init().ok();
    let body = event_body("checkout.session.completed", complete_metadata());
    let headers = signed_headers(&body);
    let (status, response) = post_request("/webhook/payment", &headers, &body, |cfg| {
        let mut store = MockPipelineStore::new();
        store
            .expect_apply_paid_event()
            .once()
            .returning(|_| Err(PipelineError::DatabaseError("disk full".to_string())));
        register(cfg, store, base_config());
    })
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.contains("Failed to update payment status"));
}

#[actix_web::test]
async fn dispatch_failure_is_a_server_error_after_commit() {
    let _ = env_logger::try_init().ok();
    let body = event_body("checkout.session.completed", complete_metadata());
    let headers = signed_headers(&body);
    let (status, response) = post_request("/webhook/payment", &headers, &body, |cfg| {
        let mut store = MockPipelineStore::new();
        store.expect_apply_paid_event().once().returning(|_| Ok(PaidEventOutcome::Applied));
        let config = ServerConfig {
            dispatch: DispatchConfig { worker_url: Some("http://127.0.0.1:1/generate".to_string()), worker_token: None },
            ..base_config()
        };
        register(cfg, store, config);
    })
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.contains("worker"));
}
