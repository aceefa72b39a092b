use actix_web::{http::StatusCode, web, web::ServiceConfig};
use notebook_engine::{render::WeeklyPdfRenderer, storage::LocalObjectStore, worker::ArtifactWorker};
use sng_common::Secret;

use super::{
    helpers::post_request,
    mocks::{MockCalendars, MockPipelineStore},
};
use crate::{
    config::{DispatchConfig, ServerConfig},
    routes::GenerateArtifactRoute,
};

const WORKER_TOKEN: &str = "worker-endpoint-test";

fn dispatch_body() -> &'static str {
    r#"{"userId":"u1","calendarId":"c1","fiscalYear":"2025","sessionId":"cs_1","source":"payment_webhook"}"#
}

fn gated_config() -> ServerConfig {
    ServerConfig {
        dispatch: DispatchConfig { worker_url: None, worker_token: Some(Secret::new(WORKER_TOKEN.to_string())) },
        ..Default::default()
    }
}

fn register(cfg: &mut ServiceConfig, store: MockPipelineStore, config: ServerConfig) {
    let storage = LocalObjectStore::new(
        std::env::temp_dir().join("notebook_worker_endpoint_test"),
        "http://localhost:4000/files",
        Secret::new("test-signing-key".to_string()),
    );
    let worker = ArtifactWorker::new(store, MockCalendars::new(), WeeklyPdfRenderer::new(), storage);
    cfg.service(GenerateArtifactRoute::<MockPipelineStore, MockCalendars>::new())
        .app_data(web::Data::new(worker))
        .app_data(web::Data::new(config));
}

#[actix_web::test]
async fn worker_endpoint_requires_the_bearer_token() {
    let _ = env_logger::try_init().ok();
    // No expectations set: a call that slips past the gate would panic.
    let configure: fn(&mut ServiceConfig) = |cfg| register(cfg, MockPipelineStore::new(), gated_config());

    let missing = vec![("content-type", "application/json".to_string())];
    let (status, _) = post_request("/worker/generate", &missing, dispatch_body(), configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let wrong = vec![
        ("content-type", "application/json".to_string()),
        ("Authorization", "Bearer not-the-token".to_string()),
    ];
    let (status, _) = post_request("/worker/generate", &wrong, dispatch_body(), configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn lost_claim_reports_skipped() {
    let _ = env_logger::try_init().ok();
    let headers = vec![
        ("content-type", "application/json".to_string()),
        ("Authorization", format!("Bearer {WORKER_TOKEN}")),
    ];
    let (status, body) = post_request("/worker/generate", &headers, dispatch_body(), |cfg| {
        let mut store = MockPipelineStore::new();
        store
            .expect_begin_generation()
            .withf(|s| s.as_str() == "cs_1")
            .once()
            .returning(|_| Ok(None));
        register(cfg, store, gated_config());
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"status":"skipped"}"#);
}
