use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{Duration, Utc};
use notebook_engine::{
    api::{DirectoryApi, OrderFlowApi, StatusApi},
    db_types::{CalendarListing, OrderRecord, OrderStatus, OwnerRecord, University},
};
use sng_common::{Secret, SessionId, UserId};

use super::{
    helpers::{get_request, post_request},
    mocks::{MockDirectory, MockPipelineStore},
};
use crate::{
    config::ServerConfig,
    routes::{CalendarsRoute, PurchaseStatusRoute, TriggerSessionRoute, UniversitiesRoute},
};

fn order(session: &str, user: &str, status: OrderStatus) -> OrderRecord {
    OrderRecord {
        session_id: SessionId::from(session),
        user_id: UserId::from(user),
        status,
        status_updated_at: Utc::now(),
        calendar_id: "c1".to_string(),
        fiscal_year: "2025".to_string(),
        buyer_email: None,
        bucket: None,
        error_message: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn owner(user: &str, status: OrderStatus) -> OwnerRecord {
    OwnerRecord {
        user_id: UserId::from(user),
        status,
        status_updated_at: Utc::now(),
        session_id: None,
        calendar_id: Some("c1".to_string()),
        fiscal_year: Some("2025".to_string()),
        buyer_email: None,
        bucket: None,
        last_event_id: Some("evt_1".to_string()),
        error_message: None,
        download_url: None,
        download_expires_at: None,
        download_path: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn register_status(cfg: &mut ServiceConfig, store: MockPipelineStore) {
    cfg.service(PurchaseStatusRoute::<MockPipelineStore>::new()).app_data(web::Data::new(StatusApi::new(store)));
}

#[actix_web::test]
async fn unknown_session_reads_as_processing() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/purchase-status?session_id=cs_unknown", |cfg| {
        let mut store = MockPipelineStore::new();
        store.expect_fetch_order().returning(|_| Ok(None));
        register_status(cfg, store);
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"status":"processing"}"#);
}

#[actix_web::test]
async fn order_without_an_owner_record_reads_as_processing() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/purchase-status?session_id=cs_1", |cfg| {
        let mut store = MockPipelineStore::new();
        store.expect_fetch_order().returning(|_| Ok(Some(order("cs_1", "u1", OrderStatus::PaidProcessing))));
        store.expect_fetch_owner().returning(|_| Ok(None));
        register_status(cfg, store);
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"status":"processing"}"#);
}

#[actix_web::test]
async fn missing_session_id_is_a_bad_request() {
    let _ = env_logger::try_init().ok();
    let (status, _) = get_request("/purchase-status", |cfg| {
        register_status(cfg, MockPipelineStore::new());
    })
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn completed_order_reports_the_download_url() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/purchase-status?session_id=cs_1", |cfg| {
        let mut store = MockPipelineStore::new();
        store.expect_fetch_order().returning(|_| Ok(Some(order("cs_1", "u1", OrderStatus::Completed))));
        store.expect_fetch_owner().returning(|_| {
            let mut owner = owner("u1", OrderStatus::Completed);
            owner.download_url = Some("https://dl.example.com/a.pdf?expires=1&sig=ff".to_string());
            owner.download_expires_at = Some(Utc::now() + Duration::days(7));
            owner.download_path = Some("notebooks/u1/a.pdf".to_string());
            Ok(Some(owner))
        });
        register_status(cfg, store);
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""status":"completed""#));
    assert!(body.contains(r#""downloadUrl":"https://dl.example.com/a.pdf?expires=1&sig=ff""#));
}

#[actix_web::test]
async fn failed_order_reports_the_error_message() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/purchase-status?session_id=cs_1", |cfg| {
        let mut store = MockPipelineStore::new();
        store.expect_fetch_order().returning(|_| Ok(Some(order("cs_1", "u1", OrderStatus::Failed))));
        store.expect_fetch_owner().returning(|_| {
            let mut owner = owner("u1", OrderStatus::Failed);
            owner.error_message = Some("calendar backend offline".to_string());
            Ok(Some(owner))
        });
        register_status(cfg, store);
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""status":"failed""#));
    assert!(body.contains("calendar backend offline"));
    assert!(!body.contains("downloadUrl"));
}

//----------------------------------------------   Directory  ----------------------------------------------------

#[actix_web::test]
async fn universities_are_listed() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/universities", |cfg| {
        let mut directory = MockDirectory::new();
        directory.expect_fetch_universities().returning(|| {
            Ok(vec![University { id: "univ-1".to_string(), name: "Example University".to_string(), short_name: None }])
        });
        cfg.service(UniversitiesRoute::<MockDirectory>::new())
            .app_data(web::Data::new(DirectoryApi::new(directory)));
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""universities""#));
    assert!(body.contains("Example University"));
}

#[actix_web::test]
async fn calendars_are_filtered_by_university() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/calendars?university_id=univ-1", |cfg| {
        let mut directory = MockDirectory::new();
        directory.expect_fetch_calendars().withf(|u| u == &Some("univ-1")).returning(|_| {
            Ok(vec![CalendarListing {
                id: "c1".to_string(),
                university_id: "univ-1".to_string(),
                fiscal_year: "2025".to_string(),
                name: "Engineering".to_string(),
            }])
        });
        cfg.service(CalendarsRoute::<MockDirectory>::new()).app_data(web::Data::new(DirectoryApi::new(directory)));
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Engineering"));
}

//----------------------------------------------   Debug trigger  ----------------------------------------------------

fn register_trigger(cfg: &mut ServiceConfig, store: MockPipelineStore, config: ServerConfig) {
    cfg.service(TriggerSessionRoute::<MockPipelineStore>::new())
        .app_data(web::Data::new(OrderFlowApi::new(store)))
        .app_data(web::Data::new(config));
}

#[actix_web::test]
async fn debug_trigger_creates_a_session_outside_production() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request("/debug/trigger-session", &[], "", |cfg| {
        let mut store = MockPipelineStore::new();
        store
            .expect_insert_synthetic_session()
            .once()
            .returning(|s, u, _, _, _, _| Ok(order(s.as_str(), u.as_str(), OrderStatus::PaidProcessing)));
        register_trigger(cfg, store, ServerConfig::default());
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("sessionId"));
    assert!(body.contains("debug-user-"));
}

#[actix_web::test]
async fn debug_trigger_requires_the_token_in_production() {
    let _ = env_logger::try_init().ok();
    let configure_denied: fn(&mut ServiceConfig) = |cfg| {
        register_trigger(
            cfg,
            MockPipelineStore::new(),
            ServerConfig {
                production: true,
                debug_token: Some(Secret::new("super-secret".to_string())),
                ..Default::default()
            },
        );
    };
    let (status, _) = post_request("/debug/trigger-session", &[], "", configure_denied).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let wrong = vec![("x-debug-token", "nope".to_string())];
    let (status, _) = post_request("/debug/trigger-session", &wrong, "", configure_denied).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = post_request("/debug/trigger-session", &[("x-debug-token", "super-secret".to_string())], "", |cfg| {
        let mut store = MockPipelineStore::new();
        store
            .expect_insert_synthetic_session()
            .once()
            .returning(|s, u, _, _, _, _| Ok(order(s.as_str(), u.as_str(), OrderStatus::PaidProcessing)));
        register_trigger(
            cfg,
            store,
            ServerConfig {
                production: true,
                debug_token: Some(Secret::new("super-secret".to_string())),
                ..Default::default()
            },
        );
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("userId"));
}
