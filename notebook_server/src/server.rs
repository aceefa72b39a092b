use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use notebook_engine::{
    api::{DirectoryApi, OrderFlowApi, StatusApi},
    render::WeeklyPdfRenderer,
    storage::LocalObjectStore,
    worker::ArtifactWorker,
    SqliteDatabase,
};

use crate::{
    config::ServerConfig,
    dispatch::JobDispatcher,
    errors::ServerError,
    routes::{health, CalendarsRoute, GenerateArtifactRoute, PurchaseStatusRoute, TriggerSessionRoute, UniversitiesRoute},
    sweeper::start_sweeper,
    webhook_routes::PaymentWebhookRoute,
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let _sweeper = start_sweeper(db.clone(), config.clone());
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn object_store(config: &ServerConfig) -> LocalObjectStore {
    LocalObjectStore::new(config.storage.root.clone(), config.storage.base_url.clone(), config.storage.signing_key.clone())
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let app_config = config.clone();
    let srv = HttpServer::new(move || {
        let config = app_config.clone();
        let order_api = OrderFlowApi::new(db.clone());
        let status_api = StatusApi::new(db.clone());
        let directory_api = DirectoryApi::new(db.clone());
        let dispatcher = JobDispatcher::new(config.dispatch.clone());
        let worker = ArtifactWorker::new(db.clone(), db.clone(), WeeklyPdfRenderer::new(), object_store(&config));
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("sng::access_log"))
            .app_data(web::Data::new(order_api))
            .app_data(web::Data::new(status_api))
            .app_data(web::Data::new(directory_api))
            .app_data(web::Data::new(dispatcher))
            .app_data(web::Data::new(worker))
            .app_data(web::Data::new(config.clone()))
            .service(health)
            .service(PaymentWebhookRoute::<SqliteDatabase>::new())
            .service(PurchaseStatusRoute::<SqliteDatabase>::new())
            .service(UniversitiesRoute::<SqliteDatabase>::new())
            .service(CalendarsRoute::<SqliteDatabase>::new())
            .service(TriggerSessionRoute::<SqliteDatabase>::new())
            .service(GenerateArtifactRoute::<SqliteDatabase, SqliteDatabase>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
