//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Any long, non-cpu-bound operation (I/O, database operations, etc.)
//! must be expressed as futures or asynchronous functions so that worker threads keep serving other requests.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use notebook_engine::{
    api::{DirectoryApi, OrderFlowApi, StatusApi},
    render::WeeklyPdfRenderer,
    storage::LocalObjectStore,
    traits::{CalendarSource, DirectoryStore, PaymentPipelineStore},
    worker::{ArtifactWorker, GenerationOutcome},
};
use serde_json::json;
use sng_common::SessionId;

use crate::{
    config::ServerConfig,
    data_objects::{CalendarQuery, DispatchRequest, StatusQuery, TriggerResponse},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Status  ----------------------------------------------------
route!(purchase_status => Get "/purchase-status" impl PaymentPipelineStore);
/// Route handler for the purchase status poll.
///
/// Clients poll this with the checkout `session_id` they were handed at payment time. Unknown
/// sessions read as `processing`; the client keeps polling until the pipeline lands in a terminal
/// state.
pub async fn purchase_status<B: PaymentPipelineStore>(
    query: web::Query<StatusQuery>,
    api: web::Data<StatusApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let session_id = query.into_inner().session_id.trim().to_string();
    if session_id.is_empty() {
        return Err(ServerError::InvalidRequestBody("session_id is required".to_string()));
    }
    trace!("💻️ GET purchase status for [{session_id}]");
    let status = api.purchase_status(&SessionId::from(session_id)).await?;
    Ok(HttpResponse::Ok().json(status))
}

//----------------------------------------------   Directory  ----------------------------------------------------
route!(universities => Get "/universities" impl DirectoryStore);
pub async fn universities<B: DirectoryStore>(api: web::Data<DirectoryApi<B>>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET universities");
    let universities = api.universities().await?;
    Ok(HttpResponse::Ok().json(json!({ "universities": universities })))
}

route!(calendars => Get "/calendars" impl DirectoryStore);
pub async fn calendars<B: DirectoryStore>(
    query: web::Query<CalendarQuery>,
    api: web::Data<DirectoryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let university_id = query.into_inner().university_id;
    trace!("💻️ GET calendars for university {university_id:?}");
    let calendars = api.calendars(university_id.as_deref()).await?;
    Ok(HttpResponse::Ok().json(json!({ "calendars": calendars })))
}

//----------------------------------------------   Debug trigger  ----------------------------------------------------
route!(trigger_session => Post "/debug/trigger-session" impl PaymentPipelineStore);
/// Creates a synthetic paid order so the generation pipeline can be exercised without a payment.
///
/// In production deployments the caller must present the shared token in `x-debug-token`.
pub async fn trigger_session<B: PaymentPipelineStore>(
    req: HttpRequest,
    api: web::Data<OrderFlowApi<B>>,
    config: web::Data<ServerConfig>,
) -> Result<HttpResponse, ServerError> {
    if config.production {
        let expected = config.debug_token.as_ref().ok_or(ServerError::Forbidden)?;
        let provided = req.headers().get("x-debug-token").and_then(|v| v.to_str().ok()).map(str::trim);
        if provided != Some(expected.reveal().trim()) {
            warn!("💻️ Debug trigger called with a missing or invalid token");
            return Err(ServerError::Forbidden);
        }
    }
    let order = api.create_debug_session().await?;
    info!("💻️ Debug session [{}] created", order.session_id);
    Ok(HttpResponse::Ok().json(TriggerResponse { session_id: order.session_id, user_id: order.user_id }))
}

//----------------------------------------------   Worker  ----------------------------------------------------
route!(generate_artifact => Post "/worker/generate" impl PaymentPipelineStore, CalendarSource);
/// The generation worker endpoint the webhook dispatches to.
///
/// Bearer-gated with the same token the dispatcher sends. Drives the artifact worker for exactly
/// one session; a lost claim is reported as `skipped` rather than an error.
pub async fn generate_artifact<B, C>(
    req: HttpRequest,
    body: web::Json<DispatchRequest>,
    worker: web::Data<ArtifactWorker<B, C, WeeklyPdfRenderer, LocalObjectStore>>,
    config: web::Data<ServerConfig>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentPipelineStore,
    C: CalendarSource,
{
    if let Some(token) = &config.dispatch.worker_token {
        let expected = format!("Bearer {}", token.reveal());
        let provided = req.headers().get("Authorization").and_then(|v| v.to_str().ok());
        if provided != Some(expected.as_str()) {
            warn!("💻️ Worker endpoint called with a missing or invalid bearer token");
            return Err(ServerError::Forbidden);
        }
    }
    let request = body.into_inner();
    debug!("💻️ Generation requested for [{}] (source: {})", request.session_id, request.source);
    match worker.generate(&request.session_id).await {
        Ok(GenerationOutcome::Completed(grant)) => {
            Ok(HttpResponse::Ok().json(json!({ "status": "completed", "downloadUrl": grant.url })))
        },
        Ok(GenerationOutcome::NotEligible) => Ok(HttpResponse::Ok().json(json!({ "status": "skipped" }))),
        Err(e) => {
            error!("💻️ Generation for [{}] failed: {e}", request.session_id);
            Err(ServerError::BackendError(e.to_string()))
        },
    }
}
