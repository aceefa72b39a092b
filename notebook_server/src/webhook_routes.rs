//----------------------------------------------   Webhook  ----------------------------------------------------

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use log::*;
use notebook_engine::{
    api::OrderFlowApi,
    db_types::PaidEventOutcome,
    traits::PaymentPipelineStore,
};

use crate::{
    config::ServerConfig,
    data_objects::{DispatchRequest, ProviderEvent, ReceivedResponse},
    dispatch::JobDispatcher,
    errors::ServerError,
    route,
    signature::{parse_signature_header, verify_signature, SIGNATURE_HEADER},
};

route!(payment_webhook => Post "/webhook/payment" impl PaymentPipelineStore);
/// Route handler for incoming payment provider events.
///
/// The raw body is verified against the provider signature before anything is parsed. Supported
/// events are applied exactly once; redeliveries acknowledge without writing or dispatching. The
/// applied-then-dispatch-failed case deliberately returns a 500 with the transition left
/// committed: the provider's retry acknowledges as a duplicate, and the sweeper picks the
/// committed order up and drives generation.
pub async fn payment_webhook<B: PaymentPipelineStore>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<OrderFlowApi<B>>,
    dispatcher: web::Data<JobDispatcher>,
    config: web::Data<ServerConfig>,
) -> Result<HttpResponse, ServerError> {
    trace!("🔐️ Received webhook request: {}", req.uri());
    let Some(secret) = &config.webhook_secret else {
        error!("🔐️ Webhook called but SNG_WEBHOOK_SECRET is not configured");
        return Err(ServerError::ConfigurationError("Webhook secret is not configured".to_string()));
    };
    let header = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(crate::signature::SignatureError)?;
    let parsed = parse_signature_header(header)?;
    verify_signature(&body, &parsed, secret, Utc::now().timestamp())?;
    trace!("🔐️ Webhook signature verified ✅️");

    let event: ProviderEvent = serde_json::from_slice(&body).map_err(|e| {
        debug!("💻️ Could not parse webhook payload. {e}");
        ServerError::CouldNotDeserializePayload
    })?;
    if !event.is_supported() {
        debug!("💻️ Ignoring unsupported event type {}", event.event_type);
        return Ok(HttpResponse::Ok().json(ReceivedResponse::acked()));
    }
    let paid = event.paid_event(config.storage_bucket.as_deref()).ok_or_else(|| {
        warn!("💻️ Event {} is missing mandatory metadata", event.id);
        ServerError::MissingMetadata
    })?;
    let session_id = paid.session_id.clone();

    let outcome = api.process_paid_event(paid.clone()).await.map_err(|e| {
        error!("💻️ Could not record paid event {}. {e}", event.id);
        ServerError::BackendError("Failed to update payment status".to_string())
    })?;
    if outcome == PaidEventOutcome::Duplicate {
        return Ok(HttpResponse::Ok().json(ReceivedResponse::acked()));
    }

    if let Some(session_id) = session_id {
        let request = DispatchRequest::from_event(&paid, &session_id, "payment_webhook");
        dispatcher.dispatch(&request).await.map_err(|e| {
            error!("💻️ Could not dispatch generation job for [{session_id}]. {e}");
            ServerError::DispatchError(e.to_string())
        })?;
    }
    Ok(HttpResponse::Ok().json(ReceivedResponse::acked()))
}
