use log::*;
use notebook_engine::{
    render::WeeklyPdfRenderer,
    traits::PaymentPipelineStore,
    worker::ArtifactWorker,
    SqliteDatabase,
};
use tokio::task::JoinHandle;

use crate::{config::ServerConfig, server::object_store};

/// Starts the watchdog sweeper. Do not await the returned JoinHandle, as it runs indefinitely.
///
/// Each tick does two things: resets orders stuck in `generating_artifact` beyond the configured
/// timeout back to `paid_processing`, then drives the worker over everything that is waiting.
/// This is the out-of-band trigger that keeps the pipeline moving when webhook dispatch was
/// skipped, failed after the transition committed, or a previous worker died mid-render.
pub fn start_sweeper(db: SqliteDatabase, config: ServerConfig) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(std::time::Duration::from_secs(config.sweep_interval_secs));
        let worker = ArtifactWorker::new(db.clone(), db.clone(), WeeklyPdfRenderer::new(), object_store(&config));
        info!("🕰️ Generation sweeper started (every {}s)", config.sweep_interval_secs);
        loop {
            timer.tick().await;
            match db.requeue_stalled_generations(config.generation_timeout).await {
                Ok(stalled) if !stalled.is_empty() => {
                    warn!("🕰️ Requeued {} stalled generation(s): {}", stalled.len(), session_list(&stalled));
                },
                Ok(_) => trace!("🕰️ No stalled generations"),
                Err(e) => {
                    error!("🕰️ Error requeuing stalled generations: {e}");
                    continue;
                },
            }
            let awaiting = match db.orders_awaiting_generation().await {
                Ok(orders) => orders,
                Err(e) => {
                    error!("🕰️ Error fetching orders awaiting generation: {e}");
                    continue;
                },
            };
            if awaiting.is_empty() {
                continue;
            }
            info!("🕰️ {} order(s) awaiting generation", awaiting.len());
            for order in awaiting {
                if let Err(e) = worker.generate(&order.session_id).await {
                    // The worker has already marked the order failed; keep sweeping.
                    error!("🕰️ Generation for [{}] failed: {e}", order.session_id);
                }
            }
        }
    })
}

fn session_list(orders: &[notebook_engine::db_types::OrderRecord]) -> String {
    orders.iter().map(|o| o.session_id.to_string()).collect::<Vec<_>>().join(", ")
}
