//! # System notebook gateway server
//! This module hosts the HTTP surface of the system-notebook pipeline. It is responsible for:
//! Listening for incoming payment provider webhook events and verifying their signatures.
//! Recording paid checkout sessions exactly once and handing them to the generation worker.
//! Answering purchase-status polls and directory queries.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/webhook/payment`: The webhook route for receiving paid checkout events from the provider.
//! * `/purchase-status`: The polling endpoint clients watch after checkout.
//! * `/worker/generate`: The bearer-gated generation worker endpoint.
//! * `/universities`, `/calendars`: Read-only directory listings.
//! * `/debug/trigger-session`: Token-gated synthetic order creation for debugging.

pub mod config;
pub mod data_objects;
pub mod dispatch;
pub mod errors;
pub mod routes;
pub mod server;
pub mod signature;
pub mod sweeper;
pub mod webhook_routes;

#[cfg(test)]
mod endpoint_tests;
