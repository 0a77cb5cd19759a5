//! # APG server
//! This crate hosts the HTTP server of the Adyen payment gateway. It is responsible for:
//! * Receiving webhook notifications from Adyen, authenticating them and storing them for later processing.
//! * Running the notification worker, which processes the stored notifications on a schedule.
//! * Serving the store API that the storefront's checkout uses to talk to Adyen.
//! * Serving the admin API for captures, refunds and notification maintenance.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/store-api/v{version}/adyen/notification`: The Adyen webhook.
//! * `/store-api/v{version}/adyen/...`: Checkout routes for the storefront.
//! * `/api/adyen/...`: Admin routes. These require the admin bearer token.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod hooks;
pub mod middleware;
pub mod notification_worker;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
