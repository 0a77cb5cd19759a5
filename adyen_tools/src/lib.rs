//! A thin client for the parts of the Adyen API the payment gateway needs.
//!
//! * [`AdyenApi`] talks to the Checkout API (`/paymentMethods`, `/payments`, `/payments/details`, `/donations`,
//!   `/orders`, `/orders/cancel`) and to the classic Payment API modifications (`capture`, `refund`).
//! * [`AdyenConfigs`] holds the merchant configuration, with optional per-sales-channel overrides.
//! * [`hmac`] validates the signatures on incoming webhook notification items.
mod api;
mod config;
mod error;

pub mod data_objects;
pub mod hmac;

pub use api::AdyenApi;
pub use config::{channel_var_name, AdyenConfig, AdyenConfigs, AdyenEnvironment, DEFAULT_CAPTURE_DELIVERY_STATE};
pub use error::AdyenApiError;
