//! Adyen Payment Engine
//!
//! The engine reconciles storefront orders with Adyen. It receives and processes webhook notifications, drives order
//! transactions through their payment states, and requests captures, refunds and Checkout API payments.
//!
//! The library is divided into three main sections:
//! 1. Storage. [`traits`] define what a backend must provide; [`SqliteDatabase`] is the SQLite implementation. The
//!    row types live in [`db_types`].
//! 2. The transaction state machine ([`state_machine`]) and the supported payment methods ([`payment_methods`]).
//! 3. The engine services in [`adyen_api`], each built from a backend and, where needed, a payment gateway.
//!
//! State changes are published as [`events`] that other components can subscribe to.
pub mod adyen_api;
pub mod db_types;
pub mod events;
pub mod payment_methods;
pub mod state_machine;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use adyen_api::{
    CaptureApi,
    NotificationProcessor,
    NotificationReceiver,
    OrderApi,
    PaymentApi,
    RefundApi,
    TransactionStateApi,
    WebhookHandlerFactory,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
#[cfg(feature = "sqlite")]
pub use sqlite::db::db_url;
