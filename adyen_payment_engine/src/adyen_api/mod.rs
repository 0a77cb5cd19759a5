//! # Adyen payment engine API
//!
//! Each service is created from a database backend implementing the traits in [`crate::traits`] and, where it talks
//! to Adyen, a [`crate::traits::PaymentGateway`].
//!
//! * [`NotificationReceiver`] authenticates, deduplicates and stores incoming webhook notifications.
//! * [`NotificationProcessor`] processes stored notifications on a schedule, dispatching each to the handler for its
//!   event code (see [`webhook_handlers`]).
//! * [`TransactionStateApi`] is the only way order transactions change state.
//! * [`CaptureApi`] and [`RefundApi`] request captures and refunds and keep their ledgers.
//! * [`PaymentApi`] serves the storefront checkout.
//! * [`OrderApi`] keeps the gateway's copy of storefront orders current.
pub mod capture_api;
pub mod errors;
pub mod notification_api;
pub mod notification_processor;
pub mod order_api;
pub mod payment_api;
pub mod payment_objects;
pub mod refund_api;
pub mod result_handler;
pub mod transaction_state_api;
pub mod webhook_handlers;

pub use capture_api::CaptureApi;
pub use errors::{
    CaptureError,
    NotificationReceiverError,
    PaymentError,
    RefundError,
    StateMachineError,
    WebhookError,
};
pub use notification_api::{NotificationReceiver, ACCEPTED};
pub use notification_processor::{NotificationProcessor, ProcessingSummary};
pub use order_api::OrderApi;
pub use payment_api::PaymentApi;
pub use refund_api::RefundApi;
pub use result_handler::ResultHandler;
pub use transaction_state_api::TransactionStateApi;
pub use webhook_handlers::{WebhookHandler, WebhookHandlerFactory};
