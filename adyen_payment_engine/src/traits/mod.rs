//! # Backend contracts
//!
//! The traits in this module define what a database backend must provide to support the Adyen payment engine.
//!
//! * [`OrderManagement`] mirrors the storefront's orders, deliveries and order transactions.
//! * [`NotificationManagement`] stores incoming webhook notifications and tracks their processing.
//! * [`LedgerManagement`] keeps the capture and refund ledgers.
//! * [`PaymentRecords`] keeps partial payments, raw payment responses and stored component state data.
//! * [`AdyenDatabase`] ties them together.
//!
//! [`PaymentGateway`] is the outbound seam: everything the engine needs from Adyen itself.
mod adyen_database;
mod ledger_management;
mod notification_management;
mod order_management;
mod payment_gateway;
mod payment_records;

pub use adyen_database::{AdyenDatabase, AdyenDbError};
pub use ledger_management::LedgerManagement;
pub use notification_management::NotificationManagement;
pub use order_management::{InsertOrderResult, OrderManagement};
pub use payment_gateway::PaymentGateway;
pub use payment_records::PaymentRecords;
