use thiserror::Error;

use crate::traits::{LedgerManagement, NotificationManagement, OrderManagement, PaymentRecords};

/// The highest level of behaviour for backends supporting the Adyen payment engine.
#[allow(async_fn_in_trait)]
pub trait AdyenDatabase:
    Clone + OrderManagement + NotificationManagement + LedgerManagement + PaymentRecords
{
    /// The URL of the database
    fn url(&self) -> &str;

    /// Closes the database connection pool.
    async fn close(&mut self) -> Result<(), AdyenDbError>;
}

#[derive(Debug, Clone, Error)]
pub enum AdyenDbError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(String),
    #[error("Order transaction {0} does not exist")]
    TransactionNotFound(String),
    #[error("Delivery {0} does not exist")]
    DeliveryNotFound(String),
    #[error("Notification {0} does not exist")]
    NotificationNotFound(i64),
    #[error("Ledger entry {0} does not exist")]
    LedgerEntryNotFound(i64),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<sqlx::Error> for AdyenDbError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}
