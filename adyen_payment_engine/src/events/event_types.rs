use serde::{Deserialize, Serialize};

use crate::db_types::{Notification, OrderTransaction, TransactionState};

/// Emitted after every successful transaction state transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionStateChangedEvent {
    pub transaction: OrderTransaction,
    pub old_state: TransactionState,
}

impl TransactionStateChangedEvent {
    pub fn new(transaction: OrderTransaction, old_state: TransactionState) -> Self {
        Self { transaction, old_state }
    }

    pub fn new_state(&self) -> TransactionState {
        self.transaction.state
    }
}

/// Emitted when a notification has failed too many times and will not be retried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationAbandonedEvent {
    pub notification: Notification,
}
