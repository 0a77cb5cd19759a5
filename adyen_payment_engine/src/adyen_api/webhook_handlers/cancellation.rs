use log::*;

use crate::{
    adyen_api::{errors::WebhookError, transaction_state_api::TransactionStateApi},
    db_types::{OrderTransaction, TransactionState},
    traits::OrderManagement,
};

/// Handles `CANCELLATION` and `OFFER_CLOSED` notifications. A payment that was cancelled or expired at Adyen fails the
/// transaction.
pub struct CancellationHandler<'a, B> {
    states: &'a TransactionStateApi<B>,
}

impl<'a, B: OrderManagement> CancellationHandler<'a, B> {
    pub fn new(states: &'a TransactionStateApi<B>) -> Self {
        Self { states }
    }

    pub async fn handle(&self, tx: &OrderTransaction, target_state: TransactionState) -> Result<(), WebhookError> {
        if target_state != TransactionState::Cancelled {
            debug!("🪝️ Ignoring cancellation of [{}], which is {}", tx.transaction_id, tx.state);
            return Ok(());
        }
        self.states.fail(&tx.transaction_id).await?;
        Ok(())
    }
}
