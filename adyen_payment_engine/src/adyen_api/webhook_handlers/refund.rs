use log::*;

use crate::{
    adyen_api::{
        errors::{RefundError, WebhookError},
        refund_api::RefundApi,
        transaction_state_api::TransactionStateApi,
    },
    db_types::{LedgerStatus, Notification, OrderTransaction, TransactionState},
    traits::{AdyenDatabase, PaymentGateway},
};

/// Handles `REFUND` and `CANCEL_OR_REFUND` notifications.
pub struct RefundHandler<'a, B, G> {
    states: &'a TransactionStateApi<B>,
    refunds: &'a RefundApi<B, G>,
}

impl<'a, B, G> RefundHandler<'a, B, G>
where
    B: AdyenDatabase,
    G: PaymentGateway,
{
    pub fn new(states: &'a TransactionStateApi<B>, refunds: &'a RefundApi<B, G>) -> Self {
        Self { states, refunds }
    }

    /// With `may_cancel`, an unpaid transaction is cancelled rather than refunded.
    pub async fn handle(
        &self,
        tx: &OrderTransaction,
        notification: &Notification,
        target_state: TransactionState,
        may_cancel: bool,
    ) -> Result<(), WebhookError> {
        if !notification.success {
            warn!("🪝️ Refund {} of [{}] failed", notification.psp_reference, tx.transaction_id);
            self.refunds.handle_refund_notification(tx, notification, LedgerStatus::Failed).await?;
            return Ok(());
        }
        if may_cancel && target_state == TransactionState::Cancelled {
            info!("🪝️ Payment of [{}] was cancelled before capture", tx.transaction_id);
            self.states.cancel(&tx.transaction_id).await?;
            return Ok(());
        }
        let amount = notification.amount().ok_or_else(|| WebhookError::MissingAmount(notification.psp_reference.clone()))?;
        if amount.value > tx.amount {
            return Err(RefundError::RefundExceedsTransaction { refund: amount.value.value(), transaction: tx.amount.value() }
                .into());
        }
        let target =
            if amount.value == tx.amount { TransactionState::Refunded } else { TransactionState::RefundedPartially };
        self.refunds.handle_refund_notification(tx, notification, LedgerStatus::Success).await?;
        let updated = self.refunds.do_refund(tx, target).await?;
        debug!("🪝️ Transaction [{}] is now {}", updated.transaction_id, updated.state);
        Ok(())
    }
}

pub struct RefundFailedHandler<'a, B, G> {
    refunds: &'a RefundApi<B, G>,
}

impl<'a, B, G> RefundFailedHandler<'a, B, G>
where
    B: AdyenDatabase,
    G: PaymentGateway,
{
    pub fn new(refunds: &'a RefundApi<B, G>) -> Self {
        Self { refunds }
    }

    pub async fn handle(&self, tx: &OrderTransaction, notification: &Notification) -> Result<(), WebhookError> {
        warn!("🪝️ Adyen reports that refund {} of [{}] failed", notification.psp_reference, tx.transaction_id);
        self.refunds.handle_refund_notification(tx, notification, LedgerStatus::Failed).await?;
        Ok(())
    }
}
