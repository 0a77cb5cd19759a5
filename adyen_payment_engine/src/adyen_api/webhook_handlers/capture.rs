use log::*;

use crate::{
    adyen_api::{errors::WebhookError, transaction_state_api::TransactionStateApi},
    db_types::{LedgerSource, LedgerStatus, NewLedgerEntry, Notification, OrderTransaction, TransactionState},
    traits::AdyenDatabase,
};

pub struct CaptureHandler<'a, B> {
    db: &'a B,
    states: &'a TransactionStateApi<B>,
}

impl<'a, B: AdyenDatabase> CaptureHandler<'a, B> {
    pub fn new(db: &'a B, states: &'a TransactionStateApi<B>) -> Self {
        Self { db, states }
    }

    pub async fn handle(&self, tx: &OrderTransaction, notification: &Notification) -> Result<(), WebhookError> {
        let status = if notification.success { LedgerStatus::Success } else { LedgerStatus::Failed };
        self.record_capture(tx, notification, status).await?;
        let id = tx.transaction_id.as_str();
        if notification.success {
            if tx.state != TransactionState::Paid {
                self.states.pay(id).await?;
            }
        } else {
            warn!("🪝️ Capture {} of [{id}] failed", notification.psp_reference);
            self.states.fail(id).await?;
        }
        Ok(())
    }

    async fn record_capture(
        &self,
        tx: &OrderTransaction,
        notification: &Notification,
        status: LedgerStatus,
    ) -> Result<(), WebhookError> {
        match self.db.fetch_capture_by_psp_reference(&tx.transaction_id, &notification.psp_reference).await? {
            Some(capture) => {
                self.db.update_capture_status(capture.id, status).await?;
            },
            None => {
                let (amount, currency) = notification
                    .amount()
                    .map(|a| (a.value, a.currency))
                    .unwrap_or_else(|| (tx.amount, tx.currency.clone()));
                let entry = NewLedgerEntry {
                    order_transaction_id: tx.transaction_id.clone(),
                    psp_reference: notification.psp_reference.clone(),
                    amount,
                    currency,
                    source: LedgerSource::Adyen,
                    status,
                };
                self.db.insert_capture(entry).await?;
            },
        }
        debug!("🪝️ Capture {} recorded as {status}", notification.psp_reference);
        Ok(())
    }
}
