use log::*;

use crate::{
    adyen_api::{capture_api::CaptureApi, errors::WebhookError, transaction_state_api::TransactionStateApi},
    db_types::{MinorUnits, Notification, OrderTransaction, TransactionState},
    traits::{AdyenDatabase, PaymentGateway},
};

pub struct AuthorisationHandler<'a, B, G> {
    db: &'a B,
    states: &'a TransactionStateApi<B>,
    captures: &'a CaptureApi<B, G>,
}

impl<'a, B, G> AuthorisationHandler<'a, B, G>
where
    B: AdyenDatabase,
    G: PaymentGateway,
{
    pub fn new(db: &'a B, states: &'a TransactionStateApi<B>, captures: &'a CaptureApi<B, G>) -> Self {
        Self { db, states, captures }
    }

    pub async fn handle(
        &self,
        tx: &OrderTransaction,
        notification: &Notification,
        target_state: TransactionState,
        current_state: TransactionState,
    ) -> Result<(), WebhookError> {
        let id = tx.transaction_id.as_str();
        if !notification.success {
            if target_state == TransactionState::Failed {
                info!("🪝️ Authorisation of [{id}] failed: {}", notification.reason.as_deref().unwrap_or("no reason given"));
                self.states.fail(id).await?;
            }
            return Ok(());
        }
        if target_state == current_state {
            debug!("🪝️ Transaction [{id}] is already {current_state}. Nothing to do");
            return Ok(());
        }
        if tx.original_psp_reference.is_none() {
            self.db.set_original_psp_reference(id, &notification.psp_reference).await?;
        }
        let order = self
            .db
            .fetch_order_by_order_id(&tx.order_id)
            .await?
            .ok_or_else(|| WebhookError::InvalidData(format!("Order {} does not exist", tx.order_id)))?;
        let partial_payments = self.db.fetch_adyen_payments(&order.order_number).await?;
        if !partial_payments.is_empty() {
            let paid = partial_payments.iter().map(|p| p.amount_value).sum::<MinorUnits>();
            if paid > order.amount_total {
                return Err(WebhookError::InvalidData(format!(
                    "Partial payments of {paid} exceed the total of {} for order {}",
                    order.amount_total, order.order_number
                )));
            }
            if paid < order.amount_total {
                info!(
                    "🪝️ Order {} has {paid} of {} paid in partial payments. Waiting for the rest",
                    order.order_number, order.amount_total
                );
                return Ok(());
            }
        }
        let kind = tx
            .payment_method_kind()
            .ok_or_else(|| WebhookError::InvalidData(format!("{} is not an Adyen payment method", tx.payment_method)))?;
        if self.captures.requires_manual_capture(kind, order.sales_channel_id.as_deref()) {
            if current_state != TransactionState::Authorized {
                self.states.authorize(id).await?;
            }
            match self.captures.do_open_invoice_capture(&order.order_number, tx.amount).await {
                Ok(captures) => debug!("🪝️ {} capture(s) requested for order {}", captures.len(), order.order_number),
                Err(e) => warn!("🪝️ Order {} is authorized but could not be captured yet. {e}", order.order_number),
            }
        } else {
            self.states.pay(id).await?;
        }
        Ok(())
    }
}
