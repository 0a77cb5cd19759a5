use std::{fmt::Debug, sync::Arc};

use adyen_tools::data_objects::{ModificationRequest, REFUND_RECEIVED};
use log::*;

use crate::{
    adyen_api::{errors::RefundError, transaction_state_api::TransactionStateApi, StateMachineError},
    db_types::{
        Amount,
        LedgerSource,
        LedgerStatus,
        MinorUnits,
        NewLedgerEntry,
        Notification,
        Order,
        OrderTransaction,
        Refund,
        TransactionState,
    },
    state_machine::TransitionAction,
    traits::{LedgerManagement, OrderManagement, PaymentGateway},
};

/// Merchant-initiated refunds and the refund ledger.
pub struct RefundApi<B, G> {
    db: B,
    gateway: Arc<G>,
    states: TransactionStateApi<B>,
}

impl<B, G> Debug for RefundApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RefundApi")
    }
}

impl<B: Clone, G> Clone for RefundApi<B, G> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), gateway: Arc::clone(&self.gateway), states: self.states.clone() }
    }
}

impl<B, G> RefundApi<B, G> {
    pub fn new(db: B, gateway: Arc<G>, states: TransactionStateApi<B>) -> Self {
        Self { db, gateway, states }
    }
}

impl<B, G> RefundApi<B, G>
where
    B: OrderManagement + LedgerManagement,
    G: PaymentGateway,
{
    /// Asks Adyen to refund `amount` of the order and records a pending refund.
    ///
    /// The transaction state is not touched here. That happens when the `REFUND` notification arrives.
    pub async fn refund(&self, order: &Order, amount: MinorUnits) -> Result<Refund, RefundError> {
        if !self.is_amount_refundable(order, amount).await? {
            warn!("💸️ Refund of {amount} for order {} exceeds the refundable amount", order.order_number);
            return Err(RefundError::NotRefundable(order.order_number.clone()));
        }
        let transactions = self.db.fetch_transactions(&order.order_id).await?;
        let tx = transactions
            .into_iter()
            .rev()
            .find(|tx| tx.payment_method_kind().is_some() && tx.state.is_refundable())
            .ok_or_else(|| RefundError::NoRefundableTransaction(order.order_number.clone()))?;
        let psp_reference =
            tx.original_psp_reference.clone().ok_or_else(|| RefundError::MissingPspReference(tx.transaction_id.clone()))?;
        let sales_channel = order.sales_channel_id.as_deref();
        let request = ModificationRequest {
            merchant_account: self.gateway.config(sales_channel).merchant_account.clone(),
            modification_amount: Some(Amount::new(amount, order.currency.as_str())),
            original_reference: psp_reference,
            reference: Some(order.order_number.clone()),
            additional_data: None,
        };
        let response = self.gateway.refund(sales_channel, &request).await?;
        if response.response != REFUND_RECEIVED {
            error!("💸️ Refund of order {} was not accepted: {}", order.order_number, response.response);
            return Err(RefundError::Rejected(response.response));
        }
        let entry = NewLedgerEntry {
            order_transaction_id: tx.transaction_id,
            psp_reference: response.psp_reference,
            amount,
            currency: order.currency.clone(),
            source: LedgerSource::Merchant,
            status: LedgerStatus::Pending,
        };
        let refund = self.db.insert_refund(entry).await?;
        info!("💸️ Refund {} of {amount} {} requested for order {}", refund.psp_reference, order.currency, order.order_number);
        Ok(refund)
    }

    pub async fn refund_order(&self, order_id: &str, amount: MinorUnits) -> Result<Refund, RefundError> {
        let order = self
            .db
            .fetch_order_by_order_id(order_id)
            .await?
            .ok_or_else(|| RefundError::OrderNotFound(order_id.to_string()))?;
        self.refund(&order, amount).await
    }

    /// False iff the non-failed refunds of the order plus `amount` would exceed the order total.
    pub async fn is_amount_refundable(&self, order: &Order, amount: MinorUnits) -> Result<bool, RefundError> {
        let refunds = self.db.fetch_refunds_for_order(&order.order_id).await?;
        let refunded = refunds.iter().filter(|r| r.status != LedgerStatus::Failed).map(|r| r.amount).sum::<MinorUnits>();
        trace!("💸️ Order {} has {refunded} refunded of {}", order.order_number, order.amount_total);
        Ok(refunded + amount <= order.amount_total)
    }

    /// Records the outcome of a refund notification in the ledger.
    ///
    /// The pending refund with the notification's PSP reference is settled if there is one. Otherwise the refund was
    /// initiated outside this gateway and a new row is recorded.
    pub async fn handle_refund_notification(
        &self,
        transaction: &OrderTransaction,
        notification: &Notification,
        status: LedgerStatus,
    ) -> Result<Refund, RefundError> {
        let existing =
            self.db.fetch_refund_by_psp_reference(&transaction.transaction_id, &notification.psp_reference).await?;
        let refund = match existing {
            Some(refund) => {
                debug!("💸️ Settling refund {} as {status}", refund.psp_reference);
                self.db.update_refund_status(refund.id, status).await?
            },
            None => {
                let amount = notification.amount().unwrap_or_else(|| Amount::new(transaction.amount, &transaction.currency));
                let entry = NewLedgerEntry {
                    order_transaction_id: transaction.transaction_id.clone(),
                    psp_reference: notification.psp_reference.clone(),
                    amount: amount.value,
                    currency: amount.currency,
                    source: LedgerSource::Adyen,
                    status,
                };
                debug!("💸️ Recording {status} refund {} from a notification", entry.psp_reference);
                self.db.insert_refund(entry).await?
            },
        };
        Ok(refund)
    }

    /// Moves the transaction into `target`, which must be one of the refund states.
    ///
    /// If the state machine refuses the transition, the transaction is forced to `paid` and the transition is tried
    /// once more. A second failure is returned as is.
    pub async fn do_refund(
        &self,
        transaction: &OrderTransaction,
        target: TransactionState,
    ) -> Result<OrderTransaction, RefundError> {
        let action = match target {
            TransactionState::Refunded => TransitionAction::Refund,
            TransactionState::RefundedPartially => TransitionAction::RefundPartially,
            other => return Err(RefundError::InvalidTarget(other)),
        };
        let id = transaction.transaction_id.as_str();
        match self.states.transition(id, action).await {
            Ok(tx) => Ok(tx),
            Err(StateMachineError::IllegalTransition { from, .. }) => {
                warn!("💸️ Cannot {action} transaction [{id}] from {from}. Forcing it to paid and retrying");
                self.states.pay(id).await?;
                let tx = self.states.transition(id, action).await?;
                Ok(tx)
            },
            Err(e) => Err(e.into()),
        }
    }

    pub async fn refunds_for_order(&self, order_id: &str) -> Result<Vec<Refund>, RefundError> {
        let refunds = self.db.fetch_refunds_for_order(order_id).await?;
        Ok(refunds)
    }
}
