use std::fmt::Debug;

use adyen_tools::data_objects::{PaymentResponse, ResultCode};
use log::*;

use crate::{
    adyen_api::{
        capture_api::CaptureApi,
        errors::{PaymentError, StateMachineError},
        payment_objects::PaymentOutcome,
        transaction_state_api::TransactionStateApi,
    },
    db_types::{Amount, CaptureMode, MinorUnits, NewAdyenPayment, Order, OrderTransaction},
    traits::{AdyenDatabase, PaymentGateway},
};

/// Applies the result of a `/payments` or `/payments/details` call to the order transaction.
pub struct ResultHandler<B, G> {
    db: B,
    states: TransactionStateApi<B>,
    captures: CaptureApi<B, G>,
}

impl<B, G> Debug for ResultHandler<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ResultHandler")
    }
}

impl<B, G> ResultHandler<B, G> {
    pub fn new(db: B, states: TransactionStateApi<B>, captures: CaptureApi<B, G>) -> Self {
        Self { db, states, captures }
    }
}

impl<B, G> ResultHandler<B, G>
where
    B: AdyenDatabase,
    G: PaymentGateway,
{
    /// `requested` is the amount the payment was made for. It is used for partial payments when Adyen does not echo
    /// the amount back.
    pub async fn handle(
        &self,
        order: &Order,
        tx: &OrderTransaction,
        response: &PaymentResponse,
        requested: Option<Amount>,
    ) -> Result<PaymentOutcome, PaymentError> {
        let id = tx.transaction_id.as_str();
        let raw = serde_json::to_string(response).map_err(|e| PaymentError::InvalidRequest(e.to_string()))?;
        self.db.save_payment_response(id, &response.result_code.to_string(), &raw).await?;
        if let Some(psp) = &response.psp_reference {
            if tx.original_psp_reference.is_none() {
                self.db.set_original_psp_reference(id, psp).await?;
            }
        }
        let kind = tx.payment_method_kind();
        let manual_capture =
            kind.is_some_and(|k| self.captures.requires_manual_capture(k, order.sales_channel_id.as_deref()));
        if let Some(adyen_order) = &response.order {
            if response.result_code == ResultCode::Authorised {
                let amount = response
                    .amount
                    .clone()
                    .or(requested)
                    .ok_or_else(|| PaymentError::InvalidRequest("A partial payment has no amount".into()))?;
                let payment = NewAdyenPayment {
                    psp_reference: response.psp_reference.clone().unwrap_or_default(),
                    merchant_reference: order.order_number.clone(),
                    merchant_order_reference: Some(adyen_order.psp_reference.clone()),
                    order_transaction_id: Some(tx.transaction_id.clone()),
                    payment_method: kind.map(|k| k.code().to_string()),
                    amount,
                    capture_mode: if manual_capture { CaptureMode::Manual } else { CaptureMode::Auto },
                };
                self.db.insert_adyen_payment(payment).await?;
            }
            let payments = self.db.fetch_adyen_payments(&order.order_number).await?;
            let paid = payments.iter().map(|p| p.amount_value).sum::<MinorUnits>();
            if paid > order.amount_total {
                return Err(PaymentError::PartialPaymentsExceedTotal {
                    paid: paid.value(),
                    total: order.amount_total.value(),
                });
            }
            if paid < order.amount_total {
                info!(
                    "💰️ Order {} has {} of {} left to pay. Waiting for further payments",
                    order.order_number,
                    order.amount_total - paid,
                    order.amount_total
                );
                return Ok(PaymentOutcome::from(response));
            }
        }
        let result = match response.result_code {
            ResultCode::Authorised if manual_capture => self.states.authorize(id).await,
            ResultCode::Authorised => self.states.pay(id).await,
            ResultCode::Refused | ResultCode::Error => self.states.fail(id).await,
            ResultCode::Cancelled => self.states.cancel(id).await,
            ResultCode::Pending | ResultCode::Received => self.states.process(id).await,
            code => {
                debug!("💰️ Payment for order {} returned {code}. No state change", order.order_number);
                return Ok(PaymentOutcome::from(response));
            },
        };
        match result {
            Ok(updated) => debug!("💰️ Transaction [{id}] is now {}", updated.state),
            // A webhook may already have moved the transaction on
            Err(e @ StateMachineError::IllegalTransition { .. }) => warn!("💰️ {e}. Leaving transaction [{id}] as is"),
            Err(e) => return Err(e.into()),
        }
        Ok(PaymentOutcome::from(response))
    }
}
