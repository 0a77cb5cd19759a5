use crate::{
    db_types::{AdyenPayment, NewAdyenPayment, PaymentResponseRecord, PaymentStateData},
    traits::AdyenDbError,
};

#[allow(async_fn_in_trait)]
pub trait PaymentRecords {
    async fn insert_adyen_payment(&self, payment: NewAdyenPayment) -> Result<AdyenPayment, AdyenDbError>;

    /// All partial payments recorded for the merchant reference (order number).
    async fn fetch_adyen_payments(&self, merchant_reference: &str) -> Result<Vec<AdyenPayment>, AdyenDbError>;

    async fn save_payment_response(
        &self,
        transaction_id: &str,
        result_code: &str,
        response: &str,
    ) -> Result<PaymentResponseRecord, AdyenDbError>;

    async fn fetch_latest_payment_response(
        &self,
        transaction_id: &str,
    ) -> Result<Option<PaymentResponseRecord>, AdyenDbError>;

    /// Stores component state data under `token`, replacing anything stored under the same token.
    async fn save_state_data(&self, token: &str, state_data: &str) -> Result<PaymentStateData, AdyenDbError>;

    /// Fetches and deletes the state data stored under `token`.
    async fn take_state_data(&self, token: &str) -> Result<Option<PaymentStateData>, AdyenDbError>;
}
