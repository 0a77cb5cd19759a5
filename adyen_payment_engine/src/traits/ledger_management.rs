use crate::{
    db_types::{LedgerStatus, NewLedgerEntry, PaymentCapture, Refund},
    traits::AdyenDbError,
};

/// Capture and refund ledgers. Rows are only ever inserted or moved to a new status; never deleted.
#[allow(async_fn_in_trait)]
pub trait LedgerManagement {
    async fn insert_capture(&self, capture: NewLedgerEntry) -> Result<PaymentCapture, AdyenDbError>;

    async fn update_capture_status(&self, id: i64, status: LedgerStatus) -> Result<PaymentCapture, AdyenDbError>;

    async fn fetch_capture_by_psp_reference(
        &self,
        transaction_id: &str,
        psp_reference: &str,
    ) -> Result<Option<PaymentCapture>, AdyenDbError>;

    async fn fetch_captures_for_order(&self, order_id: &str) -> Result<Vec<PaymentCapture>, AdyenDbError>;

    async fn insert_refund(&self, refund: NewLedgerEntry) -> Result<Refund, AdyenDbError>;

    async fn update_refund_status(&self, id: i64, status: LedgerStatus) -> Result<Refund, AdyenDbError>;

    async fn fetch_refund_by_psp_reference(
        &self,
        transaction_id: &str,
        psp_reference: &str,
    ) -> Result<Option<Refund>, AdyenDbError>;

    async fn fetch_refunds_for_order(&self, order_id: &str) -> Result<Vec<Refund>, AdyenDbError>;
}
