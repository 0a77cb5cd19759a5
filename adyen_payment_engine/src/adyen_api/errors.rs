use adyen_tools::AdyenApiError;
use thiserror::Error;

use crate::{
    db_types::{DeliveryState, TransactionState},
    state_machine::TransitionAction,
    traits::AdyenDbError,
};

/// Gateway error codes whose message may be shown to the shopper as-is.
pub const SHOPPER_VISIBLE_ERROR_CODES: [&str; 1] = ["124"];

/// The message shown to shoppers for every other gateway failure.
pub const GENERIC_SHOPPER_ERROR: &str = "adyen.error";

#[derive(Debug, Clone, Error)]
pub enum StateMachineError {
    #[error("Cannot {action} a transaction in state {from}")]
    IllegalTransition { from: TransactionState, action: TransitionAction },
    #[error("Order transaction {0} does not exist")]
    TransactionNotFound(String),
    #[error("Database error: {0}")]
    Database(#[from] AdyenDbError),
}

#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("Order {0} does not exist")]
    OrderNotFound(String),
    #[error("Order {0} has no authorized Adyen transaction")]
    NoAuthorizedTransaction(String),
    #[error("Transaction {0} has no PSP reference to capture against")]
    MissingPspReference(String),
    #[error("Delivery {delivery_id} is {actual}, but captures are only made for {expected} deliveries")]
    DeliveryStateMismatch { delivery_id: String, expected: String, actual: DeliveryState },
    #[error("Adyen did not accept the capture request: {0}")]
    Rejected(String),
    #[error("Gateway error: {0}")]
    Gateway(#[from] AdyenApiError),
    #[error("Database error: {0}")]
    Database(#[from] AdyenDbError),
}

#[derive(Debug, Clone, Error)]
pub enum RefundError {
    #[error("Order {0} does not exist")]
    OrderNotFound(String),
    #[error("The requested amount cannot be refunded for order {0}")]
    NotRefundable(String),
    #[error("Order {0} has no refundable Adyen transaction")]
    NoRefundableTransaction(String),
    #[error("Transaction {0} has no PSP reference to refund against")]
    MissingPspReference(String),
    #[error("Refund of {refund} exceeds the transaction amount of {transaction}")]
    RefundExceedsTransaction { refund: i64, transaction: i64 },
    #[error("{0} is not a refund state")]
    InvalidTarget(TransactionState),
    #[error("Adyen did not accept the refund request: {0}")]
    Rejected(String),
    #[error("Gateway error: {0}")]
    Gateway(#[from] AdyenApiError),
    #[error("Could not move the transaction to its refund state. {0}")]
    Transition(#[from] StateMachineError),
    #[error("Database error: {0}")]
    Database(#[from] AdyenDbError),
}

#[derive(Debug, Clone, Error)]
pub enum NotificationReceiverError {
    #[error("Notification authentication failed. {0}")]
    Authentication(String),
    #[error("Invalid notification. {0}")]
    Validation(String),
    #[error("Database error: {0}")]
    Database(#[from] AdyenDbError),
}

#[derive(Debug, Clone, Error)]
pub enum WebhookError {
    #[error("Notification {0} has no amount")]
    MissingAmount(String),
    #[error("Invalid notification data. {0}")]
    InvalidData(String),
    #[error(transparent)]
    StateMachine(#[from] StateMachineError),
    #[error(transparent)]
    Refund(#[from] RefundError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error("Database error: {0}")]
    Database(#[from] AdyenDbError),
}

#[derive(Debug, Clone, Error)]
pub enum PaymentError {
    #[error("Order {0} does not exist")]
    OrderNotFound(String),
    #[error("Order {0} has no Adyen transaction")]
    NoAdyenTransaction(String),
    #[error("Invalid payment request. {0}")]
    InvalidRequest(String),
    #[error("No component state data was found for token {0}")]
    StateDataNotFound(String),
    #[error("No payment response has been stored for order {0}")]
    NoPaymentResponse(String),
    #[error("Nothing is left to pay for order {0}")]
    NothingLeftToPay(String),
    #[error("Partial payments of {paid} would exceed the order total of {total}")]
    PartialPaymentsExceedTotal { paid: i64, total: i64 },
    #[error("Gateway error: {0}")]
    Gateway(#[from] AdyenApiError),
    #[error(transparent)]
    StateMachine(#[from] StateMachineError),
    #[error("Database error: {0}")]
    Database(#[from] AdyenDbError),
}

impl PaymentError {
    /// The message that is safe to show to the shopper.
    pub fn shopper_message(&self) -> String {
        match self {
            Self::Gateway(e) => match e.error_code() {
                Some(code) if SHOPPER_VISIBLE_ERROR_CODES.contains(&code) => match e {
                    AdyenApiError::GatewayError { message, .. } => message.clone(),
                    _ => GENERIC_SHOPPER_ERROR.to_string(),
                },
                _ => GENERIC_SHOPPER_ERROR.to_string(),
            },
            Self::InvalidRequest(_) | Self::StateDataNotFound(_) | Self::NothingLeftToPay(_) => self.to_string(),
            _ => GENERIC_SHOPPER_ERROR.to_string(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn gateway_error(code: &str) -> PaymentError {
        PaymentError::Gateway(AdyenApiError::GatewayError {
            status: 422,
            error_code: code.to_string(),
            message: "Unable to decrypt data".to_string(),
            psp_reference: None,
        })
    }

    #[test]
    fn only_allow_listed_gateway_errors_reach_the_shopper() {
        assert_eq!(gateway_error("124").shopper_message(), "Unable to decrypt data");
        assert_eq!(gateway_error("101").shopper_message(), GENERIC_SHOPPER_ERROR);
        let err = PaymentError::Gateway(AdyenApiError::RestResponseError("timeout".into()));
        assert_eq!(err.shopper_message(), GENERIC_SHOPPER_ERROR);
        let err = PaymentError::Database(AdyenDbError::DatabaseError("locked".into()));
        assert_eq!(err.shopper_message(), GENERIC_SHOPPER_ERROR);
    }
}
