use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use adyen_payment_engine::{
    adyen_api::{CaptureError, NotificationReceiverError, PaymentError, RefundError},
    traits::AdyenDbError,
};
use apg_common::CurrencyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The request could not be completed. {0}")]
    UnprocessableRequest(String),
    #[error("{0}")]
    PaymentFailed(String),
    #[error("The Adyen API could not be reached. {0}")]
    GatewayError(String),
    #[error("Notification rejected. {0}")]
    NotificationRejected(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingCredentials => StatusCode::UNAUTHORIZED,
                AuthError::InvalidCredentials(_) => StatusCode::UNAUTHORIZED,
                AuthError::ForbiddenPeer => StatusCode::FORBIDDEN,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::UnprocessableRequest(_) => StatusCode::BAD_REQUEST,
            Self::PaymentFailed(_) => StatusCode::BAD_REQUEST,
            Self::GatewayError(_) => StatusCode::BAD_GATEWAY,
            Self::NotificationRejected(_) => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No credentials were provided.")]
    MissingCredentials,
    #[error("The credentials are invalid. {0}")]
    InvalidCredentials(String),
    #[error("Requests from this address are not allowed.")]
    ForbiddenPeer,
}

impl From<AdyenDbError> for ServerError {
    fn from(e: AdyenDbError) -> Self {
        match e {
            AdyenDbError::OrderNotFound(_) |
            AdyenDbError::TransactionNotFound(_) |
            AdyenDbError::DeliveryNotFound(_) |
            AdyenDbError::NotificationNotFound(_) |
            AdyenDbError::LedgerEntryNotFound(_) => Self::NoRecordFound(e.to_string()),
            AdyenDbError::InvalidData(_) => Self::InvalidRequestBody(e.to_string()),
            AdyenDbError::DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<NotificationReceiverError> for ServerError {
    fn from(e: NotificationReceiverError) -> Self {
        match e {
            NotificationReceiverError::Authentication(msg) => Self::AuthenticationError(AuthError::InvalidCredentials(msg)),
            NotificationReceiverError::Validation(msg) => Self::NotificationRejected(msg),
            NotificationReceiverError::Database(e) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<CaptureError> for ServerError {
    fn from(e: CaptureError) -> Self {
        match e {
            CaptureError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            CaptureError::NoAuthorizedTransaction(_) |
            CaptureError::MissingPspReference(_) |
            CaptureError::DeliveryStateMismatch { .. } |
            CaptureError::Rejected(_) => Self::UnprocessableRequest(e.to_string()),
            CaptureError::Gateway(e) => Self::GatewayError(e.to_string()),
            CaptureError::Database(e) => e.into(),
        }
    }
}

impl From<RefundError> for ServerError {
    fn from(e: RefundError) -> Self {
        match e {
            RefundError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            RefundError::NotRefundable(_) |
            RefundError::NoRefundableTransaction(_) |
            RefundError::MissingPspReference(_) |
            RefundError::RefundExceedsTransaction { .. } |
            RefundError::InvalidTarget(_) |
            RefundError::Rejected(_) => Self::UnprocessableRequest(e.to_string()),
            RefundError::Gateway(e) => Self::GatewayError(e.to_string()),
            RefundError::Transition(e) => Self::BackendError(e.to_string()),
            RefundError::Database(e) => e.into(),
        }
    }
}

impl From<PaymentError> for ServerError {
    fn from(e: PaymentError) -> Self {
        match e {
            PaymentError::OrderNotFound(_) => Self::NoRecordFound(e.shopper_message()),
            PaymentError::NoPaymentResponse(_) => Self::NoRecordFound(e.to_string()),
            PaymentError::Database(_) | PaymentError::StateMachine(_) => Self::BackendError(e.shopper_message()),
            _ => Self::PaymentFailed(e.shopper_message()),
        }
    }
}

impl From<CurrencyError> for ServerError {
    fn from(e: CurrencyError) -> Self {
        Self::InvalidRequestBody(e.to_string())
    }
}

#[cfg(test)]
mod test {
    use adyen_tools::AdyenApiError;

    use super::*;

    #[test]
    fn gateway_details_are_hidden_from_shoppers() {
        let err = PaymentError::Gateway(AdyenApiError::GatewayError {
            status: 422,
            error_code: "101".into(),
            message: "Invalid card number".into(),
            psp_reference: None,
        });
        let err = ServerError::from(err);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "adyen.error");
        let err = ServerError::from(PaymentError::InvalidRequest("No payment method was given".into()));
        assert_eq!(err.to_string(), "Invalid payment request. No payment method was given");
    }

    #[test]
    fn not_refundable_is_a_bad_request() {
        let err = ServerError::from(RefundError::NotRefundable("1001".into()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let err = ServerError::from(RefundError::OrderNotFound("order-1".into()));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn failed_notification_checks_are_unauthorized() {
        let err = ServerError::from(NotificationReceiverError::Authentication("bad password".into()));
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        let err = ServerError::from(NotificationReceiverError::Validation("Invalid HMAC signature".into()));
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }
}
