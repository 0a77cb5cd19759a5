use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AdyenApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid Adyen configuration: {0}")]
    ConfigurationError(String),
    #[error("Invalid REST request: {0}")]
    RestRequestError(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Adyen rejected the request. Error {status}, code {error_code}. {message}")]
    GatewayError { status: u16, error_code: String, message: String, psp_reference: Option<String> },
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Invalid HMAC key: {0}")]
    InvalidHmacKey(String),
}

impl AdyenApiError {
    /// The Adyen `errorCode`, if the gateway returned a structured error.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::GatewayError { error_code, .. } => Some(error_code.as_str()),
            _ => None,
        }
    }
}
