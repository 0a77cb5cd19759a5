use std::fmt::Display;

use adyen_payment_engine::db_types::{DeliveryState, PaymentCapture, Refund};
use adyen_tools::data_objects::AdyenOrderReference;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}

//----------------------------------------------   Admin  -------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureRequest {
    pub order_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureResult {
    pub success: bool,
    pub captures: Vec<PaymentCapture>,
}

/// A merchant refund. The amount is a decimal in the order currency, e.g. `12.50`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    pub order_id: String,
    pub refund_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundResult {
    pub success: bool,
    pub refund: Refund,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryUpdate {
    pub state: DeliveryState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryUpdateResult {
    pub delivery_id: String,
    pub state: DeliveryState,
    pub captures: Vec<PaymentCapture>,
}

//----------------------------------------------   Store API  ---------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderIdRequest {
    pub order_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrderRequest {
    pub order_id: String,
    pub order: AdyenOrderReference,
}

/// Component state data stored before the storefront order exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateDataRequest {
    pub token: String,
    pub state_data: Value,
}
