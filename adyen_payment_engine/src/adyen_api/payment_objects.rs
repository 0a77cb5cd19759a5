use adyen_tools::data_objects::{PaymentResponse, ResultCode};
use apg_common::Secret;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db_types::{AdyenPayment, MinorUnits};

/// HTTP basic-auth credentials sent along with a webhook notification.
#[derive(Debug, Clone)]
pub struct BasicAuthCredentials {
    pub username: String,
    pub password: Secret<String>,
}

impl BasicAuthCredentials {
    pub fn new<S: Into<String>>(username: S, password: S) -> Self {
        Self { username: username.into(), password: Secret::new(password.into()) }
    }
}

/// Parameters of a `/paymentMethods` lookup. The amount comes from the order when an order id is given.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodsParams {
    pub sales_channel_id: Option<String>,
    pub order_id: Option<String>,
    pub amount: Option<MinorUnits>,
    pub currency: Option<String>,
    pub country_code: Option<String>,
    pub shopper_locale: Option<String>,
    pub customer_id: Option<String>,
}

/// A storefront payment attempt for an order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayParams {
    pub order_id: String,
    /// The component state data, inline.
    #[serde(default)]
    pub state_data: Option<Value>,
    /// A token under which the state data was stored before the order was placed.
    #[serde(default)]
    pub state_data_token: Option<String>,
    pub return_url: Option<String>,
    pub shopper_ip: Option<String>,
    pub shopper_locale: Option<String>,
    pub origin: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetailsParams {
    pub order_id: String,
    pub details: Value,
    #[serde(default)]
    pub payment_data: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationParams {
    pub order_id: String,
    pub amount: MinorUnits,
    pub return_url: Option<String>,
}

/// What the storefront needs to know after a payment call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOutcome {
    pub result_code: ResultCode,
    pub is_final: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refusal_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Value>,
}

impl From<&PaymentResponse> for PaymentOutcome {
    fn from(response: &PaymentResponse) -> Self {
        Self {
            result_code: response.result_code,
            is_final: response.result_code.is_final(),
            action: response.action.clone(),
            refusal_reason: response.refusal_reason.clone(),
            order: response.order.as_ref().and_then(|o| serde_json::to_value(o).ok()),
        }
    }
}

/// The last known payment state of an order, for status polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatus {
    pub order_id: String,
    pub result_code: String,
    pub is_final: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Value>,
}

/// The partial payments of a multi-tender order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialPayments {
    pub order_id: String,
    pub order_total: MinorUnits,
    pub paid: MinorUnits,
    pub remaining: MinorUnits,
    pub payments: Vec<AdyenPayment>,
}

impl PartialPayments {
    pub fn new(order_id: String, order_total: MinorUnits, payments: Vec<AdyenPayment>) -> Self {
        let paid = payments.iter().map(|p| p.amount_value).sum::<MinorUnits>();
        Self { order_id, order_total, paid, remaining: order_total - paid, payments }
    }
}
