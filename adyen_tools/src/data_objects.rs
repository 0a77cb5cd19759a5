use std::{
    collections::{BTreeMap, HashMap},
    fmt::Display,
};

use apg_common::MinorUnits;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const CAPTURE_RECEIVED: &str = "[capture-received]";
pub const REFUND_RECEIVED: &str = "[refund-received]";
pub const CANCEL_RECEIVED: &str = "[cancel-received]";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Amount {
    pub currency: String,
    pub value: MinorUnits,
}

impl Amount {
    pub fn new<S: Into<String>>(value: MinorUnits, currency: S) -> Self {
        Self { currency: currency.into(), value }
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.value, self.currency)
    }
}

//-------------------------------------------  Checkout API  ----------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodsRequest {
    pub merchant_account: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shopper_locale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shopper_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

/// A line item for open-invoice payment methods.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: String,
    pub description: String,
    pub quantity: i64,
    pub amount_excluding_tax: MinorUnits,
    pub amount_including_tax: MinorUnits,
    pub tax_amount: MinorUnits,
    /// Tax rate in basis points (`2100` is 21%).
    pub tax_percentage: i64,
}

/// Identifies an Adyen order (a multi-tender payment session).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AdyenOrderReference {
    pub psp_reference: String,
    pub order_data: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub merchant_account: String,
    pub amount: Option<Amount>,
    pub reference: String,
    pub payment_method: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shopper_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shopper_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shopper_locale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shopper_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_info: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_items: Option<Vec<LineItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_data: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<AdyenOrderReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_payment_method: Option<bool>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ResultCode {
    Authorised,
    AuthenticationFinished,
    AuthenticationNotRequired,
    Cancelled,
    ChallengeShopper,
    Error,
    IdentifyShopper,
    PartiallyAuthorised,
    Pending,
    PresentToShopper,
    Received,
    RedirectShopper,
    Refused,
    #[serde(other)]
    Unknown,
}

impl ResultCode {
    /// A final result code will not change any more for this payment attempt.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Authorised | Self::Refused | Self::Error | Self::Cancelled)
    }

    /// The shopper must complete an action (redirect, 3DS, voucher) before the result is known.
    pub fn requires_action(&self) -> bool {
        matches!(self, Self::RedirectShopper | Self::IdentifyShopper | Self::ChallengeShopper | Self::PresentToShopper)
    }
}

impl Display for ResultCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Authorised => "Authorised",
            Self::AuthenticationFinished => "AuthenticationFinished",
            Self::AuthenticationNotRequired => "AuthenticationNotRequired",
            Self::Cancelled => "Cancelled",
            Self::ChallengeShopper => "ChallengeShopper",
            Self::Error => "Error",
            Self::IdentifyShopper => "IdentifyShopper",
            Self::PartiallyAuthorised => "PartiallyAuthorised",
            Self::Pending => "Pending",
            Self::PresentToShopper => "PresentToShopper",
            Self::Received => "Received",
            Self::RedirectShopper => "RedirectShopper",
            Self::Refused => "Refused",
            Self::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// The state of an Adyen order, as returned by `/orders` and embedded in payment responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutOrderStatus {
    pub psp_reference: String,
    pub order_data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_amount: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_code: Option<String>,
}

impl CheckoutOrderStatus {
    pub fn remaining_value(&self) -> MinorUnits {
        self.remaining_amount.as_ref().map(|a| a.value).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub result_code: ResultCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub psp_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refusal_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refusal_reason_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub donation_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<CheckoutOrderStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_data: Option<HashMap<String, String>>,
}

impl PaymentResponse {
    pub fn new(result_code: ResultCode) -> Self {
        Self {
            result_code,
            psp_reference: None,
            merchant_reference: None,
            amount: None,
            action: None,
            refusal_reason: None,
            refusal_reason_code: None,
            donation_token: None,
            order: None,
            additional_data: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetailsRequest {
    pub details: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_data: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRequest {
    pub merchant_account: String,
    pub amount: Option<Amount>,
    pub reference: String,
    pub payment_method: Value,
    pub donation_token: String,
    pub donation_original_psp_reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donation_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
    pub shopper_interaction: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub merchant_account: String,
    pub amount: Option<Amount>,
    pub reference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrderRequest {
    pub merchant_account: String,
    pub order: AdyenOrderReference,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrderResponse {
    pub psp_reference: String,
    pub result_code: String,
}

//-------------------------------------------  Payment API (modifications)  -------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModificationRequest {
    pub merchant_account: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modification_amount: Option<Amount>,
    pub original_reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_data: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModificationResponse {
    pub psp_reference: String,
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_data: Option<HashMap<String, String>>,
}

/// The error body Adyen returns on 4xx/5xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdyenErrorBody {
    pub status: u16,
    pub error_code: String,
    pub message: String,
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub psp_reference: Option<String>,
}

//-------------------------------------------  Notifications  ---------------------------------------------------------

/// The body of an Adyen standard webhook.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationRequest {
    #[serde(default)]
    pub live: Option<String>,
    #[serde(rename = "notificationItems", default)]
    pub notification_items: Vec<NotificationItem>,
}

impl NotificationRequest {
    pub fn items(&self) -> impl Iterator<Item = &NotificationRequestItem> {
        self.notification_items.iter().map(|i| &i.item)
    }

    pub fn is_live(&self) -> bool {
        self.live.as_deref().map(|s| s.eq_ignore_ascii_case("true")).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationItem {
    #[serde(rename = "NotificationRequestItem")]
    pub item: NotificationRequestItem,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequestItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_data: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    pub event_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_date: Option<String>,
    pub merchant_account_code: String,
    pub merchant_reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_reference: Option<String>,
    pub psp_reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub success: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operations: Option<Vec<String>>,
}

impl NotificationRequestItem {
    pub fn is_success(&self) -> bool {
        self.success.eq_ignore_ascii_case("true")
    }

    pub fn hmac_signature(&self) -> Option<&str> {
        self.additional_data.as_ref().and_then(|d| d.get("hmacSignature")).and_then(Value::as_str)
    }

    /// Test notifications sent from the Customer Area use `test_` PSP references or `testMerchantRef` references.
    pub fn is_test_notification(&self) -> bool {
        self.psp_reference.starts_with("test_") || self.merchant_reference.starts_with("testMerchantRef")
    }
}
