use std::{fmt::Display, str::FromStr};

pub use adyen_tools::data_objects::Amount;
pub use apg_common::MinorUnits;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::{FromRow, Type};
use thiserror::Error;

use crate::payment_methods::PaymentMethodKind;

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion from string: {0}")]
pub struct ConversionError(pub String);

//--------------------------------------  TransactionState  -----------------------------------------------------------
/// The payment state of an order transaction. Transitions between states are governed by
/// [`crate::state_machine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
    Open,
    InProgress,
    Unconfirmed,
    Reminded,
    Authorized,
    Paid,
    PaidPartially,
    Refunded,
    RefundedPartially,
    Cancelled,
    Failed,
    Chargeback,
}

impl TransactionState {
    /// States in which the shopper has not (fully) paid yet.
    pub fn is_awaiting_payment(&self) -> bool {
        matches!(self, Self::Open | Self::InProgress | Self::Reminded | Self::Unconfirmed | Self::Authorized)
    }

    /// States in which money has been captured and may be refunded.
    pub fn is_refundable(&self) -> bool {
        matches!(self, Self::Paid | Self::PaidPartially | Self::RefundedPartially)
    }
}

impl Display for TransactionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Unconfirmed => "unconfirmed",
            Self::Reminded => "reminded",
            Self::Authorized => "authorized",
            Self::Paid => "paid",
            Self::PaidPartially => "paid_partially",
            Self::Refunded => "refunded",
            Self::RefundedPartially => "refunded_partially",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
            Self::Chargeback => "chargeback",
        };
        f.write_str(s)
    }
}

impl FromStr for TransactionState {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "in_progress" => Ok(Self::InProgress),
            "unconfirmed" => Ok(Self::Unconfirmed),
            "reminded" => Ok(Self::Reminded),
            "authorized" => Ok(Self::Authorized),
            "paid" => Ok(Self::Paid),
            "paid_partially" => Ok(Self::PaidPartially),
            "refunded" => Ok(Self::Refunded),
            "refunded_partially" => Ok(Self::RefundedPartially),
            "cancelled" => Ok(Self::Cancelled),
            "failed" => Ok(Self::Failed),
            "chargeback" => Ok(Self::Chargeback),
            _ => Err(ConversionError(format!("Invalid transaction state: {s}"))),
        }
    }
}

//--------------------------------------  DeliveryState  --------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryState {
    Open,
    Shipped,
    ShippedPartially,
    Returned,
    ReturnedPartially,
    Cancelled,
}

impl Display for DeliveryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::Shipped => "shipped",
            Self::ShippedPartially => "shipped_partially",
            Self::Returned => "returned",
            Self::ReturnedPartially => "returned_partially",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

impl FromStr for DeliveryState {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "shipped" => Ok(Self::Shipped),
            "shipped_partially" => Ok(Self::ShippedPartially),
            "returned" => Ok(Self::Returned),
            "returned_partially" => Ok(Self::ReturnedPartially),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ConversionError(format!("Invalid delivery state: {s}"))),
        }
    }
}

//--------------------------------------  Ledger status and source  ---------------------------------------------------
/// The status of a capture or refund ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LedgerStatus {
    Pending,
    Success,
    Failed,
}

impl Display for LedgerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Who initiated a capture or refund.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LedgerSource {
    /// Requested through this gateway (admin endpoint or automatic capture).
    Merchant,
    /// Initiated elsewhere, e.g. in the Adyen Customer Area, and learnt about through a notification.
    Adyen,
}

impl Display for LedgerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Merchant => write!(f, "merchant"),
            Self::Adyen => write!(f, "adyen"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CaptureMode {
    Auto,
    Manual,
}

impl Display for CaptureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

//--------------------------------------  EventCode  ------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventCode {
    Authorisation,
    Capture,
    CaptureFailed,
    CancelOrRefund,
    Refund,
    RefundFailed,
    Cancellation,
    OfferClosed,
    Other(String),
}

impl Display for EventCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Authorisation => "AUTHORISATION",
            Self::Capture => "CAPTURE",
            Self::CaptureFailed => "CAPTURE_FAILED",
            Self::CancelOrRefund => "CANCEL_OR_REFUND",
            Self::Refund => "REFUND",
            Self::RefundFailed => "REFUND_FAILED",
            Self::Cancellation => "CANCELLATION",
            Self::OfferClosed => "OFFER_CLOSED",
            Self::Other(s) => s.as_str(),
        };
        f.write_str(s)
    }
}

impl From<&str> for EventCode {
    fn from(value: &str) -> Self {
        match value {
            "AUTHORISATION" => Self::Authorisation,
            "CAPTURE" => Self::Capture,
            "CAPTURE_FAILED" => Self::CaptureFailed,
            "CANCEL_OR_REFUND" => Self::CancelOrRefund,
            "REFUND" => Self::Refund,
            "REFUND_FAILED" => Self::RefundFailed,
            "CANCELLATION" => Self::Cancellation,
            "OFFER_CLOSED" => Self::OfferClosed,
            other => Self::Other(other.to_string()),
        }
    }
}

//--------------------------------------  Orders  ---------------------------------------------------------------------
/// The gateway's mirror of a storefront order.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: String,
    pub order_number: String,
    pub sales_channel_id: Option<String>,
    pub customer_id: Option<String>,
    pub customer_email: Option<String>,
    pub amount_total: MinorUnits,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub id: i64,
    pub order_id: String,
    pub line_item_id: String,
    pub label: String,
    pub product_number: Option<String>,
    pub quantity: i64,
    pub unit_price: MinorUnits,
    pub total_price: MinorUnits,
    pub tax_amount: MinorUnits,
    /// Tax rate in basis points.
    pub tax_rate: i64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderDelivery {
    pub id: i64,
    pub order_id: String,
    pub delivery_id: String,
    pub state: DeliveryState,
    pub shipping_costs: MinorUnits,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderTransaction {
    pub id: i64,
    pub transaction_id: String,
    pub order_id: String,
    /// The handler identifier of the payment method, e.g. `adyen_klarna`.
    pub payment_method: String,
    pub amount: MinorUnits,
    pub currency: String,
    pub state: TransactionState,
    pub original_psp_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderTransaction {
    /// `None` if this is not an Adyen transaction.
    pub fn payment_method_kind(&self) -> Option<PaymentMethodKind> {
        self.payment_method.parse().ok()
    }
}

/// The most recent Adyen transaction in `transactions`, which must be ordered oldest first.
pub fn latest_adyen_transaction(transactions: Vec<OrderTransaction>) -> Option<OrderTransaction> {
    transactions.into_iter().rev().find(|tx| tx.payment_method_kind().is_some())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLineItem {
    pub line_item_id: String,
    pub label: String,
    pub product_number: Option<String>,
    pub quantity: i64,
    pub unit_price: MinorUnits,
    pub total_price: MinorUnits,
    pub tax_amount: MinorUnits,
    pub tax_rate: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDelivery {
    pub delivery_id: String,
    pub state: DeliveryState,
    pub shipping_costs: MinorUnits,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub transaction_id: String,
    pub payment_method: String,
    pub amount: MinorUnits,
    pub state: TransactionState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub order_id: String,
    pub order_number: String,
    pub sales_channel_id: Option<String>,
    pub customer_id: Option<String>,
    pub customer_email: Option<String>,
    pub amount_total: MinorUnits,
    pub currency: String,
    pub line_items: Vec<NewLineItem>,
    pub deliveries: Vec<NewDelivery>,
    pub transactions: Vec<NewTransaction>,
}

impl NewOrder {
    pub fn new<S: Into<String>>(order_id: S, order_number: S, amount_total: MinorUnits, currency: S) -> Self {
        Self {
            order_id: order_id.into(),
            order_number: order_number.into(),
            sales_channel_id: None,
            customer_id: None,
            customer_email: None,
            amount_total,
            currency: currency.into(),
            line_items: vec![],
            deliveries: vec![],
            transactions: vec![],
        }
    }

    pub fn with_sales_channel<S: Into<String>>(mut self, sales_channel_id: S) -> Self {
        self.sales_channel_id = Some(sales_channel_id.into());
        self
    }

    pub fn with_customer<S: Into<String>>(mut self, customer_id: S, email: Option<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self.customer_email = email;
        self
    }

    pub fn with_line_item(mut self, item: NewLineItem) -> Self {
        self.line_items.push(item);
        self
    }

    pub fn with_delivery<S: Into<String>>(mut self, delivery_id: S, state: DeliveryState) -> Self {
        self.deliveries.push(NewDelivery {
            delivery_id: delivery_id.into(),
            state,
            shipping_costs: MinorUnits::default(),
        });
        self
    }

    /// Adds a transaction for the full order amount.
    pub fn with_transaction<S: Into<String>>(mut self, transaction_id: S, payment_method: S) -> Self {
        self.transactions.push(NewTransaction {
            transaction_id: transaction_id.into(),
            payment_method: payment_method.into(),
            amount: self.amount_total,
            state: TransactionState::Open,
        });
        self
    }
}

//--------------------------------------  Notifications  --------------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub psp_reference: String,
    pub original_reference: Option<String>,
    pub merchant_reference: String,
    pub merchant_account_code: String,
    pub event_code: String,
    pub success: bool,
    pub amount_value: Option<MinorUnits>,
    pub amount_currency: Option<String>,
    pub payment_method: Option<String>,
    pub reason: Option<String>,
    pub live: bool,
    pub additional_data: Option<String>,
    pub processing: bool,
    pub done: bool,
    pub error_count: i64,
    pub error_message: Option<String>,
    pub scheduled_processing_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    pub fn event(&self) -> EventCode {
        EventCode::from(self.event_code.as_str())
    }

    pub fn amount(&self) -> Option<Amount> {
        match (self.amount_value, &self.amount_currency) {
            (Some(value), Some(currency)) => Some(Amount::new(value, currency.clone())),
            _ => None,
        }
    }

    pub fn additional_data(&self) -> Map<String, Value> {
        self.additional_data
            .as_deref()
            .and_then(|s| serde_json::from_str::<Map<String, Value>>(s).ok())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotification {
    pub psp_reference: String,
    pub original_reference: Option<String>,
    pub merchant_reference: String,
    pub merchant_account_code: String,
    pub event_code: String,
    pub success: bool,
    pub amount: Option<Amount>,
    pub payment_method: Option<String>,
    pub reason: Option<String>,
    pub live: bool,
    pub additional_data: Option<String>,
    pub scheduled_processing_time: DateTime<Utc>,
}

//--------------------------------------  Captures and refunds  -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PaymentCapture {
    pub id: i64,
    pub order_transaction_id: String,
    pub psp_reference: String,
    pub amount: MinorUnits,
    pub currency: String,
    pub source: LedgerSource,
    pub status: LedgerStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Refund {
    pub id: i64,
    pub order_transaction_id: String,
    pub psp_reference: String,
    pub amount: MinorUnits,
    pub currency: String,
    pub source: LedgerSource,
    pub status: LedgerStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A new capture or refund ledger row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLedgerEntry {
    pub order_transaction_id: String,
    pub psp_reference: String,
    pub amount: MinorUnits,
    pub currency: String,
    pub source: LedgerSource,
    pub status: LedgerStatus,
}

//--------------------------------------  Payments  -------------------------------------------------------------------
/// One authorized partial payment of a multi-tender (gift card) order.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AdyenPayment {
    pub id: i64,
    pub psp_reference: String,
    pub merchant_reference: String,
    pub merchant_order_reference: Option<String>,
    pub order_transaction_id: Option<String>,
    pub payment_method: Option<String>,
    pub amount_value: MinorUnits,
    pub amount_currency: String,
    pub capture_mode: CaptureMode,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAdyenPayment {
    pub psp_reference: String,
    pub merchant_reference: String,
    pub merchant_order_reference: Option<String>,
    pub order_transaction_id: Option<String>,
    pub payment_method: Option<String>,
    pub amount: Amount,
    pub capture_mode: CaptureMode,
}

/// The last raw Checkout API response for a transaction.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PaymentResponseRecord {
    pub id: i64,
    pub order_transaction_id: String,
    pub result_code: String,
    pub response: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PaymentStateData {
    pub id: i64,
    pub token: String,
    pub state_data: String,
    pub created_at: DateTime<Utc>,
}
