//! The Adyen payment methods the gateway knows how to handle.
//!
//! Transactions carry the handler identifier of their payment method (e.g. `adyen_klarna`). A transaction whose
//! identifier is not listed here is not an Adyen transaction.
use std::{fmt::Display, str::FromStr};

use crate::db_types::ConversionError;

/// Adyen payment-method codes that support delayed (manual) capture.
pub const MANUAL_CAPTURE_METHODS: [&str; 10] =
    ["scheme", "amazonpay", "applepay", "googlepay", "paypal", "twint", "vipps", "mobilepay", "bcmc", "sepadirectdebit"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentMethodKind {
    Cards,
    Ideal,
    Sepa,
    Paypal,
    ApplePay,
    GooglePay,
    AmazonPay,
    Bancontact,
    Eps,
    Twint,
    Swish,
    Trustly,
    Blik,
    MbWay,
    Vipps,
    MobilePay,
    GiftCard,
    Klarna,
    KlarnaAccount,
    KlarnaPayNow,
    Ratepay,
    RatepayDirectDebit,
    AfterPay,
    Affirm,
    Clearpay,
}

const ALL_KINDS: [PaymentMethodKind; 25] = [
    PaymentMethodKind::Cards,
    PaymentMethodKind::Ideal,
    PaymentMethodKind::Sepa,
    PaymentMethodKind::Paypal,
    PaymentMethodKind::ApplePay,
    PaymentMethodKind::GooglePay,
    PaymentMethodKind::AmazonPay,
    PaymentMethodKind::Bancontact,
    PaymentMethodKind::Eps,
    PaymentMethodKind::Twint,
    PaymentMethodKind::Swish,
    PaymentMethodKind::Trustly,
    PaymentMethodKind::Blik,
    PaymentMethodKind::MbWay,
    PaymentMethodKind::Vipps,
    PaymentMethodKind::MobilePay,
    PaymentMethodKind::GiftCard,
    PaymentMethodKind::Klarna,
    PaymentMethodKind::KlarnaAccount,
    PaymentMethodKind::KlarnaPayNow,
    PaymentMethodKind::Ratepay,
    PaymentMethodKind::RatepayDirectDebit,
    PaymentMethodKind::AfterPay,
    PaymentMethodKind::Affirm,
    PaymentMethodKind::Clearpay,
];

impl PaymentMethodKind {
    /// The Adyen `paymentMethod.type` code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Cards => "scheme",
            Self::Ideal => "ideal",
            Self::Sepa => "sepadirectdebit",
            Self::Paypal => "paypal",
            Self::ApplePay => "applepay",
            Self::GooglePay => "googlepay",
            Self::AmazonPay => "amazonpay",
            Self::Bancontact => "bcmc",
            Self::Eps => "eps",
            Self::Twint => "twint",
            Self::Swish => "swish",
            Self::Trustly => "trustly",
            Self::Blik => "blik",
            Self::MbWay => "mbway",
            Self::Vipps => "vipps",
            Self::MobilePay => "mobilepay",
            Self::GiftCard => "giftcard",
            Self::Klarna => "klarna",
            Self::KlarnaAccount => "klarna_account",
            Self::KlarnaPayNow => "klarna_paynow",
            Self::Ratepay => "ratepay",
            Self::RatepayDirectDebit => "ratepay_directdebit",
            Self::AfterPay => "afterpay_default",
            Self::Affirm => "affirm",
            Self::Clearpay => "clearpay",
        }
    }

    /// The handler identifier stored on order transactions.
    pub fn handler_identifier(&self) -> &'static str {
        match self {
            Self::Cards => "adyen_cards",
            Self::Ideal => "adyen_ideal",
            Self::Sepa => "adyen_sepa",
            Self::Paypal => "adyen_paypal",
            Self::ApplePay => "adyen_applepay",
            Self::GooglePay => "adyen_googlepay",
            Self::AmazonPay => "adyen_amazonpay",
            Self::Bancontact => "adyen_bancontact",
            Self::Eps => "adyen_eps",
            Self::Twint => "adyen_twint",
            Self::Swish => "adyen_swish",
            Self::Trustly => "adyen_trustly",
            Self::Blik => "adyen_blik",
            Self::MbWay => "adyen_mbway",
            Self::Vipps => "adyen_vipps",
            Self::MobilePay => "adyen_mobilepay",
            Self::GiftCard => "adyen_giftcard",
            Self::Klarna => "adyen_klarna",
            Self::KlarnaAccount => "adyen_klarna_account",
            Self::KlarnaPayNow => "adyen_klarna_paynow",
            Self::Ratepay => "adyen_ratepay",
            Self::RatepayDirectDebit => "adyen_ratepay_directdebit",
            Self::AfterPay => "adyen_afterpay",
            Self::Affirm => "adyen_affirm",
            Self::Clearpay => "adyen_clearpay",
        }
    }

    /// Open-invoice methods authorize at checkout and are captured once the goods ship, with a per-line-item
    /// breakdown of the invoice.
    pub fn is_open_invoice(&self) -> bool {
        matches!(
            self,
            Self::Klarna
                | Self::KlarnaAccount
                | Self::KlarnaPayNow
                | Self::Ratepay
                | Self::RatepayDirectDebit
                | Self::AfterPay
                | Self::Affirm
                | Self::Clearpay
        )
    }

    pub fn supports_manual_capture(&self) -> bool {
        MANUAL_CAPTURE_METHODS.contains(&self.code()) || self.is_open_invoice()
    }

    pub fn from_code(code: &str) -> Option<Self> {
        ALL_KINDS.iter().copied().find(|k| k.code() == code)
    }
}

impl FromStr for PaymentMethodKind {
    type Err = ConversionError;

    /// Parses a handler identifier.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_KINDS
            .iter()
            .copied()
            .find(|k| k.handler_identifier() == s)
            .ok_or_else(|| ConversionError(format!("{s} is not an Adyen payment method")))
    }
}

impl Display for PaymentMethodKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.handler_identifier())
    }
}
