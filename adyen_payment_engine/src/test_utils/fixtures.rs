use adyen_tools::{
    data_objects::{Amount, NotificationItem, NotificationRequest, NotificationRequestItem},
    hmac::calculate_signature,
    AdyenConfig,
    AdyenConfigs,
};
use apg_common::Secret;
use serde_json::{Map, Value};

use crate::db_types::{DeliveryState, MinorUnits, NewLineItem, NewOrder};

pub const MERCHANT_ACCOUNT: &str = "TestMerchant";
pub const NOTIFICATION_USER: &str = "adyen";
pub const NOTIFICATION_PASSWORD: &str = "webhook-secret";
pub const HMAC_KEY: &str = "44782DEF547AAA06C910C43932B1EB0C71FC68D9D0C057550C48EC2ACF6BA056";

pub fn test_config() -> AdyenConfig {
    AdyenConfig {
        merchant_account: MERCHANT_ACCOUNT.to_string(),
        api_key_test: Secret::new("test-api-key".to_string()),
        hmac_key_test: Secret::new(HMAC_KEY.to_string()),
        notification_username: NOTIFICATION_USER.to_string(),
        notification_password: Secret::new(NOTIFICATION_PASSWORD.to_string()),
        capture_delivery_state: "shipped".to_string(),
        ..Default::default()
    }
}

pub fn manual_capture_config() -> AdyenConfig {
    AdyenConfig { manual_capture: true, ..test_config() }
}

pub fn test_configs() -> AdyenConfigs {
    AdyenConfigs::new(test_config())
}

/// An order with a single line item, one open delivery and one open transaction for the full amount.
pub fn sample_order(order_number: &str, amount: i64, payment_method: &str) -> NewOrder {
    let order_id = format!("order-{order_number}");
    NewOrder::new(order_id.clone(), order_number.to_string(), MinorUnits::from(amount), "EUR".to_string())
        .with_customer(format!("customer-{order_number}"), Some("shopper@example.com".to_string()))
        .with_line_item(NewLineItem {
            line_item_id: format!("li-{order_number}"),
            label: "Widget".to_string(),
            product_number: Some("W-1".to_string()),
            quantity: 1,
            unit_price: MinorUnits::from(amount),
            total_price: MinorUnits::from(amount),
            tax_amount: MinorUnits::from(amount * 19 / 119),
            tax_rate: 1900,
        })
        .with_delivery(format!("delivery-{order_number}"), DeliveryState::Open)
        .with_transaction(format!("tx-{order_number}"), payment_method.to_string())
}

/// A notification item as Adyen would send it, signed with [`HMAC_KEY`].
pub fn notification_item(
    psp_reference: &str,
    merchant_reference: &str,
    event_code: &str,
    success: bool,
    amount: Option<i64>,
) -> NotificationRequestItem {
    let mut item = NotificationRequestItem {
        additional_data: None,
        amount: amount.map(|v| Amount::new(MinorUnits::from(v), "EUR")),
        event_code: event_code.to_string(),
        event_date: Some("2024-06-01T12:00:00+02:00".to_string()),
        merchant_account_code: MERCHANT_ACCOUNT.to_string(),
        merchant_reference: merchant_reference.to_string(),
        original_reference: None,
        psp_reference: psp_reference.to_string(),
        reason: None,
        success: success.to_string(),
        payment_method: Some("visa".to_string()),
        operations: None,
    };
    sign(&mut item);
    item
}

/// (Re)signs the item with [`HMAC_KEY`].
pub fn sign(item: &mut NotificationRequestItem) {
    let signature = calculate_signature(item, HMAC_KEY).expect("valid test key");
    item.additional_data.get_or_insert_with(Map::new).insert("hmacSignature".to_string(), Value::String(signature));
}

pub fn notification_request(items: Vec<NotificationRequestItem>) -> NotificationRequest {
    NotificationRequest {
        live: Some("false".to_string()),
        notification_items: items.into_iter().map(|item| NotificationItem { item }).collect(),
    }
}
