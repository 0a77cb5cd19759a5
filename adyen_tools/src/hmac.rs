//! HMAC signatures of webhook notification items.
//!
//! Adyen signs every `NotificationRequestItem` with HMAC-SHA256 over
//!
//! ```text
//! pspReference:originalReference:merchantAccountCode:merchantReference:value:currency:eventCode:success
//! ```
//!
//! using the hex-encoded key configured in the Customer Area, and sends the base64 encoded result in
//! `additionalData.hmacSignature`.
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{data_objects::NotificationRequestItem, AdyenApiError};

type HmacSha256 = Hmac<Sha256>;

pub fn signing_payload(item: &NotificationRequestItem) -> String {
    let (value, currency) = match &item.amount {
        Some(amount) => (amount.value.to_string(), amount.currency.as_str()),
        None => (String::default(), ""),
    };
    format!(
        "{}:{}:{}:{}:{value}:{currency}:{}:{}",
        item.psp_reference,
        item.original_reference.as_deref().unwrap_or_default(),
        item.merchant_account_code,
        item.merchant_reference,
        item.event_code,
        item.success
    )
}

fn mac_for(item: &NotificationRequestItem, hex_key: &str) -> Result<HmacSha256, AdyenApiError> {
    let key = hex::decode(hex_key.trim()).map_err(|e| AdyenApiError::InvalidHmacKey(e.to_string()))?;
    let mut mac = HmacSha256::new_from_slice(&key).map_err(|e| AdyenApiError::InvalidHmacKey(e.to_string()))?;
    mac.update(signing_payload(item).as_bytes());
    Ok(mac)
}

/// Calculates the base64-encoded signature for the notification item.
pub fn calculate_signature(item: &NotificationRequestItem, hex_key: &str) -> Result<String, AdyenApiError> {
    let mac = mac_for(item, hex_key)?;
    Ok(base64::encode(mac.finalize().into_bytes()))
}

/// Checks the item's `hmacSignature` against the key. A missing or malformed signature is invalid.
pub fn is_valid_signature(item: &NotificationRequestItem, hex_key: &str) -> Result<bool, AdyenApiError> {
    let signature = match item.hmac_signature().map(base64::decode) {
        Some(Ok(sig)) => sig,
        _ => return Ok(false),
    };
    let mac = mac_for(item, hex_key)?;
    Ok(mac.verify_slice(&signature).is_ok())
}

#[cfg(test)]
mod test {
    use apg_common::MinorUnits;
    use serde_json::{Map, Value};

    use super::*;
    use crate::data_objects::Amount;

    const KEY: &str = "44782DEF547AAA06C910C43932B1EB0C71FC68D9D0C057550C48EC2ACF6BA056";

    fn item(signature: Option<&str>) -> NotificationRequestItem {
        let additional_data = signature.map(|s| {
            let mut map = Map::new();
            map.insert("hmacSignature".into(), Value::String(s.into()));
            map
        });
        NotificationRequestItem {
            additional_data,
            amount: Some(Amount::new(MinorUnits::from(1130), "EUR")),
            event_code: "AUTHORISATION".into(),
            merchant_account_code: "TestMerchant".into(),
            merchant_reference: "TestPayment-1407325143704".into(),
            psp_reference: "7914073381342284".into(),
            success: "true".into(),
            ..Default::default()
        }
    }

    #[test]
    fn payload() {
        assert_eq!(
            signing_payload(&item(None)),
            "7914073381342284::TestMerchant:TestPayment-1407325143704:1130:EUR:AUTHORISATION:true"
        );
    }

    #[test]
    fn known_signature() {
        let sig = calculate_signature(&item(None), KEY).unwrap();
        assert_eq!(sig, "coqCmt/IZ4E3CzPvMY8zTjQVL5hYJUiBRg8UU+iCWo0=");
    }

    #[test]
    fn refund_signature_includes_original_reference() {
        let mut refund = item(None);
        refund.psp_reference = "8815101010101010".into();
        refund.original_reference = Some("7914073381342284".into());
        refund.merchant_reference = "order-1001".into();
        refund.amount = Some(Amount::new(MinorUnits::from(400), "EUR"));
        refund.event_code = "REFUND".into();
        let sig = calculate_signature(&refund, KEY).unwrap();
        assert_eq!(sig, "ZKJA3UrE16wNoPfjWpX0HVj9IaHD4J35/mu0hSdBEY4=");
    }

    #[test]
    fn validation() {
        assert!(is_valid_signature(&item(Some("coqCmt/IZ4E3CzPvMY8zTjQVL5hYJUiBRg8UU+iCWo0=")), KEY).unwrap());
        let mut tampered = item(Some("coqCmt/IZ4E3CzPvMY8zTjQVL5hYJUiBRg8UU+iCWo0="));
        tampered.amount = Some(Amount::new(MinorUnits::from(1), "EUR"));
        assert!(!is_valid_signature(&tampered, KEY).unwrap());
        assert!(!is_valid_signature(&item(None), KEY).unwrap());
        assert!(!is_valid_signature(&item(Some("not base64!")), KEY).unwrap());
    }

    #[test]
    fn bad_keys() {
        assert!(matches!(calculate_signature(&item(None), "zz"), Err(AdyenApiError::InvalidHmacKey(_))));
    }
}
