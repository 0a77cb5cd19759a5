use std::{collections::BTreeMap, fmt::Debug, sync::Arc};

use adyen_tools::{
    data_objects::{ModificationRequest, CAPTURE_RECEIVED},
    AdyenConfig,
    DEFAULT_CAPTURE_DELIVERY_STATE,
};
use log::*;

use crate::{
    adyen_api::errors::CaptureError,
    db_types::{
        latest_adyen_transaction,
        Amount,
        DeliveryState,
        LedgerSource,
        LedgerStatus,
        MinorUnits,
        NewLedgerEntry,
        Order,
        OrderLineItem,
        OrderTransaction,
        PaymentCapture,
        TransactionState,
    },
    payment_methods::PaymentMethodKind,
    traits::{LedgerManagement, OrderManagement, PaymentGateway},
};

/// Manual and open-invoice captures.
///
/// Open-invoice payments are only authorized at checkout. Funds are captured once every delivery of the order has
/// reached the configured trigger state (`shipped` unless configured otherwise).
pub struct CaptureApi<B, G> {
    db: B,
    gateway: Arc<G>,
}

impl<B, G> Debug for CaptureApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CaptureApi")
    }
}

impl<B: Clone, G> Clone for CaptureApi<B, G> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), gateway: Arc::clone(&self.gateway) }
    }
}

impl<B, G> CaptureApi<B, G> {
    pub fn new(db: B, gateway: Arc<G>) -> Self {
        Self { db, gateway }
    }
}

impl<B, G> CaptureApi<B, G>
where
    B: OrderManagement + LedgerManagement,
    G: PaymentGateway,
{
    /// Captures `amount` for the authorized Adyen transaction of the order.
    ///
    /// Every delivery must be in the capture trigger state. If any is not, nothing is sent to Adyen. The deliveries only
    /// gate the capture: a single request for `amount` carries every line item, and the accepted request is recorded as
    /// a pending capture, to be settled by the matching `CAPTURE` notification.
    pub async fn do_open_invoice_capture(
        &self,
        order_number: &str,
        amount: MinorUnits,
    ) -> Result<Vec<PaymentCapture>, CaptureError> {
        let order = self
            .db
            .fetch_order_by_number(order_number)
            .await?
            .ok_or_else(|| CaptureError::OrderNotFound(order_number.to_string()))?;
        let tx = self.authorized_transaction(&order).await?;
        let psp_reference =
            tx.original_psp_reference.clone().ok_or_else(|| CaptureError::MissingPspReference(tx.transaction_id.clone()))?;
        let sales_channel = order.sales_channel_id.as_deref();
        let config = self.gateway.config(sales_channel);
        let trigger_state = capture_trigger_state(config);
        let deliveries = self.db.fetch_deliveries(&order.order_id).await?;
        if let Some(delivery) = deliveries.iter().find(|d| d.state != trigger_state) {
            warn!(
                "💳️ Not capturing order {order_number}. Delivery {} is {}, not {trigger_state}",
                delivery.delivery_id, delivery.state
            );
            return Err(CaptureError::DeliveryStateMismatch {
                delivery_id: delivery.delivery_id.clone(),
                expected: trigger_state.to_string(),
                actual: delivery.state,
            });
        }
        let line_items = self.db.fetch_line_items(&order.order_id).await?;
        let additional_data = open_invoice_data(&line_items, &order.currency);
        let request = ModificationRequest {
            merchant_account: config.merchant_account.clone(),
            modification_amount: Some(Amount::new(amount, order.currency.as_str())),
            original_reference: psp_reference,
            reference: Some(order_number.to_string()),
            additional_data: Some(additional_data),
        };
        let response = self.gateway.capture(sales_channel, &request).await?;
        if response.response != CAPTURE_RECEIVED {
            error!("💳️ Capture of {order_number} was not accepted: {}", response.response);
            return Err(CaptureError::Rejected(response.response));
        }
        let entry = NewLedgerEntry {
            order_transaction_id: tx.transaction_id.clone(),
            psp_reference: response.psp_reference,
            amount,
            currency: order.currency.clone(),
            source: LedgerSource::Merchant,
            status: LedgerStatus::Pending,
        };
        let capture = self.db.insert_capture(entry).await?;
        info!(
            "💳️ Capture {} of {amount} {} requested for order {order_number} ({} deliveries)",
            capture.psp_reference,
            order.currency,
            deliveries.len()
        );
        let captures = vec![capture];
        Ok(captures)
    }

    /// Captures the order total. This is what the admin capture button does.
    pub async fn capture_order(&self, order_id: &str) -> Result<Vec<PaymentCapture>, CaptureError> {
        let order = self
            .db
            .fetch_order_by_order_id(order_id)
            .await?
            .ok_or_else(|| CaptureError::OrderNotFound(order_id.to_string()))?;
        self.do_open_invoice_capture(&order.order_number, order.amount_total).await
    }

    /// Captures the order once it is due: the Adyen transaction is authorized, its payment method is captured manually,
    /// and every delivery has reached the trigger state. Returns an empty list if the order is not due yet.
    pub async fn capture_if_due(&self, order_id: &str) -> Result<Vec<PaymentCapture>, CaptureError> {
        let order = self
            .db
            .fetch_order_by_order_id(order_id)
            .await?
            .ok_or_else(|| CaptureError::OrderNotFound(order_id.to_string()))?;
        let sales_channel = order.sales_channel_id.as_deref();
        let transactions = self.db.fetch_transactions(&order.order_id).await?;
        let awaiting_capture = latest_adyen_transaction(transactions).filter(|tx| {
            tx.state == TransactionState::Authorized &&
                tx.payment_method_kind().is_some_and(|k| self.requires_manual_capture(k, sales_channel))
        });
        if awaiting_capture.is_none() {
            trace!("💳️ Order {} is not awaiting a manual capture", order.order_number);
            return Ok(vec![]);
        }
        let trigger_state = capture_trigger_state(self.gateway.config(sales_channel));
        let deliveries = self.db.fetch_deliveries(&order.order_id).await?;
        if deliveries.iter().any(|d| d.state != trigger_state) {
            debug!("💳️ Order {} still has deliveries that are not {trigger_state}", order.order_number);
            return Ok(vec![]);
        }
        self.do_open_invoice_capture(&order.order_number, order.amount_total).await
    }

    /// Whether payments with this method must be captured manually on this sales channel.
    pub fn requires_manual_capture(&self, kind: PaymentMethodKind, sales_channel_id: Option<&str>) -> bool {
        self.gateway.config(sales_channel_id).manual_capture && kind.supports_manual_capture()
    }

    pub async fn captures_for_order(&self, order_id: &str) -> Result<Vec<PaymentCapture>, CaptureError> {
        let captures = self.db.fetch_captures_for_order(order_id).await?;
        Ok(captures)
    }

    async fn authorized_transaction(&self, order: &Order) -> Result<OrderTransaction, CaptureError> {
        let transactions = self.db.fetch_transactions(&order.order_id).await?;
        transactions
            .into_iter()
            .rev()
            .find(|tx| tx.payment_method_kind().is_some() && tx.state == TransactionState::Authorized)
            .ok_or_else(|| CaptureError::NoAuthorizedTransaction(order.order_number.clone()))
    }
}

/// The delivery state that triggers captures. Falls back to `shipped` when unset or invalid.
pub fn capture_trigger_state(config: &AdyenConfig) -> DeliveryState {
    let configured = config.capture_delivery_state.as_str();
    if configured.is_empty() {
        return DeliveryState::Shipped;
    }
    configured.parse().unwrap_or_else(|e| {
        warn!("💳️ {e}. Captures will trigger on {DEFAULT_CAPTURE_DELIVERY_STATE} deliveries");
        DeliveryState::Shipped
    })
}

/// The `openinvoicedata.*` additional data Adyen expects with captures of open-invoice payments.
pub fn open_invoice_data(line_items: &[OrderLineItem], currency: &str) -> BTreeMap<String, String> {
    let mut data = BTreeMap::new();
    data.insert("openinvoicedata.numberOfLines".to_string(), line_items.len().to_string());
    for (i, item) in line_items.iter().enumerate() {
        let line = format!("openinvoicedata.line{}", i + 1);
        let quantity = item.quantity.max(1);
        let item_vat = item.tax_amount.value() / quantity;
        let item_amount = item.unit_price.value() - item_vat;
        data.insert(format!("{line}.currencyCode"), currency.to_string());
        data.insert(format!("{line}.description"), item.label.clone());
        data.insert(format!("{line}.itemAmount"), item_amount.to_string());
        data.insert(format!("{line}.itemVatAmount"), item_vat.to_string());
        data.insert(format!("{line}.itemVatPercentage"), item.tax_rate.to_string());
        data.insert(format!("{line}.numberOfItems"), item.quantity.to_string());
        data.insert(format!("{line}.vatCategory"), "None".to_string());
    }
    data
}

#[cfg(test)]
mod test {
    use super::*;

    fn item(label: &str, quantity: i64, unit_price: i64, tax_amount: i64, tax_rate: i64) -> OrderLineItem {
        OrderLineItem {
            id: 1,
            order_id: "o-1".into(),
            line_item_id: format!("li-{label}"),
            label: label.into(),
            product_number: None,
            quantity,
            unit_price: MinorUnits::from(unit_price),
            total_price: MinorUnits::from(unit_price * quantity),
            tax_amount: MinorUnits::from(tax_amount),
            tax_rate,
        }
    }

    #[test]
    fn open_invoice_lines() {
        let data = open_invoice_data(&[item("Shirt", 2, 1190, 380, 1900), item("Socks", 1, 500, 0, 0)], "EUR");
        assert_eq!(data["openinvoicedata.numberOfLines"], "2");
        assert_eq!(data["openinvoicedata.line1.description"], "Shirt");
        assert_eq!(data["openinvoicedata.line1.itemAmount"], "1000");
        assert_eq!(data["openinvoicedata.line1.itemVatAmount"], "190");
        assert_eq!(data["openinvoicedata.line1.itemVatPercentage"], "1900");
        assert_eq!(data["openinvoicedata.line1.numberOfItems"], "2");
        assert_eq!(data["openinvoicedata.line2.itemAmount"], "500");
        assert_eq!(data["openinvoicedata.line2.currencyCode"], "EUR");
    }

    #[test]
    fn trigger_state_defaults_to_shipped() {
        let mut config = AdyenConfig::default();
        assert_eq!(capture_trigger_state(&config), DeliveryState::Shipped);
        config.capture_delivery_state = "shipped_partially".into();
        assert_eq!(capture_trigger_state(&config), DeliveryState::ShippedPartially);
        config.capture_delivery_state = "teleported".into();
        assert_eq!(capture_trigger_state(&config), DeliveryState::Shipped);
    }
}
