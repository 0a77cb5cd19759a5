use std::fmt::Debug;

use log::*;

use crate::{
    adyen_api::{capture_api::CaptureApi, errors::CaptureError},
    db_types::{DeliveryState, NewOrder, Order, OrderDelivery, OrderTransaction, PaymentCapture},
    traits::{AdyenDbError, InsertOrderResult, LedgerManagement, OrderManagement, PaymentGateway},
};

/// Keeps the gateway's copy of storefront orders up to date.
pub struct OrderApi<B, G> {
    db: B,
    captures: CaptureApi<B, G>,
}

impl<B, G> Debug for OrderApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderApi")
    }
}

impl<B, G> OrderApi<B, G> {
    pub fn new(db: B, captures: CaptureApi<B, G>) -> Self {
        Self { db, captures }
    }
}

impl<B, G> OrderApi<B, G>
where
    B: OrderManagement + LedgerManagement,
    G: PaymentGateway,
{
    /// Stores an order pushed by the storefront. Importing the same order twice is harmless.
    pub async fn import_order(&self, order: NewOrder) -> Result<InsertOrderResult, AdyenDbError> {
        let (order, inserted) = self.db.insert_order(order).await?;
        if inserted {
            info!("📦️ Order {} ({}) imported", order.order_number, order.order_id);
        } else {
            debug!("📦️ Order {} was already imported", order.order_number);
        }
        Ok((order, inserted))
    }

    pub async fn order(&self, order_id: &str) -> Result<Order, AdyenDbError> {
        self.db.fetch_order_by_order_id(order_id).await?.ok_or_else(|| AdyenDbError::OrderNotFound(order_id.to_string()))
    }

    pub async fn transactions(&self, order_id: &str) -> Result<Vec<OrderTransaction>, AdyenDbError> {
        self.db.fetch_transactions(order_id).await
    }

    /// Records a delivery state change. Shipping the last outstanding delivery of an authorized open-invoice order
    /// triggers its capture.
    pub async fn update_delivery_state(
        &self,
        order_id: &str,
        delivery_id: &str,
        state: DeliveryState,
    ) -> Result<(OrderDelivery, Vec<PaymentCapture>), CaptureError> {
        let delivery = self.db.update_delivery_state(order_id, delivery_id, state).await?;
        debug!("📦️ Delivery {delivery_id} of order {order_id} is now {state}");
        let captures = self.captures.capture_if_due(order_id).await?;
        Ok((delivery, captures))
    }
}
