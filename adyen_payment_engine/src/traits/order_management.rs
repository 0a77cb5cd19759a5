use crate::{
    db_types::{
        DeliveryState,
        NewOrder,
        Order,
        OrderDelivery,
        OrderLineItem,
        OrderTransaction,
        TransactionState,
    },
    traits::AdyenDbError,
};

/// `(order, inserted)`. `inserted` is false if the order already existed.
pub type InsertOrderResult = (Order, bool);

/// The gateway's mirror of storefront orders.
///
/// Orders are pushed in by the storefront. The engine only ever changes delivery states (on the storefront's
/// behalf) and transaction states and PSP references (as payments progress).
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Stores the order with its line items, deliveries and transactions in a single atomic transaction.
    /// This call is idempotent on `order_id`.
    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, AdyenDbError>;

    async fn fetch_order_by_order_id(&self, order_id: &str) -> Result<Option<Order>, AdyenDbError>;

    /// Fetches an order by its order number, which is the merchant reference Adyen echoes back.
    async fn fetch_order_by_number(&self, order_number: &str) -> Result<Option<Order>, AdyenDbError>;

    async fn fetch_line_items(&self, order_id: &str) -> Result<Vec<OrderLineItem>, AdyenDbError>;

    async fn fetch_deliveries(&self, order_id: &str) -> Result<Vec<OrderDelivery>, AdyenDbError>;

    async fn update_delivery_state(
        &self,
        order_id: &str,
        delivery_id: &str,
        state: DeliveryState,
    ) -> Result<OrderDelivery, AdyenDbError>;

    /// All transactions of the order, oldest first.
    async fn fetch_transactions(&self, order_id: &str) -> Result<Vec<OrderTransaction>, AdyenDbError>;

    async fn fetch_transaction(&self, transaction_id: &str) -> Result<Option<OrderTransaction>, AdyenDbError>;

    async fn update_transaction_state(
        &self,
        transaction_id: &str,
        state: TransactionState,
    ) -> Result<OrderTransaction, AdyenDbError>;

    async fn set_original_psp_reference(
        &self,
        transaction_id: &str,
        psp_reference: &str,
    ) -> Result<OrderTransaction, AdyenDbError>;
}
