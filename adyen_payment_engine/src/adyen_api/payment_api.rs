use std::{collections::BTreeMap, fmt::Debug, sync::Arc};

use adyen_tools::data_objects::{
    AdyenOrderReference,
    CancelOrderRequest,
    CancelOrderResponse,
    CheckoutOrderStatus,
    CreateOrderRequest,
    DonationRequest,
    LineItem,
    PaymentDetailsRequest,
    PaymentMethodsRequest,
    PaymentRequest,
    PaymentResponse,
    ResultCode,
};
use log::*;
use serde_json::Value;

use crate::{
    adyen_api::{
        capture_api::CaptureApi,
        errors::PaymentError,
        payment_objects::{
            DonationParams,
            PartialPayments,
            PayParams,
            PaymentDetailsParams,
            PaymentMethodsParams,
            PaymentOutcome,
            PaymentStatus,
        },
        result_handler::ResultHandler,
        transaction_state_api::TransactionStateApi,
    },
    db_types::{latest_adyen_transaction, Amount, MinorUnits, Order, OrderLineItem, OrderTransaction, PaymentStateData},
    traits::{AdyenDatabase, PaymentGateway},
};

/// The storefront side of the Checkout API: payment methods, payments, 3DS/redirect details, donations and gift-card
/// orders.
pub struct PaymentApi<B, G> {
    db: B,
    gateway: Arc<G>,
    captures: CaptureApi<B, G>,
    results: ResultHandler<B, G>,
}

impl<B, G> Debug for PaymentApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentApi")
    }
}

impl<B: Clone, G> PaymentApi<B, G> {
    pub fn new(db: B, gateway: Arc<G>, states: TransactionStateApi<B>) -> Self {
        let captures = CaptureApi::new(db.clone(), Arc::clone(&gateway));
        let results = ResultHandler::new(db.clone(), states, captures.clone());
        Self { db, gateway, captures, results }
    }
}

impl<B, G> PaymentApi<B, G>
where
    B: AdyenDatabase,
    G: PaymentGateway,
{
    pub async fn payment_methods(&self, params: PaymentMethodsParams) -> Result<Value, PaymentError> {
        let order = match &params.order_id {
            Some(order_id) => Some(self.order(order_id).await?),
            None => None,
        };
        let sales_channel =
            params.sales_channel_id.as_deref().or_else(|| order.as_ref().and_then(|o| o.sales_channel_id.as_deref()));
        let amount = match (&order, params.amount, &params.currency) {
            (Some(order), _, _) => Some(Amount::new(order.amount_total, order.currency.as_str())),
            (None, Some(value), Some(currency)) => Some(Amount::new(value, currency.as_str())),
            _ => None,
        };
        let request = PaymentMethodsRequest {
            merchant_account: self.gateway.config(sales_channel).merchant_account.clone(),
            amount,
            country_code: params.country_code,
            shopper_locale: params.shopper_locale,
            shopper_reference: params.customer_id.or_else(|| order.as_ref().and_then(|o| o.customer_id.clone())),
            channel: Some("Web".to_string()),
        };
        let methods = self.gateway.payment_methods(sales_channel, &request).await?;
        Ok(methods)
    }

    /// Submits a payment for the order's Adyen transaction.
    ///
    /// Inside an Adyen order (a gift card covering part of the total), only the amount not yet paid by earlier
    /// partial payments is charged.
    pub async fn pay(&self, params: PayParams) -> Result<PaymentOutcome, PaymentError> {
        let order = self.order(&params.order_id).await?;
        let tx = self.adyen_transaction(&order).await?;
        let state_data = self.state_data(&params).await?;
        let payment_method = state_data
            .get("paymentMethod")
            .cloned()
            .ok_or_else(|| PaymentError::InvalidRequest("The state data has no payment method".into()))?;
        let adyen_order = match state_data.get("order") {
            Some(value) => Some(
                serde_json::from_value::<AdyenOrderReference>(value.clone())
                    .map_err(|e| PaymentError::InvalidRequest(format!("Invalid order reference. {e}")))?,
            ),
            None => None,
        };
        let value = match &adyen_order {
            Some(_) => {
                let remaining = self.partial_payments_for(&order).await?.remaining;
                if !remaining.is_positive() {
                    warn!("💰️ Order {} is already fully paid by partial payments", order.order_number);
                    return Err(PaymentError::NothingLeftToPay(order.order_number.clone()));
                }
                remaining
            },
            None => tx.amount,
        };
        let amount = Amount::new(value, order.currency.as_str());
        let sales_channel = order.sales_channel_id.as_deref();
        let kind = tx.payment_method_kind();
        let line_items = match kind {
            Some(k) if k.is_open_invoice() => {
                let items = self.db.fetch_line_items(&order.order_id).await?;
                Some(items.iter().map(line_item).collect())
            },
            _ => None,
        };
        let additional_data = kind.filter(|k| self.captures.requires_manual_capture(*k, sales_channel)).map(|_| {
            let mut data = BTreeMap::new();
            data.insert("manualCapture".to_string(), "true".to_string());
            data
        });
        let request = PaymentRequest {
            merchant_account: self.gateway.config(sales_channel).merchant_account.clone(),
            amount: Some(amount.clone()),
            reference: order.order_number.clone(),
            payment_method,
            return_url: params.return_url,
            shopper_reference: order.customer_id.clone(),
            shopper_email: order.customer_email.clone(),
            shopper_locale: params.shopper_locale,
            shopper_ip: params.shopper_ip,
            browser_info: state_data.get("browserInfo").cloned(),
            billing_address: state_data.get("billingAddress").cloned(),
            delivery_address: state_data.get("deliveryAddress").cloned(),
            line_items,
            additional_data,
            order: adyen_order,
            channel: Some("Web".to_string()),
            origin: params.origin.or_else(|| state_data.get("origin").and_then(Value::as_str).map(String::from)),
            store_payment_method: state_data.get("storePaymentMethod").and_then(Value::as_bool),
            ..Default::default()
        };
        debug!("💰️ Paying {amount} for order {} with {}", order.order_number, tx.payment_method);
        let response = self.gateway.payments(sales_channel, &request).await?;
        self.results.handle(&order, &tx, &response, Some(amount)).await
    }

    /// Submits the result of a shopper action (redirect, 3DS challenge) to Adyen.
    pub async fn payment_details(&self, params: PaymentDetailsParams) -> Result<PaymentOutcome, PaymentError> {
        let order = self.order(&params.order_id).await?;
        let tx = self.adyen_transaction(&order).await?;
        let request = PaymentDetailsRequest { details: params.details, payment_data: params.payment_data };
        let response = self.gateway.payment_details(order.sales_channel_id.as_deref(), &request).await?;
        self.results.handle(&order, &tx, &response, None).await
    }

    pub async fn payment_status(&self, order_id: &str) -> Result<PaymentStatus, PaymentError> {
        let order = self.order(order_id).await?;
        let tx = self.adyen_transaction(&order).await?;
        let response = self.latest_response(&order, &tx).await?;
        Ok(PaymentStatus {
            order_id: order.order_id,
            result_code: response.result_code.to_string(),
            is_final: response.result_code.is_final(),
            action: response.action.filter(|_| response.result_code.requires_action()),
        })
    }

    /// Donates to the configured charity on top of an authorised payment.
    pub async fn donate(&self, params: DonationParams) -> Result<Value, PaymentError> {
        let order = self.order(&params.order_id).await?;
        let tx = self.adyen_transaction(&order).await?;
        let response = self.latest_response(&order, &tx).await?;
        let donation_token = response
            .donation_token
            .ok_or_else(|| PaymentError::InvalidRequest("The payment did not offer a donation".into()))?;
        let psp_reference = response
            .psp_reference
            .or(tx.original_psp_reference.clone())
            .ok_or_else(|| PaymentError::InvalidRequest("The payment has no PSP reference".into()))?;
        let sales_channel = order.sales_channel_id.as_deref();
        let config = self.gateway.config(sales_channel);
        let method_type = tx.payment_method_kind().map(|k| k.code()).unwrap_or("scheme");
        let request = DonationRequest {
            merchant_account: config.merchant_account.clone(),
            amount: Some(Amount::new(params.amount, order.currency.as_str())),
            reference: format!("{}-donation", order.order_number),
            payment_method: serde_json::json!({ "type": method_type }),
            donation_token,
            donation_original_psp_reference: psp_reference,
            donation_account: config.donation_account.clone(),
            return_url: params.return_url,
            shopper_interaction: "ContAuth".to_string(),
        };
        info!("💰️ Donating {} {} for order {}", params.amount, order.currency, order.order_number);
        let result = self.gateway.donations(sales_channel, &request).await?;
        Ok(result)
    }

    /// Opens an Adyen order for the full order total, so that it can be paid with several payment methods.
    pub async fn create_adyen_order(&self, order_id: &str) -> Result<CheckoutOrderStatus, PaymentError> {
        let order = self.order(order_id).await?;
        let sales_channel = order.sales_channel_id.as_deref();
        let request = CreateOrderRequest {
            merchant_account: self.gateway.config(sales_channel).merchant_account.clone(),
            amount: Some(Amount::new(order.amount_total, order.currency.as_str())),
            reference: order.order_number.clone(),
        };
        let status = self.gateway.create_order(sales_channel, &request).await?;
        info!("💰️ Adyen order {} opened for order {}", status.psp_reference, order.order_number);
        Ok(status)
    }

    pub async fn cancel_adyen_order(
        &self,
        order_id: &str,
        reference: AdyenOrderReference,
    ) -> Result<CancelOrderResponse, PaymentError> {
        let order = self.order(order_id).await?;
        let sales_channel = order.sales_channel_id.as_deref();
        let request = CancelOrderRequest {
            merchant_account: self.gateway.config(sales_channel).merchant_account.clone(),
            order: reference,
        };
        let response = self.gateway.cancel_order(sales_channel, &request).await?;
        info!("💰️ Adyen order {} for {} cancelled: {}", request.order.psp_reference, order.order_number, response.result_code);
        Ok(response)
    }

    /// Stores component state data until the order is placed and paid.
    pub async fn save_state_data(&self, token: &str, state_data: &Value) -> Result<PaymentStateData, PaymentError> {
        if token.is_empty() {
            return Err(PaymentError::InvalidRequest("A state data token is required".into()));
        }
        let record = self.db.save_state_data(token, &state_data.to_string()).await?;
        Ok(record)
    }

    pub async fn partial_payments(&self, order_id: &str) -> Result<PartialPayments, PaymentError> {
        let order = self.order(order_id).await?;
        self.partial_payments_for(&order).await
    }

    async fn partial_payments_for(&self, order: &Order) -> Result<PartialPayments, PaymentError> {
        let payments = self.db.fetch_adyen_payments(&order.order_number).await?;
        Ok(PartialPayments::new(order.order_id.clone(), order.amount_total, payments))
    }

    async fn order(&self, order_id: &str) -> Result<Order, PaymentError> {
        self.db.fetch_order_by_order_id(order_id).await?.ok_or_else(|| PaymentError::OrderNotFound(order_id.to_string()))
    }

    async fn adyen_transaction(&self, order: &Order) -> Result<OrderTransaction, PaymentError> {
        let transactions = self.db.fetch_transactions(&order.order_id).await?;
        latest_adyen_transaction(transactions).ok_or_else(|| PaymentError::NoAdyenTransaction(order.order_number.clone()))
    }

    async fn latest_response(&self, order: &Order, tx: &OrderTransaction) -> Result<PaymentResponse, PaymentError> {
        let record = self
            .db
            .fetch_latest_payment_response(&tx.transaction_id)
            .await?
            .ok_or_else(|| PaymentError::NoPaymentResponse(order.order_number.clone()))?;
        serde_json::from_str::<PaymentResponse>(&record.response).or_else(|e| {
            warn!("💰️ Stored payment response for {} is unreadable. {e}", order.order_number);
            let code = serde_json::from_value::<ResultCode>(Value::String(record.result_code)).unwrap_or(ResultCode::Unknown);
            Ok(PaymentResponse::new(code))
        })
    }

    async fn state_data(&self, params: &PayParams) -> Result<Value, PaymentError> {
        if let Some(data) = &params.state_data {
            return Ok(data.clone());
        }
        let token =
            params.state_data_token.as_deref().ok_or_else(|| PaymentError::InvalidRequest("No state data was sent".into()))?;
        let record =
            self.db.take_state_data(token).await?.ok_or_else(|| PaymentError::StateDataNotFound(token.to_string()))?;
        serde_json::from_str(&record.state_data).map_err(|e| PaymentError::InvalidRequest(format!("Invalid state data. {e}")))
    }
}

fn line_item(item: &OrderLineItem) -> LineItem {
    let quantity = item.quantity.max(1);
    let tax_per_item = item.tax_amount.value() / quantity;
    LineItem {
        id: item.line_item_id.clone(),
        description: item.label.clone(),
        quantity: item.quantity,
        amount_excluding_tax: MinorUnits::from(item.unit_price.value() - tax_per_item),
        amount_including_tax: item.unit_price,
        tax_amount: MinorUnits::from(tax_per_item),
        tax_percentage: item.tax_rate,
    }
}
