use std::sync::{
    atomic::{AtomicU64, Ordering},
    Mutex,
};

use adyen_tools::{
    data_objects::{
        CancelOrderRequest,
        CancelOrderResponse,
        CheckoutOrderStatus,
        CreateOrderRequest,
        DonationRequest,
        ModificationRequest,
        ModificationResponse,
        PaymentDetailsRequest,
        PaymentMethodsRequest,
        PaymentRequest,
        PaymentResponse,
        ResultCode,
        CAPTURE_RECEIVED,
        REFUND_RECEIVED,
    },
    AdyenApiError,
    AdyenConfig,
    AdyenConfigs,
};
use serde_json::{json, Value};

/// A [`PaymentGateway`](crate::traits::PaymentGateway) that records every request and answers with canned responses.
///
/// Captures and refunds are accepted by default. Payments answer `Authorised` unless another response is queued with
/// [`StubGateway::queue_payment_response`].
#[derive(Default)]
pub struct StubGateway {
    configs: AdyenConfigs,
    counter: AtomicU64,
    capture_answer: Mutex<Option<String>>,
    refund_answer: Mutex<Option<String>>,
    failure: Mutex<Option<AdyenApiError>>,
    payment_responses: Mutex<Vec<PaymentResponse>>,
    pub captures: Mutex<Vec<ModificationRequest>>,
    pub refunds: Mutex<Vec<ModificationRequest>>,
    pub payments: Mutex<Vec<PaymentRequest>>,
    pub details: Mutex<Vec<PaymentDetailsRequest>>,
    pub donations: Mutex<Vec<DonationRequest>>,
    pub orders: Mutex<Vec<CreateOrderRequest>>,
}

impl StubGateway {
    pub fn new(configs: AdyenConfigs) -> Self {
        Self { configs, ..Default::default() }
    }

    /// Answer capture requests with `response` instead of `[capture-received]`.
    pub fn answer_captures_with(&self, response: &str) {
        *self.capture_answer.lock().unwrap() = Some(response.to_string());
    }

    pub fn answer_refunds_with(&self, response: &str) {
        *self.refund_answer.lock().unwrap() = Some(response.to_string());
    }

    /// Every subsequent request fails with `error`.
    pub fn fail_with(&self, error: AdyenApiError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    pub fn queue_payment_response(&self, response: PaymentResponse) {
        self.payment_responses.lock().unwrap().push(response);
    }

    pub fn capture_count(&self) -> usize {
        self.captures.lock().unwrap().len()
    }

    pub fn refund_count(&self) -> usize {
        self.refunds.lock().unwrap().len()
    }

    fn check_failure(&self) -> Result<(), AdyenApiError> {
        match self.failure.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn next_psp_reference(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("STUBPSP{:09}", n + 1)
    }

    fn next_payment_response(&self, reference: &str) -> PaymentResponse {
        let mut queue = self.payment_responses.lock().unwrap();
        if queue.is_empty() {
            let mut response = PaymentResponse::new(ResultCode::Authorised);
            response.psp_reference = Some(self.next_psp_reference());
            response.merchant_reference = Some(reference.to_string());
            response
        } else {
            queue.remove(0)
        }
    }
}

impl crate::traits::PaymentGateway for StubGateway {
    fn config(&self, sales_channel_id: Option<&str>) -> &AdyenConfig {
        self.configs.for_sales_channel(sales_channel_id)
    }

    async fn payment_methods(
        &self,
        _sales_channel_id: Option<&str>,
        request: &PaymentMethodsRequest,
    ) -> Result<Value, AdyenApiError> {
        self.check_failure()?;
        Ok(json!({
            "paymentMethods": [
                { "name": "Cards", "type": "scheme" },
                { "name": "iDEAL", "type": "ideal" },
            ],
            "merchantAccount": request.merchant_account,
        }))
    }

    async fn payments(
        &self,
        _sales_channel_id: Option<&str>,
        request: &PaymentRequest,
    ) -> Result<PaymentResponse, AdyenApiError> {
        self.check_failure()?;
        self.payments.lock().unwrap().push(request.clone());
        Ok(self.next_payment_response(&request.reference))
    }

    async fn payment_details(
        &self,
        _sales_channel_id: Option<&str>,
        request: &PaymentDetailsRequest,
    ) -> Result<PaymentResponse, AdyenApiError> {
        self.check_failure()?;
        self.details.lock().unwrap().push(request.clone());
        Ok(self.next_payment_response(""))
    }

    async fn donations(&self, _sales_channel_id: Option<&str>, request: &DonationRequest) -> Result<Value, AdyenApiError> {
        self.check_failure()?;
        self.donations.lock().unwrap().push(request.clone());
        Ok(json!({ "status": "completed", "reference": request.reference }))
    }

    async fn create_order(
        &self,
        _sales_channel_id: Option<&str>,
        request: &CreateOrderRequest,
    ) -> Result<CheckoutOrderStatus, AdyenApiError> {
        self.check_failure()?;
        self.orders.lock().unwrap().push(request.clone());
        Ok(CheckoutOrderStatus {
            psp_reference: self.next_psp_reference(),
            order_data: "Ab02b4c0!BQABAgA=".to_string(),
            amount: request.amount.clone(),
            remaining_amount: request.amount.clone(),
            reference: Some(request.reference.clone()),
            result_code: Some("Success".to_string()),
            ..Default::default()
        })
    }

    async fn cancel_order(
        &self,
        _sales_channel_id: Option<&str>,
        request: &CancelOrderRequest,
    ) -> Result<CancelOrderResponse, AdyenApiError> {
        self.check_failure()?;
        Ok(CancelOrderResponse {
            psp_reference: request.order.psp_reference.clone(),
            result_code: "Received".to_string(),
        })
    }

    async fn capture(
        &self,
        _sales_channel_id: Option<&str>,
        request: &ModificationRequest,
    ) -> Result<ModificationResponse, AdyenApiError> {
        self.check_failure()?;
        self.captures.lock().unwrap().push(request.clone());
        let response = self.capture_answer.lock().unwrap().clone().unwrap_or_else(|| CAPTURE_RECEIVED.to_string());
        Ok(ModificationResponse { psp_reference: self.next_psp_reference(), response, additional_data: None })
    }

    async fn refund(
        &self,
        _sales_channel_id: Option<&str>,
        request: &ModificationRequest,
    ) -> Result<ModificationResponse, AdyenApiError> {
        self.check_failure()?;
        self.refunds.lock().unwrap().push(request.clone());
        let response = self.refund_answer.lock().unwrap().clone().unwrap_or_else(|| REFUND_RECEIVED.to_string());
        Ok(ModificationResponse { psp_reference: self.next_psp_reference(), response, additional_data: None })
    }
}
