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
    },
    AdyenApi,
    AdyenApiError,
    AdyenConfig,
};
use serde_json::Value;

/// Everything the engine needs from the Adyen APIs, plus the merchant configuration for each sales channel.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    fn config(&self, sales_channel_id: Option<&str>) -> &AdyenConfig;

    async fn payment_methods(
        &self,
        sales_channel_id: Option<&str>,
        request: &PaymentMethodsRequest,
    ) -> Result<Value, AdyenApiError>;

    async fn payments(
        &self,
        sales_channel_id: Option<&str>,
        request: &PaymentRequest,
    ) -> Result<PaymentResponse, AdyenApiError>;

    async fn payment_details(
        &self,
        sales_channel_id: Option<&str>,
        request: &PaymentDetailsRequest,
    ) -> Result<PaymentResponse, AdyenApiError>;

    async fn donations(&self, sales_channel_id: Option<&str>, request: &DonationRequest)
        -> Result<Value, AdyenApiError>;

    async fn create_order(
        &self,
        sales_channel_id: Option<&str>,
        request: &CreateOrderRequest,
    ) -> Result<CheckoutOrderStatus, AdyenApiError>;

    async fn cancel_order(
        &self,
        sales_channel_id: Option<&str>,
        request: &CancelOrderRequest,
    ) -> Result<CancelOrderResponse, AdyenApiError>;

    async fn capture(
        &self,
        sales_channel_id: Option<&str>,
        request: &ModificationRequest,
    ) -> Result<ModificationResponse, AdyenApiError>;

    async fn refund(
        &self,
        sales_channel_id: Option<&str>,
        request: &ModificationRequest,
    ) -> Result<ModificationResponse, AdyenApiError>;
}

impl PaymentGateway for AdyenApi {
    fn config(&self, sales_channel_id: Option<&str>) -> &AdyenConfig {
        AdyenApi::config(self, sales_channel_id)
    }

    async fn payment_methods(
        &self,
        sales_channel_id: Option<&str>,
        request: &PaymentMethodsRequest,
    ) -> Result<Value, AdyenApiError> {
        AdyenApi::payment_methods(self, sales_channel_id, request).await
    }

    async fn payments(
        &self,
        sales_channel_id: Option<&str>,
        request: &PaymentRequest,
    ) -> Result<PaymentResponse, AdyenApiError> {
        AdyenApi::payments(self, sales_channel_id, request).await
    }

    async fn payment_details(
        &self,
        sales_channel_id: Option<&str>,
        request: &PaymentDetailsRequest,
    ) -> Result<PaymentResponse, AdyenApiError> {
        AdyenApi::payment_details(self, sales_channel_id, request).await
    }

    async fn donations(
        &self,
        sales_channel_id: Option<&str>,
        request: &DonationRequest,
    ) -> Result<Value, AdyenApiError> {
        AdyenApi::donations(self, sales_channel_id, request).await
    }

    async fn create_order(
        &self,
        sales_channel_id: Option<&str>,
        request: &CreateOrderRequest,
    ) -> Result<CheckoutOrderStatus, AdyenApiError> {
        AdyenApi::create_order(self, sales_channel_id, request).await
    }

    async fn cancel_order(
        &self,
        sales_channel_id: Option<&str>,
        request: &CancelOrderRequest,
    ) -> Result<CancelOrderResponse, AdyenApiError> {
        AdyenApi::cancel_order(self, sales_channel_id, request).await
    }

    async fn capture(
        &self,
        sales_channel_id: Option<&str>,
        request: &ModificationRequest,
    ) -> Result<ModificationResponse, AdyenApiError> {
        AdyenApi::capture(self, sales_channel_id, request).await
    }

    async fn refund(
        &self,
        sales_channel_id: Option<&str>,
        request: &ModificationRequest,
    ) -> Result<ModificationResponse, AdyenApiError> {
        AdyenApi::refund(self, sales_channel_id, request).await
    }
}
