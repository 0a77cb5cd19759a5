use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{
    config::{AdyenConfig, AdyenConfigs},
    data_objects::{
        AdyenErrorBody,
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
    AdyenApiError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdyenService {
    Checkout,
    Payment,
}

/// Client for the Adyen Checkout and Payment APIs.
///
/// One client serves every sales channel; the API key and base url are picked per request from the channel's
/// configuration.
#[derive(Clone)]
pub struct AdyenApi {
    configs: Arc<AdyenConfigs>,
    client: Arc<Client>,
}

impl AdyenApi {
    pub fn new(configs: AdyenConfigs) -> Result<Self, AdyenApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| AdyenApiError::Initialization(e.to_string()))?;
        Ok(Self { configs: Arc::new(configs), client: Arc::new(client) })
    }

    pub fn configs(&self) -> &AdyenConfigs {
        &self.configs
    }

    pub fn config(&self, sales_channel_id: Option<&str>) -> &AdyenConfig {
        self.configs.for_sales_channel(sales_channel_id)
    }

    pub fn url(&self, sales_channel_id: Option<&str>, service: AdyenService, path: &str) -> String {
        let config = self.config(sales_channel_id);
        match service {
            AdyenService::Checkout => format!("{}{path}", config.checkout_url()),
            AdyenService::Payment => format!("{}{path}", config.payment_url()),
        }
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        sales_channel_id: Option<&str>,
        method: Method,
        service: AdyenService,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, AdyenApiError> {
        let config = self.config(sales_channel_id);
        if config.api_key().is_empty() {
            return Err(AdyenApiError::ConfigurationError(format!(
                "No {} API key is configured for sales channel {}",
                config.environment,
                sales_channel_id.unwrap_or("default")
            )));
        }
        let url = self.url(sales_channel_id, service, path);
        trace!("Sending REST query: {url}");
        let api_key =
            HeaderValue::from_str(config.api_key().reveal()).map_err(|e| AdyenApiError::RestRequestError(e.to_string()))?;
        let mut req = self.client.request(method, url).header("X-API-Key", api_key);
        if let Some(body) = body {
            req = req.json(body);
        }
        let response = req.send().await.map_err(|e| AdyenApiError::RestResponseError(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            trace!("REST query successful. {status}");
            response.json::<T>().await.map_err(|e| AdyenApiError::JsonError(e.to_string()))
        } else {
            let message = response.text().await.map_err(|e| AdyenApiError::RestResponseError(e.to_string()))?;
            Err(parse_error_body(status.as_u16(), &message))
        }
    }

    async fn checkout<T: DeserializeOwned, B: Serialize>(
        &self,
        sales_channel_id: Option<&str>,
        path: &str,
        body: &B,
    ) -> Result<T, AdyenApiError> {
        self.rest_query(sales_channel_id, Method::POST, AdyenService::Checkout, path, Some(body)).await
    }

    pub async fn payment_methods(
        &self,
        sales_channel_id: Option<&str>,
        request: &PaymentMethodsRequest,
    ) -> Result<Value, AdyenApiError> {
        debug!("Fetching payment methods for {}", request.merchant_account);
        self.checkout(sales_channel_id, "/paymentMethods", request).await
    }

    pub async fn payments(
        &self,
        sales_channel_id: Option<&str>,
        request: &PaymentRequest,
    ) -> Result<PaymentResponse, AdyenApiError> {
        debug!("Submitting payment for order {}", request.reference);
        let response = self.checkout::<PaymentResponse, _>(sales_channel_id, "/payments", request).await?;
        info!("Payment for order {} returned {}", request.reference, response.result_code);
        Ok(response)
    }

    pub async fn payment_details(
        &self,
        sales_channel_id: Option<&str>,
        request: &PaymentDetailsRequest,
    ) -> Result<PaymentResponse, AdyenApiError> {
        self.checkout(sales_channel_id, "/payments/details", request).await
    }

    pub async fn donations(
        &self,
        sales_channel_id: Option<&str>,
        request: &DonationRequest,
    ) -> Result<Value, AdyenApiError> {
        debug!("Submitting donation for {}", request.reference);
        self.checkout(sales_channel_id, "/donations", request).await
    }

    pub async fn create_order(
        &self,
        sales_channel_id: Option<&str>,
        request: &CreateOrderRequest,
    ) -> Result<CheckoutOrderStatus, AdyenApiError> {
        debug!("Creating Adyen order for {}", request.reference);
        self.checkout(sales_channel_id, "/orders", request).await
    }

    pub async fn cancel_order(
        &self,
        sales_channel_id: Option<&str>,
        request: &CancelOrderRequest,
    ) -> Result<CancelOrderResponse, AdyenApiError> {
        debug!("Cancelling Adyen order {}", request.order.psp_reference);
        self.checkout(sales_channel_id, "/orders/cancel", request).await
    }

    pub async fn capture(
        &self,
        sales_channel_id: Option<&str>,
        request: &ModificationRequest,
    ) -> Result<ModificationResponse, AdyenApiError> {
        debug!("Requesting capture of {}", request.original_reference);
        self.rest_query(sales_channel_id, Method::POST, AdyenService::Payment, "/capture", Some(request)).await
    }

    pub async fn refund(
        &self,
        sales_channel_id: Option<&str>,
        request: &ModificationRequest,
    ) -> Result<ModificationResponse, AdyenApiError> {
        debug!("Requesting refund of {}", request.original_reference);
        self.rest_query(sales_channel_id, Method::POST, AdyenService::Payment, "/refund", Some(request)).await
    }
}

/// Converts an error response into a [`AdyenApiError::GatewayError`] when Adyen sent its structured error body.
pub fn parse_error_body(status: u16, body: &str) -> AdyenApiError {
    match serde_json::from_str::<AdyenErrorBody>(body) {
        Ok(err) => {
            warn!("Adyen returned error {} ({}): {}", err.error_code, err.status, err.message);
            AdyenApiError::GatewayError {
                status: err.status,
                error_code: err.error_code,
                message: err.message,
                psp_reference: err.psp_reference,
            }
        },
        Err(_) => AdyenApiError::QueryError { status, message: body.to_string() },
    }
}

#[cfg(test)]
mod test {
    use apg_common::Secret;

    use super::*;

    #[test]
    fn structured_errors() {
        let body = r#"{"status":422,"errorCode":"124","message":"Field 'shopperEmail' is not valid.","errorType":"validation","pspReference":"QWERTY"}"#;
        match parse_error_body(422, body) {
            AdyenApiError::GatewayError { status, error_code, psp_reference, .. } => {
                assert_eq!(status, 422);
                assert_eq!(error_code, "124");
                assert_eq!(psp_reference.as_deref(), Some("QWERTY"));
            },
            e => panic!("Unexpected error: {e}"),
        }
        let err = parse_error_body(502, "Bad gateway");
        assert!(matches!(err, AdyenApiError::QueryError { status: 502, .. }));
        assert!(err.error_code().is_none());
    }

    #[test]
    fn urls_per_channel() {
        let default = AdyenConfig::default();
        let eu = AdyenConfig { checkout_url: Some("http://localhost:8999/checkout".into()), ..Default::default() };
        let api = AdyenApi::new(AdyenConfigs::new(default).with_channel("eu", eu)).unwrap();
        assert_eq!(api.url(None, AdyenService::Checkout, "/payments"), "https://checkout-test.adyen.com/v70/payments");
        assert_eq!(api.url(Some("eu"), AdyenService::Checkout, "/payments"), "http://localhost:8999/checkout/payments");
        assert_eq!(
            api.url(Some("eu"), AdyenService::Payment, "/refund"),
            "https://pal-test.adyen.com/pal/servlet/Payment/v68/refund"
        );
    }

    #[tokio::test]
    async fn missing_api_key_is_a_configuration_error() {
        let api = AdyenApi::new(AdyenConfigs::default()).unwrap();
        let request = PaymentMethodsRequest { merchant_account: "TestMerchant".into(), ..Default::default() };
        let err = api.payment_methods(None, &request).await.unwrap_err();
        assert!(matches!(err, AdyenApiError::ConfigurationError(_)));
        let config = AdyenConfig { api_key_test: Secret::new("key".into()), ..Default::default() };
        assert!(!AdyenApi::new(AdyenConfigs::new(config)).unwrap().config(None).api_key().is_empty());
    }
}
