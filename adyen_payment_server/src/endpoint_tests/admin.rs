use std::sync::Arc;

use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use adyen_payment_engine::{
    db_types::{LedgerSource, LedgerStatus, MinorUnits, Order, PaymentCapture, Refund},
    events::EventProducers,
    test_utils::{fixtures::test_configs, StubGateway},
    CaptureApi,
    OrderApi,
    RefundApi,
    TransactionStateApi,
};
use apg_common::Secret;
use chrono::{TimeZone, Utc};

use super::{helpers::send_request, mocks::MockAdyenBackend};
use crate::{
    middleware::AdminTokenMiddlewareFactory,
    routes::{CapturesForOrderRoute, RefundRoute, RefundsForOrderRoute},
};

const ADMIN_TOKEN: &str = "admin-token-for-tests";

#[actix_web::test]
async fn fetch_captures_without_token() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/api/adyen/orders/order-1001/captures");
    let (status, body) = send_request(req, configure_captures).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication Error. No credentials were provided."}"#);
}

#[actix_web::test]
async fn fetch_captures_with_wrong_token() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get()
        .uri("/api/adyen/orders/order-1001/captures")
        .insert_header(("Authorization", "Bearer not-the-token"));
    let (status, body) = send_request(req, configure_captures).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("The credentials are invalid."), "was: {body}");
}

#[actix_web::test]
async fn fetch_captures() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get()
        .uri("/api/adyen/orders/order-1001/captures")
        .insert_header(("Authorization", format!("Bearer {ADMIN_TOKEN}")));
    let (status, body) = send_request(req, configure_captures).await;
    assert_eq!(status, StatusCode::OK);
    let captures: Vec<PaymentCapture> = serde_json::from_str(&body).unwrap();
    assert_eq!(captures.len(), 1);
    assert_eq!(captures[0].psp_reference, "CAPTURE0001");
    assert_eq!(captures[0].amount, MinorUnits::from(1000));
    assert_eq!(captures[0].status, LedgerStatus::Success);
}

#[actix_web::test]
async fn fetch_refunds() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get()
        .uri("/api/adyen/orders/order-1001/refunds")
        .insert_header(("Authorization", format!("Bearer {ADMIN_TOKEN}")));
    let (status, body) = send_request(req, configure_refunds).await;
    assert_eq!(status, StatusCode::OK);
    let refunds: Vec<Refund> = serde_json::from_str(&body).unwrap();
    assert_eq!(refunds.len(), 1);
    assert_eq!(refunds[0].amount, MinorUnits::from(800));
}

#[actix_web::test]
async fn refund_more_than_is_left() {
    let _ = env_logger::try_init().ok();
    // 800 of 1000 has been refunded already
    let req = TestRequest::post()
        .uri("/api/adyen/refunds")
        .insert_header(("Authorization", format!("Bearer {ADMIN_TOKEN}")))
        .set_json(serde_json::json!({ "orderId": "order-1001", "refundAmount": 5.0 }));
    let (status, body) = send_request(req, configure_refunds).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        r#"{"error":"The request could not be completed. The requested amount cannot be refunded for order 1001"}"#
    );
}

#[actix_web::test]
async fn refund_a_negative_amount() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/api/adyen/refunds")
        .insert_header(("Authorization", format!("Bearer {ADMIN_TOKEN}")))
        .set_json(serde_json::json!({ "orderId": "order-1001", "refundAmount": -1.5 }));
    let (status, body) = send_request(req, configure_refunds).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Invalid refund amount"), "was: {body}");
}

fn admin_guard() -> AdminTokenMiddlewareFactory {
    AdminTokenMiddlewareFactory::new(Secret::new(ADMIN_TOKEN.to_string()))
}

fn gateway() -> Arc<StubGateway> {
    Arc::new(StubGateway::new(test_configs()))
}

fn configure_captures(cfg: &mut ServiceConfig) {
    let mut backend = MockAdyenBackend::new();
    backend.expect_fetch_captures_for_order().returning(|_| Ok(vec![sample_capture()]));
    let captures_api = CaptureApi::new(backend, gateway());
    cfg.service(
        web::scope("/api").wrap(admin_guard()).service(CapturesForOrderRoute::<MockAdyenBackend, StubGateway>::new()),
    )
        .app_data(web::Data::new(captures_api));
}

fn configure_refunds(cfg: &mut ServiceConfig) {
    let gateway = gateway();
    let mut orders_backend = MockAdyenBackend::new();
    orders_backend.expect_fetch_order_by_order_id().returning(|_| Ok(Some(sample_order())));
    let orders_api = OrderApi::new(orders_backend, CaptureApi::new(MockAdyenBackend::new(), Arc::clone(&gateway)));
    let mut refunds_backend = MockAdyenBackend::new();
    refunds_backend.expect_fetch_refunds_for_order().returning(|_| Ok(vec![sample_refund()]));
    let states = TransactionStateApi::new(MockAdyenBackend::new(), EventProducers::default());
    let refunds_api = RefundApi::new(refunds_backend, gateway, states);
    cfg.service(
        web::scope("/api")
            .wrap(admin_guard())
            .service(RefundRoute::<MockAdyenBackend, StubGateway>::new())
            .service(RefundsForOrderRoute::<MockAdyenBackend, StubGateway>::new()),
    )
    .app_data(web::Data::new(orders_api))
    .app_data(web::Data::new(refunds_api));
}

fn sample_order() -> Order {
    Order {
        id: 1,
        order_id: "order-1001".to_string(),
        order_number: "1001".to_string(),
        sales_channel_id: None,
        customer_id: Some("customer-1001".to_string()),
        customer_email: None,
        amount_total: MinorUnits::from(1000),
        currency: "EUR".to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap(),
    }
}

fn sample_capture() -> PaymentCapture {
    PaymentCapture {
        id: 1,
        order_transaction_id: "tx-1001".to_string(),
        psp_reference: "CAPTURE0001".to_string(),
        amount: MinorUnits::from(1000),
        currency: "EUR".to_string(),
        source: LedgerSource::Merchant,
        status: LedgerStatus::Success,
        created_at: Utc.with_ymd_and_hms(2024, 6, 2, 9, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 6, 2, 9, 5, 0).unwrap(),
    }
}

fn sample_refund() -> Refund {
    Refund {
        id: 1,
        order_transaction_id: "tx-1001".to_string(),
        psp_reference: "REFUND0001".to_string(),
        amount: MinorUnits::from(800),
        currency: "EUR".to_string(),
        source: LedgerSource::Merchant,
        status: LedgerStatus::Success,
        created_at: Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 6, 3, 9, 5, 0).unwrap(),
    }
}
