use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use adyen_payment_engine::{
    test_utils::{
        fixtures::{notification_item, notification_request, test_config, NOTIFICATION_PASSWORD, NOTIFICATION_USER},
        TestSystem,
    },
    traits::NotificationManagement,
    NotificationReceiver,
    SqliteDatabase,
};
use adyen_tools::data_objects::NotificationRequest;

use super::helpers::send_request;
use crate::{config::ServerOptions, routes::NotificationRoute};

const ADYEN_IP: &str = "82.199.87.129";

#[actix_web::test]
async fn notifications_are_accepted_and_stored() {
    let TestSystem { db, receiver, .. } = TestSystem::new(test_config()).await;
    let req = webhook_request(NOTIFICATION_PASSWORD, sample_request());
    let (status, body) = send_request(req, configure(receiver, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[accepted]");
    assert_eq!(db.count_unprocessed_notifications().await.unwrap(), 1);
}

#[actix_web::test]
async fn duplicate_notifications_are_accepted_once() {
    let TestSystem { db, receiver, .. } = TestSystem::new(test_config()).await;
    let (status, _) =
        send_request(webhook_request(NOTIFICATION_PASSWORD, sample_request()), configure(receiver.clone(), None)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) =
        send_request(webhook_request(NOTIFICATION_PASSWORD, sample_request()), configure(receiver, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[accepted]");
    assert_eq!(db.fetch_notifications_for_reference("1001").await.unwrap().len(), 1);
}

#[actix_web::test]
async fn wrong_password_is_unauthorized() {
    let TestSystem { db, receiver, .. } = TestSystem::new(test_config()).await;
    let req = webhook_request("guess", sample_request());
    let (status, body) = send_request(req, configure(receiver, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.starts_with(r#"{"error":"Authentication Error."#), "was: {body}");
    assert_eq!(db.count_unprocessed_notifications().await.unwrap(), 0);
}

#[actix_web::test]
async fn tampered_notifications_are_rejected() {
    let TestSystem { db, receiver, .. } = TestSystem::new(test_config()).await;
    let mut request = sample_request();
    if let Some(item) = request.notification_items.first_mut() {
        item.item.merchant_reference = "9999".to_string();
    }
    let (status, _) = send_request(webhook_request(NOTIFICATION_PASSWORD, request), configure(receiver, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(db.count_unprocessed_notifications().await.unwrap(), 0);
}

#[actix_web::test]
async fn whitelisted_peers_are_accepted() {
    let TestSystem { receiver, .. } = TestSystem::new(test_config()).await;
    let req = webhook_request(NOTIFICATION_PASSWORD, sample_request()).insert_header(("X-Forwarded-For", ADYEN_IP));
    let (status, body) = send_request(req, configure(receiver, Some(vec![ADYEN_IP]))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[accepted]");
}

#[actix_web::test]
async fn other_peers_are_forbidden() {
    let TestSystem { db, receiver, .. } = TestSystem::new(test_config()).await;
    let req = webhook_request(NOTIFICATION_PASSWORD, sample_request()).insert_header(("X-Forwarded-For", "10.9.9.9"));
    let (status, body) = send_request(req, configure(receiver, Some(vec![ADYEN_IP]))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"error":"Authentication Error. Requests from this address are not allowed."}"#);
    assert_eq!(db.count_unprocessed_notifications().await.unwrap(), 0);
}

fn sample_request() -> NotificationRequest {
    notification_request(vec![notification_item("PSP0001", "1001", "AUTHORISATION", true, Some(1000))])
}

fn webhook_request(password: &str, body: NotificationRequest) -> TestRequest {
    let credentials = base64::encode(format!("{NOTIFICATION_USER}:{password}"));
    TestRequest::post()
        .uri("/notification")
        .insert_header(("Authorization", format!("Basic {credentials}")))
        .set_json(body)
}

fn configure(
    receiver: NotificationReceiver<SqliteDatabase>,
    whitelist: Option<Vec<&str>>,
) -> impl FnOnce(&mut ServiceConfig) {
    let options = ServerOptions {
        use_x_forwarded_for: true,
        use_forwarded: false,
        adyen_whitelist: whitelist.map(|ips| ips.into_iter().map(|ip| ip.parse().unwrap()).collect()),
    };
    move |cfg| {
        cfg.service(NotificationRoute::<SqliteDatabase>::new())
            .app_data(web::Data::new(options))
            .app_data(web::Data::new(receiver));
    }
}
