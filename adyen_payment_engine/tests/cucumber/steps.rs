use adyen_payment_engine::{
    adyen_api::payment_objects::BasicAuthCredentials,
    db_types::{DeliveryState, MinorUnits},
    test_utils::fixtures::{
        notification_item,
        notification_request,
        sample_order,
        NOTIFICATION_PASSWORD,
        NOTIFICATION_USER,
    },
    traits::{NotificationManagement, OrderManagement},
};
use chrono::{Duration, Utc};
use cucumber::{then, when};

use crate::cucumber::PaymentWorld;

#[when(expr = "I import order {word} for {int} cents paid with {word}")]
async fn import_order(world: &mut PaymentWorld, order_number: String, amount: i64, method: String) {
    let order = sample_order(&order_number, amount, &method);
    world.engine().orders.import_order(order).await.expect("Error importing order");
}

//             Adyen sends a successful AUTHORISATION notification with psp [PSP1] for order 1001 and 1000 cents
#[when(expr = "Adyen sends a {word} {word} notification with psp [{word}] for order {word} and {int} cents")]
async fn send_notification(
    world: &mut PaymentWorld,
    outcome: String,
    event_code: String,
    psp: String,
    order_number: String,
    amount: i64,
) {
    let success = match outcome.as_str() {
        "successful" => true,
        "failed" => false,
        _ => panic!("Unknown outcome {outcome}"),
    };
    let request = notification_request(vec![notification_item(&psp, &order_number, &event_code, success, Some(amount))]);
    let credentials = BasicAuthCredentials::new(NOTIFICATION_USER, NOTIFICATION_PASSWORD);
    let response =
        world.engine().receiver.process(&request, Some(&credentials), None).await.expect("Notification was rejected");
    assert!(response.starts_with("[accepted]"));
}

#[when("the notification processor runs")]
async fn run_processor(world: &mut PaymentWorld) {
    let now = Utc::now() + Duration::seconds(1);
    world.engine().processor.process_scheduled(now).await.expect("Error processing notifications");
}

#[when(expr = "delivery {word} of order {word} is {word}")]
async fn update_delivery(world: &mut PaymentWorld, delivery_id: String, order_id: String, state: String) {
    let state = state.parse::<DeliveryState>().expect("Invalid delivery state");
    world.engine().orders.update_delivery_state(&order_id, &delivery_id, state).await.expect("Error updating delivery");
}

#[when(expr = "the merchant refunds {int} cents of order {word}")]
async fn refund(world: &mut PaymentWorld, amount: i64, order_id: String) {
    world.engine().refunds.refund_order(&order_id, MinorUnits::from(amount)).await.expect("Error refunding order");
}

#[then(expr = "transaction {word} is {word}")]
async fn transaction_state(world: &mut PaymentWorld, transaction_id: String, state: String) {
    let tx = world
        .engine()
        .db
        .fetch_transaction(&transaction_id)
        .await
        .expect("Error fetching transaction")
        .expect("Transaction does not exist");
    assert_eq!(tx.state.to_string(), state, "Transaction state is incorrect");
}

#[then(expr = "order {word} has {int} capture(s) with status {word}")]
async fn captures(world: &mut PaymentWorld, order_id: String, count: usize, status: String) {
    let captures = world.engine().captures.captures_for_order(&order_id).await.expect("Error fetching captures");
    assert_eq!(captures.len(), count, "Wrong number of captures");
    assert!(captures.iter().all(|c| c.status.to_string() == status), "Capture status is incorrect");
}

#[then(expr = "order {word} has {int} refund(s) with status {word}")]
async fn refunds(world: &mut PaymentWorld, order_id: String, count: usize, status: String) {
    let refunds = world.engine().refunds.refunds_for_order(&order_id).await.expect("Error fetching refunds");
    assert_eq!(refunds.len(), count, "Wrong number of refunds");
    assert!(refunds.iter().all(|r| r.status.to_string() == status), "Refund status is incorrect");
}

#[when(expr = "the last capture for order {word} settles with a successful CAPTURE notification")]
async fn settle_capture(world: &mut PaymentWorld, order_id: String) {
    let engine = world.engine();
    let captures = engine.captures.captures_for_order(&order_id).await.expect("Error fetching captures");
    let capture = captures.last().expect("No captures");
    let order = engine.orders.order(&order_id).await.expect("Order does not exist");
    let item = notification_item(&capture.psp_reference, &order.order_number, "CAPTURE", true, Some(capture.amount.value()));
    let credentials = BasicAuthCredentials::new(NOTIFICATION_USER, NOTIFICATION_PASSWORD);
    engine.receiver.process(&notification_request(vec![item]), Some(&credentials), None).await.expect("Rejected");
    engine.processor.process_scheduled(Utc::now() + Duration::seconds(1)).await.expect("Error processing");
}

#[when(expr = "the last refund for order {word} settles with a successful REFUND notification")]
async fn settle_refund(world: &mut PaymentWorld, order_id: String) {
    let engine = world.engine();
    let refunds = engine.refunds.refunds_for_order(&order_id).await.expect("Error fetching refunds");
    let refund = refunds.last().expect("No refunds");
    let order = engine.orders.order(&order_id).await.expect("Order does not exist");
    let item = notification_item(&refund.psp_reference, &order.order_number, "REFUND", true, Some(refund.amount.value()));
    let credentials = BasicAuthCredentials::new(NOTIFICATION_USER, NOTIFICATION_PASSWORD);
    engine.receiver.process(&notification_request(vec![item]), Some(&credentials), None).await.expect("Rejected");
    engine.processor.process_scheduled(Utc::now() + Duration::seconds(1)).await.expect("Error processing");
}

#[then(expr = "there are {int} unprocessed notifications")]
async fn unprocessed(world: &mut PaymentWorld, count: i64) {
    let pending = world.engine().db.count_unprocessed_notifications().await.expect("Error counting notifications");
    assert_eq!(pending, count, "Wrong number of unprocessed notifications");
}

#[then(expr = "{int} capture request(s) was/were sent to Adyen")]
async fn capture_requests(world: &mut PaymentWorld, count: usize) {
    assert_eq!(world.engine().gateway.capture_count(), count, "Wrong number of capture requests");
}
