//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module or the engine. Keep this module neat and
//! tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Any long, non-cpu-bound operation (e.g. I/O, database operations,
//! calls to Adyen) must be expressed as futures or asynchronous functions.
//!
//! Routes are grouped into:
//! * admin routes, mounted under `/api` behind the admin token middleware,
//! * store-api routes, mounted under `/store-api/v{version}/adyen`. The webhook receiver lives here too.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use adyen_payment_engine::{
    adyen_api::payment_objects::{DonationParams, PayParams, PaymentDetailsParams, PaymentMethodsParams},
    db_types::NewOrder,
    traits::{AdyenDatabase, NotificationManagement, PaymentGateway},
    CaptureApi,
    NotificationProcessor,
    NotificationReceiver,
    OrderApi,
    PaymentApi,
    RefundApi,
};
use adyen_tools::data_objects::NotificationRequest;
use apg_common::sanitize_amount;
use log::*;

use crate::{
    config::ServerOptions,
    data_objects::{
        CancelOrderRequest,
        CaptureRequest,
        CaptureResult,
        DeliveryUpdate,
        DeliveryUpdateResult,
        JsonResponse,
        OrderIdRequest,
        RefundRequest,
        RefundResult,
        StateDataRequest,
    },
    errors::{AuthError, ServerError},
    helpers::{basic_auth_credentials, get_remote_ip, is_whitelisted, sales_channel_id},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Captures  ----------------------------------------------------
route!(capture => Post "/adyen/capture" impl AdyenDatabase, PaymentGateway);
/// Captures the order total against the order's authorized Adyen transaction. This is the admin "capture" button.
pub async fn capture<B: AdyenDatabase, G: PaymentGateway>(
    body: web::Json<CaptureRequest>,
    api: web::Data<CaptureApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = body.into_inner().order_id;
    info!("💻️ Capture requested for order {order_id}");
    let captures = api.capture_order(&order_id).await.map_err(|e| {
        warn!("💻️ Could not capture order {order_id}. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(CaptureResult { success: true, captures }))
}

route!(captures_for_order => Get "/adyen/orders/{order_id}/captures" impl AdyenDatabase, PaymentGateway);
pub async fn captures_for_order<B: AdyenDatabase, G: PaymentGateway>(
    path: web::Path<String>,
    api: web::Data<CaptureApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET captures for order {order_id}");
    let captures = api.captures_for_order(&order_id).await?;
    Ok(HttpResponse::Ok().json(captures))
}

//----------------------------------------------   Refunds  ----------------------------------------------------
route!(refund => Post "/adyen/refunds" impl AdyenDatabase, PaymentGateway);
/// Requests a refund of `refundAmount` (a decimal in the order currency). Amounts that would take the refunded total
/// above the order total are refused with a 400 response.
pub async fn refund<B: AdyenDatabase, G: PaymentGateway>(
    body: web::Json<RefundRequest>,
    orders: web::Data<OrderApi<B, G>>,
    api: web::Data<RefundApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    info!("💻️ Refund of {} requested for order {}", request.refund_amount, request.order_id);
    let order = orders.order(&request.order_id).await?;
    let amount = sanitize_amount(request.refund_amount, &order.currency)?;
    if !amount.is_positive() {
        return Err(ServerError::InvalidRequestBody(format!("Invalid refund amount: {}", request.refund_amount)));
    }
    let refund = api.refund(&order, amount).await.map_err(|e| {
        warn!("💻️ Could not refund order {}. {e}", order.order_number);
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(RefundResult { success: true, refund }))
}

route!(refunds_for_order => Get "/adyen/orders/{order_id}/refunds" impl AdyenDatabase, PaymentGateway);
pub async fn refunds_for_order<B: AdyenDatabase, G: PaymentGateway>(
    path: web::Path<String>,
    api: web::Data<RefundApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET refunds for order {order_id}");
    let refunds = api.refunds_for_order(&order_id).await?;
    Ok(HttpResponse::Ok().json(refunds))
}

//----------------------------------------------   Notifications  ----------------------------------------------------
route!(notifications_for_order => Get "/adyen/orders/{order_id}/notifications" impl AdyenDatabase, PaymentGateway);
pub async fn notifications_for_order<B: AdyenDatabase, G: PaymentGateway>(
    path: web::Path<String>,
    api: web::Data<NotificationProcessor<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET notifications for order {order_id}");
    let notifications = api.notifications_for_order(&order_id).await?;
    Ok(HttpResponse::Ok().json(notifications))
}

route!(reschedule_notification => Get "/adyen/reschedule-notification/{notification_id}" impl AdyenDatabase, PaymentGateway);
pub async fn reschedule_notification<B: AdyenDatabase, G: PaymentGateway>(
    path: web::Path<i64>,
    api: web::Data<NotificationProcessor<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    info!("💻️ Rescheduling notification #{id}");
    let notification = api.reschedule(id).await?;
    let msg = format!("Notification {} for {} has been rescheduled", notification.id, notification.merchant_reference);
    Ok(HttpResponse::Ok().json(JsonResponse::success(msg)))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(partial_payments => Get "/adyen/orders/{order_id}/partial-payments" impl AdyenDatabase, PaymentGateway);
pub async fn partial_payments<B: AdyenDatabase, G: PaymentGateway>(
    path: web::Path<String>,
    api: web::Data<PaymentApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET partial payments for order {order_id}");
    let payments = api.partial_payments(&order_id).await?;
    Ok(HttpResponse::Ok().json(payments))
}

route!(import_order => Post "/adyen/orders" impl AdyenDatabase, PaymentGateway);
/// The storefront pushes its orders here. Importing an order that already exists returns the stored copy.
pub async fn import_order<B: AdyenDatabase, G: PaymentGateway>(
    body: web::Json<NewOrder>,
    api: web::Data<OrderApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let order = body.into_inner();
    debug!("💻️ Importing order {}", order.order_number);
    let (order, inserted) = api.import_order(order).await?;
    if inserted {
        Ok(HttpResponse::Created().json(order))
    } else {
        Ok(HttpResponse::Ok().json(order))
    }
}

route!(update_delivery => Patch "/adyen/orders/{order_id}/deliveries/{delivery_id}" impl AdyenDatabase, PaymentGateway);
/// Records a delivery state change. This may trigger the capture of an open-invoice payment.
pub async fn update_delivery<B: AdyenDatabase, G: PaymentGateway>(
    path: web::Path<(String, String)>,
    body: web::Json<DeliveryUpdate>,
    api: web::Data<OrderApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let (order_id, delivery_id) = path.into_inner();
    let state = body.into_inner().state;
    debug!("💻️ Delivery {delivery_id} of order {order_id} is now {state}");
    let (delivery, captures) = api.update_delivery_state(&order_id, &delivery_id, state).await?;
    Ok(HttpResponse::Ok().json(DeliveryUpdateResult { delivery_id: delivery.delivery_id, state: delivery.state, captures }))
}

//----------------------------------------------   Webhook  ----------------------------------------------------
route!(notification => Post "/notification" impl NotificationManagement);
/// The Adyen webhook. Notifications are only stored here, so Adyen gets its `[accepted]` quickly. The notification
/// worker processes them later.
pub async fn notification<B: NotificationManagement>(
    req: HttpRequest,
    body: web::Json<NotificationRequest>,
    options: web::Data<ServerOptions>,
    api: web::Data<NotificationReceiver<B>>,
) -> Result<HttpResponse, ServerError> {
    let peer_ip = get_remote_ip(&req, options.use_x_forwarded_for, options.use_forwarded);
    if !is_whitelisted(peer_ip, options.adyen_whitelist.as_deref()) {
        return Err(ServerError::AuthenticationError(AuthError::ForbiddenPeer));
    }
    let request = body.into_inner();
    let channel = sales_channel_id(&req);
    trace!("🔔️ Received {} notification item(s)", request.notification_items.len());
    let credentials = basic_auth_credentials(&req);
    let result = api.process(&request, credentials.as_ref(), channel.as_deref()).await.map_err(|e| {
        warn!("🔔️ Rejected webhook notification. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().content_type("text/plain").body(result))
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(payment_methods => Post "/payment-methods" impl AdyenDatabase, PaymentGateway);
pub async fn payment_methods<B: AdyenDatabase, G: PaymentGateway>(
    req: HttpRequest,
    body: web::Json<PaymentMethodsParams>,
    api: web::Data<PaymentApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let mut params = body.into_inner();
    if params.sales_channel_id.is_none() {
        params.sales_channel_id = sales_channel_id(&req);
    }
    let methods = api.payment_methods(params).await?;
    Ok(HttpResponse::Ok().json(methods))
}

route!(payments => Post "/payments" impl AdyenDatabase, PaymentGateway);
pub async fn payments<B: AdyenDatabase, G: PaymentGateway>(
    req: HttpRequest,
    body: web::Json<PayParams>,
    options: web::Data<ServerOptions>,
    api: web::Data<PaymentApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let mut params = body.into_inner();
    if params.shopper_ip.is_none() {
        params.shopper_ip =
            get_remote_ip(&req, options.use_x_forwarded_for, options.use_forwarded).map(|ip| ip.to_string());
    }
    debug!("💰️ Payment requested for order {}", params.order_id);
    let outcome = api.pay(params).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

route!(payment_details => Post "/payment-details" impl AdyenDatabase, PaymentGateway);
pub async fn payment_details<B: AdyenDatabase, G: PaymentGateway>(
    body: web::Json<PaymentDetailsParams>,
    api: web::Data<PaymentApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let outcome = api.payment_details(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

route!(payment_status => Post "/payment-status" impl AdyenDatabase, PaymentGateway);
pub async fn payment_status<B: AdyenDatabase, G: PaymentGateway>(
    body: web::Json<OrderIdRequest>,
    api: web::Data<PaymentApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let status = api.payment_status(&body.order_id).await?;
    Ok(HttpResponse::Ok().json(status))
}

route!(donate => Post "/donate" impl AdyenDatabase, PaymentGateway);
pub async fn donate<B: AdyenDatabase, G: PaymentGateway>(
    body: web::Json<DonationParams>,
    api: web::Data<PaymentApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let response = api.donate(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

route!(create_adyen_order => Post "/orders" impl AdyenDatabase, PaymentGateway);
pub async fn create_adyen_order<B: AdyenDatabase, G: PaymentGateway>(
    body: web::Json<OrderIdRequest>,
    api: web::Data<PaymentApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let order = api.create_adyen_order(&body.order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(cancel_adyen_order => Post "/orders/cancel" impl AdyenDatabase, PaymentGateway);
pub async fn cancel_adyen_order<B: AdyenDatabase, G: PaymentGateway>(
    body: web::Json<CancelOrderRequest>,
    api: web::Data<PaymentApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    let response = api.cancel_adyen_order(&request.order_id, request.order).await?;
    Ok(HttpResponse::Ok().json(response))
}

route!(payment_state_data => Post "/payment-state-data" impl AdyenDatabase, PaymentGateway);
pub async fn payment_state_data<B: AdyenDatabase, G: PaymentGateway>(
    body: web::Json<StateDataRequest>,
    api: web::Data<PaymentApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    api.save_state_data(&request.token, &request.state_data).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("State data saved")))
}
