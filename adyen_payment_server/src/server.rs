use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use adyen_payment_engine::{
    events::EventProducers,
    CaptureApi,
    NotificationReceiver,
    OrderApi,
    PaymentApi,
    RefundApi,
    SqliteDatabase,
    TransactionStateApi,
};
use adyen_tools::{AdyenApi, AdyenConfigs};
use log::*;

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    hooks::create_event_handlers,
    middleware::AdminTokenMiddlewareFactory,
    notification_worker::{create_notification_processor, start_notification_worker},
    routes::{
        health,
        CancelAdyenOrderRoute,
        CaptureRoute,
        CapturesForOrderRoute,
        CreateAdyenOrderRoute,
        DonateRoute,
        ImportOrderRoute,
        NotificationRoute,
        NotificationsForOrderRoute,
        PartialPaymentsRoute,
        PaymentDetailsRoute,
        PaymentMethodsRoute,
        PaymentStateDataRoute,
        PaymentStatusRoute,
        PaymentsRoute,
        RefundRoute,
        RefundsForOrderRoute,
        RescheduleNotificationRoute,
        UpdateDeliveryRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let configs = AdyenConfigs::new_from_env_or_default();
    let gateway = AdyenApi::new(configs).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = Arc::new(gateway);
    let handlers = create_event_handlers();
    let producers = handlers.producers();
    handlers.start_handlers().await;
    // The worker runs for the lifetime of the server
    let _worker = start_notification_worker(db.clone(), Arc::clone(&gateway), producers.clone(), config.notifications);
    let srv = create_server_instance(config, db, gateway, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: Arc<AdyenApi>,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let notification_delay = config.notifications.delay;
    debug!("🚀️ Notifications other than AUTHORISATION wait {}s before processing", notification_delay.num_seconds());
    let srv = HttpServer::new(move || {
        let states = TransactionStateApi::new(db.clone(), producers.clone());
        let captures_api = CaptureApi::new(db.clone(), Arc::clone(&gateway));
        let refunds_api = RefundApi::new(db.clone(), Arc::clone(&gateway), states.clone());
        let orders_api = OrderApi::new(db.clone(), captures_api.clone());
        let payments_api = PaymentApi::new(db.clone(), Arc::clone(&gateway), states);
        let processor =
            create_notification_processor(db.clone(), Arc::clone(&gateway), producers.clone(), config.notifications);
        let receiver =
            NotificationReceiver::new(db.clone(), Arc::new(gateway.configs().clone()), notification_delay);
        let options = ServerOptions::from_config(&config);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("apg::access_log"))
            .app_data(web::Data::new(captures_api))
            .app_data(web::Data::new(refunds_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(payments_api))
            .app_data(web::Data::new(processor))
            .app_data(web::Data::new(receiver))
            .app_data(web::Data::new(options));
        // Routes that require the admin token
        let admin_scope = web::scope("/api")
            .wrap(AdminTokenMiddlewareFactory::new(config.admin_api_token.clone()))
            .service(CaptureRoute::<SqliteDatabase, AdyenApi>::new())
            .service(CapturesForOrderRoute::<SqliteDatabase, AdyenApi>::new())
            .service(RefundRoute::<SqliteDatabase, AdyenApi>::new())
            .service(RefundsForOrderRoute::<SqliteDatabase, AdyenApi>::new())
            .service(NotificationsForOrderRoute::<SqliteDatabase, AdyenApi>::new())
            .service(RescheduleNotificationRoute::<SqliteDatabase, AdyenApi>::new())
            .service(PartialPaymentsRoute::<SqliteDatabase, AdyenApi>::new())
            .service(ImportOrderRoute::<SqliteDatabase, AdyenApi>::new())
            .service(UpdateDeliveryRoute::<SqliteDatabase, AdyenApi>::new());
        let store_scope = web::scope("/store-api/v{version}/adyen")
            .service(NotificationRoute::<SqliteDatabase>::new())
            .service(PaymentMethodsRoute::<SqliteDatabase, AdyenApi>::new())
            .service(PaymentsRoute::<SqliteDatabase, AdyenApi>::new())
            .service(PaymentDetailsRoute::<SqliteDatabase, AdyenApi>::new())
            .service(PaymentStatusRoute::<SqliteDatabase, AdyenApi>::new())
            .service(DonateRoute::<SqliteDatabase, AdyenApi>::new())
            .service(CreateAdyenOrderRoute::<SqliteDatabase, AdyenApi>::new())
            .service(CancelAdyenOrderRoute::<SqliteDatabase, AdyenApi>::new())
            .service(PaymentStateDataRoute::<SqliteDatabase, AdyenApi>::new());
        app.service(health).service(admin_scope).service(store_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
