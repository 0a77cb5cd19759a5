use std::sync::Arc;

use adyen_tools::{AdyenConfig, AdyenConfigs};
use chrono::Duration;

use crate::{
    adyen_api::{
        CaptureApi,
        NotificationProcessor,
        NotificationReceiver,
        OrderApi,
        PaymentApi,
        RefundApi,
        TransactionStateApi,
        WebhookHandlerFactory,
    },
    events::EventProducers,
    test_utils::{
        prepare_env::{prepare_test_env, random_db_path},
        StubGateway,
    },
    SqliteDatabase,
};

/// The complete engine, wired to a fresh SQLite database and a [`StubGateway`].
pub struct TestSystem {
    pub db: SqliteDatabase,
    pub gateway: Arc<StubGateway>,
    pub states: TransactionStateApi<SqliteDatabase>,
    pub captures: CaptureApi<SqliteDatabase, StubGateway>,
    pub refunds: RefundApi<SqliteDatabase, StubGateway>,
    pub receiver: NotificationReceiver<SqliteDatabase>,
    pub processor: NotificationProcessor<SqliteDatabase, StubGateway>,
    pub payments: PaymentApi<SqliteDatabase, StubGateway>,
    pub orders: OrderApi<SqliteDatabase, StubGateway>,
}

impl TestSystem {
    pub async fn new(config: AdyenConfig) -> Self {
        Self::with_producers(config, EventProducers::default()).await
    }

    pub async fn with_producers(config: AdyenConfig, producers: EventProducers) -> Self {
        let url = random_db_path();
        let db = prepare_test_env(&url).await;
        let configs = AdyenConfigs::new(config);
        let gateway = Arc::new(StubGateway::new(configs.clone()));
        let states = TransactionStateApi::new(db.clone(), producers.clone());
        let captures = CaptureApi::new(db.clone(), Arc::clone(&gateway));
        let refunds = RefundApi::new(db.clone(), Arc::clone(&gateway), states.clone());
        let factory = WebhookHandlerFactory::new(db.clone(), states.clone(), captures.clone(), refunds.clone());
        let processor = NotificationProcessor::new(db.clone(), factory, producers);
        let receiver = NotificationReceiver::new(db.clone(), Arc::new(configs), Duration::zero());
        let payments = PaymentApi::new(db.clone(), Arc::clone(&gateway), states.clone());
        let orders = OrderApi::new(db.clone(), captures.clone());
        Self { db, gateway, states, captures, refunds, receiver, processor, payments, orders }
    }
}
