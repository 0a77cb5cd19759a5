use std::fmt::Debug;

use adyen_payment_engine::{test_utils::TestSystem, traits::AdyenDatabase};
use adyen_tools::AdyenConfig;
use cucumber::World;
use log::*;

#[derive(Default, Debug, World)]
pub struct PaymentWorld {
    pub system: Option<GatewaySystem>,
}

pub struct GatewaySystem {
    pub db_path: String,
    pub engine: TestSystem,
}

impl Debug for GatewaySystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GatewaySystem({})", self.db_path)
    }
}

impl PaymentWorld {
    pub fn engine(&self) -> &TestSystem {
        &self.system.as_ref().expect("Payment gateway not initialised").engine
    }
}

impl GatewaySystem {
    pub async fn new(config: AdyenConfig) -> Self {
        let engine = TestSystem::new(config).await;
        let db_path = engine.db.url().to_string();
        debug!("Created database: {db_path}");
        Self { db_path, engine }
    }
}
