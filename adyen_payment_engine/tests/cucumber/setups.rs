use adyen_payment_engine::test_utils::fixtures::{manual_capture_config, test_config};
use cucumber::given;

use crate::cucumber::{GatewaySystem, PaymentWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut PaymentWorld) {
    world.system = Some(GatewaySystem::new(test_config()).await);
}

#[given("a fresh install with manual capture")]
async fn fresh_database_with_manual_capture(world: &mut PaymentWorld) {
    world.system = Some(GatewaySystem::new(manual_capture_config()).await);
}
