//! Helpers for tests of the engine and of crates built on it.
pub mod fixtures;
pub mod prepare_env;
pub mod stub_gateway;
pub mod system;

pub use stub_gateway::StubGateway;
pub use system::TestSystem;
