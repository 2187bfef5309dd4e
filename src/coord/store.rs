use anyhow::Result;
use std::time::Duration;

pub const BEST_PROCESSOR_KEY: &str = "best_processor";
pub const ELECTION_LOCK_KEY: &str = "best_processor:lock";

pub fn health_key(processor: &str) -> String {
    format!("processor_health:{}", processor)
}

#[async_trait::async_trait]
pub trait CoordinationStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    async fn set_if_absent_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<bool>;

    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool>;
}
