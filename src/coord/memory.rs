use crate::coord::store::CoordinationStore;
use anyhow::{bail, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Clone, Default)]
pub struct InMemoryCoordinationStore {
    entries: Arc<Mutex<HashMap<String, (String, Instant)>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryCoordinationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            bail!("coordination store unavailable");
        }
        Ok(())
    }
}

fn live<'a>(
    entries: &'a mut HashMap<String, (String, Instant)>,
    key: &str,
    now: Instant,
) -> Option<&'a String> {
    if entries.get(key).is_some_and(|(_, expires_at)| *expires_at <= now) {
        entries.remove(key);
    }
    entries.get(key).map(|(value, _)| value)
}

#[async_trait::async_trait]
impl CoordinationStore for InMemoryCoordinationStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.check_available()?;
        let mut entries = self.entries.lock().await;
        Ok(live(&mut entries, key, Instant::now()).cloned())
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.check_available()?;
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn set_if_absent_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        self.check_available()?;
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        if live(&mut entries, key, now).is_some() {
            return Ok(false);
        }
        entries.insert(key.to_string(), (value.to_string(), now + ttl));
        Ok(true)
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool> {
        self.check_available()?;
        let mut entries = self.entries.lock().await;
        if live(&mut entries, key, Instant::now()).is_some_and(|v| v == expected) {
            entries.remove(key);
            return Ok(true);
        }
        Ok(false)
    }
}
