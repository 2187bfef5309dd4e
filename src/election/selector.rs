use crate::coord::store::{health_key, CoordinationStore, BEST_PROCESSOR_KEY, ELECTION_LOCK_KEY};
use crate::domain::health::{effective_health, ProcessorHealth};
use crate::domain::payment::ProcessorName;
use crate::election::evaluator::elect;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct SelectorSettings {
    pub health_ttl: Duration,
    pub election_ttl: Duration,
    pub lock_ttl: Duration,
    pub cache_refresh: Duration,
}

impl Default for SelectorSettings {
    fn default() -> Self {
        Self {
            health_ttl: Duration::from_secs(4),
            election_ttl: Duration::from_secs(4),
            lock_ttl: Duration::from_secs(1),
            cache_refresh: Duration::from_secs(1),
        }
    }
}

struct CachedElection {
    processor: ProcessorName,
    refreshed_at: Option<Instant>,
}

#[derive(Clone)]
pub struct ProcessorSelector {
    store: Arc<dyn CoordinationStore>,
    instance_id: String,
    settings: SelectorSettings,
    cached: Arc<RwLock<CachedElection>>,
}

impl ProcessorSelector {
    pub fn new(store: Arc<dyn CoordinationStore>, instance_id: impl Into<String>, settings: SelectorSettings) -> Self {
        Self {
            store,
            instance_id: instance_id.into(),
            settings,
            cached: Arc::new(RwLock::new(CachedElection {
                processor: ProcessorName::Default,
                refreshed_at: None,
            })),
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub async fn select_best_processor(&self) -> ProcessorName {
        {
            let read = self.cached.read().await;
            if read
                .refreshed_at
                .is_some_and(|at| at.elapsed() <= self.settings.cache_refresh)
            {
                return read.processor;
            }
        }

        match self.store.get(BEST_PROCESSOR_KEY).await {
            Ok(Some(raw)) => match raw.parse::<ProcessorName>() {
                Ok(processor) => {
                    let mut write = self.cached.write().await;
                    write.processor = processor;
                    write.refreshed_at = Some(Instant::now());
                    processor
                }
                Err(e) => {
                    tracing::warn!("ignoring election record: {:#}", e);
                    self.cached.read().await.processor
                }
            },
            Ok(None) => self.cached.read().await.processor,
            Err(e) => {
                tracing::warn!("election refresh failed, serving cached processor: {:#}", e);
                // Next store read waits a full refresh window.
                let mut write = self.cached.write().await;
                write.refreshed_at = Some(Instant::now());
                write.processor
            }
        }
    }

    pub async fn update_processor_health(
        &self,
        processor: ProcessorName,
        healthy: bool,
        response_time_ms: u64,
    ) -> Result<()> {
        let health = ProcessorHealth {
            failing: !healthy,
            response_time_ms,
            observed_at: chrono::Utc::now(),
        };
        self.store
            .set_with_ttl(&health_key(processor.as_str()), &health.encode(), self.settings.health_ttl)
            .await?;

        self.try_elect().await
    }

    async fn try_elect(&self) -> Result<()> {
        let token = format!("{}:{}", self.instance_id, chrono::Utc::now().timestamp_millis());
        let acquired = self
            .store
            .set_if_absent_with_ttl(ELECTION_LOCK_KEY, &token, self.settings.lock_ttl)
            .await?;
        if !acquired {
            tracing::debug!(instance = %self.instance_id, "election lock held elsewhere, skipping");
            return Ok(());
        }

        let outcome = self.elect_and_publish().await;

        match self.store.compare_and_delete(ELECTION_LOCK_KEY, &token).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!(instance = %self.instance_id, "election lock expired before release"),
            Err(e) => tracing::warn!("failed to release election lock: {:#}", e),
        }

        outcome.map(|_| ())
    }

    async fn elect_and_publish(&self) -> Result<ProcessorName> {
        let now = chrono::Utc::now();
        let ttl = chrono::Duration::from_std(self.settings.health_ttl)?;
        let default_raw = self.store.get(&health_key(ProcessorName::Default.as_str())).await?;
        let fallback_raw = self.store.get(&health_key(ProcessorName::Fallback.as_str())).await?;
        let default = effective_health(default_raw.as_deref(), ttl, now);
        let fallback = effective_health(fallback_raw.as_deref(), ttl, now);

        let best = elect(&default, &fallback);
        self.store
            .set_with_ttl(BEST_PROCESSOR_KEY, best.as_str(), self.settings.election_ttl)
            .await?;

        let mut write = self.cached.write().await;
        if write.processor != best {
            tracing::info!(
                instance = %self.instance_id,
                from = %write.processor,
                to = %best,
                "best processor changed"
            );
        }
        write.processor = best;
        write.refreshed_at = Some(Instant::now());
        Ok(best)
    }
}
