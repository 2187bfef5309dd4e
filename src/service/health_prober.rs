use crate::domain::health::UNREACHABLE_RESPONSE_MS;
use crate::election::selector::ProcessorSelector;
use crate::gateways::{HealthProbe, ProcessorGateway};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Published {
    Health { healthy: bool, response_time_ms: u64 },
    Nothing,
}

#[derive(Clone)]
pub struct HealthProber {
    pub selector: ProcessorSelector,
    pub gateway: Arc<dyn ProcessorGateway>,
    pub interval: Duration,
}

impl HealthProber {
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    pub async fn run(self, shutdown: CancellationToken) {
        let processor = self.gateway.processor();
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.probe_once().await;
                }
            }
        }
        tracing::info!(processor = %processor, "health prober stopped");
    }

    pub async fn probe_once(&self) -> Published {
        let processor = self.gateway.processor();
        let published = match self.gateway.probe_health().await {
            HealthProbe::Reported(report) => Published::Health {
                healthy: !report.failing,
                response_time_ms: report.min_response_time,
            },
            HealthProbe::RateLimited => {
                tracing::debug!(processor = %processor, "health check rate limited, skipping tick");
                return Published::Nothing;
            }
            HealthProbe::Malformed(reason) => {
                tracing::warn!(processor = %processor, "unreadable health response: {}", reason);
                down()
            }
            HealthProbe::Down(reason) => {
                tracing::warn!(processor = %processor, "processor looks down: {}", reason);
                down()
            }
        };

        if let Published::Health {
            healthy,
            response_time_ms,
        } = published
        {
            if let Err(e) = self
                .selector
                .update_processor_health(processor, healthy, response_time_ms)
                .await
            {
                tracing::error!(processor = %processor, "failed to publish health: {:#}", e);
            }
        }
        published
    }
}

fn down() -> Published {
    Published::Health {
        healthy: false,
        response_time_ms: UNREACHABLE_RESPONSE_MS,
    }
}
