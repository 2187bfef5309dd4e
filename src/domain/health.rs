use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};

pub const UNREACHABLE_RESPONSE_MS: u64 = u64::MAX;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorHealth {
    pub failing: bool,
    pub response_time_ms: u64,
    pub observed_at: DateTime<Utc>,
}

impl ProcessorHealth {
    pub fn unknown(now: DateTime<Utc>) -> Self {
        Self {
            failing: true,
            response_time_ms: UNREACHABLE_RESPONSE_MS,
            observed_at: now,
        }
    }

    pub fn is_stale(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.observed_at > ttl
    }

    // <healthy>:<responseTimeMs>:<epochSeconds>
    pub fn encode(&self) -> String {
        format!(
            "{}:{}:{}",
            !self.failing,
            self.response_time_ms,
            self.observed_at.timestamp()
        )
    }

    pub fn decode(raw: &str) -> Result<Self> {
        let mut parts = raw.trim().split(':');
        let healthy = parts
            .next()
            .ok_or_else(|| anyhow!("empty health record"))?
            .parse::<bool>()
            .context("health flag")?;
        let response_time_ms = parts
            .next()
            .ok_or_else(|| anyhow!("health record missing response time"))?
            .parse::<u64>()
            .context("response time")?;
        let epoch_seconds = parts
            .next()
            .ok_or_else(|| anyhow!("health record missing timestamp"))?
            .parse::<i64>()
            .context("timestamp")?;
        if parts.next().is_some() {
            return Err(anyhow!("health record has trailing fields: {}", raw));
        }
        let observed_at = Utc
            .timestamp_opt(epoch_seconds, 0)
            .single()
            .ok_or_else(|| anyhow!("health timestamp out of range: {}", epoch_seconds))?;

        Ok(Self {
            failing: !healthy,
            response_time_ms,
            observed_at,
        })
    }
}

pub fn effective_health(raw: Option<&str>, ttl: Duration, now: DateTime<Utc>) -> ProcessorHealth {
    let Some(raw) = raw else {
        return ProcessorHealth::unknown(now);
    };
    match ProcessorHealth::decode(raw) {
        Ok(health) if !health.is_stale(ttl, now) => health,
        Ok(_) => ProcessorHealth::unknown(now),
        Err(e) => {
            tracing::warn!(record = raw, "discarding unreadable health record: {:#}", e);
            ProcessorHealth::unknown(now)
        }
    }
}
