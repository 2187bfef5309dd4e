use crate::domain::payment::{PaymentSummary, ProcessorName, ProcessorTotals};
use crate::outcome::recorder::{range, OutcomeBucket, OutcomeRecorder, PaymentOutcome, RECORD_RETENTION_SECS};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use rust_decimal::Decimal;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone)]
pub struct RedisOutcomeRecorder {
    conn: MultiplexedConnection,
    op_timeout: Duration,
}

impl RedisOutcomeRecorder {
    pub fn new(conn: MultiplexedConnection, op_timeout: Duration) -> Self {
        Self { conn, op_timeout }
    }

    fn total_key(bucket: OutcomeBucket) -> String {
        format!("{}:total", bucket)
    }

    fn amount_key(bucket: OutcomeBucket) -> String {
        format!("{}:amount", bucket)
    }

    fn timeline_key(bucket: OutcomeBucket) -> String {
        format!("payments:{}:timeline", bucket)
    }

    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        tokio::time::timeout(self.op_timeout, fut)
            .await
            .with_context(|| format!("redis {} timed out after {:?}", op, self.op_timeout))?
            .with_context(|| format!("redis {} failed", op))
    }

    async fn running_totals(&self, bucket: OutcomeBucket) -> Result<ProcessorTotals> {
        let mut conn = self.conn.clone();
        let total_key = Self::total_key(bucket);
        let amount_key = Self::amount_key(bucket);
        let (total, amount): (Option<String>, Option<String>) = self
            .bounded("MGET", async move { conn.mget(vec![total_key, amount_key]).await })
            .await?;

        Ok(ProcessorTotals {
            total_requests: match total {
                Some(raw) => raw.parse::<u64>().with_context(|| format!("counter for {}", bucket))?,
                None => 0,
            },
            total_amount: match amount {
                Some(raw) => parse_amount(&raw)?,
                None => Decimal::ZERO,
            },
        })
    }

    async fn totals_in_range(
        &self,
        bucket: OutcomeBucket,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<ProcessorTotals> {
        let mut conn = self.conn.clone();
        let key = Self::timeline_key(bucket);
        let (min, max) = (from.timestamp_millis(), to.timestamp_millis());
        let members: Vec<String> = self
            .bounded("ZRANGEBYSCORE", async move { conn.zrangebyscore(key, min, max).await })
            .await?;

        let mut totals = ProcessorTotals::default();
        for member in members {
            match member.rsplit('|').next().map(parse_amount) {
                Some(Ok(amount)) => {
                    totals.total_requests += 1;
                    totals.total_amount += amount;
                }
                _ => tracing::warn!(bucket = %bucket, member = %member, "skipping unreadable payment record"),
            }
        }
        Ok(totals)
    }
}

fn parse_amount(raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map(|d| d.round_dp(2))
        .with_context(|| format!("unreadable amount {:?}", raw))
}

#[async_trait::async_trait]
impl OutcomeRecorder for RedisOutcomeRecorder {
    async fn save_payment(&self, outcome: &PaymentOutcome) -> Result<()> {
        let bucket = outcome.bucket;
        let timeline_key = Self::timeline_key(bucket);
        let millis = outcome.timestamp.timestamp_millis();
        let cutoff = (Utc::now().timestamp() - RECORD_RETENTION_SECS) * 1000;
        let member = format!("{}|{}|{}", millis, outcome.correlation_id, outcome.amount);

        let mut pipe = redis::pipe();
        pipe.atomic()
            .incr(Self::total_key(bucket), 1)
            .ignore()
            .cmd("INCRBYFLOAT")
            .arg(Self::amount_key(bucket))
            .arg(outcome.amount.to_string())
            .ignore()
            .zadd(&timeline_key, member, millis)
            .ignore()
            .zrembyscore(&timeline_key, "-inf", format!("({}", cutoff))
            .ignore()
            .expire(&timeline_key, RECORD_RETENTION_SECS)
            .ignore();

        let mut conn = self.conn.clone();
        let _: () = self
            .bounded("record payment", async move { pipe.query_async(&mut conn).await })
            .await?;

        tracing::debug!(
            bucket = %bucket,
            amount = %outcome.amount,
            correlation_id = %outcome.correlation_id,
            "payment recorded"
        );
        Ok(())
    }

    async fn summary(&self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Result<PaymentSummary> {
        let default = OutcomeBucket::Processor(ProcessorName::Default);
        let fallback = OutcomeBucket::Processor(ProcessorName::Fallback);

        match range(from, to) {
            Some((from, to)) => Ok(PaymentSummary {
                default: self.totals_in_range(default, from, to).await?,
                fallback: self.totals_in_range(fallback, from, to).await?,
            }),
            None => Ok(PaymentSummary {
                default: self.running_totals(default).await?,
                fallback: self.running_totals(fallback).await?,
            }),
        }
    }
}
