use crate::domain::payment::{PaymentEvent, ProcessorName};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod http;
pub mod mock;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("{processor} timed out")]
    Timeout { processor: ProcessorName },
    #[error("{processor} rejected the payment with HTTP {status}")]
    Rejected { processor: ProcessorName, status: u16 },
    #[error("{processor} transport error: {message}")]
    Transport { processor: ProcessorName, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceHealthReport {
    pub failing: bool,
    #[serde(rename = "minResponseTime")]
    pub min_response_time: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthProbe {
    Reported(ServiceHealthReport),
    RateLimited,
    Down(String),
    Malformed(String),
}

#[async_trait::async_trait]
pub trait ProcessorGateway: Send + Sync {
    fn processor(&self) -> ProcessorName;

    fn fee(&self) -> Decimal {
        self.processor().fee()
    }

    async fn process_payment(&self, event: &PaymentEvent) -> Result<(), GatewayError>;

    async fn probe_health(&self) -> HealthProbe;
}

#[derive(Clone)]
pub struct Gateways {
    pub default: Arc<dyn ProcessorGateway>,
    pub fallback: Arc<dyn ProcessorGateway>,
}

impl Gateways {
    pub fn new(default: Arc<dyn ProcessorGateway>, fallback: Arc<dyn ProcessorGateway>) -> Self {
        Self { default, fallback }
    }

    pub fn get(&self, processor: ProcessorName) -> &Arc<dyn ProcessorGateway> {
        match processor {
            ProcessorName::Default => &self.default,
            ProcessorName::Fallback => &self.fallback,
        }
    }
}
