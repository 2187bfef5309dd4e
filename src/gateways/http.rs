use crate::domain::payment::{PaymentEvent, PaymentSubmission, ProcessorName};
use crate::gateways::{GatewayError, HealthProbe, ProcessorGateway, ServiceHealthReport};
use anyhow::Result;
use reqwest::StatusCode;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpGatewaySettings {
    pub payment_timeout: Duration,
    pub health_timeout: Duration,
    pub pool_size: usize,
}

impl Default for HttpGatewaySettings {
    fn default() -> Self {
        Self {
            payment_timeout: Duration::from_millis(200),
            health_timeout: Duration::from_millis(2000),
            pool_size: 16,
        }
    }
}

pub struct HttpProcessorGateway {
    processor: ProcessorName,
    payment_url: String,
    health_url: String,
    settings: HttpGatewaySettings,
    client: reqwest::Client,
    health_client: reqwest::Client,
}

impl HttpProcessorGateway {
    pub fn new(processor: ProcessorName, base_url: &str, settings: HttpGatewaySettings) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/');
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(settings.pool_size)
            .connect_timeout(settings.payment_timeout)
            .build()?;
        let health_client = reqwest::Client::builder()
            .pool_max_idle_per_host(1)
            .connect_timeout(settings.health_timeout)
            .build()?;

        Ok(Self {
            processor,
            payment_url: base_url.to_string(),
            health_url: format!("{}/payments/service-health", base_url),
            settings,
            client,
            health_client,
        })
    }

    pub fn payment_url(&self) -> &str {
        &self.payment_url
    }

    pub fn health_url(&self) -> &str {
        &self.health_url
    }

    fn classify(&self, e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::Timeout {
                processor: self.processor,
            }
        } else {
            GatewayError::Transport {
                processor: self.processor,
                message: e.to_string(),
            }
        }
    }
}

#[async_trait::async_trait]
impl ProcessorGateway for HttpProcessorGateway {
    fn processor(&self) -> ProcessorName {
        self.processor
    }

    async fn process_payment(&self, event: &PaymentEvent) -> Result<(), GatewayError> {
        let body = PaymentSubmission::from(event);
        let resp = self
            .client
            .post(&self.payment_url)
            .json(&body)
            .timeout(self.settings.payment_timeout)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let detail: String = resp.text().await.unwrap_or_default().chars().take(200).collect();
        tracing::debug!(
            processor = %self.processor,
            status = status.as_u16(),
            correlation_id = %event.request.correlation_id,
            "payment rejected: {}",
            detail
        );
        Err(GatewayError::Rejected {
            processor: self.processor,
            status: status.as_u16(),
        })
    }

    async fn probe_health(&self) -> HealthProbe {
        let resp = self
            .health_client
            .get(&self.health_url)
            .timeout(self.settings.health_timeout)
            .send()
            .await;

        match resp {
            Ok(r) if r.status() == StatusCode::OK => match r.bytes().await {
                Ok(body) => match serde_json::from_slice::<ServiceHealthReport>(&body) {
                    Ok(report) => HealthProbe::Reported(report),
                    Err(e) => HealthProbe::Malformed(e.to_string()),
                },
                Err(e) => HealthProbe::Down(e.to_string()),
            },
            Ok(r) if r.status() == StatusCode::TOO_MANY_REQUESTS => HealthProbe::RateLimited,
            Ok(r) => HealthProbe::Down(format!("HTTP {}", r.status().as_u16())),
            Err(e) if e.is_timeout() => HealthProbe::Down("health check timed out".to_string()),
            Err(e) => HealthProbe::Down(e.to_string()),
        }
    }
}
