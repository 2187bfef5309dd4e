use crate::domain::payment::{PaymentEvent, ProcessorName};
use crate::gateways::{GatewayError, HealthProbe, ProcessorGateway, ServiceHealthReport};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockBehavior {
    AlwaysSuccess,
    AlwaysRejected(u16),
    AlwaysTimeout,
    FailFirst(usize),
}

pub struct MockProcessorGateway {
    pub processor: ProcessorName,
    pub behavior: MockBehavior,
    pub health: Mutex<HealthProbe>,
    calls: AtomicUsize,
    submitted: Mutex<Vec<PaymentEvent>>,
}

impl MockProcessorGateway {
    pub fn new(processor: ProcessorName, behavior: MockBehavior) -> Self {
        Self {
            processor,
            behavior,
            health: Mutex::new(HealthProbe::Reported(ServiceHealthReport {
                failing: false,
                min_response_time: 0,
            })),
            calls: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn with_health(self, probe: HealthProbe) -> Self {
        self.set_health(probe);
        self
    }

    pub fn set_health(&self, probe: HealthProbe) {
        if let Ok(mut health) = self.health.lock() {
            *health = probe;
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<PaymentEvent> {
        self.submitted.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl ProcessorGateway for MockProcessorGateway {
    fn processor(&self) -> ProcessorName {
        self.processor
    }

    async fn process_payment(&self, event: &PaymentEvent) -> Result<(), GatewayError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut submitted) = self.submitted.lock() {
            submitted.push(event.clone());
        }

        match &self.behavior {
            MockBehavior::AlwaysSuccess => Ok(()),
            MockBehavior::AlwaysRejected(status) => Err(GatewayError::Rejected {
                processor: self.processor,
                status: *status,
            }),
            MockBehavior::AlwaysTimeout => Err(GatewayError::Timeout {
                processor: self.processor,
            }),
            MockBehavior::FailFirst(n) if call < *n => Err(GatewayError::Rejected {
                processor: self.processor,
                status: 500,
            }),
            MockBehavior::FailFirst(_) => Ok(()),
        }
    }

    async fn probe_health(&self) -> HealthProbe {
        self.health
            .lock()
            .map(|h| h.clone())
            .unwrap_or_else(|_| HealthProbe::Down("mock health poisoned".to_string()))
    }
}
