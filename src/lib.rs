pub mod config;
pub mod coord {
    pub mod memory;
    pub mod store;
    pub mod store_redis;
}
pub mod domain {
    pub mod health;
    pub mod payment;
}
pub mod election {
    pub mod evaluator;
    pub mod selector;
}
pub mod gateways;
pub mod http {
    pub mod handlers {
        pub mod payments;
        pub mod summary;
    }
    pub mod routes;
}
pub mod outcome {
    pub mod memory;
    pub mod recorder;
    pub mod store_redis;
}
pub mod service {
    pub mod dispatcher;
    pub mod health_prober;
    pub mod retry_orchestrator;
    pub mod retry_queue;
}

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: service::dispatcher::PaymentDispatcher,
    pub recorder: std::sync::Arc<dyn outcome::recorder::OutcomeRecorder>,
}
