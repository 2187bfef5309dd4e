use anyhow::Context;
use payments_router::config::AppConfig;
use payments_router::coord::store_redis::RedisCoordinationStore;
use payments_router::domain::payment::ProcessorName;
use payments_router::election::selector::{ProcessorSelector, SelectorSettings};
use payments_router::gateways::http::{HttpGatewaySettings, HttpProcessorGateway};
use payments_router::gateways::{Gateways, ProcessorGateway};
use payments_router::outcome::store_redis::RedisOutcomeRecorder;
use payments_router::service::dispatcher::PaymentDispatcher;
use payments_router::service::health_prober::HealthProber;
use payments_router::service::retry_orchestrator::RetryPolicy;
use payments_router::service::retry_queue::RetryQueue;
use payments_router::AppState;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const WORKER_DRAIN_DEADLINE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env()?;

    let redis_client = redis::Client::open(cfg.redis_url.clone())?;
    let store = RedisCoordinationStore::connect(&redis_client, cfg.store_timeout)
        .await
        .with_context(|| format!("cannot reach coordination store at {}", cfg.redis_url))?;
    let recorder_conn = tokio::time::timeout(cfg.store_timeout, redis_client.get_multiplexed_async_connection())
        .await
        .context("timed out connecting outcome recorder")??;
    let recorder = Arc::new(RedisOutcomeRecorder::new(recorder_conn, cfg.store_timeout));

    let gateway_settings = HttpGatewaySettings {
        payment_timeout: cfg.processor_timeout,
        health_timeout: cfg.health_timeout,
        pool_size: cfg.processor_pool_size,
    };
    let default_gateway: Arc<dyn ProcessorGateway> = Arc::new(HttpProcessorGateway::new(
        ProcessorName::Default,
        &cfg.default_processor_url,
        gateway_settings.clone(),
    )?);
    let fallback_gateway: Arc<dyn ProcessorGateway> = Arc::new(HttpProcessorGateway::new(
        ProcessorName::Fallback,
        &cfg.fallback_processor_url,
        gateway_settings,
    )?);

    let selector = ProcessorSelector::new(Arc::new(store), cfg.instance_id.clone(), SelectorSettings::default());

    let queue = Arc::new(RetryQueue::new());
    let dispatcher = PaymentDispatcher {
        queue: queue.clone(),
        selector: selector.clone(),
        gateways: Gateways::new(default_gateway.clone(), fallback_gateway.clone()),
        recorder: recorder.clone(),
        retry_policy: RetryPolicy::from_config(cfg.max_attempts),
    };
    let workers = dispatcher.spawn_workers(cfg.workers);

    let shutdown = CancellationToken::new();
    let probers = [default_gateway, fallback_gateway].map(|gateway| {
        HealthProber {
            selector: selector.clone(),
            gateway,
            interval: cfg.health_check_interval,
        }
        .spawn(shutdown.clone())
    });

    let state = AppState {
        dispatcher,
        recorder,
    };
    let app = payments_router::http::routes::router(state);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!(
        instance = %cfg.instance_id,
        workers = cfg.workers,
        "listening on {}",
        cfg.bind_addr
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutting down: stopping probers and draining queue");
    shutdown.cancel();
    queue.close();
    for prober in probers {
        let _ = prober.await;
    }

    let drain = async {
        for worker in workers {
            if let Err(e) = worker.await {
                tracing::error!("dispatch worker ended abnormally: {}", e);
            }
        }
    };
    if tokio::time::timeout(WORKER_DRAIN_DEADLINE, drain).await.is_err() {
        let remaining = queue.len().await;
        tracing::warn!(
            remaining,
            "workers did not drain within {:?}, exiting",
            WORKER_DRAIN_DEADLINE
        );
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
