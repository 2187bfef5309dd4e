use payments_router::coord::memory::InMemoryCoordinationStore;
use payments_router::domain::payment::{PaymentEvent, PaymentRequest, ProcessorName};
use payments_router::election::selector::{ProcessorSelector, SelectorSettings};
use payments_router::gateways::mock::{MockBehavior, MockProcessorGateway};
use payments_router::gateways::Gateways;
use payments_router::outcome::memory::InMemoryOutcomeRecorder;
use payments_router::outcome::recorder::OutcomeBucket;
use payments_router::service::dispatcher::{DispatchOutcome, PaymentDispatcher};
use payments_router::service::retry_orchestrator::RetryPolicy;
use payments_router::service::retry_queue::RetryQueue;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

struct Harness {
    dispatcher: PaymentDispatcher,
    selector: ProcessorSelector,
    default: Arc<MockProcessorGateway>,
    fallback: Arc<MockProcessorGateway>,
    recorder: InMemoryOutcomeRecorder,
}

fn harness(default: MockBehavior, fallback: MockBehavior, policy: RetryPolicy) -> Harness {
    let selector = ProcessorSelector::new(
        Arc::new(InMemoryCoordinationStore::new()),
        "test",
        SelectorSettings {
            cache_refresh: Duration::ZERO,
            ..SelectorSettings::default()
        },
    );
    let default = Arc::new(MockProcessorGateway::new(ProcessorName::Default, default));
    let fallback = Arc::new(MockProcessorGateway::new(ProcessorName::Fallback, fallback));
    let recorder = InMemoryOutcomeRecorder::new();

    let dispatcher = PaymentDispatcher {
        queue: Arc::new(RetryQueue::new()),
        selector: selector.clone(),
        gateways: Gateways::new(default.clone(), fallback.clone()),
        recorder: Arc::new(recorder.clone()),
        retry_policy: policy,
    };

    Harness {
        dispatcher,
        selector,
        default,
        fallback,
        recorder,
    }
}

fn request(amount: rust_decimal::Decimal) -> PaymentRequest {
    PaymentRequest {
        correlation_id: Uuid::new_v4(),
        amount,
    }
}

#[tokio::test]
async fn failed_payment_is_retried_before_fresh_ones() {
    let h = harness(MockBehavior::AlwaysTimeout, MockBehavior::AlwaysSuccess, RetryPolicy::default());
    let failed = PaymentEvent::new(request(dec!(10.00)), chrono::Utc::now());

    assert_eq!(
        h.dispatcher.dispatch(failed.clone()).await,
        DispatchOutcome::Requeued { attempts: 1 }
    );

    h.dispatcher.enqueue_payment(request(dec!(3.00))).await.unwrap();

    let next = h.dispatcher.queue.pop().await.unwrap();
    assert_eq!(next.request, failed.request);
    assert_eq!(next.attempts, 1);
    assert_eq!(next.enqueued_at, failed.enqueued_at);

    let fresh = h.dispatcher.queue.pop().await.unwrap();
    assert_eq!(fresh.attempts, 0);
    assert_eq!(fresh.request.amount, dec!(3.00));
}

#[tokio::test]
async fn non_success_status_counts_as_failure() {
    let h = harness(MockBehavior::AlwaysRejected(422), MockBehavior::AlwaysSuccess, RetryPolicy::default());
    let event = PaymentEvent::new(request(dec!(1.00)), chrono::Utc::now());

    assert_eq!(h.dispatcher.dispatch(event).await, DispatchOutcome::Requeued { attempts: 1 });
    assert_eq!(h.recorder.totals(OutcomeBucket::Processor(ProcessorName::Default)).await.total_requests, 0);
    assert_eq!(h.dispatcher.queue.len().await, 1);
}

#[tokio::test]
async fn exhausted_payment_lands_in_failed_bucket() {
    let h = harness(
        MockBehavior::AlwaysRejected(500),
        MockBehavior::AlwaysSuccess,
        RetryPolicy { max_attempts: Some(3) },
    );
    let mut event = PaymentEvent::new(request(dec!(7.25)), chrono::Utc::now());

    for expected in 1..3 {
        match h.dispatcher.dispatch(event).await {
            DispatchOutcome::Requeued { attempts } => assert_eq!(attempts, expected),
            other => panic!("expected requeue, got {:?}", other),
        }
        event = h.dispatcher.queue.pop().await.unwrap();
    }

    assert_eq!(h.dispatcher.dispatch(event).await, DispatchOutcome::DeadLettered);
    assert!(h.dispatcher.queue.is_empty().await);
    assert_eq!(h.default.calls(), 3);

    let failed = h.recorder.totals(OutcomeBucket::Failed).await;
    assert_eq!(failed.total_requests, 1);
    assert_eq!(failed.total_amount, dec!(7.25));

    let summary = h.dispatcher.recorder.summary(None, None).await.unwrap();
    assert_eq!(summary.default_total_requests(), 0);
    assert_eq!(summary.fallback_total_requests(), 0);
}

#[tokio::test]
async fn unbounded_policy_keeps_retrying() {
    let h = harness(MockBehavior::AlwaysTimeout, MockBehavior::AlwaysSuccess, RetryPolicy::unbounded());
    let mut event = PaymentEvent::new(request(dec!(1.00)), chrono::Utc::now());

    for expected in 1..=25 {
        assert_eq!(
            h.dispatcher.dispatch(event).await,
            DispatchOutcome::Requeued { attempts: expected }
        );
        event = h.dispatcher.queue.pop().await.unwrap();
    }
}

#[tokio::test]
async fn requeue_after_close_dead_letters() {
    let h = harness(MockBehavior::AlwaysTimeout, MockBehavior::AlwaysSuccess, RetryPolicy::default());
    h.dispatcher.queue.close();

    let event = PaymentEvent::new(request(dec!(2.00)), chrono::Utc::now());
    assert_eq!(h.dispatcher.dispatch(event).await, DispatchOutcome::DeadLettered);
    assert_eq!(h.recorder.totals(OutcomeBucket::Failed).await.total_requests, 1);
}

#[tokio::test]
async fn delivery_is_recorded_under_the_elected_processor() {
    let h = harness(MockBehavior::AlwaysSuccess, MockBehavior::AlwaysSuccess, RetryPolicy::default());

    let first = PaymentEvent::new(request(dec!(10.00)), chrono::Utc::now());
    assert_eq!(
        h.dispatcher.dispatch(first.clone()).await,
        DispatchOutcome::Delivered(ProcessorName::Default)
    );

    h.selector
        .update_processor_health(ProcessorName::Default, false, 10)
        .await
        .unwrap();
    h.selector
        .update_processor_health(ProcessorName::Fallback, true, 10)
        .await
        .unwrap();

    let second = PaymentEvent::new(request(dec!(4.50)), chrono::Utc::now());
    assert_eq!(
        h.dispatcher.dispatch(second).await,
        DispatchOutcome::Delivered(ProcessorName::Fallback)
    );

    let summary = h.dispatcher.recorder.summary(None, None).await.unwrap();
    assert_eq!(summary.default_total_requests(), 1);
    assert_eq!(summary.default_total_amount(), dec!(10.00));
    assert_eq!(summary.fallback_total_requests(), 1);
    assert_eq!(summary.fallback_total_amount(), dec!(4.50));

    let records = h.recorder.records().await;
    assert_eq!(records[0].timestamp, first.enqueued_at);
    assert_eq!(h.default.submitted().len(), 1);
    assert_eq!(h.fallback.submitted().len(), 1);
}

#[tokio::test]
async fn workers_retry_until_delivery() {
    let h = harness(MockBehavior::FailFirst(4), MockBehavior::AlwaysSuccess, RetryPolicy::unbounded());
    let workers = h.dispatcher.spawn_workers(3);

    for _ in 0..5 {
        h.dispatcher.enqueue_payment(request(dec!(2.00))).await.unwrap();
    }

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let delivered = h
            .recorder
            .totals(OutcomeBucket::Processor(ProcessorName::Default))
            .await;
        if delivered.total_requests == 5 {
            assert_eq!(delivered.total_amount, dec!(10.00));
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "payments were not delivered in time");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(h.default.calls(), 9);
    assert_eq!(h.fallback.calls(), 0);

    h.dispatcher.queue.close();
    for worker in workers {
        worker.await.unwrap();
    }
}
