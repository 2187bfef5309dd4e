use chrono::{Duration, Utc};
use payments_router::domain::payment::ProcessorName;
use payments_router::outcome::memory::InMemoryOutcomeRecorder;
use payments_router::outcome::recorder::{OutcomeBucket, OutcomeRecorder, PaymentOutcome};
use rust_decimal::Decimal;
use uuid::Uuid;

fn outcome(bucket: OutcomeBucket, amount: Decimal, minutes_ago: i64) -> PaymentOutcome {
    PaymentOutcome {
        bucket,
        correlation_id: Uuid::new_v4(),
        amount,
        timestamp: Utc::now() - Duration::minutes(minutes_ago),
    }
}

#[tokio::test]
async fn running_totals_add_up() {
    let recorder = InMemoryOutcomeRecorder::new();
    let default = OutcomeBucket::Processor(ProcessorName::Default);
    for amount in ["10.00", "5.50", "2.25"] {
        recorder
            .save_payment(&outcome(default, amount.parse().unwrap(), 0))
            .await
            .unwrap();
    }

    let summary = recorder.summary(None, None).await.unwrap();
    assert_eq!(summary.default_total_requests(), 3);
    assert_eq!(summary.default_total_amount(), "17.75".parse::<Decimal>().unwrap());
    assert_eq!(summary.fallback_total_requests(), 0);
    assert_eq!(summary.fallback_total_amount(), Decimal::ZERO);
}

#[tokio::test]
async fn range_filters_by_request_time() {
    let recorder = InMemoryOutcomeRecorder::new();
    let fallback = OutcomeBucket::Processor(ProcessorName::Fallback);
    recorder.save_payment(&outcome(fallback, Decimal::new(100, 2), 60)).await.unwrap();
    recorder.save_payment(&outcome(fallback, Decimal::new(250, 2), 10)).await.unwrap();
    recorder.save_payment(&outcome(fallback, Decimal::new(400, 2), 1)).await.unwrap();

    let now = Utc::now();
    let summary = recorder
        .summary(Some(now - Duration::minutes(15)), Some(now))
        .await
        .unwrap();
    assert_eq!(summary.fallback_total_requests(), 2);
    assert_eq!(summary.fallback_total_amount(), Decimal::new(650, 2));

    let one_bound = recorder.summary(Some(now), None).await.unwrap();
    assert_eq!(one_bound.fallback_total_requests(), 3);
}

#[tokio::test]
async fn failed_bucket_stays_out_of_summary() {
    let recorder = InMemoryOutcomeRecorder::new();
    recorder
        .save_payment(&outcome(OutcomeBucket::Failed, Decimal::new(999, 2), 0))
        .await
        .unwrap();

    let summary = recorder.summary(None, None).await.unwrap();
    assert_eq!(summary.default_total_requests(), 0);
    assert_eq!(summary.fallback_total_requests(), 0);
    assert_eq!(recorder.totals(OutcomeBucket::Failed).await.total_requests, 1);
}

#[tokio::test]
async fn timeline_keeps_one_day_of_records() {
    let recorder = InMemoryOutcomeRecorder::new();
    let default = OutcomeBucket::Processor(ProcessorName::Default);
    recorder
        .save_payment(&outcome(default, Decimal::new(100, 2), 25 * 60))
        .await
        .unwrap();
    recorder
        .save_payment(&outcome(default, Decimal::new(200, 2), 1))
        .await
        .unwrap();

    let records = recorder.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].amount, Decimal::new(200, 2));

    let now = Utc::now();
    let ranged = recorder
        .summary(Some(now - Duration::hours(48)), Some(now))
        .await
        .unwrap();
    assert_eq!(ranged.default_total_requests(), 1);

    let running = recorder.summary(None, None).await.unwrap();
    assert_eq!(running.default_total_requests(), 2);
    assert_eq!(running.default_total_amount(), Decimal::new(300, 2));
}
