use crate::domain::payment::PaymentEvent;
use anyhow::{bail, Result};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tokio::sync::{Mutex, Semaphore};

struct Prioritized(PaymentEvent);

impl PartialEq for Prioritized {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Prioritized {}

impl PartialOrd for Prioritized {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Prioritized {
    // Max-heap: more attempts first, then the older event.
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .attempts
            .cmp(&other.0.attempts)
            .then_with(|| other.0.enqueued_at.cmp(&self.0.enqueued_at))
    }
}

pub struct RetryQueue {
    heap: Mutex<BinaryHeap<Prioritized>>,
    available: Semaphore,
}

impl Default for RetryQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryQueue {
    pub fn new() -> Self {
        Self {
            heap: Mutex::new(BinaryHeap::new()),
            available: Semaphore::new(0),
        }
    }

    pub async fn push(&self, event: PaymentEvent) -> Result<()> {
        if self.available.is_closed() {
            bail!("retry queue is closed");
        }
        self.heap.lock().await.push(Prioritized(event));
        self.available.add_permits(1);
        Ok(())
    }

    pub async fn pop(&self) -> Option<PaymentEvent> {
        match self.available.acquire().await {
            Ok(permit) => {
                permit.forget();
                self.heap.lock().await.pop().map(|p| p.0)
            }
            Err(_) => self.heap.lock().await.pop().map(|p| p.0),
        }
    }

    pub fn close(&self) {
        self.available.close();
    }

    pub fn is_closed(&self) -> bool {
        self.available.is_closed()
    }

    pub async fn len(&self) -> usize {
        self.heap.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.heap.lock().await.is_empty()
    }
}
