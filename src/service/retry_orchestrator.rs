use crate::domain::payment::PaymentEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Some(5),
        }
    }
}

impl RetryPolicy {
    pub fn unbounded() -> Self {
        Self { max_attempts: None }
    }

    pub fn from_config(max_attempts: u32) -> Self {
        if max_attempts == 0 {
            Self::unbounded()
        } else {
            Self {
                max_attempts: Some(max_attempts),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDirective {
    Requeue(PaymentEvent),
    DeadLetter,
}

pub fn after_failure(event: &PaymentEvent, policy: &RetryPolicy) -> RetryDirective {
    let tries = event.attempts.saturating_add(1);
    match policy.max_attempts {
        Some(limit) if tries >= limit => RetryDirective::DeadLetter,
        _ => RetryDirective::Requeue(event.retried()),
    }
}
