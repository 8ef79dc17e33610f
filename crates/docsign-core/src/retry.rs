//! Bounded polling with a fixed delay and a fallback value

use crate::collaborators::Sleeper;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How often, and how patiently, to poll for a value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total number of probes, including the first one
    pub max_attempts: u32,
    /// Delay before the first probe
    pub initial_delay_ms: u64,
    /// Delay between consecutive probes
    pub retry_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_delay_ms: 200,
            retry_delay_ms: 300,
        }
    }
}

impl RetryPolicy {
    fn delay_before(&self, attempt: u32) -> Duration {
        if attempt == 1 {
            Duration::from_millis(self.initial_delay_ms)
        } else {
            Duration::from_millis(self.retry_delay_ms)
        }
    }
}

/// Outcome of [`poll_with_fallback`]
#[derive(Debug, Clone, PartialEq)]
pub enum Polled<T> {
    /// The probe produced a value on attempt `attempts`
    Ready { value: T, attempts: u32 },
    /// Every attempt came back empty and the fallback was substituted
    Exhausted { fallback: T, attempts: u32 },
}

impl<T> Polled<T> {
    pub fn into_value(self) -> T {
        match self {
            Polled::Ready { value, .. } => value,
            Polled::Exhausted { fallback, .. } => fallback,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Polled::Ready { attempts, .. } | Polled::Exhausted { attempts, .. } => *attempts,
        }
    }
}

/// Run `probe` until it returns `Some`, sleeping per `policy` before each
/// attempt. Never fails: after `max_attempts` empty probes the fallback is
/// returned instead.
pub async fn poll_with_fallback<T, P, S>(
    policy: &RetryPolicy,
    sleeper: &S,
    mut probe: P,
    fallback: T,
) -> Polled<T>
where
    P: FnMut(u32) -> Option<T>,
    S: Sleeper + ?Sized,
{
    let max_attempts = policy.max_attempts.max(1);
    for attempt in 1..=max_attempts {
        sleeper.sleep(policy.delay_before(attempt)).await;
        if let Some(value) = probe(attempt) {
            return Polled::Ready {
                value,
                attempts: attempt,
            };
        }
        tracing::debug!(attempt, max_attempts, "probe came back empty");
    }
    Polled::Exhausted {
        fallback,
        attempts: max_attempts,
    }
}
