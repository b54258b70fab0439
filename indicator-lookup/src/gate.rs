use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tokio::time::Instant;

/// What happens when demand exceeds the concurrency ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Excess work waits for a slot; everything eventually runs.
    Queue,
    /// Once `max_waiting` admissions are already queued, further admissions
    /// fail fast instead of waiting.
    Reject { max_waiting: usize },
}

#[derive(Error, Debug)]
pub enum GateError {
    #[error("admission queue is full, not accepting more work")]
    AtCapacity,
    #[error("admission gate is closed")]
    Closed,
}

/// Bounds how many units of work run concurrently and how quickly new ones
/// are admitted. Knows nothing about jobs or entities.
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    min_interval: Duration,
    policy: OverflowPolicy,
    waiting: AtomicUsize,
    last_admitted: Mutex<Option<Instant>>,
}

impl AdmissionGate {
    pub fn new(max_concurrent: usize, min_interval: Duration, policy: OverflowPolicy) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            min_interval,
            policy,
            waiting: AtomicUsize::new(0),
            last_admitted: Mutex::new(None),
        }
    }

    /// Waits for a concurrency slot (subject to the overflow policy) and
    /// paces admissions by the minimum interval. The returned permit frees
    /// the slot on drop.
    pub async fn admit(&self) -> Result<AdmissionPermit, GateError> {
        let slot = match self.semaphore.clone().try_acquire_owned() {
            Ok(slot) => slot,
            Err(TryAcquireError::Closed) => return Err(GateError::Closed),
            Err(TryAcquireError::NoPermits) => self.wait_for_slot().await?,
        };
        self.pace().await;
        Ok(AdmissionPermit { _slot: slot })
    }

    async fn wait_for_slot(&self) -> Result<OwnedSemaphorePermit, GateError> {
        let waiting = self.waiting.fetch_add(1, Ordering::SeqCst) + 1;
        if let OverflowPolicy::Reject { max_waiting } = self.policy {
            if waiting > max_waiting {
                self.waiting.fetch_sub(1, Ordering::SeqCst);
                return Err(GateError::AtCapacity);
            }
        }

        let slot = self.semaphore.clone().acquire_owned().await;
        self.waiting.fetch_sub(1, Ordering::SeqCst);
        slot.map_err(|_| GateError::Closed)
    }

    // Admissions are serialized through the mutex so consecutive ones are
    // at least `min_interval` apart.
    async fn pace(&self) {
        if self.min_interval.is_zero() {
            return;
        }
        let mut last = self.last_admitted.lock().await;
        if let Some(previous) = *last {
            tokio::time::sleep_until(previous + self.min_interval).await;
        }
        *last = Some(Instant::now());
    }
}

pub struct AdmissionPermit {
    _slot: OwnedSemaphorePermit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn never_exceeds_max_concurrent() {
        let gate = Arc::new(AdmissionGate::new(
            3,
            Duration::ZERO,
            OverflowPolicy::Queue,
        ));
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let (gate, active, peak) = (gate.clone(), active.clone(), peak.clone());
            handles.push(tokio::spawn(async move {
                let _permit = gate.admit().await.unwrap();
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(active.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn queued_work_eventually_runs() {
        let gate = Arc::new(AdmissionGate::new(
            2,
            Duration::ZERO,
            OverflowPolicy::Queue,
        ));
        let completed = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let (gate, completed) = (gate.clone(), completed.clone());
            handles.push(tokio::spawn(async move {
                let _permit = gate.admit().await.unwrap();
                tokio::time::sleep(Duration::from_millis(5)).await;
                completed.fetch_add(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(completed.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn rejects_when_queue_is_full() {
        let gate = Arc::new(AdmissionGate::new(
            1,
            Duration::ZERO,
            OverflowPolicy::Reject { max_waiting: 1 },
        ));

        let held = gate.admit().await.unwrap();

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.admit().await.map(drop) })
        };
        // let the waiter enqueue before the third attempt
        tokio::time::sleep(Duration::from_millis(1)).await;

        let third = gate.admit().await;
        assert!(matches!(third, Err(GateError::AtCapacity)));

        drop(held);
        waiter.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn paces_admissions_by_min_interval() {
        let gate = AdmissionGate::new(1, Duration::from_millis(100), OverflowPolicy::Queue);

        let start = Instant::now();
        for _ in 0..3 {
            let permit = gate.admit().await.unwrap();
            drop(permit);
        }

        // first admission is immediate, the next two wait 100ms each
        assert!(start.elapsed() >= Duration::from_millis(200));
    }
}
