//! Admission control for the shared recognizer
//!
//! The recognizer tolerates only a small fixed number of concurrent
//! inferences, so every job must hold a [`SlotPermit`] while it runs.
//! The gate supports two policies:
//!
//! - **Queue**: up to `capacity` concurrent holders, with excess callers
//!   queued FIFO behind them (the tokio semaphore is fair, so waiters
//!   are admitted in arrival order).
//! - **SingleFlight**: one holder at a time; after each release the
//!   slot is withheld for a cooldown interval so the device can settle
//!   (cache and memory reclamation) before the next job starts.
//!
//! Release is RAII: dropping the permit returns the slot exactly once,
//! on every exit path. Waiting at `acquire` is cancellation-safe —
//! dropping the future relinquishes the caller's place in line.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::{AdmissionConfig, AdmissionPolicy};
use crate::error::OcrError;

/// Bounded pool of recognizer slots.
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    policy: AdmissionPolicy,
    cooldown: Duration,
    acquire_timeout: Option<Duration>,
    in_flight: Arc<AtomicUsize>,
}

impl AdmissionGate {
    pub fn new(config: &AdmissionConfig) -> Self {
        let capacity = config.effective_capacity();
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            policy: config.policy,
            cooldown: config.cooldown(),
            acquire_timeout: config.acquire_timeout(),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Wait for a slot. Blocks indefinitely unless an acquire timeout
    /// is configured, in which case the caller gets [`OcrError::Busy`]
    /// once the bound elapses.
    pub async fn acquire(&self) -> Result<SlotPermit, OcrError> {
        let waiting = self.semaphore.clone().acquire_owned();
        let permit = match self.acquire_timeout {
            Some(limit) => tokio::time::timeout(limit, waiting)
                .await
                .map_err(|_| OcrError::Busy)?,
            None => waiting.await,
        }
        // The semaphore is never closed while the gate is alive.
        .map_err(|_| OcrError::Internal("admission gate is closed".to_string()))?;

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        Ok(SlotPermit {
            permit: Some(permit),
            in_flight: Arc::clone(&self.in_flight),
            cooldown: match self.policy {
                AdmissionPolicy::Queue => None,
                AdmissionPolicy::SingleFlight => {
                    Some((Arc::clone(&self.semaphore), self.cooldown))
                }
            },
        })
    }

    /// Snapshot of gate occupancy, for the health endpoint and tests.
    pub fn stats(&self) -> GateStats {
        GateStats {
            capacity: self.capacity,
            available: self.semaphore.available_permits(),
            in_flight: self.in_flight.load(Ordering::SeqCst),
        }
    }
}

/// One unit of concurrent access to the recognizer.
///
/// Dropping the permit releases the slot. Under the single-flight
/// policy the slot only becomes acquirable again once the cooldown has
/// elapsed; the release path schedules the permit's return instead of
/// making the next waiter poll for it.
#[derive(Debug)]
pub struct SlotPermit {
    permit: Option<OwnedSemaphorePermit>,
    in_flight: Arc<AtomicUsize>,
    cooldown: Option<(Arc<Semaphore>, Duration)>,
}

impl Drop for SlotPermit {
    fn drop(&mut self) {
        let Some(permit) = self.permit.take() else {
            return;
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.cooldown.take() {
            None => drop(permit),
            Some((semaphore, cooldown)) => {
                // Withhold the slot for the cooldown. The permit is
                // forgotten here and re-added once the interval elapses.
                permit.forget();
                if cooldown.is_zero() {
                    semaphore.add_permits(1);
                    return;
                }
                match tokio::runtime::Handle::try_current() {
                    Ok(handle) => {
                        handle.spawn(async move {
                            tokio::time::sleep(cooldown).await;
                            semaphore.add_permits(1);
                        });
                    }
                    // No runtime (e.g. dropped after shutdown): return
                    // the slot immediately rather than leak it.
                    Err(_) => semaphore.add_permits(1),
                }
            }
        }
    }
}

/// Gate occupancy snapshot
#[derive(Debug, Clone, serde::Serialize)]
pub struct GateStats {
    pub capacity: usize,
    pub available: usize,
    pub in_flight: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue_config(capacity: usize) -> AdmissionConfig {
        AdmissionConfig {
            policy: AdmissionPolicy::Queue,
            capacity,
            cooldown_ms: 0,
            acquire_timeout_ms: None,
        }
    }

    fn single_flight_config(cooldown_ms: u64) -> AdmissionConfig {
        AdmissionConfig {
            policy: AdmissionPolicy::SingleFlight,
            capacity: 1,
            cooldown_ms,
            acquire_timeout_ms: None,
        }
    }

    #[tokio::test]
    async fn acquire_and_release_restore_stats() {
        let gate = AdmissionGate::new(&queue_config(2));

        {
            let _slot = gate.acquire().await.unwrap();
            let stats = gate.stats();
            assert_eq!(stats.in_flight, 1);
            assert_eq!(stats.available, 1);
        }

        let stats = gate.stats();
        assert_eq!(stats.in_flight, 0);
        assert_eq!(stats.available, 2);
    }

    #[tokio::test]
    async fn concurrency_never_exceeds_capacity() {
        let gate = Arc::new(AdmissionGate::new(&queue_config(3)));
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let gate = Arc::clone(&gate);
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                let _slot = gate.acquire().await.unwrap();
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                running.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(gate.stats().available, 3);
        assert_eq!(gate.stats().in_flight, 0);
    }

    #[tokio::test]
    async fn waiters_are_admitted_in_arrival_order() {
        let gate = Arc::new(AdmissionGate::new(&queue_config(1)));
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let blocker = gate.acquire().await.unwrap();

        let mut handles = Vec::new();
        for i in 0..4 {
            let gate = Arc::clone(&gate);
            let order = Arc::clone(&order);
            handles.push(tokio::spawn(async move {
                let _slot = gate.acquire().await.unwrap();
                order.lock().push(i);
            }));
            // Stagger arrivals so queue positions are deterministic.
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        drop(blocker);
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*order.lock(), vec![0, 1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn single_flight_withholds_slot_for_cooldown() {
        let gate = AdmissionGate::new(&single_flight_config(5_000));

        let slot = gate.acquire().await.unwrap();
        drop(slot);
        tokio::task::yield_now().await;

        // Just shy of the cooldown: slot still withheld.
        tokio::time::advance(Duration::from_millis(4_999)).await;
        tokio::task::yield_now().await;
        assert_eq!(gate.stats().available, 0);

        // Past the cooldown: slot is back.
        tokio::time::advance(Duration::from_millis(2)).await;
        tokio::task::yield_now().await;
        assert_eq!(gate.stats().available, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn second_acquire_waits_out_the_cooldown() {
        let gate = AdmissionGate::new(&single_flight_config(5_000));

        let first = gate.acquire().await.unwrap();
        let released_at = tokio::time::Instant::now();
        drop(first);

        let _second = gate.acquire().await.unwrap();
        assert!(released_at.elapsed() >= Duration::from_millis(5_000));
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_wait_reports_busy() {
        let config = AdmissionConfig {
            policy: AdmissionPolicy::Queue,
            capacity: 1,
            cooldown_ms: 0,
            acquire_timeout_ms: Some(10),
        };
        let gate = AdmissionGate::new(&config);

        let _held = gate.acquire().await.unwrap();
        let err = gate.acquire().await.unwrap_err();
        assert_eq!(err, OcrError::Busy);
    }

    #[tokio::test]
    async fn dropping_a_waiting_acquire_gives_up_its_place() {
        let gate = Arc::new(AdmissionGate::new(&queue_config(1)));
        let held = gate.acquire().await.unwrap();

        let waiter = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move {
                let _slot = gate.acquire().await.unwrap();
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        waiter.abort();
        let _ = waiter.await;

        drop(held);
        // The cancelled waiter must not have consumed the slot.
        let slot = gate.acquire().await.unwrap();
        drop(slot);
        assert_eq!(gate.stats().available, 1);
    }
}
