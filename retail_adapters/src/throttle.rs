use std::time::Duration;

use skinmatch_engine::traits::AdapterError;
use tokio::{
    sync::{Mutex, Semaphore, SemaphorePermit},
    time::Instant,
};

/// Per-adapter request pacing: a concurrency ceiling plus a minimum interval between request
/// starts.
///
/// Each adapter instance owns one of these exclusively. The spacing lock is held while waiting
/// out the interval, so request starts are serialized at least `min_interval` apart even when
/// several permits are free.
pub struct RequestThrottle {
    semaphore: Semaphore,
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RequestThrottle {
    pub fn new(max_concurrent: usize, min_interval: Duration) -> Self {
        Self {
            semaphore: Semaphore::new(max_concurrent),
            last_request: Mutex::new(None),
            min_interval,
        }
    }

    /// Waits for a free slot and for the minimum inter-request spacing, then returns the permit.
    /// Hold the permit for the duration of the request.
    pub async fn acquire(&self) -> Result<SemaphorePermit<'_>, AdapterError> {
        let permit = self.semaphore.acquire().await.map_err(|e| AdapterError::Throttle(e.to_string()))?;
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let since = previous.elapsed();
            if since < self.min_interval {
                tokio::time::sleep(self.min_interval - since).await;
            }
        }
        *last = Some(Instant::now());
        drop(last);
        Ok(permit)
    }
}

#[cfg(test)]
mod test {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn requests_are_spaced_by_the_minimum_interval() {
        let throttle = RequestThrottle::new(5, Duration::from_millis(200));
        let started = Instant::now();
        for _ in 0..3 {
            let _permit = throttle.acquire().await.unwrap();
        }
        // First request is immediate; the next two each wait out the interval.
        assert!(started.elapsed() >= Duration::from_millis(400));
    }

    #[tokio::test]
    async fn concurrency_ceiling_is_enforced() {
        let throttle = Arc::new(RequestThrottle::new(2, Duration::ZERO));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let throttle = Arc::clone(&throttle);
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                let _permit = throttle.acquire().await.unwrap();
                let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(current, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 2, "more than two requests were in flight");
    }
}
