//! Tokio async runtime implementation

use std::future::Future;
use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use super::{AsyncSpawner, Pulse, PulseSource, TaskHandle};

/// Tokio-based async spawner
#[derive(Clone, Debug, Default, Copy)]
pub struct TokioSpawner;

impl TokioSpawner {
    pub fn new() -> Self {
        Self
    }
}

impl AsyncSpawner for TokioSpawner {
    fn spawn<F>(&self, task: F) -> TaskHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        TaskHandle::new(tokio::spawn(task))
    }

    fn runtime_name(&self) -> &'static str {
        "Tokio"
    }
}

/// Wall-clock pulses backed by `tokio::time::interval`
#[derive(Clone, Debug, Default, Copy)]
pub struct IntervalPulseSource;

impl IntervalPulseSource {
    pub fn new() -> Self {
        Self
    }
}

impl PulseSource for IntervalPulseSource {
    fn pulse(&self, period: Duration) -> Box<dyn Pulse> {
        // First tick lands one full period from now, not immediately.
        let mut interval = interval_at(Instant::now() + period, period);
        // A stalled frame should not be followed by a burst of catch-up frames.
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Box::new(IntervalPulse { interval })
    }
}

#[derive(Debug)]
struct IntervalPulse {
    interval: Interval,
}

#[async_trait::async_trait]
impl Pulse for IntervalPulse {
    async fn tick(&mut self) -> bool {
        self.interval.tick().await;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_tokio_spawner() {
        let spawner = TokioSpawner::new();
        let ran = Arc::new(AtomicBool::new(false));
        let ran_clone = ran.clone();

        let handle = spawner.spawn(async move {
            ran_clone.store(true, Ordering::SeqCst);
        });

        let inner = handle.downcast::<tokio::task::JoinHandle<()>>();
        assert!(inner.is_some());
        if let Some(inner) = inner {
            inner.await.unwrap();
        }
        assert!(ran.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_pulse_waits_one_period() {
        let source = IntervalPulseSource::new();
        let mut pulse = source.pulse(Duration::from_secs(1));

        let start = Instant::now();
        assert!(pulse.tick().await);
        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    #[test]
    fn test_tokio_runtime_name() {
        assert_eq!(TokioSpawner::new().runtime_name(), "Tokio");
    }
}
