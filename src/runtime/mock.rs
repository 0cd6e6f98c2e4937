//! Test doubles for the runtime abstraction
//!
//! `MockSpawner` either drops tasks or runs them to completion in place.
//! `ManualPulseSource` hands out pulses that only tick when the test calls
//! [`ManualPulseSource::fire`].

use std::future::Future;
use std::time::Duration;

use futures::channel::mpsc;
use futures::StreamExt;
use parking_lot::Mutex;

use super::{AsyncSpawner, Pulse, PulseSource, TaskHandle};

/// Spawn behavior for MockSpawner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockSpawnBehavior {
    /// Drop tasks immediately (don't execute)
    Drop,
    /// Block on tasks synchronously
    BlockSync,
}

/// Mock async spawner for testing
#[derive(Clone, Debug)]
pub struct MockSpawner {
    behavior: MockSpawnBehavior,
}

impl Default for MockSpawner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSpawner {
    /// Create a mock spawner that drops tasks
    pub fn new() -> Self {
        Self {
            behavior: MockSpawnBehavior::Drop,
        }
    }

    pub fn with_behavior(behavior: MockSpawnBehavior) -> Self {
        Self { behavior }
    }

    /// Create a mock spawner that runs tasks synchronously
    ///
    /// Tasks must finish on their own; a frame cycle waiting on a pulse that
    /// nobody fires would block forever.
    pub fn blocking() -> Self {
        Self {
            behavior: MockSpawnBehavior::BlockSync,
        }
    }

    pub fn behavior(&self) -> MockSpawnBehavior {
        self.behavior
    }
}

impl AsyncSpawner for MockSpawner {
    fn spawn<F>(&self, task: F) -> TaskHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match self.behavior {
            MockSpawnBehavior::Drop => {
                drop(task);
                TaskHandle::new(())
            }
            MockSpawnBehavior::BlockSync => {
                futures::executor::block_on(task);
                TaskHandle::new(())
            }
        }
    }

    fn runtime_name(&self) -> &'static str {
        "Mock"
    }
}

/// Pulse source driven by the test
#[derive(Debug, Default)]
pub struct ManualPulseSource {
    senders: Mutex<Vec<(Duration, mpsc::UnboundedSender<()>)>>,
}

impl ManualPulseSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tick every live pulse once; returns how many were ticked
    pub fn fire(&self) -> usize {
        let mut senders = self.senders.lock();
        senders.retain(|(_, tx)| tx.unbounded_send(()).is_ok());
        senders.len()
    }

    /// Tick only the live pulses created with `period`
    pub fn fire_period(&self, period: Duration) -> usize {
        let mut senders = self.senders.lock();
        senders.retain(|(_, tx)| !tx.is_closed());
        senders
            .iter()
            .filter(|(p, _)| *p == period)
            .filter(|(_, tx)| tx.unbounded_send(()).is_ok())
            .count()
    }

    /// Number of pulses whose receiving side is still alive
    pub fn live_pulses(&self) -> usize {
        let mut senders = self.senders.lock();
        senders.retain(|(_, tx)| !tx.is_closed());
        senders.len()
    }

    /// End every pulse; waiting loops observe `tick() == false`
    pub fn close_all(&self) {
        self.senders.lock().clear();
    }
}

impl PulseSource for ManualPulseSource {
    fn pulse(&self, period: Duration) -> Box<dyn Pulse> {
        let (tx, rx) = mpsc::unbounded();
        self.senders.lock().push((period, tx));
        Box::new(ChannelPulse { rx })
    }
}

/// Pulse fed by an unbounded channel
#[derive(Debug)]
pub struct ChannelPulse {
    rx: mpsc::UnboundedReceiver<()>,
}

#[async_trait::async_trait]
impl Pulse for ChannelPulse {
    async fn tick(&mut self) -> bool {
        self.rx.next().await.is_some()
    }
}
