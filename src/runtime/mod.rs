//! Async runtime abstraction for background viewer work
//!
//! The viewer never blocks: the frame cycle and the mission-duration ticker
//! run as spawned tasks that wait on a [`Pulse`] between iterations. Both the
//! spawner and the pulse source are traits so the same host and controller
//! code runs under Tokio or under the deterministic test doubles in [`mock`].

pub mod mock;
#[cfg(feature = "runtime-tokio")]
pub mod tokio_impl;

use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// A boxed future that can be sent across threads
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Handle to a spawned async task
///
/// Type-erased; downcast to the runtime's native handle when needed.
#[derive(Debug)]
pub struct TaskHandle {
    inner: Box<dyn std::any::Any + Send>,
}

impl TaskHandle {
    pub fn new<T: Send + 'static>(handle: T) -> Self {
        Self {
            inner: Box::new(handle),
        }
    }

    /// Try to downcast to a specific handle type
    pub fn downcast<T: 'static>(self) -> Option<T> {
        self.inner.downcast::<T>().ok().map(|b| *b)
    }
}

/// Async task spawner trait
///
/// # Example
/// ```ignore
/// let spawner = TokioSpawner::new();
/// host.spawn_frame_cycle(&spawner, &IntervalPulseSource::new(), config.timing.frame_period());
/// ```
pub trait AsyncSpawner: Send + Sync + Clone + Debug {
    /// Spawn a background task
    fn spawn<F>(&self, task: F) -> TaskHandle
    where
        F: Future<Output = ()> + Send + 'static;

    /// Get the name of this runtime (for debugging)
    fn runtime_name(&self) -> &'static str;
}

/// A periodic wake-up signal
///
/// `tick` resolves once per period and returns `false` when the signal
/// source has gone away, which ends the waiting loop.
#[async_trait::async_trait]
pub trait Pulse: Send {
    async fn tick(&mut self) -> bool;
}

/// Factory for periodic signals (display refresh, 1-second ticks)
pub trait PulseSource: Send + Sync + Debug {
    fn pulse(&self, period: Duration) -> Box<dyn Pulse>;
}

pub use mock::{ManualPulseSource, MockSpawner};

#[cfg(feature = "runtime-tokio")]
pub use tokio_impl::{IntervalPulseSource, TokioSpawner};
