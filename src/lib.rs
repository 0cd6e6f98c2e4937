//! mission_viewer - Headless core of an interactive Mars 2020 vehicle viewer
//!
//! # Features
//! - Two-tier model cache (persistent origin cache + session memo) with
//!   stale-version eviction
//! - Encyclopedia fact sheets with local-store fallback
//! - Per-vehicle idle animations bound to named scene nodes
//! - Scene host with an atomic model swap and a pulse-driven frame cycle
//! - View controller with a selection-token race policy and a live mission
//!   duration display
//!
//! # Quick Start
//!
//! ```ignore
//! use mission_viewer::*;
//!
//! let config = ViewerConfig::default();
//! let facts = FactProvider::new(Arc::new(source), FactStore::new(Arc::new(MemoryStore::new()), "wikis"))?;
//! let cache = AssetCache::new(Arc::new(fetcher), Arc::new(MemoryOriginCache::default()), facts);
//! let host = SceneHost::new(HeadlessSurface::new(1280, 720), &config.scene)?;
//! let controller = ViewController::new(Arc::new(cache), host, session, TokioSpawner::new(), pulses, config);
//! controller.navigate("/ingenuity").await?;
//! ```
//!
//! # Feature Flags
//!
//! - `runtime-tokio` (default): Tokio spawner, interval pulses, on-disk origin cache
//! - `net-http`: reqwest-backed origin fetcher and encyclopedia source

// Core modules
pub mod animation;
pub mod cache;
pub mod controller;
pub mod facts;
pub mod host;
pub mod loader;
pub mod net;
pub mod runtime;

// Support modules
pub mod catalog;
pub mod config;
pub mod mission;
pub mod model;

// Error types
mod error;
pub use error::{FailureKind, Result, ViewerError};

#[cfg(test)]
mod fixtures;

// Re-export main types from cache
pub use cache::metrics::{AssetMetrics, AssetMetricsHandle};
#[cfg(feature = "runtime-tokio")]
pub use cache::DiskOriginCache;
pub use cache::{AssetCache, MemoryOriginCache, OriginCache, ResolvedModel};

// Re-export fact types
#[cfg(feature = "net-http")]
pub use facts::WikipediaSource;
pub use facts::{
    EncyclopediaSource, FactProvider, FactSheet, FactStore, FileStore, KeyValueStore,
    MemoryStore, MockEncyclopedia, PageSummary,
};

// Re-export fetch types
#[cfg(feature = "net-http")]
pub use net::HttpFetcher;
pub use net::{MockFetcher, OriginFetcher};

// Re-export host types
pub use host::{
    Camera, Frame, HeadlessSurface, HostHandle, RenderSurface, SceneHost, SurfaceError,
};

// Re-export runtime types
pub use runtime::mock::MockSpawner;
#[cfg(feature = "runtime-tokio")]
pub use runtime::tokio_impl::{IntervalPulseSource, TokioSpawner};
pub use runtime::{AsyncSpawner, ManualPulseSource, Pulse, PulseSource, TaskHandle};

// Re-export model and animation types
pub use animation::{AnimationFn, AnimationRule, Animator};
pub use model::{ModelLoader, NodeRef, SceneGraph, SceneNode, Transform};

// Re-export controller types
pub use catalog::{ModelId, Vehicle};
pub use config::ViewerConfig;
pub use controller::{
    AnimState, FatalNotice, Overlay, RecordingSession, Selection, SessionHost, ViewController,
    ViewState,
};

// Version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
