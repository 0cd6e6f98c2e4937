//! View state controller
//!
//! Drives `initial -> loading -> loaded`, pushes resolved models into the
//! scene host, keeps the overlay (facts and mission duration) current, and
//! turns any resolution failure into a fatal session termination.
//!
//! Every selection takes a token. Only the most recently requested selection
//! may commit; an older one that completes later is discarded, whether it
//! succeeded or failed.

use std::fmt::Debug;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::channel::oneshot;
use futures::future::{self, Either};
use parking_lot::Mutex;

use crate::animation;
use crate::cache::AssetCache;
use crate::catalog::{ModelId, Vehicle};
use crate::config::{TimingConfig, ViewerConfig};
use crate::error::{FailureKind, Result, ViewerError};
use crate::facts::FactSheet;
use crate::host::{HostHandle, RenderSurface};
use crate::mission::{self, DEPLOYED_LABEL};
use crate::runtime::{AsyncSpawner, PulseSource};

pub const FATAL_TITLE: &str = "Error Occurred";
pub const FATAL_BODY: &str = "An error occurred while loading model";

/// User-facing load state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Initial,
    Loading,
    Loaded,
    /// Terminal; the session must be restarted
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimState {
    #[default]
    Playing,
    Paused,
}

impl AnimState {
    pub fn is_playing(self) -> bool {
        self == Self::Playing
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Playing => Self::Paused,
            Self::Paused => Self::Playing,
        }
    }
}

/// Outcome of a selection request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// The model is now active
    Committed,
    /// A newer selection was requested before this one completed
    Superseded,
}

/// Blocking notice shown when the session cannot continue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatalNotice {
    pub title: String,
    pub body: String,
    pub cause: String,
    pub kind: FailureKind,
}

impl FatalNotice {
    fn from_error(err: &ViewerError) -> Self {
        Self {
            title: FATAL_TITLE.to_string(),
            body: FATAL_BODY.to_string(),
            cause: err.to_string(),
            kind: err.kind(),
        }
    }
}

/// The embedding environment's response to a fatal error
///
/// Acknowledging the notice restarts the whole session; the controller never
/// retries on its own.
pub trait SessionHost: Send + Sync + Debug {
    fn terminate(&self, notice: &FatalNotice);
}

/// Session host that records terminations
#[derive(Clone, Debug, Default)]
pub struct RecordingSession {
    notices: Arc<Mutex<Vec<FatalNotice>>>,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<FatalNotice> {
        self.notices.lock().clone()
    }
}

impl SessionHost for RecordingSession {
    fn terminate(&self, notice: &FatalNotice) {
        self.notices.lock().push(notice.clone());
    }
}

/// Text and attributes drawn over the scene
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Overlay {
    pub title: String,
    /// Elapsed mission time; `None` when the deployment date is unknown
    pub duration: Option<String>,
    /// Info-card attributes in source order
    pub info: Vec<(String, String)>,
    pub about: String,
    pub more_info: Option<String>,
}

impl Overlay {
    fn from_facts(id: &ModelId, facts: &FactSheet) -> Self {
        Self {
            title: facts.title.clone(),
            duration: None,
            info: facts
                .visible_attributes()
                .into_iter()
                .map(|(l, v)| (l.to_string(), v.to_string()))
                .collect(),
            about: facts.extract.clone(),
            more_info: Vehicle::from_identifier(id).map(Vehicle::wiki_url),
        }
    }

    pub fn duration_text(&self) -> Option<String> {
        self.duration
            .as_ref()
            .map(|d| format!("Mission duration: {d}"))
    }
}

/// Source of wall-clock time for the duration display
pub type NowFn = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Default)]
struct ControllerState {
    view: ViewState,
    anim: AnimState,
    active: Option<ModelId>,
    selection: u64,
    overlay: Overlay,
    deployed: Option<DateTime<Utc>>,
    ticker_generation: u64,
    ticker_cancel: Option<oneshot::Sender<()>>,
    notice: Option<FatalNotice>,
    torn_down: bool,
}

impl ControllerState {
    fn cancel_ticker(&mut self) {
        self.ticker_generation += 1;
        self.ticker_cancel = None;
        self.deployed = None;
    }
}

struct ControllerInner<S: RenderSurface, A: AsyncSpawner> {
    cache: Arc<AssetCache>,
    host: HostHandle<S>,
    session: Arc<dyn SessionHost>,
    spawner: A,
    pulses: Arc<dyn PulseSource>,
    config: ViewerConfig,
    now: NowFn,
    state: Mutex<ControllerState>,
}

/// Orchestrates selection, loading and the overlay
///
/// Cloning is cheap; clones share state.
pub struct ViewController<S: RenderSurface, A: AsyncSpawner> {
    inner: Arc<ControllerInner<S, A>>,
}

impl<S: RenderSurface, A: AsyncSpawner> Clone for ViewController<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: RenderSurface + 'static, A: AsyncSpawner + 'static> ViewController<S, A> {
    pub fn new(
        cache: Arc<AssetCache>,
        host: HostHandle<S>,
        session: Arc<dyn SessionHost>,
        spawner: A,
        pulses: Arc<dyn PulseSource>,
        config: ViewerConfig,
    ) -> Self {
        Self::with_clock(cache, host, session, spawner, pulses, config, Arc::new(Utc::now))
    }

    /// Like [`ViewController::new`] with an explicit time source
    pub fn with_clock(
        cache: Arc<AssetCache>,
        host: HostHandle<S>,
        session: Arc<dyn SessionHost>,
        spawner: A,
        pulses: Arc<dyn PulseSource>,
        config: ViewerConfig,
        now: NowFn,
    ) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                cache,
                host,
                session,
                spawner,
                pulses,
                config,
                now,
                state: Mutex::new(ControllerState::default()),
            }),
        }
    }

    pub fn host(&self) -> &HostHandle<S> {
        &self.inner.host
    }

    pub fn cache(&self) -> &Arc<AssetCache> {
        &self.inner.cache
    }

    pub fn view_state(&self) -> ViewState {
        self.inner.state.lock().view
    }

    pub fn anim_state(&self) -> AnimState {
        self.inner.state.lock().anim
    }

    /// Identifier of the committed model
    pub fn active(&self) -> Option<ModelId> {
        self.inner.state.lock().active.clone()
    }

    pub fn overlay(&self) -> Overlay {
        self.inner.state.lock().overlay.clone()
    }

    pub fn fatal_notice(&self) -> Option<FatalNotice> {
        self.inner.state.lock().notice.clone()
    }

    /// Select the vehicle shown on `route`
    pub async fn navigate(&self, route: &str) -> Result<Selection> {
        let vehicle = Vehicle::from_route(route)
            .ok_or_else(|| ViewerError::InvalidIdentifier(format!("unknown route {route}")))?;
        let id = self.inner.config.model_id(vehicle)?;
        self.select(id).await
    }

    /// Load `id` and make it the active model
    ///
    /// A failure terminates the session. Once terminated or torn down, every
    /// further selection fails with [`ViewerError::SessionTerminated`], and a
    /// selection still loading at teardown completes as
    /// [`Selection::Superseded`].
    pub async fn select(&self, id: ModelId) -> Result<Selection> {
        let token = {
            let mut state = self.inner.state.lock();
            if state.view == ViewState::Failed || state.torn_down {
                return Err(ViewerError::SessionTerminated);
            }
            state.selection += 1;
            state.view = ViewState::Loading;
            state.cancel_ticker();
            state.overlay.duration = None;
            state.selection
        };
        log::debug!("Selection {token}: loading {id}");

        let result = match self.inner.cache.resolve(&id).await {
            Ok(model) => animation::build(&id, &model.scene).map(|anim| (model, anim)),
            Err(e) => Err(e),
        };

        let mut state = self.inner.state.lock();
        if state.torn_down {
            log::debug!("Discarding selection {token} ({id}) completed after teardown");
            return Ok(Selection::Superseded);
        }
        if state.selection != token || state.view == ViewState::Failed {
            log::debug!("Discarding stale selection {token} ({id})");
            return Ok(Selection::Superseded);
        }

        match result {
            Ok((model, animate)) => {
                let host = &self.inner.host;
                host.set_model(model.scene.clone());
                host.set_animation_func(Some(animate));
                host.set_animation_state(state.anim.is_playing());

                state.view = ViewState::Loaded;
                state.active = Some(id.clone());
                state.overlay = Overlay::from_facts(&id, &model.facts);
                self.start_duration_ticker(&mut state, &model.facts);
                log::info!("Loaded {id}");
                Ok(Selection::Committed)
            }
            Err(e) => {
                let notice = FatalNotice::from_error(&e);
                state.view = ViewState::Failed;
                state.notice = Some(notice.clone());
                drop(state);

                log::warn!("Terminating session: failed to load {id}: {e}");
                self.inner.session.terminate(&notice);
                Err(e)
            }
        }
    }

    /// Flip play/pause and apply it to the host immediately
    pub fn toggle_animation(&self) -> AnimState {
        let mut state = self.inner.state.lock();
        state.anim = state.anim.toggled();
        self.inner.host.set_animation_state(state.anim.is_playing());
        state.anim
    }

    /// Recompute the duration text from the current time
    pub fn refresh_duration(&self) {
        let mut state = self.inner.state.lock();
        self.update_duration(&mut state);
    }

    /// Stop the ticker and tear the host down
    pub fn teardown(&self) {
        {
            let mut state = self.inner.state.lock();
            state.torn_down = true;
            state.cancel_ticker();
        }
        self.inner.host.teardown();
    }

    fn update_duration(&self, state: &mut ControllerState) {
        if let Some(deployed) = state.deployed {
            let units = self.inner.config.timing.duration_units;
            state.overlay.duration =
                Some(mission::mission_duration(deployed, (self.inner.now)(), units));
        }
    }

    fn start_duration_ticker(&self, state: &mut ControllerState, facts: &FactSheet) {
        let deployed = match facts.attribute(DEPLOYED_LABEL).map(mission::deployed_at) {
            Some(Ok(deployed)) => deployed,
            Some(Err(e)) => {
                log::info!("No mission duration for {}: {e}", facts.title);
                return;
            }
            None => {
                log::info!("No {DEPLOYED_LABEL} attribute for {}", facts.title);
                return;
            }
        };

        state.deployed = Some(deployed);
        self.update_duration(state);

        let (cancel_tx, cancel_rx) = oneshot::channel();
        state.ticker_cancel = Some(cancel_tx);
        let generation = state.ticker_generation;
        let timing: &TimingConfig = &self.inner.config.timing;
        let mut pulse = self.inner.pulses.pulse(timing.duration_tick());
        let controller = self.clone();

        self.inner.spawner.spawn(async move {
            let mut cancelled = cancel_rx;
            loop {
                match future::select(pulse.tick(), &mut cancelled).await {
                    Either::Left((true, _)) => {}
                    _ => break,
                }
                let mut state = controller.inner.state.lock();
                if state.ticker_generation != generation {
                    break;
                }
                controller.update_duration(&mut state);
            }
            log::debug!("Duration ticker {generation} stopped");
        });
    }
}
