//! Render loop and scene host
//!
//! [`SceneHost::new`] builds the scene around a [`RenderSurface`] and returns
//! a [`HostHandle`]. The handle swaps the active model, installs the
//! per-frame animation and steps frames, either one at a time or from a
//! spawned frame cycle woken by the display refresh pulse.
//!
//! The host is `running` until [`HostHandle::teardown`], after which every
//! control is a no-op and the frame cycle exits on its next tick.

pub mod headless;
pub mod scene;
pub mod surface;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::animation::AnimationFn;
use crate::config::SceneConfig;
use crate::error::Result;
use crate::model::SceneGraph;
use crate::runtime::{AsyncSpawner, PulseSource, TaskHandle};
pub use headless::{FrameRecord, HeadlessSurface};
pub use scene::{Camera, FrameClock, ModelGroup, OrbitControls, RenderContext};
pub use surface::{Frame, RenderSurface, SurfaceError, SurfaceResult};

struct HostState<T> {
    context: RenderContext<T>,
    animation: Option<AnimationFn>,
    playing: bool,
}

struct HostInner<S: RenderSurface> {
    surface: S,
    running: AtomicBool,
    frames: AtomicU64,
    state: Mutex<HostState<S::Texture>>,
}

/// Constructs scene hosts
#[derive(Debug, Clone, Copy, Default)]
pub struct SceneHost;

impl SceneHost {
    /// Build the scene on `surface` and return its control handle
    ///
    /// Animation starts out playing with no animation installed.
    pub fn new<S: RenderSurface>(surface: S, config: &SceneConfig) -> Result<HostHandle<S>> {
        let context = RenderContext::build(&surface, config)?;
        log::debug!(
            "Scene host ready on {} surface, aspect {:.3}",
            surface.backend_name(),
            context.camera.aspect
        );
        Ok(HostHandle {
            inner: Arc::new(HostInner {
                surface,
                running: AtomicBool::new(true),
                frames: AtomicU64::new(0),
                state: Mutex::new(HostState {
                    context,
                    animation: None,
                    playing: true,
                }),
            }),
        })
    }
}

/// Control handle for a scene host
///
/// Cloning is cheap; every clone controls the same host.
pub struct HostHandle<S: RenderSurface> {
    inner: Arc<HostInner<S>>,
}

impl<S: RenderSurface> Clone for HostHandle<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: RenderSurface> std::fmt::Debug for HostHandle<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostHandle")
            .field("surface", &self.inner.surface)
            .field("running", &self.inner.running.load(Ordering::SeqCst))
            .field("frames", &self.inner.frames.load(Ordering::SeqCst))
            .finish()
    }
}

impl<S: RenderSurface + 'static> HostHandle<S> {
    pub fn surface(&self) -> &S {
        &self.inner.surface
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Frames rendered so far
    pub fn frame_count(&self) -> u64 {
        self.inner.frames.load(Ordering::SeqCst)
    }

    /// Replace the attached model root
    ///
    /// The swap happens under the frame lock, so no frame ever sees both
    /// roots or neither.
    pub fn set_model(&self, root: SceneGraph) {
        if !self.is_running() {
            log::debug!("Ignoring model swap on a torn-down host");
            return;
        }
        self.inner.state.lock().context.model_group.replace(root);
    }

    /// Install (or with `None`, remove) the per-frame animation
    pub fn set_animation_func(&self, animation: Option<AnimationFn>) {
        if !self.is_running() {
            return;
        }
        self.inner.state.lock().animation = animation;
    }

    /// Whether the animation runs each frame; rendering continues either way
    pub fn set_animation_state(&self, playing: bool) {
        self.inner.state.lock().playing = playing;
    }

    pub fn is_playing(&self) -> bool {
        self.inner.state.lock().playing
    }

    /// Currently attached root
    pub fn attached_root(&self) -> Option<SceneGraph> {
        self.inner.state.lock().context.model_group.root().cloned()
    }

    /// Number of roots under the model group (0 or 1)
    pub fn attached_count(&self) -> usize {
        self.inner.state.lock().context.model_group.children().len()
    }

    pub fn camera(&self) -> Camera {
        self.inner.state.lock().context.camera.clone()
    }

    /// Queue orbit input, applied after the next rendered frame
    pub fn orbit(&self, yaw: f32, pitch: f32) {
        self.inner.state.lock().context.controls.rotate(yaw, pitch);
    }

    pub fn zoom(&self, factor: f32) {
        self.inner.state.lock().context.controls.zoom(factor);
    }

    /// Inspect the render context
    pub fn with_context<R>(&self, f: impl FnOnce(&RenderContext<S::Texture>) -> R) -> R {
        f(&self.inner.state.lock().context)
    }

    /// Resize listener: match the backing buffer and camera to the container
    pub fn handle_resize(&self) -> Result<()> {
        if !self.is_running() {
            return Ok(());
        }
        let (width, height) = self.inner.surface.container_size();
        self.inner.surface.resize(width, height)?;
        self.inner.state.lock().context.camera.aspect = scene::aspect_ratio(width, height);
        Ok(())
    }

    /// Step one frame with the elapsed time from the frame clock
    pub fn frame(&self) -> Result<bool> {
        if !self.is_running() {
            return Ok(false);
        }
        let delta = self.inner.state.lock().context.clock.delta();
        self.advance(delta)
    }

    /// Step one frame of `delta` seconds
    ///
    /// Returns `false` once the host is torn down, without rendering.
    pub fn advance(&self, delta: f32) -> Result<bool> {
        let mut state = self.inner.state.lock();
        if !self.is_running() {
            return Ok(false);
        }

        let HostState {
            context,
            animation,
            playing,
        } = &mut *state;
        if *playing {
            if let Some(animate) = animation.as_mut() {
                animate(delta);
            }
        }

        let index = self.inner.frames.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.surface.render(&Frame {
            index,
            camera: &context.camera,
            clear_color: context.clear_color,
            fog: &context.fog,
            model_group: &context.model_group,
        })?;
        context.controls.update(&mut context.camera);
        Ok(true)
    }

    /// Stop the frame cycle and release the surface; irreversible
    pub fn teardown(&self) {
        if !self.inner.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let mut state = self.inner.state.lock();
        state.animation = None;
        state.context.model_group.clear();
        if let Some(texture) = state.context.environment.take() {
            self.inner.surface.release_texture(texture);
        }
        self.inner.surface.dispose();
        log::debug!("Scene host torn down after {} frames", self.frame_count());
    }

    /// Run frames on a spawned task, one per pulse of `period`
    ///
    /// The task ends when the host is torn down or the pulse source closes.
    pub fn spawn_frame_cycle<A: AsyncSpawner>(
        &self,
        spawner: &A,
        pulses: &dyn PulseSource,
        period: Duration,
    ) -> TaskHandle {
        let host = self.clone();
        let mut pulse = pulses.pulse(period);
        spawner.spawn(async move {
            while pulse.tick().await {
                match host.frame() {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => log::warn!("Frame {} failed: {e}", host.frame_count()),
                }
            }
            log::debug!("Frame cycle stopped");
        })
    }
}
