//! Headless surface for tests and offline runs
//!
//! Draws nothing; records every frame it is handed so callers can assert on
//! what would have been on screen.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use glam::Vec3;
use parking_lot::Mutex;

use super::surface::{Frame, RenderSurface, SurfaceError, SurfaceResult, TextureDescriptor};

/// Counter for generating unique texture IDs
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// What one rendered frame contained
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub index: u64,
    /// Names of the roots attached under the model group
    pub attached: Vec<Option<String>>,
    pub camera_position: Vec3,
    pub aspect: f32,
}

/// Cube texture held in memory
#[derive(Clone, Debug)]
pub struct HeadlessTexture {
    pub id: u64,
    pub desc: TextureDescriptor,
    pub faces: Arc<[Vec<u8>; 6]>,
}

#[derive(Debug, Default)]
struct HeadlessState {
    container: (u32, u32),
    backing: (u32, u32),
    frames: Vec<FrameRecord>,
    live_textures: usize,
    disposed: bool,
    fail_render: bool,
}

/// Surface that records frames instead of drawing them
///
/// Clones share state, so a test can keep one clone while the host owns
/// another.
#[derive(Clone, Debug, Default)]
pub struct HeadlessSurface {
    state: Arc<Mutex<HeadlessState>>,
}

impl HeadlessSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(HeadlessState {
                container: (width, height),
                backing: (width, height),
                ..HeadlessState::default()
            })),
        }
    }

    /// Simulate the container element changing size
    pub fn set_container_size(&self, width: u32, height: u32) {
        self.state.lock().container = (width, height);
    }

    /// Make every subsequent render report a lost context
    pub fn set_fail_render(&self, fail: bool) {
        self.state.lock().fail_render = fail;
    }

    pub fn frames(&self) -> Vec<FrameRecord> {
        self.state.lock().frames.clone()
    }

    pub fn frame_count(&self) -> usize {
        self.state.lock().frames.len()
    }

    pub fn last_frame(&self) -> Option<FrameRecord> {
        self.state.lock().frames.last().cloned()
    }

    /// Backing buffer size
    pub fn size(&self) -> (u32, u32) {
        self.state.lock().backing
    }

    pub fn live_textures(&self) -> usize {
        self.state.lock().live_textures
    }

    pub fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }
}

impl RenderSurface for HeadlessSurface {
    type Texture = HeadlessTexture;

    fn container_size(&self) -> (u32, u32) {
        self.state.lock().container
    }

    fn resize(&self, width: u32, height: u32) -> SurfaceResult<()> {
        let mut state = self.state.lock();
        if state.disposed {
            return Err(SurfaceError::Disposed);
        }
        if width == 0 || height == 0 {
            return Err(SurfaceError::InvalidSize(width, height));
        }
        state.backing = (width, height);
        Ok(())
    }

    fn create_cube_texture(
        &self,
        desc: &TextureDescriptor,
        faces: [&[u8]; 6],
    ) -> SurfaceResult<Self::Texture> {
        if desc.width == 0 || desc.height == 0 {
            return Err(SurfaceError::TextureCreationFailed(
                "Invalid texture dimensions".to_string(),
            ));
        }
        if let Some(face) = faces.iter().find(|f| f.len() != desc.face_len()) {
            return Err(SurfaceError::TextureCreationFailed(format!(
                "Face holds {} bytes, expected {}",
                face.len(),
                desc.face_len()
            )));
        }

        let mut state = self.state.lock();
        if state.disposed {
            return Err(SurfaceError::Disposed);
        }
        state.live_textures += 1;
        Ok(HeadlessTexture {
            id: next_id(),
            desc: *desc,
            faces: Arc::new(faces.map(<[u8]>::to_vec)),
        })
    }

    fn render(&self, frame: &Frame<'_>) -> SurfaceResult<()> {
        let mut state = self.state.lock();
        if state.disposed {
            return Err(SurfaceError::Disposed);
        }
        if state.fail_render {
            return Err(SurfaceError::ContextLost);
        }
        state.frames.push(FrameRecord {
            index: frame.index,
            attached: frame
                .model_group
                .children()
                .iter()
                .map(|root| root.name().map(str::to_string))
                .collect(),
            camera_position: frame.camera.position,
            aspect: frame.camera.aspect,
        });
        Ok(())
    }

    fn release_texture(&self, _texture: Self::Texture) {
        let mut state = self.state.lock();
        state.live_textures = state.live_textures.saturating_sub(1);
    }

    fn dispose(&self) {
        self.state.lock().disposed = true;
    }

    fn backend_name(&self) -> &'static str {
        "Headless"
    }
}
