//! Drawable surface abstraction
//!
//! The scene host never talks to a graphics API directly. It hands each frame
//! to a [`RenderSurface`], which owns the backing pixels, textures and
//! whatever device context the embedding environment provides.

use std::fmt::Debug;

use thiserror::Error;

use super::scene::{Camera, Fog, ModelGroup};

/// Error type for surface operations
#[derive(Error, Debug)]
pub enum SurfaceError {
    #[error("Texture creation failed: {0}")]
    TextureCreationFailed(String),

    #[error("Invalid surface size: {0}x{1}")]
    InvalidSize(u32, u32),

    #[error("Rendering context lost")]
    ContextLost,

    #[error("Surface already disposed")]
    Disposed,
}

/// Result type for surface operations
pub type SurfaceResult<T> = Result<T, SurfaceError>;

/// Texel format of a surface texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// RGBA 8-bit with sRGB color space
    Rgba8Srgb,
    /// RGBA 8-bit unorm
    Rgba8Unorm,
}

impl TextureFormat {
    pub fn bytes_per_texel(self) -> usize {
        4
    }
}

/// Size and format of each cube-map face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDescriptor {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

impl TextureDescriptor {
    /// Bytes expected for one face
    pub fn face_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_texel()
    }
}

/// Everything a surface needs to draw one frame
#[derive(Debug)]
pub struct Frame<'a> {
    /// Monotonic frame counter, starting at 1
    pub index: u64,
    pub camera: &'a Camera,
    pub clear_color: u32,
    pub fog: &'a Fog,
    pub model_group: &'a ModelGroup,
}

/// Backend-agnostic drawable surface
///
/// # Example
/// ```ignore
/// let surface = HeadlessSurface::new(1280, 720);
/// let host = SceneHost::new(surface, &config.scene)?;
/// host.frame()?;
/// ```
pub trait RenderSurface: Send + Sync + Debug {
    /// Texture handle type for this backend
    type Texture: Clone + Send + Sync + Debug;

    /// Current size of the element the surface fills, in pixels
    fn container_size(&self) -> (u32, u32);

    /// Resize the backing buffer
    fn resize(&self, width: u32, height: u32) -> SurfaceResult<()>;

    /// Create a cube-map texture from six faces (+X, -X, +Y, -Y, +Z, -Z)
    fn create_cube_texture(
        &self,
        desc: &TextureDescriptor,
        faces: [&[u8]; 6],
    ) -> SurfaceResult<Self::Texture>;

    /// Draw one frame
    fn render(&self, frame: &Frame<'_>) -> SurfaceResult<()>;

    /// Release a texture (optional cleanup)
    fn release_texture(&self, _texture: Self::Texture) {
        // Default: let Drop handle it
    }

    /// Release every resource held by the surface; irreversible
    fn dispose(&self);

    /// Get the name of this backend (for debugging)
    fn backend_name(&self) -> &'static str;
}
