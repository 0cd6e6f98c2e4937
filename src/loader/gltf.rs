//! GLB scene loading
//!
//! Thin entry points over [`ModelLoader`]; only embedded binary glTF is
//! supported, external buffers are skipped.

use crate::error::Result;
use crate::model::{ModelLoader, SceneGraph};

/// Load a GLB from bytes
pub fn load_glb_bytes(data: &[u8]) -> Result<SceneGraph> {
    ModelLoader::new().load_glb(data)
}

/// Awaitable parse stage
pub async fn parse_scene(data: Vec<u8>) -> Result<SceneGraph> {
    load_glb_bytes(&data)
}
