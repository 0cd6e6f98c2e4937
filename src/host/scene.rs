//! Scene contents owned by the host
//!
//! Camera, lights, fog, floor grid, environment backdrop and the single
//! model group that holds the active model's root.

use std::f32::consts::PI;
use std::time::Instant;

use glam::{Mat4, Quat, Vec3};

use super::surface::{RenderSurface, SurfaceResult, TextureDescriptor, TextureFormat};
use crate::config::SceneConfig;
use crate::model::SceneGraph;

/// Edge length of each environment cube face
pub const ENVIRONMENT_FACE_SIZE: u32 = 128;

const WHITE: u32 = 0xffffff;

/// Perspective camera
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl Camera {
    pub fn from_config(config: &SceneConfig, aspect: f32) -> Self {
        Self {
            fov_degrees: config.fov_degrees,
            aspect,
            near: config.near,
            far: config.far,
            position: Vec3::from(config.camera_position),
            target: Vec3::ZERO,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }
}

/// Linear distance fog
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub color: u32,
    pub near: f32,
    pub far: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: u32,
    pub intensity: f32,
}

/// Floor grid helper
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pub size: f32,
    pub divisions: u32,
    pub y: f32,
}

/// The one node the active model's root hangs from
#[derive(Debug, Clone)]
pub struct ModelGroup {
    pub translation: Vec3,
    pub rotation: Quat,
    children: Vec<SceneGraph>,
}

impl ModelGroup {
    fn new(floor_y: f32) -> Self {
        Self {
            translation: Vec3::new(0.0, floor_y, 0.0),
            // Models are authored facing -Z; turn them toward the camera.
            rotation: Quat::from_rotation_y(PI),
            children: Vec::new(),
        }
    }

    /// Detach the current root (if any) and attach `root` in its place
    pub fn replace(&mut self, root: SceneGraph) {
        self.children.clear();
        self.children.push(root);
    }

    pub fn clear(&mut self) {
        self.children.clear();
    }

    pub fn children(&self) -> &[SceneGraph] {
        &self.children
    }

    pub fn root(&self) -> Option<&SceneGraph> {
        self.children.first()
    }

    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.translation)
    }
}

/// Camera orbiting a target, driven by pointer input
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitControls {
    pub max_distance: f32,
    pub min_distance: f32,
    yaw_delta: f32,
    pitch_delta: f32,
    zoom_scale: f32,
}

impl OrbitControls {
    pub fn new(max_distance: f32) -> Self {
        Self {
            max_distance,
            min_distance: 0.01,
            yaw_delta: 0.0,
            pitch_delta: 0.0,
            zoom_scale: 1.0,
        }
    }

    /// Queue a rotation around the target, in radians
    pub fn rotate(&mut self, yaw: f32, pitch: f32) {
        self.yaw_delta += yaw;
        self.pitch_delta += pitch;
    }

    /// Queue a zoom; factors above 1 move the camera away
    pub fn zoom(&mut self, factor: f32) {
        if factor > 0.0 {
            self.zoom_scale *= factor;
        }
    }

    /// Apply queued input to `camera` and clamp its distance
    pub fn update(&mut self, camera: &mut Camera) {
        let offset = camera.position - camera.target;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return;
        }

        let mut theta = offset.x.atan2(offset.z) + self.yaw_delta;
        let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos() + self.pitch_delta;
        phi = phi.clamp(1e-4, PI - 1e-4);
        theta %= 2.0 * PI;

        let radius = (radius * self.zoom_scale).clamp(self.min_distance, self.max_distance);
        let offset = Vec3::new(
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
            radius * phi.sin() * theta.cos(),
        );
        camera.position = camera.target + offset;

        self.yaw_delta = 0.0;
        self.pitch_delta = 0.0;
        self.zoom_scale = 1.0;
    }
}

/// Seconds elapsed between successive calls
#[derive(Debug, Default)]
pub struct FrameClock {
    last: Option<Instant>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the previous call; the first call returns 0
    pub fn delta(&mut self) -> f32 {
        let now = Instant::now();
        let delta = self
            .last
            .map(|last| now.duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        self.last = Some(now);
        delta
    }
}

/// Solid-color faces for the environment cube map
pub fn environment_faces(color: u32) -> Vec<u8> {
    let [_, r, g, b] = color.to_be_bytes();
    let texels = (ENVIRONMENT_FACE_SIZE * ENVIRONMENT_FACE_SIZE) as usize;
    [r, g, b, 255].repeat(texels)
}

/// Everything drawn each frame
#[derive(Debug)]
pub struct RenderContext<T> {
    pub camera: Camera,
    pub controls: OrbitControls,
    pub ambient: AmbientLight,
    pub fog: Fog,
    pub grid: Grid,
    pub clear_color: u32,
    pub environment: Option<T>,
    pub model_group: ModelGroup,
    pub clock: FrameClock,
}

impl<T> RenderContext<T> {
    /// Build the scene for `surface`, uploading the environment backdrop
    pub fn build<S>(surface: &S, config: &SceneConfig) -> SurfaceResult<Self>
    where
        S: RenderSurface<Texture = T>,
    {
        let (width, height) = surface.container_size();
        let desc = TextureDescriptor {
            width: ENVIRONMENT_FACE_SIZE,
            height: ENVIRONMENT_FACE_SIZE,
            format: TextureFormat::Rgba8Srgb,
        };
        let face = environment_faces(config.clear_color);
        let environment = surface.create_cube_texture(&desc, [&face[..]; 6])?;

        let mut camera = Camera::from_config(config, aspect_ratio(width, height));
        let mut controls = OrbitControls::new(config.max_orbit_distance);
        controls.update(&mut camera);

        Ok(Self {
            camera,
            controls,
            ambient: AmbientLight {
                color: WHITE,
                intensity: config.ambient_intensity,
            },
            fog: Fog {
                color: config.clear_color,
                near: config.fog_near,
                far: config.fog_far,
            },
            grid: Grid {
                size: config.grid_size,
                divisions: config.grid_divisions,
                y: config.floor_y,
            },
            clear_color: config.clear_color,
            environment: Some(environment),
            model_group: ModelGroup::new(config.floor_y),
            clock: FrameClock::new(),
        })
    }
}

/// Width over height, treating a collapsed container as square
pub fn aspect_ratio(width: u32, height: u32) -> f32 {
    if width == 0 || height == 0 {
        return 1.0;
    }
    width as f32 / height as f32
}
