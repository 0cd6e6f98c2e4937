use std::sync::Arc;

use glam::{EulerRot, Quat, Vec3};
use gltf::Gltf;
use parking_lot::RwLock;

use crate::error::{Result, ViewerError};

/// Local transform of a node
///
/// Rotation is kept as XYZ Euler angles in radians so per-axis animation can
/// accumulate on a single component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Build from a glTF decomposed transform (quaternion is x, y, z, w)
    pub fn from_decomposed(translation: [f32; 3], rotation: [f32; 4], scale: [f32; 3]) -> Self {
        let (x, y, z) = Quat::from_array(rotation).to_euler(EulerRot::XYZ);
        Self {
            translation: Vec3::from(translation),
            rotation: Vec3::new(x, y, z),
            scale: Vec3::from(scale),
        }
    }

    pub fn quaternion(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }
}

/// Geometry summary of one glTF mesh
#[derive(Debug, Clone, PartialEq)]
pub struct MeshInfo {
    pub name: Option<String>,
    pub primitive_count: usize,
    pub vertex_count: usize,
    pub index_count: usize,
}

/// A node in the scene hierarchy
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: Option<String>,
    /// Shared with every clone of the owning scene graph
    transform: Arc<RwLock<Transform>>,
    pub mesh: Option<usize>,
    pub children: Vec<usize>,
    pub parent: Option<usize>,
}

impl SceneNode {
    pub fn transform(&self) -> Transform {
        *self.transform.read()
    }
}

/// Handle to a named node whose transform can be driven every frame
#[derive(Debug, Clone)]
pub struct NodeRef {
    index: usize,
    name: String,
    transform: Arc<RwLock<Transform>>,
}

impl NodeRef {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rotation(&self) -> Vec3 {
        self.transform.read().rotation
    }

    /// Advance the rotation about X by `radians`
    pub fn rotate_x(&self, radians: f32) {
        self.transform.write().rotation.x += radians;
    }

    pub fn set_rotation(&self, rotation: Vec3) {
        self.transform.write().rotation = rotation;
    }
}

/// Hierarchical tree of named nodes parsed from a model asset
///
/// Cloning is cheap and clones share node transforms, so an animation built
/// against one clone moves the nodes every other clone renders.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    name: Option<String>,
    nodes: Arc<[SceneNode]>,
    roots: Arc<[usize]>,
    meshes: Arc<[MeshInfo]>,
}

impl SceneGraph {
    pub fn new(
        name: Option<String>,
        nodes: Vec<SceneNode>,
        roots: Vec<usize>,
        meshes: Vec<MeshInfo>,
    ) -> Self {
        Self {
            name,
            nodes: nodes.into(),
            roots: roots.into(),
            meshes: meshes.into(),
        }
    }

    /// Scene name, falling back to the first root node's name
    pub fn name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or_else(|| self.roots.first().and_then(|&i| self.nodes[i].name.as_deref()))
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn meshes(&self) -> &[MeshInfo] {
        &self.meshes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Find the first node with the given name, depth-first from the roots
    pub fn find_by_name(&self, name: &str) -> Option<NodeRef> {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(index) = stack.pop() {
            if std::mem::replace(&mut visited[index], true) {
                continue;
            }
            let node = &self.nodes[index];
            if node.name.as_deref() == Some(name) {
                return Some(NodeRef {
                    index,
                    name: name.to_string(),
                    transform: Arc::clone(&node.transform),
                });
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    /// Whether both handles refer to the same parsed scene
    pub fn same_scene(&self, other: &SceneGraph) -> bool {
        Arc::ptr_eq(&self.nodes, &other.nodes)
    }

    /// Rough in-memory footprint, used for metrics
    pub fn estimated_size(&self) -> usize {
        let geometry: usize = self
            .meshes
            .iter()
            .map(|m| m.vertex_count * 3 * std::mem::size_of::<f32>() + m.index_count * 4)
            .sum();
        geometry + self.nodes.len() * std::mem::size_of::<SceneNode>()
    }
}

/// Parses binary glTF payloads into scene graphs
#[derive(Debug, Clone, Default)]
pub struct ModelLoader;

impl ModelLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a GLB model from binary data
    pub fn load_glb(&self, data: &[u8]) -> Result<SceneGraph> {
        if data.is_empty() {
            return Err(ViewerError::Parse("empty model payload".to_string()));
        }

        let gltf = Gltf::from_slice(data)?;
        let blob = gltf.blob.as_deref();

        log::debug!(
            "Parsed GLB with {} nodes and {} meshes",
            gltf.nodes().len(),
            gltf.meshes().len()
        );

        let meshes = gltf
            .meshes()
            .map(|mesh| {
                let mut info = MeshInfo {
                    name: mesh.name().map(str::to_string),
                    primitive_count: 0,
                    vertex_count: 0,
                    index_count: 0,
                };
                for primitive in mesh.primitives() {
                    info.primitive_count += 1;
                    let reader = primitive.reader(|buffer| match buffer.source() {
                        gltf::buffer::Source::Bin => blob,
                        gltf::buffer::Source::Uri(uri) => {
                            log::debug!("Skipping external buffer {uri}");
                            None
                        }
                    });
                    if let Some(positions) = reader.read_positions() {
                        info.vertex_count += positions.count();
                    }
                    if let Some(indices) = reader.read_indices() {
                        info.index_count += indices.into_u32().count();
                    }
                }
                info
            })
            .collect::<Vec<_>>();

        let mut nodes: Vec<SceneNode> = gltf
            .nodes()
            .map(|node| {
                let (translation, rotation, scale) = node.transform().decomposed();
                SceneNode {
                    name: node.name().map(str::to_string),
                    transform: Arc::new(RwLock::new(Transform::from_decomposed(
                        translation,
                        rotation,
                        scale,
                    ))),
                    mesh: node.mesh().map(|m| m.index()),
                    children: node.children().map(|c| c.index()).collect(),
                    parent: None,
                }
            })
            .collect();

        for parent in 0..nodes.len() {
            for child in nodes[parent].children.clone() {
                if let Some(existing) = nodes[child].parent.replace(parent) {
                    return Err(ViewerError::Parse(format!(
                        "node {child} has two parents ({existing} and {parent})"
                    )));
                }
            }
        }

        let scene = gltf.default_scene().or_else(|| gltf.scenes().next());
        let (name, roots): (Option<String>, Vec<usize>) = match scene {
            Some(scene) => (
                scene.name().map(str::to_string),
                scene.nodes().map(|n| n.index()).collect(),
            ),
            None => (
                None,
                (0..nodes.len()).filter(|&i| nodes[i].parent.is_none()).collect(),
            ),
        };

        check_acyclic(&nodes, &roots)?;
        Ok(SceneGraph::new(name, nodes, roots, meshes))
    }
}

/// Every node reachable from `roots` must be reached exactly once.
fn check_acyclic(nodes: &[SceneNode], roots: &[usize]) -> Result<()> {
    let mut visited = vec![false; nodes.len()];
    let mut stack = roots.to_vec();
    while let Some(index) = stack.pop() {
        if std::mem::replace(&mut visited[index], true) {
            return Err(ViewerError::Parse(format!(
                "node {index} is reachable more than once; the hierarchy has a cycle"
            )));
        }
        stack.extend(nodes[index].children.iter().copied());
    }
    Ok(())
}
