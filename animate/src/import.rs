//! Scene data as produced by an asset importer.
//!
//! Matrices are 16 floats in row-major order.
//! Quaternions are stored as `[w, x, y, z]`.

use nalgebra as na;

pub const IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0, //
];

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct ImportScene {
    pub root: ImportNode,

    #[serde(default)]
    pub meshes: Vec<ImportMesh>,

    #[serde(default)]
    pub animations: Vec<ImportAnimation>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ImportNode {
    pub name: String,

    #[serde(default = "identity")]
    pub transform: [f32; 16],

    /// Indices of meshes attached to this node.
    #[serde(default)]
    pub meshes: Vec<usize>,

    #[serde(default)]
    pub children: Vec<ImportNode>,
}

impl Default for ImportNode {
    fn default() -> Self {
        ImportNode {
            name: String::new(),
            transform: IDENTITY,
            meshes: Vec::new(),
            children: Vec::new(),
        }
    }
}

impl ImportNode {
    pub fn new(name: impl Into<String>) -> Self {
        ImportNode {
            name: name.into(),
            ..ImportNode::default()
        }
    }

    pub fn with_transform(mut self, transform: &na::Matrix4<f32>) -> Self {
        self.transform = row_major(transform);
        self
    }

    pub fn with_child(mut self, child: ImportNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_mesh(mut self, mesh: usize) -> Self {
        self.meshes.push(mesh);
        self
    }

    pub fn is_mesh_node(&self) -> bool {
        !self.meshes.is_empty()
    }

    /// Number of nodes in this subtree, this node included.
    pub fn count(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            count += 1;
            pending.extend(&node.children);
        }
        count
    }

    pub fn local_transform(&self) -> na::Matrix4<f32> {
        na::Matrix4::from_row_slice(&self.transform)
    }
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct ImportMesh {
    pub name: String,

    #[serde(default)]
    pub positions: Vec<[f32; 3]>,

    #[serde(default)]
    pub bones: Vec<ImportBone>,
}

impl ImportMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn has_bones(&self) -> bool {
        !self.bones.is_empty()
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ImportBone {
    pub name: String,

    /// Transforms mesh space into bone space in bind pose.
    #[serde(default = "identity")]
    pub offset: [f32; 16],

    #[serde(default)]
    pub weights: Vec<VertexWeight>,
}

impl ImportBone {
    pub fn offset_matrix(&self) -> na::Matrix4<f32> {
        na::Matrix4::from_row_slice(&self.offset)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VertexWeight(pub u32, pub f32);

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct ImportAnimation {
    #[serde(default)]
    pub name: String,

    /// Zero means unknown.
    #[serde(default)]
    pub ticks_per_second: f64,

    /// Duration in ticks.
    pub duration: f64,

    #[serde(default)]
    pub channels: Vec<ImportChannel>,
}

/// Keys animating single node.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct ImportChannel {
    pub node: String,

    #[serde(default)]
    pub position_keys: Vec<(f64, [f32; 3])>,

    #[serde(default)]
    pub rotation_keys: Vec<(f64, [f32; 4])>,

    #[serde(default)]
    pub scale_keys: Vec<(f64, [f32; 3])>,
}

/// Flattens matrix into row-major array.
pub fn row_major(m: &na::Matrix4<f32>) -> [f32; 16] {
    let mut out = [0.0; 16];
    for row in 0..4 {
        for col in 0..4 {
            out[row * 4 + col] = m[(row, col)];
        }
    }
    out
}

fn identity() -> [f32; 16] {
    IDENTITY
}
