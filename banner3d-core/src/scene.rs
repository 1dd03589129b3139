//! Scene graph: nodes with shared geometry, instanced meshes and lights
use std::sync::Arc;

use nalgebra::Matrix4;

use crate::geometry::Mesh;
use crate::material::{Color, DirectionalLight, Material};
use crate::transform::Transform;

/// A positioned object. Children are placed relative to their parent.
#[derive(Debug, Clone)]
pub struct Node {
    pub transform: Transform,
    pub mesh: Option<Arc<Mesh>>,
    pub material: Material,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(mesh: Arc<Mesh>, material: Material) -> Self {
        Self {
            transform: Transform::identity(),
            mesh: Some(mesh),
            material,
            children: Vec::new(),
        }
    }

    /// A node with no geometry of its own, only children.
    pub fn group() -> Self {
        Self {
            transform: Transform::identity(),
            mesh: None,
            material: Material::Normal,
            children: Vec::new(),
        }
    }

    pub fn add(&mut self, child: Node) {
        self.children.push(child);
    }

    fn collect<'a>(&'a self, parent: &Matrix4<f32>, out: &mut Vec<DrawItem<'a>>) {
        let world = parent * self.transform.matrix();
        if let Some(mesh) = &self.mesh {
            out.push(DrawItem {
                mesh,
                material: &self.material,
                model: world,
            });
        }
        for child in &self.children {
            child.collect(&world, out);
        }
    }
}

/// One geometry drawn once per transform matrix
#[derive(Debug, Clone)]
pub struct InstancedMesh {
    pub mesh: Arc<Mesh>,
    pub material: Material,
    pub transforms: Vec<Matrix4<f32>>,
}

impl InstancedMesh {
    pub fn new(mesh: Arc<Mesh>, material: Material, count: usize) -> Self {
        Self {
            mesh,
            material,
            transforms: vec![Matrix4::identity(); count],
        }
    }

    pub fn count(&self) -> usize {
        self.transforms.len()
    }

    /// Panics if `index` is out of range, like slice indexing.
    pub fn set_matrix_at(&mut self, index: usize, matrix: Matrix4<f32>) {
        self.transforms[index] = matrix;
    }
}

/// A mesh ready to rasterize, with its world transform resolved
#[derive(Debug, Clone, Copy)]
pub struct DrawItem<'a> {
    pub mesh: &'a Mesh,
    pub material: &'a Material,
    pub model: Matrix4<f32>,
}

#[derive(Debug, Clone)]
pub struct Scene {
    pub nodes: Vec<Node>,
    pub instanced: Vec<InstancedMesh>,
    pub lights: Vec<DirectionalLight>,
    pub background: Color,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            instanced: Vec::new(),
            lights: Vec::new(),
            background: Color::BLACK,
        }
    }

    pub fn add(&mut self, node: Node) {
        self.nodes.push(node);
    }

    pub fn add_instanced(&mut self, mesh: InstancedMesh) {
        self.instanced.push(mesh);
    }

    pub fn add_light(&mut self, light: DirectionalLight) {
        self.lights.push(light);
    }

    /// Flatten the scene into draw items with world matrices.
    pub fn draw_items(&self) -> Vec<DrawItem<'_>> {
        let mut items = Vec::with_capacity(
            self.nodes.len() + self.instanced.iter().map(InstancedMesh::count).sum::<usize>(),
        );
        let root = Matrix4::identity();
        for node in &self.nodes {
            node.collect(&root, &mut items);
        }
        for instanced in &self.instanced {
            items.extend(instanced.transforms.iter().map(|model| DrawItem {
                mesh: &instanced.mesh,
                material: &instanced.material,
                model: *model,
            }));
        }
        items
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
