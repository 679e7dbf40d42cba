// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 verdant contributors
// This file is part of the verdant crate.

use super::primitives::{BranchFragment, LeafFragment};
use vector_traits::glam::{DQuat, DVec3};

/// An indexed triangle list. Every three consecutive indices form one triangle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<DVec3>,
    pub indices: Vec<usize>,
}

impl Mesh {
    pub fn with_capacity(vertex_capacity: usize, index_capacity: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_capacity),
            indices: Vec::with_capacity(index_capacity),
        }
    }

    /// Adds a vertex and returns its index
    #[inline(always)]
    pub fn add_vertex(&mut self, vertex: DVec3) -> usize {
        self.vertices.push(vertex);
        self.vertices.len() - 1
    }

    #[inline(always)]
    pub fn add_triangle(&mut self, a: usize, b: usize, c: usize) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Rotates every vertex around the local origin, then moves it by `translation`
    pub fn transform(mut self, rotation: DQuat, translation: DVec3) -> Self {
        self.vertices
            .iter_mut()
            .for_each(|v| *v = rotation * *v + translation);
        self
    }

    /// Appends `other` to this mesh, the indices of `other` are offset to stay valid.
    /// Vertices are copied as-is.
    pub fn append(&mut self, other: &Mesh) {
        let offset = self.vertices.len();
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(other.indices.iter().map(|i| i + offset));
    }

    /// Concatenates all the meshes into one buffer
    pub fn merge<'a>(meshes: impl IntoIterator<Item = &'a Mesh> + Clone) -> Mesh {
        let (vertex_count, index_count) = meshes
            .clone()
            .into_iter()
            .fold((0, 0), |(v, i), m| (v + m.vertices.len(), i + m.indices.len()));
        let mut merged = Mesh::with_capacity(vertex_count, index_count);
        for mesh in meshes {
            merged.append(mesh);
        }
        merged
    }
}

/// A flat, single color material
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Material {
    /// 0xRRGGBB
    pub color: u32,
}

impl Material {
    pub const BARK: Material = Material { color: 0xC4A484 };
    pub const FOLIAGE: Material = Material { color: 0x008000 };
}

/// A merged mesh that the scene host stores under a stable name, so that the next
/// regeneration can find and replace it.
pub trait NamedMesh {
    const NAME: &'static str;
    fn mesh(&self) -> &Mesh;
    fn material(&self) -> Material;
}

/// All branch segments of one tree, merged
#[derive(Debug, Clone, PartialEq)]
pub struct TreeMesh {
    pub mesh: Mesh,
    pub material: Material,
}

/// All leaves of one tree, merged
#[derive(Debug, Clone, PartialEq)]
pub struct LeafMesh {
    pub mesh: Mesh,
    pub material: Material,
}

impl NamedMesh for TreeMesh {
    const NAME: &'static str = "tree_mesh";
    fn mesh(&self) -> &Mesh {
        &self.mesh
    }
    fn material(&self) -> Material {
        self.material
    }
}

impl NamedMesh for LeafMesh {
    const NAME: &'static str = "leaf_mesh";
    fn mesh(&self) -> &Mesh {
        &self.mesh
    }
    fn material(&self) -> Material {
        self.material
    }
}

/// Merges the branch fragments into one mesh. Returns None if there was nothing to merge,
/// such a mesh must never reach the scene.
pub fn merge_branches(fragments: &[BranchFragment]) -> Option<TreeMesh> {
    (!fragments.is_empty()).then(|| TreeMesh {
        mesh: Mesh::merge(fragments.iter().map(|f| &f.mesh)),
        material: Material::BARK,
    })
}

/// Merges the leaf fragments into one mesh. Returns None if there was nothing to merge.
pub fn merge_leaves(fragments: &[LeafFragment]) -> Option<LeafMesh> {
    (!fragments.is_empty()).then(|| LeafMesh {
        mesh: Mesh::merge(fragments.iter().map(|f| &f.mesh)),
        material: Material::FOLIAGE,
    })
}
