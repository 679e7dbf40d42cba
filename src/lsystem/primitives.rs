// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 verdant contributors
// This file is part of the verdant crate.

//! Low poly building blocks of the tree: tapered cylinders for branches and tiny spheres for
//! leaves. Both are returned already placed in world space.

use super::mesh::Mesh;
use std::f64::consts::{PI, TAU};
use vector_traits::glam::{DQuat, DVec3, dvec3};

/// Radial segments of a branch, a triangular cross-section gives the stylised look
pub const BRANCH_RADIAL_SEGMENTS: usize = 3;
/// Requested longitudinal divisions of a leaf
pub const LEAF_SEGMENTS: usize = 2;
/// Requested latitudinal divisions of a leaf
pub const LEAF_RINGS: usize = 2;

/// One emitted `F` segment
#[derive(Debug, Clone, PartialEq)]
pub struct BranchFragment {
    pub start: DVec3,
    pub end: DVec3,
    pub start_radius: f64,
    pub end_radius: f64,
    pub orientation: DQuat,
    pub mesh: Mesh,
}

/// One emitted `]` leaf
#[derive(Debug, Clone, PartialEq)]
pub struct LeafFragment {
    pub center: DVec3,
    pub radius: f64,
    pub mesh: Mesh,
}

/// Builds a cylinder along the local Y axis, centered at the origin.
/// `radius_bottom` sits at `-height/2`, `radius_top` at `+height/2`.
/// A cap is only generated for a positive radius.
fn cylinder(radius_bottom: f64, radius_top: f64, height: f64, segments: usize) -> Mesh {
    let segments = segments.max(3);
    let half_height = height * 0.5;
    let mut mesh = Mesh::with_capacity(segments * 4 + 2, segments * 12);

    let ring = |radius: f64, y: f64, i: usize| {
        let theta = (i as f64 / segments as f64) * TAU;
        dvec3(radius * theta.cos(), y, radius * theta.sin())
    };

    let body: Vec<(usize, usize)> = (0..segments)
        .map(|i| {
            (
                mesh.add_vertex(ring(radius_bottom, -half_height, i)),
                mesh.add_vertex(ring(radius_top, half_height, i)),
            )
        })
        .collect();

    for i in 0..segments {
        let (i0, i1) = body[i];
        let (i2, i3) = body[(i + 1) % segments];
        mesh.add_triangle(i0, i1, i3);
        mesh.add_triangle(i0, i3, i2);
    }

    if radius_bottom > 0.0 {
        let center = mesh.add_vertex(dvec3(0.0, -half_height, 0.0));
        let first = mesh.vertex_count();
        for i in 0..segments {
            let _ = mesh.add_vertex(ring(radius_bottom, -half_height, i));
        }
        for i in 0..segments {
            mesh.add_triangle(center, first + i, first + (i + 1) % segments);
        }
    }

    if radius_top > 0.0 {
        let center = mesh.add_vertex(dvec3(0.0, half_height, 0.0));
        let first = mesh.vertex_count();
        for i in 0..segments {
            let _ = mesh.add_vertex(ring(radius_top, half_height, i));
        }
        for i in 0..segments {
            mesh.add_triangle(center, first + (i + 1) % segments, first + i);
        }
    }
    mesh
}

/// Builds a UV sphere centered at the origin, `segments` is clamped to at least 3 and `rings`
/// to at least 2. The poles are duplicated per segment, the quads touching a pole are reduced
/// to a single triangle.
fn sphere(radius: f64, segments: usize, rings: usize) -> Mesh {
    let segments = segments.max(3);
    let rings = rings.max(2);
    let mut mesh = Mesh::with_capacity((rings + 1) * segments, (rings - 1) * segments * 6);

    for ring in 0..=rings {
        let phi = (ring as f64 / rings as f64) * PI;
        let y = radius * phi.cos();
        let ring_radius = radius * phi.sin();
        for seg in 0..segments {
            let theta = (seg as f64 / segments as f64) * TAU;
            let _ = mesh.add_vertex(dvec3(ring_radius * theta.cos(), y, ring_radius * theta.sin()));
        }
    }

    for ring in 0..rings {
        for seg in 0..segments {
            let next_seg = (seg + 1) % segments;
            let i0 = ring * segments + seg;
            let i1 = ring * segments + next_seg;
            let i2 = (ring + 1) * segments + seg;
            let i3 = (ring + 1) * segments + next_seg;
            if ring != 0 {
                mesh.add_triangle(i0, i1, i3);
            }
            if ring != rings - 1 {
                mesh.add_triangle(i0, i3, i2);
            }
        }
    }
    mesh
}

/// Builds the tapered cylinder of one branch segment going from `start` to `end`.
///
/// The cylinder is `|end - start|` long, `start_radius` wide at the bottom and `end_radius`
/// wide at the top. It is rotated by `orientation` and its center is placed at the midpoint of
/// `start` and `end`. Negative radii are treated as zero.
pub fn build_branch(
    start: DVec3,
    end: DVec3,
    start_radius: f64,
    end_radius: f64,
    orientation: DQuat,
) -> BranchFragment {
    let length = start.distance(end);
    let midpoint = start.lerp(end, 0.5);
    let mesh = cylinder(
        start_radius.max(0.0),
        end_radius.max(0.0),
        length,
        BRANCH_RADIAL_SEGMENTS,
    )
    .transform(orientation, midpoint);

    BranchFragment {
        start,
        end,
        start_radius,
        end_radius,
        orientation,
        mesh,
    }
}

/// Builds a leaf sphere at `center`. A radius `<= 0` collapses every vertex onto `center`.
pub fn build_leaf(center: DVec3, radius: f64) -> LeafFragment {
    let radius = radius.max(0.0);
    LeafFragment {
        center,
        radius,
        mesh: sphere(radius, LEAF_SEGMENTS, LEAF_RINGS).transform(DQuat::IDENTITY, center),
    }
}
