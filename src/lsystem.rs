// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 verdant contributors
// This file is part of the verdant crate.

//! The L-system to geometry compiler.
//!
//! A [`SymbolGenerator`] expands an axiom into a symbol sequence, the [`Interpreter`] walks it
//! with a turtle and emits one tapered cylinder per `F` and one leaf sphere per `]`. The
//! fragments are finally merged into a [`TreeMesh`] and a [`LeafMesh`].

mod generator;
mod interpreter;
mod mesh;
mod params;
mod primitives;
mod trait_impl;
mod turtle;

#[cfg(test)]
mod tests;

pub use generator::{DEFAULT_AXIOM, RewriteRules, SymbolGenerator};
pub use interpreter::{Interpretation, Interpreter, TurtleCommand};
pub use mesh::{LeafMesh, Material, Mesh, NamedMesh, TreeMesh, merge_branches, merge_leaves};
pub use params::{GrowthParams, SliderInput};
pub use primitives::{
    BRANCH_RADIAL_SEGMENTS, BranchFragment, LEAF_RINGS, LEAF_SEGMENTS, LeafFragment, build_branch,
    build_leaf,
};
pub use turtle::{Segment, TurtleStack, TurtleState};

use crate::VerdantError;
use std::time::Instant;
use tracing::debug;

/// Iterations of the very first regeneration, before any slider input
pub const STARTUP_ITERATIONS: u32 = 5;
/// Growth of the very first regeneration, before any slider input
pub const STARTUP_GROWTH: f64 = 100.0;

/// The meshes of one regeneration. A `None` mesh had no geometry and must not be inserted
/// into the scene.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeOutput {
    pub tree_mesh: Option<TreeMesh>,
    pub leaf_mesh: Option<LeafMesh>,
}

impl TreeOutput {
    pub fn is_empty(&self) -> bool {
        self.tree_mesh.is_none() && self.leaf_mesh.is_none()
    }
}

/// Interprets an already generated symbol sequence and merges the result
pub fn build_tree(symbols: &[char], params: &GrowthParams) -> TreeOutput {
    let interpretation = Interpreter::new(*params).run(symbols.iter().copied());
    TreeOutput {
        tree_mesh: merge_branches(&interpretation.branches),
        leaf_mesh: merge_leaves(&interpretation.leaves),
    }
}

/// Generates the symbols with `generator` and builds the tree meshes from them
pub fn regenerate_with<G: SymbolGenerator + ?Sized>(
    generator: &G,
    axiom: &str,
    iteration_count: u32,
    seed: u64,
    growth: f64,
) -> Result<TreeOutput, VerdantError> {
    let now = Instant::now();
    let params = GrowthParams::new(growth);
    let symbols = generator.generate(axiom, iteration_count, seed)?;
    let output = build_tree(&symbols, &params);
    debug!(
        "regenerate({iteration_count}, {growth}) built {} branch and {} leaf vertices from {} symbols in {:?}",
        output.tree_mesh.as_ref().map_or(0, |m| m.mesh.vertex_count()),
        output.leaf_mesh.as_ref().map_or(0, |m| m.mesh.vertex_count()),
        symbols.len(),
        now.elapsed()
    );
    Ok(output)
}

/// The single regeneration entry point, used at startup and on every slider event.
/// Uses the default tree grammar on the default axiom.
pub fn regenerate(iteration_count: u32, growth: f64) -> Result<TreeOutput, VerdantError> {
    regenerate_with(
        &RewriteRules::default_tree(),
        DEFAULT_AXIOM,
        iteration_count,
        0,
        growth,
    )
}
