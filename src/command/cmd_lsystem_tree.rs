// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 verdant contributors
// This file is part of the verdant crate.


use super::{CommandResult, ConfigType, Options};
use crate::{
    VerdantError,
    ffi::{FFIVector3, MeshFormat},
    lsystem::{
        DEFAULT_AXIOM, LeafMesh, NamedMesh, RewriteRules, STARTUP_GROWTH, STARTUP_ITERATIONS,
        SliderInput, TreeMesh, TreeOutput, regenerate_with,
    },
};
use itertools::Itertools;
use std::time;
use tracing::{debug, info};

pub(crate) const COMMAND_NAME: &str = "lsystem_tree";
/// Optional grammar text replacing the default rule table
pub(crate) const GRAMMAR_TAG: &str = "🌳";
pub(crate) const MESH_NAMES_TAG: &str = "mesh.names";

/// Resolves `(iterations, growth)`, a slider value overrides both
fn growth_input(input_config: &ConfigType) -> Result<(u32, f64), VerdantError> {
    if let Some(value) = input_config.get_parsed_option::<f64>("slider")? {
        if !value.is_finite() {
            return Err(VerdantError::FloatNotFinite(format!(
                "slider value must be finite, got {value}"
            )));
        }
        return Ok(SliderInput::new(value).params());
    }
    let iterations =
        input_config.get_mandatory_parsed_option::<u32>("iterations", Some(STARTUP_ITERATIONS))?;
    let growth = input_config.get_mandatory_parsed_option::<f64>("growth", Some(STARTUP_GROWTH))?;
    if !growth.is_finite() {
        return Err(VerdantError::FloatNotFinite(format!(
            "growth must be finite, got {growth}"
        )));
    }
    Ok((iterations, growth))
}

/// Either the default tree grammar or the one supplied under [`GRAMMAR_TAG`]
fn rewrite_rules(input_config: &ConfigType) -> Result<RewriteRules, VerdantError> {
    if !input_config.does_option_exist(GRAMMAR_TAG)? {
        return Ok(RewriteRules::default_tree());
    }
    let mut rules = RewriteRules::default();
    let _ = rules.parse(input_config.get_mandatory_option(GRAMMAR_TAG)?)?;
    if rules.rule_count() == 0 {
        return Err(VerdantError::ParseError(
            "The grammar did not contain any rules".to_string(),
        ));
    }
    Ok(rules)
}

/// Appends `named` to the packed buffers and records its ranges and color in `return_config`
fn pack_mesh<M: NamedMesh>(
    named: &M,
    output_vertices: &mut Vec<FFIVector3>,
    output_indices: &mut Vec<usize>,
    return_config: &mut ConfigType,
) {
    let mesh = named.mesh();
    let vertex_offset = output_vertices.len();
    let index_offset = output_indices.len();
    output_vertices.extend(mesh.vertices.iter().map(|v| FFIVector3::from(*v)));
    output_indices.extend(mesh.indices.iter().map(|i| i + vertex_offset));

    let _ = return_config.insert(
        format!("{}.vertex_range", M::NAME),
        format!("{vertex_offset}..{}", output_vertices.len()),
    );
    let _ = return_config.insert(
        format!("{}.index_range", M::NAME),
        format!("{index_offset}..{}", output_indices.len()),
    );
    let _ = return_config.insert(
        format!("{}.color", M::NAME),
        named.material().to_string(),
    );
}

/// Packs the present meshes of `output` into one vertex and index buffer
pub(crate) fn pack_tree_output(output: &TreeOutput) -> CommandResult {
    let vertex_count = output.tree_mesh.as_ref().map_or(0, |m| m.mesh.vertex_count())
        + output.leaf_mesh.as_ref().map_or(0, |m| m.mesh.vertex_count());
    let index_count = output.tree_mesh.as_ref().map_or(0, |m| m.mesh.indices.len())
        + output.leaf_mesh.as_ref().map_or(0, |m| m.mesh.indices.len());
    let mut output_vertices = Vec::<FFIVector3>::with_capacity(vertex_count);
    let mut output_indices = Vec::<usize>::with_capacity(index_count);
    let mut return_config = ConfigType::new();
    let mut names = Vec::<&str>::with_capacity(2);

    if let Some(tree_mesh) = &output.tree_mesh {
        pack_mesh(
            tree_mesh,
            &mut output_vertices,
            &mut output_indices,
            &mut return_config,
        );
        names.push(TreeMesh::NAME);
    }
    if let Some(leaf_mesh) = &output.leaf_mesh {
        pack_mesh(
            leaf_mesh,
            &mut output_vertices,
            &mut output_indices,
            &mut return_config,
        );
        names.push(LeafMesh::NAME);
    }

    let _ = return_config.insert(
        MeshFormat::MESH_FORMAT_TAG.to_string(),
        MeshFormat::Triangulated.to_string(),
    );
    let _ = return_config.insert(MESH_NAMES_TAG.to_string(), names.iter().join(","));
    (output_vertices, output_indices, return_config)
}

/// Runs one regeneration as described by `input_config`
pub(crate) fn process_command(input_config: &ConfigType) -> Result<CommandResult, VerdantError> {
    let (iterations, growth) = growth_input(input_config)?;
    let seed = input_config.get_mandatory_parsed_option::<u64>("seed", Some(0))?;
    let rules = rewrite_rules(input_config)?;
    let axiom = match input_config.get("axiom") {
        Some(axiom) => axiom.as_str(),
        None => rules.axiom().unwrap_or(DEFAULT_AXIOM),
    };
    debug!("lsystem_tree: axiom:\"{axiom}\" iterations:{iterations} growth:{growth} seed:{seed}");

    let now = time::Instant::now();
    let output = regenerate_with(&rules, axiom, iterations, seed, growth)?;
    let rv = pack_tree_output(&output);
    info!(
        "lsystem_tree render() duration: {:?}, vertices:{} indices:{}",
        now.elapsed(),
        rv.0.len(),
        rv.1.len()
    );
    Ok(rv)
}
