// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 verdant contributors
// This file is part of the verdant crate.

#![deny(
    rust_2018_compatibility,
    rust_2018_idioms,
    nonstandard_style,
    unused,
    future_incompatible,
    non_camel_case_types,
    unused_parens,
    non_upper_case_globals,
    unused_qualifications,
    unused_results,
    unused_imports,
    unused_variables,
    bare_trait_objects,
    ellipsis_inclusive_range_patterns,
    elided_lifetimes_in_paths
)]
#![warn(clippy::explicit_into_iter_loop)]

//! Turtle-graphics L-system tree mesher.
//!
//! A symbol string (`F + - [ ] < >`) is interpreted by a turtle that emits tapered three-sided
//! cylinders for branches and tiny spheres for leaves. The fragments are merged into one tree
//! mesh and one leaf mesh that a scene host inserts under stable names.
//!
//! Design guideline: every regeneration is stateless. Everything needed for a run is contained
//! within that run, and the resulting meshes are owned by the caller.

pub mod command;
pub mod ffi;
pub mod lsystem;

pub mod prelude {
    pub use crate::{
        VerdantError,
        ffi::{FFIVector3, GeometryOutput, StringMap, free_process_results, process_geometry},
        lsystem::{
            GrowthParams, LeafMesh, Material, Mesh, SliderInput, TreeMesh, TreeOutput,
            build_tree, regenerate,
        },
    };
}

#[derive(thiserror::Error, Debug)]
pub enum VerdantError {
    #[error("Overflow error: {0}")]
    Overflow(String),

    #[error("Invalid float value: {0}")]
    FloatNotFinite(String),

    #[error("Invalid input data: {0}")]
    InvalidParameter(String),

    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    #[error("Unknown error: {0}")]
    InternalError(String),

    #[error("L-system generator error: {0}")]
    LSystems(String),

    #[error("Could not parse L-system grammar: {0}")]
    ParseError(String),
}
