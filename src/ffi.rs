// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 verdant contributors
// This file is part of the verdant crate.

//! This module contains the Rust to Python (or rather CTypes) interface
mod trait_impl;


use crate::{VerdantError, command::ConfigType};
use std::{
    ffi::{CStr, CString},
    iter::successors,
    os::raw::c_char,
    slice,
    sync::Once,
    time::Instant,
};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

/// A simple 3D vector struct for FFI (Foreign Function Interface) usage.
///
/// # Example
///
/// ```
/// use verdant::prelude::FFIVector3;
///
/// let vector = FFIVector3 { x: 1.0, y: 2.0, z: 3.0 };
/// let result = vector.x + vector.y;
/// ```
#[derive(PartialEq, PartialOrd, Copy, Clone, Default)]
#[repr(C)]
pub struct FFIVector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl FFIVector3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Describes how the returned index buffer should be read by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    /// Every three indices form one triangle
    Triangulated,
}

impl MeshFormat {
    /// The result option key holding the format
    pub const MESH_FORMAT_TAG: &'static str = "mesh.format";

    pub fn as_char(&self) -> char {
        match self {
            MeshFormat::Triangulated => '△',
        }
    }
}

/// The packed geometry handed to the host.
///
/// # Fields
///
/// * `vertices`: A pointer to an array of `FFIVector3` representing vertices.
/// * `vertex_count`: The number of vertices in the geometry.
/// * `indices`: A pointer to an array of `usize` representing indices.
/// * `indices_count`: The number of indices in the geometry.
#[repr(C)]
pub struct GeometryOutput {
    vertices: *mut FFIVector3,
    vertex_count: usize,
    indices: *mut usize,
    indices_count: usize,
}

impl GeometryOutput {
    fn new(vertices: Vec<FFIVector3>, indices: Vec<usize>) -> Self {
        // shrink so that capacity == len, free() relies on it
        let mut vertices = vertices.into_boxed_slice();
        let mut indices = indices.into_boxed_slice();
        let rv = Self {
            vertices: vertices.as_mut_ptr(),
            vertex_count: vertices.len(),
            indices: indices.as_mut_ptr(),
            indices_count: indices.len(),
        };
        // The memory is now owned by the caller until it calls free_process_results on it.
        std::mem::forget(vertices);
        std::mem::forget(indices);
        rv
    }

    /// Deallocates the memory associated with the `GeometryOutput` vertices and indices.
    ///
    /// # Safety
    /// Must only be called once, on a value created by [`GeometryOutput::new`].
    unsafe fn free(&self) {
        unsafe {
            // Convert the raw pointers back into Vecs, which will deallocate when dropped
            let _ = Vec::from_raw_parts(self.vertices, self.vertex_count, self.vertex_count);
            let _ = Vec::from_raw_parts(self.indices, self.indices_count, self.indices_count);
        }
    }
}

/// A struct representing a map of strings for FFI (Foreign Function Interface) usage.
///
/// # Fields
///
/// * `keys`: A pointer to an array of null-terminated C strings representing keys.
/// * `values`: A pointer to an array of null-terminated C strings representing values.
/// * `count`: The number of key-value pairs in the map.
#[repr(C)]
pub struct StringMap {
    keys: *mut *mut c_char,
    values: *mut *mut c_char,
    count: usize,
}

impl StringMap {
    /// Moves the content of `config` into C strings owned by the caller
    fn new(config: ConfigType) -> Self {
        // CString can't hold interior nul bytes, they are dropped
        fn to_c_string(s: String) -> *mut c_char {
            CString::new(s.replace('\0', ""))
                .unwrap_or_default()
                .into_raw()
        }
        let (keys, values): (Vec<_>, Vec<_>) = config
            .into_iter()
            .map(|(k, v)| (to_c_string(k), to_c_string(v)))
            .unzip();
        let mut keys = keys.into_boxed_slice();
        let mut values = values.into_boxed_slice();
        let rv = Self {
            keys: keys.as_mut_ptr(),
            values: values.as_mut_ptr(),
            count: keys.len(),
        };
        std::mem::forget(keys);
        std::mem::forget(values);
        rv
    }

    /// Copies the content of the map into a [`ConfigType`]
    ///
    /// # Safety
    /// `keys` and `values` must point to `count` valid null-terminated strings each.
    unsafe fn to_config(&self) -> Result<ConfigType, VerdantError> {
        if self.count == 0 {
            return Ok(ConfigType::new());
        }
        if self.keys.is_null() || self.values.is_null() {
            return Err(VerdantError::InvalidParameter(
                "Null key or value array in configuration".to_string(),
            ));
        }
        let (keys, values) = unsafe {
            (
                slice::from_raw_parts(self.keys, self.count),
                slice::from_raw_parts(self.values, self.count),
            )
        };
        let to_string = |ptr: *mut c_char| -> Result<String, VerdantError> {
            if ptr.is_null() {
                return Err(VerdantError::InvalidParameter(
                    "Null string in configuration".to_string(),
                ));
            }
            unsafe { CStr::from_ptr(ptr) }
                .to_str()
                .map(str::to_string)
                .map_err(|e| VerdantError::InvalidParameter(format!("Invalid UTF-8: {e}")))
        };
        keys.iter()
            .zip(values.iter())
            .map(|(k, v)| -> Result<(String, String), VerdantError> {
                Ok((to_string(*k)?, to_string(*v)?))
            })
            .collect()
    }

    /// Deallocates the memory associated with the `StringMap` keys and values.
    ///
    /// # Safety
    /// Must only be called once, on a value created by [`StringMap::new`].
    unsafe fn free(&self) {
        unsafe {
            for i in 0..self.count {
                // Convert back to CString to free the memory
                let _ = CString::from_raw(*self.keys.add(i));
                let _ = CString::from_raw(*self.values.add(i));
            }
            let _ = Vec::from_raw_parts(self.keys, self.count, self.count);
            let _ = Vec::from_raw_parts(self.values, self.count, self.count);
        }
    }
}

/// The result of one `process_geometry()` call: the packed meshes and the result options.
/// A failed call has empty geometry and an `ERROR` entry in `map`.
#[repr(C)]
pub struct ProcessResult {
    pub geometry: GeometryOutput,
    pub map: StringMap,
}

/// The result option key holding the error message of a failed command
pub const ERROR_TAG: &str = "ERROR";

static LOGGER: Once = Once::new();

/// Installs a fmt subscriber filtered by `RUST_LOG`, defaulting to `info`.
/// Does nothing if the host process already installed a global subscriber.
fn init_logging() {
    LOGGER.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .try_init();
    });
}

/// Converts any Err object into a python side response.
fn process_command_error_handler(
    config: Result<ConfigType, VerdantError>,
) -> (Vec<FFIVector3>, Vec<usize>, ConfigType) {
    let start = Instant::now();
    let rv = match config.and_then(crate::command::process_command) {
        Ok(rv) => rv,
        Err(err) => {
            error!("{err:?}");
            for cause in successors(
                (&err as &dyn std::error::Error).source(),
                |e| e.source(),
            ) {
                error!("Caused by: {cause:?}");
            }
            let mut config = ConfigType::new();
            let _ = config.insert(ERROR_TAG.to_string(), err.to_string());
            (vec![], vec![], config)
        }
    };
    debug!("Time elapsed in process_command() was {:?}", start.elapsed());
    rv
}

/// Runs the command described by the `config` string map and returns the packed meshes.
///
/// # Safety
///
/// `config` must either be null or point to a valid `StringMap` whose `keys` and `values`
/// arrays each hold `count` valid null-terminated strings. The memory must stay untouched until
/// this function returns. The returned `ProcessResult` must be released with
/// [`free_process_results`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn process_geometry(config: *const StringMap) -> ProcessResult {
    init_logging();
    let input_config = if config.is_null() {
        Err(VerdantError::MissingParameter(
            "process_geometry(): Config ptr was null".to_string(),
        ))
    } else {
        unsafe { (*config).to_config() }
    };
    if let Ok(input_config) = &input_config {
        debug!("Received config:{input_config:?}");
    }

    let (output_vertices, output_indices, output_config) =
        process_command_error_handler(input_config);
    debug!(
        "returning: vertices:{}, indices:{}, config:{:?}",
        output_vertices.len(),
        output_indices.len(),
        output_config
    );

    ProcessResult {
        geometry: GeometryOutput::new(output_vertices, output_indices),
        map: StringMap::new(output_config),
    }
}

/// Frees the memory associated with a `ProcessResult`.
///
/// # Safety
/// `result` must be null or point to a `ProcessResult` returned by [`process_geometry`] that
/// has not been freed already. A null pointer is ignored.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn free_process_results(result: *mut ProcessResult) {
    if result.is_null() {
        return;
    }
    unsafe {
        debug!(
            "releasing memory: vertices:{}, indices:{}, map items:{}",
            (*result).geometry.vertex_count,
            (*result).geometry.indices_count,
            (*result).map.count
        );
        (*result).geometry.free();
        (*result).map.free();
    }
}
