// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 verdant contributors
// This file is part of the verdant crate.

//! A module containing boilerplate implementations of standard traits such as Default, From etc etc

use super::{FFIVector3, MeshFormat};
use std::fmt;
use vector_traits::glam::DVec3;

impl fmt::Debug for FFIVector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn format_float(value: f32) -> String {
            if value.fract() == 0.0 {
                format!("{value:.1}",)
            } else {
                format!("{value}",)
            }
        }

        write!(
            f,
            "({},{},{})",
            format_float(self.x),
            format_float(self.y),
            format_float(self.z)
        )
    }
}

impl fmt::Display for FFIVector3 {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl From<DVec3> for FFIVector3 {
    #[inline(always)]
    fn from(v: DVec3) -> Self {
        Self {
            x: v.x as f32,
            y: v.y as f32,
            z: v.z as f32,
        }
    }
}

impl fmt::Display for MeshFormat {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}
