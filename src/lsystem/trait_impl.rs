// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 verdant contributors
// This file is part of the verdant crate.

//! A module containing boilerplate implementations of standard traits such as Default, From etc etc

use super::{GrowthParams, Material, RewriteRules, STARTUP_GROWTH, SliderInput};
use rustc_hash::FxHashMap;
use std::fmt;

impl Default for RewriteRules {
    fn default() -> Self {
        Self {
            rules: FxHashMap::default(),
            axiom: None,
            timeout: None,
            max_symbols: Self::MAX_SYMBOLS,
        }
    }
}

impl Default for GrowthParams {
    fn default() -> Self {
        Self::new(STARTUP_GROWTH)
    }
}

impl From<f64> for GrowthParams {
    #[inline(always)]
    fn from(growth: f64) -> Self {
        Self::new(growth)
    }
}

impl From<SliderInput> for GrowthParams {
    #[inline(always)]
    fn from(slider: SliderInput) -> Self {
        Self::new(slider.growth())
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.color & 0x00FF_FFFF)
    }
}
