// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 verdant contributors
// This file is part of the verdant crate.

use std::f64::consts::PI;
use tracing::debug;

/// Every geometric constant of one tree regeneration, derived from a single `growth` value.
///
/// The initial build and every slider driven rebuild go through [`GrowthParams::new`], so the
/// two can never disagree on how a growth value maps to radius, decay and length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthParams {
    /// The sanitized growth value, never negative and always finite
    pub growth: f64,
    /// Trunk radius at the root
    pub radius: f64,
    /// Radius shrink factor applied once per emitted segment, within `0.0..=0.95`
    pub decay: f64,
    /// Length of the very first segment
    pub segment_length: f64,
    /// Length shrink factor applied once per emitted segment
    pub length_factor: f64,
    /// Radius of every leaf sphere
    pub leaf_radius: f64,
    /// Angle used by the `+ - < >` rotations, in radians
    pub turn_angle: f64,
}

impl GrowthParams {
    pub const TURN_ANGLE: f64 = PI / 7.0;
    pub const MAX_DECAY: f64 = 0.95;

    pub fn new(growth: f64) -> Self {
        let growth = if growth.is_finite() && growth > 0.0 {
            growth
        } else {
            if growth != 0.0 {
                debug!("growth value {growth} is not a positive finite number, using 0.0");
            }
            0.0
        };

        // growth == 0 would divide by zero, the trunk simply vanishes instead.
        let decay = if growth > 0.0 {
            (1.0 - 0.05 / (growth / 50.0)).clamp(0.0, Self::MAX_DECAY)
        } else {
            0.0
        };

        Self {
            growth,
            radius: 3.0 + 5.0 * growth / 1000.0,
            decay,
            segment_length: 10.0 * growth / 100.0,
            length_factor: 1.0 - 1.0 / (growth + 1.0),
            leaf_radius: (growth / 100.0 * 20.0 - 5.0).max(0.0),
            turn_angle: Self::TURN_ANGLE,
        }
    }
}

/// The raw value of the growth slider, usually within `0.0..=100.0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderInput {
    value: f64,
}

impl SliderInput {
    pub fn new(value: f64) -> Self {
        Self {
            value: if value.is_finite() { value.max(0.0) } else { 0.0 },
        }
    }

    /// Iterations grow by one for every 20 units of slider travel
    pub fn iterations(&self) -> u32 {
        (self.value / 20.0).ceil() as u32
    }

    pub fn growth(&self) -> f64 {
        self.value
    }

    /// Returns `(iteration_count, growth)` as fed to [`super::regenerate`]
    pub fn params(&self) -> (u32, f64) {
        (self.iterations(), self.growth())
    }
}
