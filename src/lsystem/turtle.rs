// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 verdant contributors
// This file is part of the verdant crate.

use super::params::GrowthParams;
use vector_traits::glam::{DQuat, DVec3};

/// The pose of the turtle and the parameters of the next segment it will draw.
///
/// This is a plain `Copy` value, a stack frame is just a copy of it. Restoring a frame can
/// never alias the live state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurtleState {
    pub position: DVec3,
    pub orientation: DQuat,
    pub radius: f64,
    pub segment_length: f64,
}

/// A segment walked by [`TurtleState::forward`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: DVec3,
    pub end: DVec3,
    pub start_radius: f64,
    pub end_radius: f64,
    pub orientation: DQuat,
}

impl TurtleState {
    /// Where the root of every tree is planted
    pub const ROOT_POSITION: DVec3 = DVec3::new(0.0, -50.0, 0.0);

    pub fn new(params: &GrowthParams) -> Self {
        Self {
            position: Self::ROOT_POSITION,
            orientation: DQuat::IDENTITY,
            radius: params.radius,
            segment_length: params.segment_length,
        }
    }

    /// The local +Y axis in world space, the direction `forward` walks in
    pub fn heading(&self) -> DVec3 {
        self.orientation * DVec3::Y
    }

    /// Right-multiplies a rotation around a local axis onto the orientation
    fn rotate(&mut self, axis: DVec3, angle: f64) {
        self.orientation = (self.orientation * DQuat::from_axis_angle(axis, angle)).normalize();
    }

    /// Rotate around the local Z axis
    pub fn yaw(&mut self, angle: f64) {
        self.rotate(DVec3::Z, angle)
    }

    /// Rotate around the local X axis
    pub fn pitch(&mut self, angle: f64) {
        self.rotate(DVec3::X, angle)
    }

    /// Walks one segment, shrinking radius and length afterwards.
    /// Returns None, and leaves the turtle untouched, once the segment length has run out.
    pub fn forward(&mut self, decay: f64, length_factor: f64) -> Option<Segment> {
        if self.segment_length <= 0.0 {
            return None;
        }
        let segment = Segment {
            start: self.position,
            end: self.position + self.orientation * DVec3::new(0.0, self.segment_length, 0.0),
            start_radius: self.radius,
            end_radius: self.radius * decay,
            orientation: self.orientation,
        };
        self.position = segment.end;
        self.radius = segment.end_radius;
        self.segment_length *= length_factor;
        Some(segment)
    }
}

/// Save points of the turtle, one per open branch
#[derive(Debug, Clone, Default)]
pub struct TurtleStack {
    frames: Vec<TurtleState>,
}

impl TurtleStack {
    pub fn push(&mut self, state: TurtleState) {
        self.frames.push(state)
    }

    /// Returns None on an empty stack, this is not an error
    pub fn pop(&mut self) -> Option<TurtleState> {
        self.frames.pop()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
