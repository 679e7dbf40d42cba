// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 verdant contributors
// This file is part of the verdant crate.

use super::{
    params::GrowthParams,
    primitives::{BranchFragment, LeafFragment, build_branch, build_leaf},
    turtle::{TurtleStack, TurtleState},
};
use tracing::debug;

/// What a single symbol makes the turtle do
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TurtleCommand {
    /// Any symbol outside the drawing alphabet
    Nop,
    /// `F`, draw one branch segment
    Forward,
    /// `+` and `-`, rotate around the local Z axis
    Yaw(f64),
    /// `<` and `>`, rotate around the local X axis
    Pitch(f64),
    /// `[`, open a branch
    Push,
    /// `]`, drop a leaf and close the branch
    Pop,
}

impl TurtleCommand {
    pub fn from_symbol(symbol: char, turn_angle: f64) -> Self {
        match symbol {
            'F' => Self::Forward,
            '+' => Self::Yaw(turn_angle),
            '-' => Self::Yaw(-turn_angle),
            '<' => Self::Pitch(turn_angle),
            '>' => Self::Pitch(-turn_angle),
            '[' => Self::Push,
            ']' => Self::Pop,
            _ => Self::Nop,
        }
    }
}

/// The result of one interpreter pass
#[derive(Debug, Clone)]
pub struct Interpretation {
    pub branches: Vec<BranchFragment>,
    pub leaves: Vec<LeafFragment>,
    /// The turtle as it was after the last symbol
    pub turtle: TurtleState,
    /// Number of branches still open after the last symbol
    pub stack_depth: usize,
}

/// Walks a symbol sequence with a turtle and collects the emitted geometry.
///
/// All working state lives inside the interpreter, so independent runs may happen on
/// independent threads.
pub struct Interpreter {
    params: GrowthParams,
    turtle: TurtleState,
    stack: TurtleStack,
    branches: Vec<BranchFragment>,
    leaves: Vec<LeafFragment>,
}

impl Interpreter {
    pub fn new(params: GrowthParams) -> Self {
        Self {
            turtle: TurtleState::new(&params),
            params,
            stack: TurtleStack::default(),
            branches: Vec::new(),
            leaves: Vec::new(),
        }
    }

    /// Apply a turtle command
    fn apply(&mut self, command: TurtleCommand) {
        match command {
            TurtleCommand::Nop => {}
            TurtleCommand::Forward => {
                if let Some(segment) = self
                    .turtle
                    .forward(self.params.decay, self.params.length_factor)
                {
                    self.branches.push(build_branch(
                        segment.start,
                        segment.end,
                        segment.start_radius,
                        segment.end_radius,
                        segment.orientation,
                    ));
                }
            }
            TurtleCommand::Yaw(angle) => self.turtle.yaw(angle),
            TurtleCommand::Pitch(angle) => self.turtle.pitch(angle),
            TurtleCommand::Push => self.stack.push(self.turtle),
            TurtleCommand::Pop => {
                // the leaf is dropped even if there is nothing to pop
                self.leaves
                    .push(build_leaf(self.turtle.position, self.params.leaf_radius));
                if let Some(frame) = self.stack.pop() {
                    self.turtle = frame;
                }
            }
        }
    }

    /// Runs the turtle over every symbol in a single pass
    pub fn run(mut self, symbols: impl IntoIterator<Item = char>) -> Interpretation {
        let turn_angle = self.params.turn_angle;
        for symbol in symbols {
            self.apply(TurtleCommand::from_symbol(symbol, turn_angle));
        }
        debug!(
            "turtle emitted {} branches and {} leaves, {} branches left open",
            self.branches.len(),
            self.leaves.len(),
            self.stack.depth()
        );
        Interpretation {
            branches: self.branches,
            leaves: self.leaves,
            turtle: self.turtle,
            stack_depth: self.stack.depth(),
        }
    }
}
