// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 verdant contributors
// This file is part of the verdant crate.

use super::*;
use crate::VerdantError;
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::{f64::consts::PI, fmt::Debug};
use vector_traits::glam::{DQuat, DVec3, dvec3};

const EPSILON: f64 = 1e-9;

fn assert_approx_eq<T: SillyApproxEq + Debug>(v1: T, v2: T, epsilon: f64) {
    assert!(v1.silly_approx_eq(&v2, epsilon), "{v1:?} != {v2:?}");
}

trait SillyApproxEq {
    fn silly_approx_eq(&self, other: &Self, epsilon: f64) -> bool;
}

impl SillyApproxEq for f64 {
    fn silly_approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        (self - other).abs() <= epsilon
    }
}

impl SillyApproxEq for DVec3 {
    fn silly_approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        (self.x - other.x).abs() <= epsilon
            && (self.y - other.y).abs() <= epsilon
            && (self.z - other.z).abs() <= epsilon
    }
}

fn interpret(symbols: &str, growth: f64) -> Interpretation {
    Interpreter::new(GrowthParams::new(growth)).run(symbols.chars())
}

fn random_symbols(rng: &mut StdRng, len: usize) -> String {
    const ALPHABET: [char; 9] = ['F', '+', '-', '[', ']', '<', '>', 'X', 'F'];
    (0..len)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())])
        .collect()
}

#[test]
fn test_growth_params_100() {
    let p = GrowthParams::new(100.0);
    assert_approx_eq(p.radius, 3.5, EPSILON);
    assert_approx_eq(p.decay, 0.95, EPSILON);
    assert_approx_eq(p.segment_length, 10.0, EPSILON);
    assert_approx_eq(p.length_factor, 100.0 / 101.0, EPSILON);
    assert_approx_eq(p.leaf_radius, 15.0, EPSILON);
    assert_approx_eq(p.turn_angle, PI / 7.0, EPSILON);
}

#[test]
fn test_growth_params_zero_is_finite() {
    let p = GrowthParams::new(0.0);
    assert!(p.decay.is_finite());
    assert_eq!(p.decay, 0.0);
    assert_eq!(p.segment_length, 0.0);
    assert_eq!(p.length_factor, 0.0);
    assert_eq!(p.leaf_radius, 0.0);
    assert_approx_eq(p.radius, 3.0, EPSILON);
}

#[test]
fn test_growth_params_sanitized() {
    for growth in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -1.0, -100.0] {
        assert_eq!(GrowthParams::new(growth), GrowthParams::new(0.0), "{growth}");
    }
    // 1 - 2.5/growth is negative below 2.5
    for growth in [0.1, 1.0, 2.0, 2.5] {
        let p = GrowthParams::new(growth);
        assert_eq!(p.decay, 0.0, "{growth}");
    }
    assert_approx_eq(GrowthParams::new(10.0).decay, 0.75, EPSILON);
    assert_eq!(GrowthParams::new(1000.0).decay, GrowthParams::MAX_DECAY);
}

#[test]
fn test_slider_mapping() {
    assert_eq!(SliderInput::new(0.0).params(), (0, 0.0));
    assert_eq!(SliderInput::new(1.0).params(), (1, 1.0));
    assert_eq!(SliderInput::new(20.0).params(), (1, 20.0));
    assert_eq!(SliderInput::new(50.0).params(), (3, 50.0));
    assert_eq!(SliderInput::new(100.0).params(), (5, 100.0));
    assert_eq!(SliderInput::new(-5.0).params(), (0, 0.0));
    assert_eq!(
        GrowthParams::from(SliderInput::new(50.0)),
        GrowthParams::new(50.0)
    );
}

#[test]
fn test_turtle_stack() {
    let params = GrowthParams::new(50.0);
    let mut stack = TurtleStack::default();
    assert!(stack.pop().is_none());
    assert!(stack.is_empty());

    let mut turtle = TurtleState::new(&params);
    stack.push(turtle);
    turtle.yaw(0.3);
    let _ = turtle.forward(params.decay, params.length_factor);
    assert_eq!(stack.depth(), 1);

    let restored = stack.pop().unwrap();
    assert_eq!(restored, TurtleState::new(&params));
    assert_ne!(restored, turtle);
    assert!(stack.pop().is_none());
}

#[test]
fn test_turtle_forward_exhausted() {
    let params = GrowthParams::new(0.0);
    let mut turtle = TurtleState::new(&params);
    let before = turtle;
    assert!(turtle.forward(params.decay, params.length_factor).is_none());
    assert_eq!(turtle, before);
}

#[test]
fn test_scenario_a_single_segment() {
    let result = interpret("F", 100.0);
    assert_eq!(result.branches.len(), 1);
    assert!(result.leaves.is_empty());

    let branch = &result.branches[0];
    assert_approx_eq(branch.start, dvec3(0.0, -50.0, 0.0), EPSILON);
    assert_approx_eq(branch.end, dvec3(0.0, -40.0, 0.0), EPSILON);
    assert_approx_eq(branch.start_radius, 3.5, EPSILON);
    assert_approx_eq(branch.end_radius, 3.5 * 0.95, EPSILON);

    let output = build_tree(&['F'], &GrowthParams::new(100.0));
    let tree = output.tree_mesh.expect("a tree mesh");
    assert!(output.leaf_mesh.is_none());
    assert_eq!(tree.mesh, branch.mesh);
    assert_eq!(tree.material, Material::BARK);
}

#[test]
fn test_scenario_b_branch_restores_state() {
    let params = GrowthParams::new(50.0);
    let result = interpret("F[F]F", 50.0);
    assert_eq!(result.branches.len(), 3);
    assert_eq!(result.leaves.len(), 1);
    assert_eq!(result.stack_depth, 0);

    let first_end = dvec3(0.0, -45.0, 0.0);
    let inner_length = params.segment_length * params.length_factor;
    let inner_end = first_end + dvec3(0.0, inner_length, 0.0);

    let inner = &result.branches[1];
    let last = &result.branches[2];
    assert_approx_eq(inner.start, first_end, EPSILON);
    assert_approx_eq(inner.end, inner_end, EPSILON);
    assert_approx_eq(result.leaves[0].center, inner_end, EPSILON);

    // the last F continues from the state saved by '['
    assert_approx_eq(last.start, first_end, EPSILON);
    assert_approx_eq(last.start_radius, inner.start_radius, EPSILON);
    assert_approx_eq(last.end, inner.end, EPSILON);
    assert_approx_eq(result.turtle.position, inner_end, EPSILON);
    assert_approx_eq(
        result.turtle.segment_length,
        inner_length * params.length_factor,
        EPSILON,
    );
}

#[test]
fn test_scenario_c_empty_branch() {
    let result = interpret("[]", 100.0);
    assert!(result.branches.is_empty());
    assert_eq!(result.leaves.len(), 1);
    assert_approx_eq(result.leaves[0].center, TurtleState::ROOT_POSITION, EPSILON);
    assert_eq!(result.stack_depth, 0);

    let output = build_tree(&['[', ']'], &GrowthParams::new(100.0));
    assert!(output.tree_mesh.is_none());
    assert_eq!(output.leaf_mesh.unwrap().material, Material::FOLIAGE);
}

#[test]
fn test_scenario_d_unbalanced_close() {
    let result = interpret("]", 100.0);
    assert!(result.branches.is_empty());
    assert_eq!(result.leaves.len(), 1);
    assert_eq!(result.stack_depth, 0);
    assert_eq!(result.turtle, TurtleState::new(&GrowthParams::new(100.0)));

    let result = interpret("F]]]F", 100.0);
    assert_eq!(result.branches.len(), 2);
    assert_eq!(result.leaves.len(), 3);
    assert_eq!(result.stack_depth, 0);
}

#[test]
fn test_unknown_symbols_ignored() {
    let with_noise = interpret("XFYZ[+AF]B-F", 70.0);
    let without_noise = interpret("F[+F]-F", 70.0);
    assert_eq!(with_noise.branches, without_noise.branches);
    assert_eq!(with_noise.leaves, without_noise.leaves);
    assert_eq!(with_noise.turtle, without_noise.turtle);
}

#[test]
fn test_yaw_then_pitch_order() {
    let theta = GrowthParams::TURN_ANGLE;
    let result = interpret("+F", 100.0);
    assert_approx_eq(
        result.branches[0].end - result.branches[0].start,
        dvec3(-theta.sin(), theta.cos(), 0.0) * 10.0,
        EPSILON,
    );

    // rotations are right-multiplied: Rz * Rx applied to +Y
    let result = interpret("+<F", 100.0);
    let expected = dvec3(-theta.sin() * theta.cos(), theta.cos() * theta.cos(), theta.sin());
    assert_approx_eq(
        result.branches[0].end - result.branches[0].start,
        expected * 10.0,
        EPSILON,
    );

    let swapped = interpret("<+F", 100.0);
    assert!(
        !(swapped.branches[0].end).abs_diff_eq(result.branches[0].end, 1e-6),
        "rotation order must matter"
    );

    // a full turn in 14 steps brings the heading back
    let result = interpret(&"+".repeat(14), 100.0);
    assert_approx_eq(result.turtle.heading(), DVec3::Y, 1e-9);
}

#[test]
fn test_segments_shrink_and_taper() {
    let params = GrowthParams::new(30.0);
    let result = interpret("FFFFF+F-F<F>F", 30.0);
    for pair in result.branches.windows(2) {
        let l0 = pair[0].start.distance(pair[0].end);
        let l1 = pair[1].start.distance(pair[1].end);
        assert!(l1 < l0);
        assert_approx_eq(l1, l0 * params.length_factor, 1e-9);
        assert_approx_eq(pair[1].start_radius, pair[0].end_radius, EPSILON);
    }
    for branch in result.branches.iter() {
        assert!(branch.end_radius <= branch.start_radius);
    }
}

#[test]
fn test_random_sequences_properties() {
    let mut rng: StdRng = SeedableRng::from_seed([42; 32]);
    for _ in 0..200 {
        let len = rng.random_range(0..300);
        let symbols = random_symbols(&mut rng, len);
        let growth = rng.random_range(0.0..120.0);
        let result = interpret(&symbols, growth);

        let closes = symbols.chars().filter(|c| *c == ']').count();
        assert_eq!(result.leaves.len(), closes, "{symbols}");

        let expected_depth = symbols.chars().fold(0_usize, |depth, c| match c {
            '[' => depth + 1,
            ']' => depth.saturating_sub(1),
            _ => depth,
        });
        assert_eq!(result.stack_depth, expected_depth, "{symbols}");

        for branch in result.branches.iter() {
            assert!(branch.end_radius <= branch.start_radius, "{symbols}");
            assert!(branch.end_radius >= 0.0);
        }
        assert!(result.branches.len() <= symbols.chars().filter(|c| *c == 'F').count());
    }
}

#[test]
fn test_build_branch_geometry() {
    let start = dvec3(1.0, 2.0, 3.0);
    let orientation = DQuat::from_axis_angle(DVec3::Z, 0.4);
    let end = start + orientation * dvec3(0.0, 8.0, 0.0);
    let branch = build_branch(start, end, 2.0, 1.5, orientation);

    // body ring + two caps
    assert_eq!(branch.mesh.vertex_count(), 2 * 3 + 2 * (1 + 3));
    assert_eq!(branch.mesh.triangle_count(), 2 * 3 + 3 + 3);
    assert!(branch.mesh.indices.iter().all(|i| *i < branch.mesh.vertex_count()));

    // the cap centers are the end points
    let axis = (end - start).normalize();
    let bottom_center = branch.mesh.vertices[6];
    let top_center = branch.mesh.vertices[10];
    assert_approx_eq(bottom_center, start, 1e-9);
    assert_approx_eq(top_center, end, 1e-9);

    // ring vertices keep their radius from the axis
    for (i, v) in branch.mesh.vertices[0..6].iter().enumerate() {
        let rel = *v - start;
        let along = rel.dot(axis);
        let radial = (rel - axis * along).length();
        let expected = if i % 2 == 0 { 2.0 } else { 1.5 };
        assert_approx_eq(radial, expected, 1e-9);
    }
}

#[test]
fn test_build_branch_degenerate_top() {
    let start = DVec3::ZERO;
    let end = dvec3(0.0, 1.0, 0.0);
    let branch = build_branch(start, end, 1.0, 0.0, DQuat::IDENTITY);
    // no top cap for a zero radius
    assert_eq!(branch.mesh.vertex_count(), 2 * 3 + (1 + 3));
    assert_eq!(branch.mesh.triangle_count(), 2 * 3 + 3);

    let branch = build_branch(start, end, -1.0, -2.0, DQuat::IDENTITY);
    assert_eq!(branch.mesh.vertex_count(), 2 * 3);
    assert!(branch.mesh.vertices.iter().all(|v| v.x == 0.0 && v.z == 0.0));
}

#[test]
fn test_build_leaf() {
    let center = dvec3(5.0, -3.0, 2.0);
    let leaf = build_leaf(center, 2.0);
    // 2 segments are clamped to 3
    assert_eq!(leaf.mesh.vertex_count(), (LEAF_RINGS + 1) * 3);
    // one triangle per pole quad, no sliver triangles
    assert_eq!(leaf.mesh.triangle_count(), 2 * 3);
    for v in leaf.mesh.vertices.iter() {
        assert_approx_eq(v.distance(center), 2.0, 1e-9);
    }
    for triangle in leaf.mesh.indices.chunks_exact(3) {
        let [a, b, c] = [0, 1, 2].map(|i| leaf.mesh.vertices[triangle[i]]);
        assert!((b - a).cross(c - a).length() > 1e-6, "{triangle:?}");
    }

    let leaf = build_leaf(center, -4.0);
    assert_eq!(leaf.radius, 0.0);
    assert_eq!(leaf.mesh.vertex_count(), (LEAF_RINGS + 1) * 3);
    for v in leaf.mesh.vertices.iter() {
        assert_approx_eq(*v, center, EPSILON);
    }
}

#[test]
fn test_merge_preserves_fragments() {
    let result = interpret("F[+F]F[-F<F]>F]", 80.0);
    let tree = merge_branches(&result.branches).unwrap();
    let leaves = merge_leaves(&result.leaves).unwrap();

    let vertex_sum: usize = result.branches.iter().map(|b| b.mesh.vertex_count()).sum();
    assert_eq!(tree.mesh.vertex_count(), vertex_sum);
    assert!(tree.mesh.indices.iter().all(|i| *i < tree.mesh.vertex_count()));
    assert!(leaves.mesh.indices.iter().all(|i| *i < leaves.mesh.vertex_count()));

    // the merge does not move anything
    let mut offset = 0;
    for branch in result.branches.iter() {
        let merged = &tree.mesh.vertices[offset..offset + branch.mesh.vertex_count()];
        assert_eq!(merged, &branch.mesh.vertices[..]);
        offset += branch.mesh.vertex_count();
    }

    assert!(merge_branches(&[]).is_none());
    assert!(merge_leaves(&[]).is_none());
}

#[test]
fn test_material_display() {
    assert_eq!(Material::BARK.color, 12887172);
    assert_eq!(Material::BARK.to_string(), "#c4a484");
    assert_eq!(Material::FOLIAGE.to_string(), "#008000");
}

#[test]
fn test_default_tree_expansion() -> Result<(), VerdantError> {
    let rules = RewriteRules::default_tree();
    assert_eq!(rules.axiom(), Some(DEFAULT_AXIOM));
    assert_eq!(rules.generate("X", 0, 0)?, vec!['X']);
    let one: String = rules.generate("X", 1, 0)?.into_iter().collect();
    assert_eq!(one, "F[+X][-X]F[<X][>X]X");
    let two = rules.generate("X", 2, 0)?;
    assert_eq!(two.iter().filter(|c| **c == 'X').count(), 25);
    Ok(())
}

#[test]
fn test_parse_grammar() -> Result<(), VerdantError> {
    let mut rules = RewriteRules::default();
    let _ = rules.parse(
        r#"
# a binary tree
axiom("A")
rule("A", "F [ +A ] [ -A ]")   # spaces are removed
rule("F", "FF")
timeout(2)
"#,
    )?;
    assert_eq!(rules.axiom(), Some("A"));
    assert_eq!(rules.rule_count(), 2);
    assert_eq!(rules.timeout(), Some(std::time::Duration::from_secs(2)));
    let expanded: String = rules.generate("A", 2, 0)?.into_iter().collect();
    assert_eq!(expanded, "FF[+F[+A][-A]][-F[+A][-A]]");
    Ok(())
}

#[test]
fn test_parse_grammar_errors() {
    let bad = [
        r#"rule("AB", "F")"#,
        r#"rule("A")"#,
        r#"axiom("X") axiom("Y")"#,
        r#"timeout("X")"#,
        r#"rule("A", "")"#,
        r#"grow("A")"#,
        "axiom(\n\"X\")",
    ];
    for text in bad {
        assert!(RewriteRules::default().parse(text).is_err(), "{text}");
    }
    match RewriteRules::default().parse("axiom(\"X\")\nrule(\"A\")\n") {
        Err(VerdantError::ParseError(msg)) => assert!(msg.contains("line 2"), "{msg}"),
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn test_stochastic_rules_are_seeded() -> Result<(), VerdantError> {
    let mut rules = RewriteRules::default();
    let _ = rules.add_rule('X', "F+X")?.add_rule('X', "F-X")?;
    let a = rules.generate("X", 8, 7)?;
    let b = rules.generate("X", 8, 7)?;
    assert_eq!(a, b);
    let distinct = (0..16_u64)
        .map(|seed| rules.generate("X", 8, seed))
        .collect::<Result<Vec<_>, _>>()?;
    assert!(distinct.iter().any(|s| *s != distinct[0]));
    Ok(())
}

#[test]
fn test_expansion_overflow() {
    let mut rules = RewriteRules::default();
    let _ = rules.add_rule('X', "XXXXXXXXXX").unwrap().set_max_symbols(1000);
    match rules.generate("X", 12, 0) {
        Err(VerdantError::Overflow(_)) => {}
        other => panic!("expected an overflow, got {:?}", other.map(|s| s.len())),
    }
}

#[test]
fn test_default_tree_symbol_limit() -> Result<(), VerdantError> {
    let rules = RewriteRules::default_tree();
    assert!(rules.generate(DEFAULT_AXIOM, 7, 0)?.len() <= RewriteRules::MAX_SYMBOLS);
    assert!(matches!(
        rules.generate(DEFAULT_AXIOM, 8, 0),
        Err(VerdantError::Overflow(_))
    ));
    Ok(())
}

#[test]
fn test_expansion_timeout() -> Result<(), VerdantError> {
    let mut rules = RewriteRules::default_tree();
    let _ = rules.set_timeout(0.0)?;
    assert!(matches!(
        rules.generate(DEFAULT_AXIOM, 1, 0),
        Err(VerdantError::LSystems(_))
    ));
    // nothing to expand, nothing to time out
    assert_eq!(rules.generate(DEFAULT_AXIOM, 0, 0)?, vec!['X']);

    let mut rules = RewriteRules::default();
    let _ = rules.parse("timeout(0)\nrule(\"X\", \"FX\")")?;
    assert!(matches!(
        rules.generate("X", 3, 0),
        Err(VerdantError::LSystems(_))
    ));

    for seconds in [-1.0, f64::NAN, f64::INFINITY, 1e30] {
        assert!(
            matches!(
                RewriteRules::default().set_timeout(seconds),
                Err(VerdantError::InvalidParameter(_))
            ),
            "{seconds}"
        );
    }
    Ok(())
}

#[test]
fn test_regenerate_growth_zero() -> Result<(), VerdantError> {
    let output = regenerate(5, 0.0)?;
    assert!(output.tree_mesh.is_none());
    let leaves = output.leaf_mesh.expect("every ']' drops a leaf");
    assert!(leaves.mesh.vertices.iter().all(|v| v.is_finite()));
    Ok(())
}

#[test]
fn test_regenerate_is_idempotent() -> Result<(), VerdantError> {
    let a = regenerate(3, 60.0)?;
    let b = regenerate(3, 60.0)?;
    assert!(!a.is_empty());
    assert_eq!(a, b);
    Ok(())
}

#[test]
fn test_regenerate_startup() -> Result<(), VerdantError> {
    let output = regenerate(STARTUP_ITERATIONS, STARTUP_GROWTH)?;
    let symbols = RewriteRules::default_tree().generate(DEFAULT_AXIOM, STARTUP_ITERATIONS, 0)?;
    let closes = symbols.iter().filter(|c| **c == ']').count();
    let leaves = output.leaf_mesh.unwrap();
    assert_eq!(leaves.mesh.vertex_count(), closes * (LEAF_RINGS + 1) * 3);
    let tree = output.tree_mesh.unwrap();
    assert!(tree.mesh.vertices.iter().all(|v| v.is_finite()));
    Ok(())
}

#[test]
fn test_regenerate_on_threads() -> Result<(), VerdantError> {
    let expected = regenerate(3, 45.0)?;
    let handles: Vec<_> = (0..4)
        .map(|_| std::thread::spawn(|| regenerate(3, 45.0)))
        .collect();
    for handle in handles {
        let output = handle
            .join()
            .map_err(|_| VerdantError::InternalError("thread panicked".to_string()))??;
        assert_eq!(output, expected);
    }
    Ok(())
}
