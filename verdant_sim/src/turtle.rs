// Turtle interpretation of an expanded grammar string into branch geometry.
//
// A turtle walks the symbol string left to right, carrying a position, a
// heading and a thickness. It starts at the pot origin heading straight up
// (+Y) with the pass's base thickness.
//
// - `F` draws a segment of jittered length along the heading, records the
//   segment's end as an attachment point (with the pre-taper thickness), then
//   tapers the thickness.
// - `+` / `-` rotate the heading about the fixed Z axis by the profile angle.
// - `[` pushes the turtle state; `]` pops it. A pop on an empty stack is a
//   counted no-op, never an error.
// - Every other symbol is ignored.
//
// The profile's length and thickness are scaled by the plant's condition at
// interpretation time: length by light, thickness by water, each linearly
// between `condition_floor` and 1.0 (see `TurtleSettings::for_conditions`).
//
// The stack is an explicit `SmallVec` rather than recursion, so nesting
// depth is bounded only by memory.
//
// See also: `grammar.rs` which produces the symbol string, `foliage.rs`
// which selects leaf sites from the attachment points, `mesh.rs` which
// turns segments into renderable prisms.
//
// **Critical constraint: determinism.** The only randomness is the length
// jitter, drawn from the caller's `GardenRng` in symbol order.

use crate::config::TurtleParams;
use crate::grammar::{Symbol, SymbolString};
use crate::prng::GardenRng;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Axis every rotate symbol turns about.
pub const ROTATION_AXIS: Vec3 = Vec3::Z;

/// Turtle parameters after condition scaling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TurtleSettings {
    pub angle_radians: f32,
    pub segment_length: f32,
    pub base_thickness: f32,
    pub taper: f32,
    pub length_jitter: (f32, f32),
}

impl TurtleSettings {
    /// Unscaled settings, as if water and light were both at 100%.
    pub fn ideal(params: &TurtleParams) -> Self {
        Self::for_conditions(params, 1.0, 1.0)
    }

    /// Scale the profile by the plant's current water and light factors.
    pub fn for_conditions(params: &TurtleParams, water_factor: f32, light_factor: f32) -> Self {
        let floor = params.condition_floor;
        let scale = |factor: f32| floor + (1.0 - floor) * factor.clamp(0.0, 1.0);
        Self {
            angle_radians: params.angle_degrees.to_radians(),
            segment_length: params.base_length * scale(light_factor),
            base_thickness: params.base_thickness * scale(water_factor),
            taper: params.taper,
            length_jitter: params.length_jitter,
        }
    }
}

/// Position, heading and thickness of the turtle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TurtleState {
    pub position: Vec3,
    pub heading: Vec3,
    pub thickness: f32,
}

impl TurtleState {
    pub fn at_origin(thickness: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            heading: Vec3::Y,
            thickness,
        }
    }

    fn rotate(&mut self, angle: f32) {
        self.heading = (Quat::from_axis_angle(ROTATION_AXIS, angle) * self.heading).normalize();
    }
}

/// One drawn branch segment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BranchSegment {
    pub start: Vec3,
    pub end: Vec3,
    pub thickness: f32,
    /// Bracket nesting depth when the segment was drawn.
    pub depth: u32,
}

impl BranchSegment {
    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }
}

/// A point where foliage may attach: the end of a drawn segment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttachmentPoint {
    pub position: Vec3,
    pub heading: Vec3,
    pub thickness: f32,
}

/// Result of one interpretation pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Interpretation {
    /// Segments in symbol order.
    pub segments: Vec<BranchSegment>,
    /// One per segment, in the same order.
    pub attachment_points: Vec<AttachmentPoint>,
    /// Stack depth after the last symbol; zero for balanced input.
    pub final_depth: usize,
    pub max_depth: usize,
    /// `]` symbols seen with an empty stack.
    pub unmatched_pops: usize,
}

/// Walk `symbols` and emit branch geometry.
pub fn interpret(
    symbols: &SymbolString,
    settings: &TurtleSettings,
    rng: &mut GardenRng,
) -> Interpretation {
    let mut out = Interpretation {
        segments: Vec::with_capacity(symbols.draw_count()),
        attachment_points: Vec::with_capacity(symbols.draw_count()),
        ..Interpretation::default()
    };
    let mut stack: SmallVec<[TurtleState; 16]> = SmallVec::new();
    let mut state = TurtleState::at_origin(settings.base_thickness);
    let (jitter_lo, jitter_hi) = settings.length_jitter;

    for &symbol in symbols {
        match symbol {
            Symbol::Draw => {
                let length = settings.segment_length * rng.range_f32(jitter_lo, jitter_hi);
                let end = state.position + state.heading * length;
                out.segments.push(BranchSegment {
                    start: state.position,
                    end,
                    thickness: state.thickness,
                    depth: stack.len() as u32,
                });
                out.attachment_points.push(AttachmentPoint {
                    position: end,
                    heading: state.heading,
                    thickness: state.thickness,
                });
                state.position = end;
                state.thickness *= settings.taper;
            }
            Symbol::RotatePositive => state.rotate(settings.angle_radians),
            Symbol::RotateNegative => state.rotate(-settings.angle_radians),
            Symbol::PushState => {
                stack.push(state);
                out.max_depth = out.max_depth.max(stack.len());
            }
            Symbol::PopState => match stack.pop() {
                Some(saved) => state = saved,
                None => out.unmatched_pops += 1,
            },
            Symbol::Variable(_) => {}
        }
    }

    if out.unmatched_pops > 0 {
        tracing::warn!(
            unmatched_pops = out.unmatched_pops,
            "turtle ignored pops on an empty stack"
        );
    }
    out.final_depth = stack.len();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlantProfile;

    fn settings() -> TurtleSettings {
        TurtleSettings {
            angle_radians: 90f32.to_radians(),
            segment_length: 1.0,
            base_thickness: 1.0,
            taper: 0.7,
            length_jitter: (1.0, 1.0),
        }
    }

    fn approx(a: Vec3, b: Vec3) -> bool {
        a.distance(b) < 1e-4
    }

    #[test]
    fn starts_at_origin_heading_up() {
        let mut rng = GardenRng::new(1);
        let out = interpret(&SymbolString::from("F"), &settings(), &mut rng);
        assert_eq!(out.segments.len(), 1);
        assert_eq!(out.segments[0].start, Vec3::ZERO);
        assert!(approx(out.segments[0].end, Vec3::Y));
        assert_eq!(out.segments[0].thickness, 1.0);
    }

    #[test]
    fn rotation_turns_about_z() {
        let mut rng = GardenRng::new(1);
        let out = interpret(&SymbolString::from("+F"), &settings(), &mut rng);
        assert!(approx(out.segments[0].end, Vec3::NEG_X));
        assert_eq!(out.segments[0].end.z, 0.0);

        let out = interpret(&SymbolString::from("-F"), &settings(), &mut rng);
        assert!(approx(out.segments[0].end, Vec3::X));
    }

    #[test]
    fn push_pop_restores_state() {
        let mut rng = GardenRng::new(1);
        let out = interpret(&SymbolString::from("F[+F]F"), &settings(), &mut rng);
        assert_eq!(out.segments.len(), 3);
        // The third segment continues from the first, not from the branch.
        assert!(approx(out.segments[2].start, out.segments[0].end));
        assert!(approx(out.segments[2].end, Vec3::new(0.0, 2.0, 0.0)));
        assert_eq!(out.segments[1].depth, 1);
        assert_eq!(out.segments[2].depth, 0);
        // The popped state carries the thickness from before the branch.
        assert_eq!(out.segments[2].thickness, out.segments[1].thickness);
    }

    #[test]
    fn balanced_input_ends_at_depth_zero() {
        let mut rng = GardenRng::new(1);
        let text = "FF+[+F-F-F]-[-F+F+F]";
        let out = interpret(&SymbolString::from(text), &settings(), &mut rng);
        assert_eq!(out.final_depth, 0);
        assert_eq!(out.max_depth, 1);
        assert_eq!(out.unmatched_pops, 0);
    }

    #[test]
    fn pop_on_empty_stack_is_ignored() {
        let mut rng = GardenRng::new(1);
        let out = interpret(&SymbolString::from("]]F]"), &settings(), &mut rng);
        assert_eq!(out.unmatched_pops, 3);
        assert_eq!(out.segments.len(), 1);
        assert!(approx(out.segments[0].end, Vec3::Y));
    }

    #[test]
    fn unclosed_push_reports_depth() {
        let mut rng = GardenRng::new(1);
        let out = interpret(&SymbolString::from("F[[F"), &settings(), &mut rng);
        assert_eq!(out.final_depth, 2);
    }

    #[test]
    fn thickness_never_increases_along_a_chain() {
        let mut rng = GardenRng::new(5);
        let out = interpret(&SymbolString::from("F+F-F+FF"), &settings(), &mut rng);
        for pair in out.segments.windows(2) {
            assert!(pair[1].thickness <= pair[0].thickness);
            assert!(approx(pair[1].start, pair[0].end));
        }
    }

    #[test]
    fn attachment_points_carry_pre_taper_thickness() {
        let mut rng = GardenRng::new(1);
        let out = interpret(&SymbolString::from("FF"), &settings(), &mut rng);
        assert_eq!(out.attachment_points.len(), 2);
        assert_eq!(out.attachment_points[0].thickness, 1.0);
        assert!((out.attachment_points[1].thickness - 0.7).abs() < 1e-6);
        assert_eq!(out.attachment_points[1].position, out.segments[1].end);
    }

    #[test]
    fn symbols_without_turtle_meaning_are_ignored() {
        let mut rng = GardenRng::new(1);
        let out = interpret(&SymbolString::from("XYFZ"), &settings(), &mut rng);
        assert_eq!(out.segments.len(), 1);
    }

    #[test]
    fn jittered_lengths_stay_in_range() {
        let mut rng = GardenRng::new(8);
        let s = TurtleSettings {
            length_jitter: (0.9, 1.1),
            ..settings()
        };
        let out = interpret(&SymbolString::from("FFFFFFFFFF"), &s, &mut rng);
        for seg in &out.segments {
            let len = seg.length();
            assert!((0.9 - 1e-5..1.1 + 1e-5).contains(&len), "length {len}");
        }
    }

    #[test]
    fn interpretation_is_deterministic() {
        let params = PlantProfile::bush().turtle;
        let s = TurtleSettings::ideal(&params);
        let text = SymbolString::from("FF+[+F-F-F]-[-F+F+F]");
        let a = interpret(&text, &s, &mut GardenRng::new(42));
        let b = interpret(&text, &s, &mut GardenRng::new(42));
        assert_eq!(a, b);
    }

    #[test]
    fn conditions_scale_length_and_thickness() {
        let params = PlantProfile::bush().turtle;
        let ideal = TurtleSettings::ideal(&params);
        let starved = TurtleSettings::for_conditions(&params, 0.0, 0.0);
        assert!((starved.segment_length - ideal.segment_length * 0.6).abs() < 1e-6);
        assert!((starved.base_thickness - ideal.base_thickness * 0.6).abs() < 1e-6);

        let dry = TurtleSettings::for_conditions(&params, 0.0, 1.0);
        assert_eq!(dry.segment_length, ideal.segment_length);
        assert!(dry.base_thickness < ideal.base_thickness);
    }
}
