// Leaf placement on a mature plant's branch tips.
//
// Runs once per plant, when the plant first reaches its stage cap. A tip is
// an attachment point whose thickness fell below `tip_threshold` of the
// pass's base thickness. The spawner places `ceil(tips * leaf_fraction)`
// leaves, capped at `max_leaves`, each on a tip sampled uniformly with
// replacement. Every leaf gets a small random position offset, an
// orientation following its tip heading with pitch/roll jitter, and a
// jittered scale.
//
// The once-only guarantee lives on the plant (`GrowthState::foliage_spawned`,
// checked by `Plant::spawn_foliage`). This module is stateless.
//
// See also: `turtle.rs` for `AttachmentPoint`, `plant.rs` which stores the
// leaves on `PlantGeometry`, `mesh.rs` which renders them as quads.
//
// **Critical constraint: determinism.** All sampling draws from the
// caller's `GardenRng`.

use crate::config::FoliageParams;
use crate::prng::GardenRng;
use crate::turtle::AttachmentPoint;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// One placed leaf.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeafInstance {
    pub position: Vec3,
    /// Euler angles in radians: (pitch, yaw, roll).
    pub rotation: Vec3,
    pub scale: f32,
}

pub fn is_tip(point: &AttachmentPoint, base_thickness: f32, tip_threshold: f32) -> bool {
    point.thickness < base_thickness * tip_threshold
}

/// Attachment points that qualify as tips.
pub fn select_tips<'a>(
    points: &'a [AttachmentPoint],
    base_thickness: f32,
    tip_threshold: f32,
) -> Vec<&'a AttachmentPoint> {
    points
        .iter()
        .filter(|p| is_tip(p, base_thickness, tip_threshold))
        .collect()
}

/// Number of leaves for `tip_count` tips.
pub fn leaf_count(tip_count: usize, params: &FoliageParams) -> usize {
    let wanted = (tip_count as f32 * params.leaf_fraction).ceil() as usize;
    wanted.min(params.max_leaves as usize)
}

/// Place leaves on the tips among `points`. Empty when there are no tips.
pub fn spawn_leaves(
    points: &[AttachmentPoint],
    base_thickness: f32,
    params: &FoliageParams,
    rng: &mut GardenRng,
) -> Vec<LeafInstance> {
    let tips = select_tips(points, base_thickness, params.tip_threshold);
    let count = leaf_count(tips.len(), params);
    let (scale_lo, scale_hi) = params.scale_range;
    let mut leaves = Vec::with_capacity(count);
    for _ in 0..count {
        let Some(index) = rng.pick_index(tips.len()) else {
            break;
        };
        let tip = tips[index];
        let offset = Vec3::new(
            rng.symmetric_f32(params.position_jitter),
            rng.symmetric_f32(params.position_jitter),
            rng.symmetric_f32(params.position_jitter),
        );
        // Yaw faces the leaf along its tip's heading in the XY plane.
        let yaw = tip.heading.x.atan2(tip.heading.y);
        let rotation = Vec3::new(
            rng.symmetric_f32(params.rotation_jitter),
            yaw,
            rng.symmetric_f32(params.rotation_jitter),
        );
        leaves.push(LeafInstance {
            position: tip.position + offset,
            rotation,
            scale: rng.range_f32(scale_lo, scale_hi),
        });
    }
    leaves
}
