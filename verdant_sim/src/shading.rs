// Neighbor shading: light reduction from nearby plants and obstacles.
//
// For each plant, every other placed entity within `radius` on the ground
// plane is a neighbor. Each neighbor is attributed to the first cardinal
// direction (north, east, south, west, in that order) whose cone of
// `cone_half_angle_degrees` contains it, and contributes its kind's
// increment exactly once. The summed reduction is capped at `max_reduction`
// so shading never fully blocks light.
//
// Shading is computed from an immutable `ShadingSnapshot` of positions, so
// refresh order cannot affect the result. Subjects are evaluated in
// parallel with rayon; `shade_all` returns results in subject order and the
// caller applies them sequentially.
//
// See also: `environment.rs` which applies the reduction to raw light,
// `sim.rs` which decides when to refresh (`ShadingRefresh`), `config.rs` for
// `ShadingParams`.

use crate::config::ShadingParams;
use crate::types::{Cardinal, GroundPos, ObstacleId, PlantId};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// The entity behind an occluding position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OccluderKind {
    Plant(PlantId),
    Obstacle(ObstacleId),
}

/// One positioned occluder in a snapshot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Occluder {
    pub kind: OccluderKind,
    pub position: GroundPos,
}

/// A neighbor within the shading radius, with the direction it lies in.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NeighborRelation {
    pub neighbor: OccluderKind,
    pub direction: Cardinal,
    pub distance: f32,
}

pub type NeighborList = SmallVec<[NeighborRelation; 8]>;

/// Shading outcome for one plant.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShadingResult {
    /// Fraction of light removed, in [0, max_reduction].
    pub reduction: f32,
    pub neighbors: NeighborList,
}

/// Immutable positions of every occluder at refresh time.
#[derive(Clone, Debug, Default)]
pub struct ShadingSnapshot {
    pub occluders: Vec<Occluder>,
}

impl ShadingSnapshot {
    pub fn new(occluders: Vec<Occluder>) -> Self {
        Self { occluders }
    }
}

/// First cardinal direction whose cone contains the offset from `from` to
/// `to`. Cone boundaries are inclusive. Coincident positions have no
/// direction.
pub fn cardinal_direction(
    from: GroundPos,
    to: GroundPos,
    half_angle_degrees: f32,
) -> Option<Cardinal> {
    let dx = to.x - from.x;
    let dz = to.z - from.z;
    let len = (dx * dx + dz * dz).sqrt();
    if len <= f32::EPSILON {
        return None;
    }
    // Small slack so offsets exactly on a cone edge land inside it.
    let min_cos = half_angle_degrees.to_radians().cos() - 1e-6;
    Cardinal::ALL.into_iter().find(|dir| {
        let (ux, uz) = dir.unit();
        (dx * ux + dz * uz) / len >= min_cos
    })
}

/// Shading for one plant at `position` against every other occluder.
pub fn shade_plant(
    subject: PlantId,
    position: GroundPos,
    snapshot: &ShadingSnapshot,
    params: &ShadingParams,
) -> ShadingResult {
    let mut result = ShadingResult::default();
    let mut total = 0.0f32;
    for occluder in &snapshot.occluders {
        if occluder.kind == OccluderKind::Plant(subject) {
            continue;
        }
        let distance = position.distance(occluder.position);
        if distance > params.radius {
            continue;
        }
        let Some(direction) =
            cardinal_direction(position, occluder.position, params.cone_half_angle_degrees)
        else {
            continue;
        };
        total += match occluder.kind {
            OccluderKind::Plant(_) => params.plant_increment,
            OccluderKind::Obstacle(_) => params.obstacle_increment,
        };
        result.neighbors.push(NeighborRelation {
            neighbor: occluder.kind,
            direction,
            distance,
        });
    }
    result.reduction = total.min(params.max_reduction);
    result
}

/// Shade every subject in parallel. Results are returned in subject order.
pub fn shade_all(
    subjects: &[(PlantId, GroundPos)],
    snapshot: &ShadingSnapshot,
    params: &ShadingParams,
) -> Vec<(PlantId, ShadingResult)> {
    subjects
        .par_iter()
        .map(|&(id, position)| (id, shade_plant(id, position, snapshot, params)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GardenConfig;
    use crate::prng::GardenRng;

    fn params() -> ShadingParams {
        GardenConfig::default().shading
    }

    fn plant_at(rng: &mut GardenRng, x: f32, z: f32) -> Occluder {
        Occluder {
            kind: OccluderKind::Plant(PlantId::new(rng)),
            position: GroundPos::new(x, z),
        }
    }

    fn obstacle_at(rng: &mut GardenRng, x: f32, z: f32) -> Occluder {
        Occluder {
            kind: OccluderKind::Obstacle(ObstacleId::new(rng)),
            position: GroundPos::new(x, z),
        }
    }

    #[test]
    fn cardinal_cones() {
        let o = GroundPos::new(0.0, 0.0);
        assert_eq!(cardinal_direction(o, GroundPos::new(0.0, -2.0), 45.0), Some(Cardinal::North));
        assert_eq!(cardinal_direction(o, GroundPos::new(2.0, 0.5), 45.0), Some(Cardinal::East));
        assert_eq!(cardinal_direction(o, GroundPos::new(0.3, 2.0), 45.0), Some(Cardinal::South));
        assert_eq!(cardinal_direction(o, GroundPos::new(-2.0, 0.0), 45.0), Some(Cardinal::West));
        assert_eq!(cardinal_direction(o, o, 45.0), None);
    }

    #[test]
    fn diagonal_neighbor_goes_to_first_matching_direction() {
        // Exactly north-east lies on the edge of both the north and east
        // cones; north is checked first.
        let o = GroundPos::new(0.0, 0.0);
        assert_eq!(cardinal_direction(o, GroundPos::new(1.0, -1.0), 45.0), Some(Cardinal::North));
        assert_eq!(cardinal_direction(o, GroundPos::new(1.0, 1.0), 45.0), Some(Cardinal::East));
    }

    #[test]
    fn narrow_cones_leave_gaps() {
        let o = GroundPos::new(0.0, 0.0);
        assert_eq!(cardinal_direction(o, GroundPos::new(1.0, 1.0), 30.0), None);
    }

    #[test]
    fn isolated_plant_is_unshaded() {
        let mut rng = GardenRng::new(1);
        let subject = plant_at(&mut rng, 0.0, 0.0);
        let far = plant_at(&mut rng, 9.0, 0.0);
        let snapshot = ShadingSnapshot::new(vec![subject, far]);
        let OccluderKind::Plant(id) = subject.kind else { unreachable!() };
        let result = shade_plant(id, subject.position, &snapshot, &params());
        assert_eq!(result.reduction, 0.0);
        assert!(result.neighbors.is_empty());
    }

    #[test]
    fn increments_by_kind() {
        let mut rng = GardenRng::new(2);
        let subject = plant_at(&mut rng, 0.0, 0.0);
        let snapshot = ShadingSnapshot::new(vec![
            subject,
            plant_at(&mut rng, 2.0, 0.0),
            obstacle_at(&mut rng, 0.0, 3.0),
        ]);
        let OccluderKind::Plant(id) = subject.kind else { unreachable!() };
        let result = shade_plant(id, subject.position, &snapshot, &params());
        assert!((result.reduction - 0.40).abs() < 1e-6);
        assert_eq!(result.neighbors.len(), 2);
        assert_eq!(result.neighbors[0].direction, Cardinal::East);
        assert_eq!(result.neighbors[1].direction, Cardinal::South);
    }

    #[test]
    fn reduction_caps_with_many_neighbors() {
        let mut rng = GardenRng::new(3);
        let subject = plant_at(&mut rng, 0.0, 0.0);
        let mut occluders = vec![subject];
        for i in 0..10 {
            let angle = i as f32 * std::f32::consts::TAU / 10.0;
            occluders.push(plant_at(&mut rng, angle.cos() * 2.0, angle.sin() * 2.0));
        }
        let snapshot = ShadingSnapshot::new(occluders);
        let OccluderKind::Plant(id) = subject.kind else { unreachable!() };
        let result = shade_plant(id, subject.position, &snapshot, &params());
        assert_eq!(result.neighbors.len(), 10);
        assert!(result.reduction <= 0.8 + 1e-6);
        assert!((result.reduction - 0.8).abs() < 1e-6);
    }

    #[test]
    fn each_neighbor_counts_once() {
        let mut rng = GardenRng::new(4);
        let subject = plant_at(&mut rng, 0.0, 0.0);
        let snapshot = ShadingSnapshot::new(vec![subject, plant_at(&mut rng, 1.0, -1.0)]);
        let OccluderKind::Plant(id) = subject.kind else { unreachable!() };
        let result = shade_plant(id, subject.position, &snapshot, &params());
        assert_eq!(result.neighbors.len(), 1);
        assert!((result.reduction - 0.15).abs() < 1e-6);
    }

    #[test]
    fn parallel_matches_sequential() {
        let mut rng = GardenRng::new(5);
        let occluders: Vec<Occluder> = (0..12)
            .map(|i| plant_at(&mut rng, (i % 4) as f32 * 1.5, (i / 4) as f32 * 1.5))
            .collect();
        let subjects: Vec<(PlantId, GroundPos)> = occluders
            .iter()
            .filter_map(|o| match o.kind {
                OccluderKind::Plant(id) => Some((id, o.position)),
                OccluderKind::Obstacle(_) => None,
            })
            .collect();
        let snapshot = ShadingSnapshot::new(occluders);
        let p = params();
        let parallel = shade_all(&subjects, &snapshot, &p);
        for ((id, pos), (pid, result)) in subjects.iter().zip(&parallel) {
            assert_eq!(id, pid);
            assert_eq!(*result, shade_plant(*id, *pos, &snapshot, &p));
        }
    }
}
