// Garden entities: potted plants and static obstacles.
//
// A `Plant` owns everything about one pot: its fixed ground position, water
// and light levels, the shading reduction and neighbor relations from the
// last refresh, its `GrowthState`, and the `PlantGeometry` currently
// published for it. Geometry is replaced wholesale on every growth step;
// prior segments are never mutated in place.
//
// `Obstacle`s (crates, rocks) exist only to shade plants. Both entity types
// implement `Placed` so the sim can build a shading snapshot from either.
//
// See also: `sim.rs` which owns plants and obstacles in `BTreeMap`s and
// drives the per-tick update, `scheduler.rs` for `GrowthState`, `grammar.rs`
// and `turtle.rs` for geometry regeneration, `foliage.rs` for leaves.
//
// **Critical constraint: determinism.** Every random draw made here comes
// from the `GardenRng` passed by the caller.

use crate::config::{GardenConfig, PlantProfile};
use crate::environment;
use crate::foliage::{self, LeafInstance};
use crate::grammar::{self, Grammar};
use crate::prng::GardenRng;
use crate::scene::AssetHandle;
use crate::scheduler::GrowthState;
use crate::shading::{NeighborList, OccluderKind, ShadingResult};
use crate::turtle::{self, AttachmentPoint, BranchSegment, TurtleSettings};
use crate::types::{GroundPos, ObstacleId, PlantId};
use serde::{Deserialize, Serialize};

/// Anything with a fixed ground position that can shade a plant.
pub trait Placed {
    fn ground_position(&self) -> GroundPos;
    fn occluder_kind(&self) -> OccluderKind;
}

/// Renderable structure of a plant at one growth stage.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlantGeometry {
    pub stage: u32,
    /// Rewrite iterations actually applied for this geometry.
    pub iterations: u32,
    /// Base thickness of the interpretation pass (tips are measured
    /// against it).
    pub base_thickness: f32,
    pub segments: Vec<BranchSegment>,
    pub leaves: Vec<LeafInstance>,
}

impl PlantGeometry {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() && self.leaves.is_empty()
    }

    /// Highest point reached by any segment, relative to the pot.
    pub fn height(&self) -> f32 {
        self.segments
            .iter()
            .map(|s| s.start.y.max(s.end.y))
            .fold(0.0, f32::max)
    }
}

/// A potted plant.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Plant {
    pub id: PlantId,
    pub position: GroundPos,
    pub pot: AssetHandle,
    /// Soil moisture, [0, 100].
    pub water: f32,
    /// Light reaching the plant after shading, [0, 100].
    pub light: f32,
    /// Fraction of light removed by neighbors, [0, max_reduction].
    pub light_reduction: f32,
    pub neighbors: NeighborList,
    pub growth: GrowthState,
    pub geometry: PlantGeometry,
    /// Attachment points from the latest interpretation pass.
    pub attachment_points: Vec<AttachmentPoint>,
}

impl Plant {
    /// A fresh pot at stage 0 with no branch geometry yet.
    pub fn new(
        id: PlantId,
        position: GroundPos,
        pot: AssetHandle,
        config: &GardenConfig,
        now_ms: f64,
    ) -> Self {
        Self {
            id,
            position,
            pot,
            water: environment::clamp_level(config.water.initial_level),
            light: environment::clamp_level(config.light.initial_level),
            light_reduction: 0.0,
            neighbors: NeighborList::new(),
            growth: GrowthState::new(config.growth.max_stage, now_ms),
            geometry: PlantGeometry::default(),
            attachment_points: Vec::new(),
        }
    }

    pub fn water_factor(&self) -> f32 {
        environment::level_factor(self.water)
    }

    pub fn light_factor(&self) -> f32 {
        environment::level_factor(self.light)
    }

    pub fn decay_water(&mut self, decay_per_second: f32, delta_seconds: f32) {
        self.water = environment::decay_water(self.water, decay_per_second, delta_seconds);
    }

    pub fn add_water(&mut self, amount: f32) {
        self.water = environment::add_water(self.water, amount);
    }

    /// Recompute light from the source height and the current reduction.
    pub fn update_light(&mut self, source_height: f32, reference_height: f32) {
        let raw = environment::raw_light(source_height, reference_height);
        self.light = environment::shaded_light(raw, self.light_reduction);
    }

    pub fn apply_shading(&mut self, result: ShadingResult) {
        self.light_reduction = result.reduction;
        self.neighbors = result.neighbors;
    }

    /// Expand and interpret the grammar for the current stage and
    /// conditions, replacing the previous geometry. Leaves are cleared; they
    /// are only ever spawned at the cap.
    pub fn regrow(&mut self, grammar: &Grammar, profile: &PlantProfile, rng: &mut GardenRng) {
        let water_factor = self.water_factor();
        let light_factor = self.light_factor();
        let nominal = self.growth.stage * profile.grammar.iterations_per_stage;
        let iterations = grammar::effective_iterations(nominal, light_factor, water_factor)
            .min(grammar.max_iterations);
        let symbols = grammar.expand(iterations);
        let settings = TurtleSettings::for_conditions(&profile.turtle, water_factor, light_factor);
        let interpretation = turtle::interpret(&symbols, &settings, rng);

        self.geometry = PlantGeometry {
            stage: self.growth.stage,
            iterations,
            base_thickness: settings.base_thickness,
            segments: interpretation.segments,
            leaves: Vec::new(),
        };
        self.attachment_points = interpretation.attachment_points;
    }

    /// Spawn leaves on the current tips, at most once per plant. Returns the
    /// number of leaves placed, or `None` if foliage was already spawned.
    pub fn spawn_foliage(&mut self, profile: &PlantProfile, rng: &mut GardenRng) -> Option<usize> {
        if self.growth.foliage_spawned {
            return None;
        }
        self.growth.foliage_spawned = true;
        let leaves = foliage::spawn_leaves(
            &self.attachment_points,
            self.geometry.base_thickness,
            &profile.foliage,
            rng,
        );
        let count = leaves.len();
        self.geometry.leaves = leaves;
        Some(count)
    }

    /// Number of attachment points that currently qualify as tips.
    pub fn tip_count(&self, profile: &PlantProfile) -> usize {
        foliage::select_tips(
            &self.attachment_points,
            self.geometry.base_thickness,
            profile.foliage.tip_threshold,
        )
        .len()
    }
}

impl Placed for Plant {
    fn ground_position(&self) -> GroundPos {
        self.position
    }

    fn occluder_kind(&self) -> OccluderKind {
        OccluderKind::Plant(self.id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleKind {
    Crate,
    Rock,
}

/// A static prop that shades nearby plants.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: ObstacleId,
    pub position: GroundPos,
    pub kind: ObstacleKind,
    pub model: AssetHandle,
}

impl Placed for Obstacle {
    fn ground_position(&self) -> GroundPos {
        self.position
    }

    fn occluder_kind(&self) -> OccluderKind {
        OccluderKind::Obstacle(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_plant(config: &GardenConfig) -> Plant {
        let mut rng = GardenRng::new(1);
        Plant::new(
            PlantId::new(&mut rng),
            GroundPos::new(0.0, 0.0),
            AssetHandle(0),
            config,
            0.0,
        )
    }

    fn grammar(config: &GardenConfig) -> Grammar {
        Grammar::from_params(&config.plant_profile.grammar).unwrap()
    }

    #[test]
    fn new_plant_starts_bare_and_full() {
        let config = GardenConfig::default();
        let plant = test_plant(&config);
        assert_eq!(plant.water, 100.0);
        assert_eq!(plant.light, 0.0);
        assert_eq!(plant.growth.stage, 0);
        assert!(plant.geometry.is_empty());
    }

    #[test]
    fn light_applies_reduction() {
        let config = GardenConfig::default();
        let mut plant = test_plant(&config);
        plant.light_reduction = 0.5;
        plant.update_light(50.0, 50.0);
        assert_eq!(plant.light, 50.0);
        plant.update_light(-5.0, 50.0);
        assert_eq!(plant.light, 0.0);
    }

    #[test]
    fn regrow_replaces_geometry() {
        let config = GardenConfig::default();
        let grammar = grammar(&config);
        let mut rng = GardenRng::new(3);
        let mut plant = test_plant(&config);
        plant.light = 100.0;

        plant.growth.stage = 1;
        plant.regrow(&grammar, &config.plant_profile, &mut rng);
        assert_eq!(plant.geometry.iterations, 1);
        assert_eq!(plant.geometry.segments.len(), 8);

        plant.growth.stage = 2;
        plant.regrow(&grammar, &config.plant_profile, &mut rng);
        assert_eq!(plant.geometry.iterations, 2);
        assert_eq!(plant.geometry.segments.len(), 64);
        assert_eq!(plant.attachment_points.len(), 64);
    }

    #[test]
    fn poor_conditions_reduce_iterations() {
        let config = GardenConfig::default();
        let grammar = grammar(&config);
        let mut rng = GardenRng::new(3);
        let mut plant = test_plant(&config);
        plant.growth.stage = 4;
        plant.water = 80.0;
        plant.light = 50.0;
        plant.regrow(&grammar, &config.plant_profile, &mut rng);
        assert_eq!(plant.geometry.iterations, 1);
    }

    #[test]
    fn foliage_spawns_once() {
        let config = GardenConfig::default();
        let grammar = grammar(&config);
        let mut rng = GardenRng::new(4);
        let mut plant = test_plant(&config);
        plant.light = 100.0;
        plant.growth.stage = 3;
        plant.regrow(&grammar, &config.plant_profile, &mut rng);
        assert!(plant.tip_count(&config.plant_profile) > 0);

        let first = plant.spawn_foliage(&config.plant_profile, &mut rng).unwrap();
        assert!(first > 0 && first <= 50);
        let leaves = plant.geometry.leaves.clone();
        assert_eq!(plant.spawn_foliage(&config.plant_profile, &mut rng), None);
        assert_eq!(plant.geometry.leaves, leaves);
    }

    #[test]
    fn foliage_without_tips_is_a_no_op() {
        let config = GardenConfig::default();
        let mut rng = GardenRng::new(5);
        let mut plant = test_plant(&config);
        assert_eq!(plant.spawn_foliage(&config.plant_profile, &mut rng), Some(0));
        assert!(plant.geometry.leaves.is_empty());
        assert!(plant.growth.foliage_spawned);
    }

    #[test]
    fn placed_entities_report_their_kind() {
        let config = GardenConfig::default();
        let plant = test_plant(&config);
        assert_eq!(plant.occluder_kind(), OccluderKind::Plant(plant.id));
        let mut rng = GardenRng::new(6);
        let obstacle = Obstacle {
            id: ObstacleId::new(&mut rng),
            position: GroundPos::new(1.0, 2.0),
            kind: ObstacleKind::Rock,
            model: AssetHandle(1),
        };
        assert_eq!(obstacle.ground_position(), GroundPos::new(1.0, 2.0));
    }
}
