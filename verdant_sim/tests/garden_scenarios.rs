// End-to-end growth scenarios driven through the public `SimState` API.
//
// Each test builds a small garden by hand (or via `populate`), feeds it
// frames with a fixed light source position, and checks the garden-level
// guarantees: growth timing and gating, geometry replacement, the foliage
// once-only rule, shading caps, resource bounds and seed determinism.

use verdant_sim::command::SimCommand;
use verdant_sim::config::GardenConfig;
use verdant_sim::event::SimEventKind;
use verdant_sim::grammar::{self, Grammar};
use verdant_sim::mesh::{MeshConfig, build_plant_mesh};
use verdant_sim::prng::GardenRng;
use verdant_sim::scene::InMemoryAssets;
use verdant_sim::scheduler::{GrowthBlock, GrowthPhase, GrowthRoll};
use verdant_sim::sim::{SimState, TickInput};
use verdant_sim::turtle::{self, TurtleSettings};
use verdant_sim::types::{GroundPos, PlantId, Vec3};

/// Light source height giving 50% raw light with the default reference.
const HALF_LIGHT: Vec3 = Vec3::new(0.0, 25.0, 0.0);
const FULL_LIGHT: Vec3 = Vec3::new(0.0, 50.0, 0.0);

fn single_plant(config: GardenConfig, seed: u64) -> (SimState, PlantId) {
    let mut state = SimState::with_config(seed, config);
    let mut events = Vec::new();
    let id = state
        .place_plant(GroundPos::new(0.0, 0.0), &mut InMemoryAssets::default(), &mut events)
        .unwrap();
    (state, id)
}

fn run(state: &mut SimState, frames: usize, dt: f64, light: Vec3) -> Vec<SimEventKind> {
    let mut kinds = Vec::new();
    for _ in 0..frames {
        let result = state.step(&[], TickInput::new(dt, light));
        kinds.extend(result.events.into_iter().map(|e| e.kind));
    }
    kinds
}

#[test]
fn first_growth_after_interval_replaces_geometry() {
    let mut config = GardenConfig::default();
    config.water.decay_per_second = 0.0;
    let (mut state, id) = single_plant(config, 1);
    state.growth_roll = GrowthRoll::AlwaysSucceed;
    state.plants.get_mut(&id).unwrap().water = 80.0;
    let stage_zero = state.plants[&id].geometry.clone();

    // 50 frames of 100 ms reach exactly 5000 ms: not yet strictly past the interval.
    run(&mut state, 50, 0.1, HALF_LIGHT);
    assert_eq!(state.plants[&id].growth.stage, 0);

    let events = run(&mut state, 10, 0.1, HALF_LIGHT);
    let plant = &state.plants[&id];
    assert_eq!(plant.light, 50.0);
    assert_eq!(plant.growth.stage, 1);
    assert_eq!(plant.growth.phase, GrowthPhase::Dormant);
    assert_ne!(plant.geometry, stage_zero);
    assert_eq!(plant.geometry.stage, 1);
    // floor(1 * 0.5 * 0.8) = 0 iterations: the bare axiom.
    assert_eq!(plant.geometry.iterations, 0);
    assert_eq!(plant.geometry.segments.len(), 1);
    assert_eq!(
        events
            .iter()
            .filter(|k| matches!(k, SimEventKind::GrowthAdvanced { .. }))
            .count(),
        1
    );
}

#[test]
fn starved_plant_never_grows() {
    let mut config = GardenConfig::default();
    config.growth.interval_ms = 10;
    let (mut state, id) = single_plant(config, 2);
    state.growth_roll = GrowthRoll::AlwaysSucceed;
    state.plants.get_mut(&id).unwrap().water = 30.0;

    let events = run(&mut state, 100, 0.05, FULL_LIGHT);
    let plant = &state.plants[&id];
    assert_eq!(plant.growth.stage, 0);
    assert!(plant.geometry.is_empty());
    assert_eq!(plant.growth.phase, GrowthPhase::Evaluating);
    assert!(events.iter().any(|k| matches!(k, SimEventKind::GrowthBlocked { .. })));
    assert!(!events.iter().any(|k| matches!(k, SimEventKind::GrowthAdvanced { .. })));
}

#[test]
fn dim_plant_never_grows() {
    let mut config = GardenConfig::default();
    config.growth.interval_ms = 10;
    let (mut state, id) = single_plant(config, 12);
    state.growth_roll = GrowthRoll::AlwaysSucceed;
    state.config.water.decay_per_second = 0.0;

    // Height 5 against the reference 50 gives 10% light, under the 20% gate.
    let dim = Vec3::new(0.0, 5.0, 0.0);
    let events = run(&mut state, 100, 0.05, dim);
    let plant = &state.plants[&id];
    assert_eq!(plant.water, 100.0);
    assert!((plant.light - 10.0).abs() < 1e-4);
    assert_eq!(plant.growth.stage, 0);
    assert!(plant.geometry.is_empty());
    assert_eq!(plant.growth.last_block, Some(GrowthBlock::LowLight));
    assert!(!events.iter().any(|k| matches!(k, SimEventKind::GrowthAdvanced { .. })));
}

#[test]
fn watering_unblocks_growth() {
    let mut config = GardenConfig::default();
    config.growth.interval_ms = 100;
    let (mut state, id) = single_plant(config, 3);
    state.growth_roll = GrowthRoll::AlwaysSucceed;
    state.plants.get_mut(&id).unwrap().water = 30.0;
    run(&mut state, 10, 0.05, FULL_LIGHT);
    assert_eq!(state.plants[&id].growth.stage, 0);

    let water = SimCommand::WaterPlant { plant_id: id };
    state.step(&[water], TickInput::new(0.05, FULL_LIGHT));
    assert_eq!(state.plants[&id].growth.stage, 1);
}

#[test]
fn matured_plant_keeps_its_leaves() {
    let mut config = GardenConfig::default();
    config.growth.interval_ms = 50;
    config.growth.max_stage = 3;
    let (mut state, id) = single_plant(config, 4);
    state.growth_roll = GrowthRoll::AlwaysSucceed;

    let events = run(&mut state, 40, 0.05, FULL_LIGHT);
    let leaves = state.plants[&id].geometry.leaves.clone();
    assert_eq!(state.plants[&id].growth.stage, 3);
    assert!(!leaves.is_empty());
    assert!(events.iter().any(|k| matches!(k, SimEventKind::PlantMatured { .. })));

    let later = run(&mut state, 200, 0.05, FULL_LIGHT);
    assert_eq!(state.plants[&id].geometry.leaves, leaves);
    assert!(later.is_empty(), "a capped plant emits nothing: {later:?}");
}

#[test]
fn crowded_plant_keeps_some_light() {
    let mut state = SimState::new(5);
    let mut assets = InMemoryAssets::default();
    let mut events = Vec::new();
    let center = state
        .place_plant(GroundPos::new(0.0, 0.0), &mut assets, &mut events)
        .unwrap();
    for i in 0..10 {
        let angle = i as f32 * std::f32::consts::TAU / 10.0;
        state
            .place_plant(
                GroundPos::new(angle.cos() * 3.0, angle.sin() * 3.0),
                &mut assets,
                &mut events,
            )
            .unwrap();
    }
    state.refresh_shading(&mut events);
    state.step(&[], TickInput::new(0.016, FULL_LIGHT));

    let plant = &state.plants[&center];
    assert_eq!(plant.neighbors.len(), 10);
    assert!((plant.light_reduction - 0.8).abs() < 1e-6);
    assert!((plant.light - 20.0).abs() < 1e-3);
}

#[test]
fn water_stays_bounded_across_a_long_run() {
    let mut state = SimState::new(6);
    state.populate(&mut InMemoryAssets::default()).unwrap();
    for frame in 0..3000 {
        let commands = if frame % 40 == 0 {
            vec![SimCommand::WaterAll]
        } else {
            Vec::new()
        };
        state.step(&commands, TickInput::new(0.1, FULL_LIGHT));
        for plant in state.plants.values() {
            assert!((0.0..=100.0).contains(&plant.water));
            assert!((0.0..=100.0).contains(&plant.light));
        }
    }
}

#[test]
fn same_seed_same_garden() {
    let play = |seed| {
        let mut state = SimState::new(seed);
        state.populate(&mut InMemoryAssets::default()).unwrap();
        for frame in 0..600 {
            let commands = if frame % 100 == 0 {
                vec![SimCommand::WaterAll]
            } else {
                Vec::new()
            };
            state.step(&commands, TickInput::new(0.1, FULL_LIGHT));
        }
        state
            .plants
            .values()
            .map(|p| (p.id, p.growth.stage, p.geometry.clone()))
            .collect::<Vec<_>>()
    };
    assert_eq!(play(77), play(77));
}

#[test]
fn expansion_feeds_the_turtle() {
    let config = GardenConfig::default();
    let g = Grammar::from_params(&config.plant_profile.grammar).unwrap();
    assert_eq!(g.expand(0).to_string(), "F");
    assert_eq!(g.expand(1).to_string(), "FF+[+F-F-F]-[-F+F+F]");
    assert_eq!(grammar::expanded_len(&g.axiom, &g.rules, 3), g.expand(3).len() as u64);

    let settings = TurtleSettings::ideal(&config.plant_profile.turtle);
    let out = turtle::interpret(&g.expand(3), &settings, &mut GardenRng::new(8));
    assert_eq!(out.final_depth, 0);
    assert_eq!(out.unmatched_pops, 0);
    assert_eq!(out.segments.len(), 512);

    let geometry = verdant_sim::plant::PlantGeometry {
        segments: out.segments,
        ..Default::default()
    };
    let mesh = build_plant_mesh(&geometry, &MeshConfig::default());
    assert_eq!(mesh.triangle_count(), 512 * 12);
}
