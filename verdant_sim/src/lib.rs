// verdant_sim: procedural potted-plant growth engine.
//
// This crate contains all garden logic: plant growth by string rewriting,
// turtle interpretation into branch geometry, the water/light environment,
// neighbor shading, leaf placement, scheduling and the command interface. It
// has no renderer dependencies and runs headless; a host drives it one frame
// at a time and forwards geometry through the `scene.rs` traits.
//
// Module overview:
// - `sim.rs`:         Top-level SimState, garden layout, tick loop, command/event processing.
// - `grammar.rs`:     Parallel rewriting grammar (axiom + production rules) and iteration scaling.
// - `turtle.rs`:      Stack-based turtle that turns a symbol string into branch segments.
// - `environment.rs`: Water decay/watering, light from source height, sun orbit, day phases.
// - `shading.rs`:     Cardinal-cone neighbor shading over an immutable position snapshot.
// - `scheduler.rs`:   Per-plant growth timer, resource gates and the weighted growth roll.
// - `foliage.rs`:     One-time leaf scattering over branch tips.
// - `plant.rs`:       Plant and Obstacle entities, PlantGeometry.
// - `mesh.rs`:        Triangle mesh generation from PlantGeometry (branch prisms, leaf quads).
// - `scene.rs`:       AssetLoader / SceneGraph seams to the host.
// - `command.rs`:     SimCommand: all external mutations.
// - `event.rs`:       EventQueue (priority queue) + host-visible SimEvents.
// - `config.rs`:      GardenConfig + PlantProfile: all tunable parameters including plant presets.
// - `prng`:           Re-exported from `verdant_prng`: xoshiro256++ PRNG with SplitMix64 seeding.
// - `types.rs`:       GroundPos, entity IDs, Cardinal, SimSpeed.
//
// **Critical constraint: determinism.** The garden is a function of its seed,
// config and inputs. All randomness comes from a seeded xoshiro256++ PRNG.
// No system time, no OS entropy. Use `BTreeMap` for entity collections.

pub mod command;
pub mod config;
pub mod environment;
pub mod event;
pub mod foliage;
pub mod grammar;
pub mod mesh;
pub mod plant;
pub use verdant_prng as prng;
pub mod scene;
pub mod scheduler;
pub mod shading;
pub mod sim;
pub mod turtle;
pub mod types;
