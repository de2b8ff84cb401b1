// Core garden state and tick loop.
//
// `SimState` is the single source of truth for the garden. It owns every
// plant and obstacle, the event queue, the PRNG, the compiled grammar and
// the config. The sim is a function:
// `(state, commands, tick input) -> (new state, events)`.
//
// ## Setup
//
// `with_config()` builds an empty garden. `populate()` scatters the
// configured number of pots and obstacles over the grid by rejection
// sampling and then computes neighbor shading once. Callers that lay out a
// garden by hand use `place_plant()` / `place_obstacle()` and then
// `refresh_shading()`.
//
// ## Step
//
// Each `step()`:
//
//   1. Applies commands in order (watering, speed, shading refresh).
//   2. Scales the frame delta by the sim speed and advances the clock. A
//      paused garden stops here.
//   3. Drains scheduled events up to the new clock (periodic shading).
//   4. Updates every plant in `BTreeMap` order: water decay, light from the
//      source height and the shading reduction, then one growth evaluation.
//      A successful growth regenerates the plant's geometry; reaching the
//      cap also spawns foliage, exactly once.
//
// Every outward change is reported as a `SimEvent` and logged through
// `tracing`.
//
// See also: `scheduler.rs` for the growth decision, `plant.rs` for entity
// state and geometry regeneration, `shading.rs` for neighbor shading,
// `scene.rs` for publishing geometry to a renderer, `command.rs` and
// `event.rs` for the input and output types.
//
// **Critical constraint: determinism.** All randomness comes from the
// single `GardenRng`, consumed in a fixed order: placement, then per tick
// each plant in id order. Iteration uses `BTreeMap` only.

use crate::command::SimCommand;
use crate::config::{GardenConfig, ShadingRefresh};
use crate::environment::DayPhase;
use crate::event::{EventQueue, ScheduledEventKind, SimEvent, SimEventKind};
use crate::grammar::Grammar;
use crate::plant::{Obstacle, ObstacleKind, Placed, Plant};
use crate::prng::GardenRng;
use crate::scene::{self, AssetError, AssetLoader};
use crate::scheduler::{GrowthDecision, GrowthPhase, GrowthRoll};
use crate::shading::{self, Occluder, ShadingSnapshot};
use crate::types::*;
use std::collections::BTreeMap;
use std::fmt;

/// Per-frame input from the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickInput {
    /// Wall-clock seconds since the previous frame.
    pub delta_seconds: f64,
    /// World position of the light source this frame.
    pub light_source: Vec3,
}

impl TickInput {
    pub fn new(delta_seconds: f64, light_source: Vec3) -> Self {
        Self {
            delta_seconds,
            light_source,
        }
    }
}

/// The result of processing commands and advancing the simulation.
#[derive(Debug)]
pub struct StepResult {
    pub events: Vec<SimEvent>,
}

pub struct SimState {
    /// Sim time in milliseconds (speed-scaled).
    pub clock_ms: f64,
    pub rng: GardenRng,
    pub config: GardenConfig,
    pub speed: SimSpeed,
    pub growth_roll: GrowthRoll,
    pub event_queue: EventQueue,
    pub plants: BTreeMap<PlantId, Plant>,
    pub obstacles: BTreeMap<ObstacleId, Obstacle>,
    /// Light source position from the latest tick.
    pub light_source: Vec3,
    grammar: Grammar,
}

impl SimState {
    /// Create an empty garden with default config and the given seed.
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, GardenConfig::default())
    }

    /// Create an empty garden with the given seed and config.
    ///
    /// The config should already have passed `GardenConfig::validate()`. An
    /// invalid grammar falls back to the bare axiom with no rules.
    pub fn with_config(seed: u64, config: GardenConfig) -> Self {
        let grammar = Grammar::from_params(&config.plant_profile.grammar).unwrap_or_else(|err| {
            tracing::warn!(%err, "plant grammar rejected, growing the axiom only");
            Grammar {
                axiom: config.plant_profile.grammar.axiom.as_str().into(),
                rules: Default::default(),
                max_iterations: 0,
            }
        });
        let mut event_queue = EventQueue::new();
        if let ShadingRefresh::Every { interval_ms } = config.shading.refresh {
            event_queue.schedule(interval_ms.max(1), ScheduledEventKind::ShadingRefresh);
        }
        Self {
            clock_ms: 0.0,
            rng: GardenRng::new(seed),
            config,
            speed: SimSpeed::Normal,
            growth_roll: GrowthRoll::Stochastic,
            event_queue,
            plants: BTreeMap::new(),
            obstacles: BTreeMap::new(),
            light_source: Vec3::ZERO,
            grammar,
        }
    }

    /// Current sim time in whole milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.clock_ms as u64
    }

    pub fn plant(&self, id: PlantId) -> Option<&Plant> {
        self.plants.get(&id)
    }

    pub fn day_phase(&self) -> DayPhase {
        DayPhase::from_height(self.light_source.y, self.config.sun.orbit_radius)
    }

    fn event(&self, kind: SimEventKind) -> SimEvent {
        SimEvent {
            at_ms: self.now_ms(),
            kind,
        }
    }

    // -----------------------------------------------------------------------
    // Placement
    // -----------------------------------------------------------------------

    /// Pot a new plant at `position`. Fails without creating anything if the
    /// pot model cannot be loaded.
    pub fn place_plant(
        &mut self,
        position: GroundPos,
        loader: &mut dyn AssetLoader,
        events: &mut Vec<SimEvent>,
    ) -> Result<PlantId, AssetError> {
        let pot = loader.load(scene::POT_ASSET)?;
        let id = PlantId::new(&mut self.rng);
        let plant = Plant::new(id, position, pot, &self.config, self.clock_ms);
        self.plants.insert(id, plant);
        tracing::info!(plant = %id, %position, "plant potted");
        events.push(self.event(SimEventKind::PlantPlaced {
            plant_id: id,
            position,
        }));
        Ok(id)
    }

    pub fn place_obstacle(
        &mut self,
        position: GroundPos,
        kind: ObstacleKind,
        loader: &mut dyn AssetLoader,
        events: &mut Vec<SimEvent>,
    ) -> Result<ObstacleId, AssetError> {
        let model = loader.load(scene::obstacle_asset(kind))?;
        let id = ObstacleId::new(&mut self.rng);
        self.obstacles.insert(
            id,
            Obstacle {
                id,
                position,
                kind,
                model,
            },
        );
        tracing::info!(obstacle = %id, ?kind, %position, "obstacle placed");
        events.push(self.event(SimEventKind::ObstaclePlaced {
            obstacle_id: id,
            kind,
            position,
        }));
        Ok(id)
    }

    /// Random position on the grid, at least `min_spacing` from everything
    /// already placed. After `max_attempts` misses the last candidate is
    /// used anyway.
    fn random_free_position(&mut self) -> GroundPos {
        let layout = &self.config.layout;
        let span = layout.grid_size - 2.0;
        let offset = layout.grid_size / 2.0 - 1.0;
        let min_spacing = layout.min_spacing;
        let max_attempts = layout.max_attempts.max(1);

        let mut candidate = GroundPos::new(0.0, 0.0);
        for _ in 0..max_attempts {
            candidate = GroundPos::new(
                self.rng.next_f32() * span - offset,
                self.rng.next_f32() * span - offset,
            );
            let clear = self
                .plants
                .values()
                .map(Placed::ground_position)
                .chain(self.obstacles.values().map(Placed::ground_position))
                .all(|p| p.distance(candidate) >= min_spacing);
            if clear {
                return candidate;
            }
        }
        tracing::warn!(%candidate, "no free spot found, accepting crowded position");
        candidate
    }

    /// Scatter the configured pots and obstacles, then compute shading.
    ///
    /// All or nothing: if any model fails to load, every plant and obstacle
    /// placed by this call is removed again before the error is returned.
    pub fn populate(&mut self, loader: &mut dyn AssetLoader) -> Result<StepResult, AssetError> {
        let mut events = Vec::new();
        let mut placed = PlacedEntities::default();
        if let Err(err) = self.scatter(loader, &mut placed, &mut events) {
            for id in &placed.plants {
                self.plants.remove(id);
            }
            for id in &placed.obstacles {
                self.obstacles.remove(id);
            }
            tracing::warn!(
                %err,
                plants = placed.plants.len(),
                obstacles = placed.obstacles.len(),
                "garden setup failed, placements rolled back"
            );
            return Err(err);
        }
        self.refresh_shading(&mut events);
        Ok(StepResult { events })
    }

    fn scatter(
        &mut self,
        loader: &mut dyn AssetLoader,
        placed: &mut PlacedEntities,
        events: &mut Vec<SimEvent>,
    ) -> Result<(), AssetError> {
        for _ in 0..self.config.layout.plant_count {
            let position = self.random_free_position();
            placed.plants.push(self.place_plant(position, loader, events)?);
        }
        for _ in 0..self.config.layout.resolved_obstacle_count() {
            let position = self.random_free_position();
            let kind = if self.rng.random_bool(0.5) {
                ObstacleKind::Crate
            } else {
                ObstacleKind::Rock
            };
            placed
                .obstacles
                .push(self.place_obstacle(position, kind, loader, events)?);
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Shading
    // -----------------------------------------------------------------------

    /// Recompute every plant's light reduction from a fresh position snapshot.
    pub fn refresh_shading(&mut self, events: &mut Vec<SimEvent>) {
        let occluder = |entity: &dyn Placed| Occluder {
            kind: entity.occluder_kind(),
            position: entity.ground_position(),
        };
        let snapshot = ShadingSnapshot::new(
            self.plants
                .values()
                .map(|p| occluder(p))
                .chain(self.obstacles.values().map(|o| occluder(o)))
                .collect(),
        );
        let subjects: Vec<(PlantId, GroundPos)> =
            self.plants.values().map(|p| (p.id, p.position)).collect();
        let results = shading::shade_all(&subjects, &snapshot, &self.config.shading);
        for (id, result) in results {
            if let Some(plant) = self.plants.get_mut(&id) {
                tracing::debug!(
                    plant = %id,
                    reduction = result.reduction,
                    neighbors = result.neighbors.len(),
                    "shading updated"
                );
                plant.apply_shading(result);
            }
        }
        events.push(self.event(SimEventKind::ShadingRefreshed {
            plants: subjects.len(),
        }));
    }

    // -----------------------------------------------------------------------
    // Step
    // -----------------------------------------------------------------------

    /// Apply `commands`, then advance the garden by one frame.
    pub fn step(&mut self, commands: &[SimCommand], input: TickInput) -> StepResult {
        let mut events = Vec::new();
        for cmd in commands {
            self.apply_command(cmd, &mut events);
        }

        self.light_source = input.light_source;
        if self.speed == SimSpeed::Paused {
            return StepResult { events };
        }

        let frame_seconds = if input.delta_seconds.is_finite() {
            input.delta_seconds.max(0.0)
        } else {
            0.0
        };
        let delta_seconds = frame_seconds * self.speed.multiplier();
        self.clock_ms += delta_seconds * 1000.0;

        let now = self.now_ms();
        while let Some(event) = self.event_queue.pop_if_ready(now) {
            self.process_event(event.kind, &mut events);
        }

        self.update_plants(delta_seconds as f32, &mut events);
        StepResult { events }
    }

    fn apply_command(&mut self, cmd: &SimCommand, events: &mut Vec<SimEvent>) {
        match cmd {
            SimCommand::WaterPlant { plant_id } => self.water_plant(*plant_id, events),
            SimCommand::WaterAll => {
                let ids: Vec<PlantId> = self.plants.keys().copied().collect();
                for id in ids {
                    self.water_plant(id, events);
                }
            }
            SimCommand::SetSimSpeed { speed } => {
                self.speed = *speed;
                tracing::info!(?speed, "sim speed changed");
                events.push(self.event(SimEventKind::SpeedChanged { speed: *speed }));
            }
            SimCommand::RefreshShading => self.refresh_shading(events),
        }
    }

    fn water_plant(&mut self, plant_id: PlantId, events: &mut Vec<SimEvent>) {
        let amount = self.config.water.watering_amount;
        let Some(plant) = self.plants.get_mut(&plant_id) else {
            tracing::debug!(plant = %plant_id, "watering ignored: no such plant");
            return;
        };
        plant.add_water(amount);
        let water = plant.water;
        tracing::info!(plant = %plant_id, water, "plant watered");
        events.push(self.event(SimEventKind::PlantWatered { plant_id, water }));
    }

    fn process_event(&mut self, kind: ScheduledEventKind, events: &mut Vec<SimEvent>) {
        match kind {
            ScheduledEventKind::ShadingRefresh => {
                self.refresh_shading(events);
                if let ShadingRefresh::Every { interval_ms } = self.config.shading.refresh {
                    let next = self.now_ms() + interval_ms.max(1);
                    self.event_queue
                        .schedule(next, ScheduledEventKind::ShadingRefresh);
                }
            }
        }
    }

    fn update_plants(&mut self, delta_seconds: f32, events: &mut Vec<SimEvent>) {
        let at_ms = self.now_ms();
        let Self {
            clock_ms,
            rng,
            config,
            growth_roll,
            plants,
            light_source,
            grammar,
            ..
        } = self;
        let now = *clock_ms;
        let profile = &config.plant_profile;

        for plant in plants.values_mut() {
            plant.decay_water(config.water.decay_per_second, delta_seconds);
            plant.update_light(light_source.y, config.light.reference_height);

            let water_factor = plant.water_factor();
            let light_factor = plant.light_factor();
            let previous_block = plant.growth.last_block;
            let decision = plant.growth.evaluate(
                now,
                water_factor,
                light_factor,
                &config.growth,
                *growth_roll,
                rng,
            );
            let plant_id = plant.id;
            let mut emit = |kind| events.push(SimEvent { at_ms, kind });

            match decision {
                GrowthDecision::Waiting | GrowthDecision::Capped => {}
                GrowthDecision::Blocked(reason) => {
                    if previous_block != Some(reason) {
                        tracing::debug!(plant = %plant_id, ?reason, "growth blocked");
                        emit(SimEventKind::GrowthBlocked {
                            plant_id,
                            reason,
                            water: plant.water,
                            light: plant.light,
                        });
                    }
                }
                GrowthDecision::RollFailed { chance } => {
                    tracing::debug!(plant = %plant_id, chance, "growth roll failed");
                    emit(SimEventKind::GrowthRollFailed { plant_id, chance });
                }
                GrowthDecision::Advanced { stage, reached_cap } => {
                    plant.regrow(grammar, profile, rng);
                    let geometry = &plant.geometry;
                    tracing::info!(
                        plant = %plant_id,
                        stage,
                        iterations = geometry.iterations,
                        segments = geometry.segments.len(),
                        "plant grew"
                    );
                    emit(SimEventKind::GrowthAdvanced {
                        plant_id,
                        stage,
                        max_stage: plant.growth.max_stage,
                        iterations: geometry.iterations,
                        segments: geometry.segments.len(),
                    });
                    if reached_cap {
                        tracing::info!(plant = %plant_id, "plant matured");
                        emit(SimEventKind::PlantMatured { plant_id });
                        let tips = plant.tip_count(profile);
                        if let Some(leaves) = plant.spawn_foliage(profile, rng) {
                            if leaves > 0 {
                                tracing::info!(plant = %plant_id, leaves, tips, "foliage spawned");
                                emit(SimEventKind::FoliageSpawned {
                                    plant_id,
                                    leaves,
                                    tips,
                                });
                            }
                        }
                    }
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Reporting
    // -----------------------------------------------------------------------

    /// One status line per plant, in id order.
    pub fn status_report(&self) -> Vec<PlantStatus> {
        self.plants
            .values()
            .map(|p| PlantStatus {
                plant_id: p.id,
                position: p.position,
                water: p.water,
                light: p.light,
                light_reduction: p.light_reduction,
                stage: p.growth.stage,
                max_stage: p.growth.max_stage,
                phase: p.growth.phase,
                neighbors: p.neighbors.len(),
                height: p.geometry.height(),
                segments: p.geometry.segments.len(),
                leaves: p.geometry.leaves.len(),
            })
            .collect()
    }
}

/// Entities inserted by one `populate` call.
#[derive(Default)]
struct PlacedEntities {
    plants: Vec<PlantId>,
    obstacles: Vec<ObstacleId>,
}

/// Snapshot of one plant for the status panel.
#[derive(Clone, Debug, PartialEq)]
pub struct PlantStatus {
    pub plant_id: PlantId,
    pub position: GroundPos,
    pub water: f32,
    pub light: f32,
    pub light_reduction: f32,
    pub stage: u32,
    pub max_stage: u32,
    pub phase: GrowthPhase,
    pub neighbors: usize,
    /// Tallest point of the branch geometry above the pot.
    pub height: f32,
    pub segments: usize,
    pub leaves: usize,
}

impl fmt::Display for PlantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {}: water {:.0}%, light {:.0}% (shaded {:.0}%), ",
            self.plant_id,
            self.position,
            self.water,
            self.light,
            self.light_reduction * 100.0,
        )?;
        write!(
            f,
            "stage {}/{} {:?}, height {:.2}, {} neighbors, {} segments, {} leaves",
            self.stage,
            self.max_stage,
            self.phase,
            self.height,
            self.neighbors,
            self.segments,
            self.leaves,
        )
    }
}
