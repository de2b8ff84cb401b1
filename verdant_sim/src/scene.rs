// Collaborator seams: asset loading and scene-graph publishing.
//
// The sim never talks to a renderer directly. Two traits separate it from
// its host:
//
// - `AssetLoader` resolves the pot and obstacle models at placement time.
//   A failure propagates out of `SimState::place_plant` /
//   `SimState::place_obstacle` and no entity is created.
// - `SceneGraph` receives each plant's geometry whenever the sim replaces
//   it. `publish_events` drives it from a tick's `SimEvent`s.
//
// `InMemoryAssets` is a loader that always succeeds with sequential handles,
// for headless runs and tests.
//
// See also: `sim.rs` for placement and the event stream, `mesh.rs` for
// turning published geometry into triangles.

use crate::event::{SimEvent, SimEventKind};
use crate::plant::{ObstacleKind, PlantGeometry};
use crate::sim::SimState;
use crate::types::PlantId;
use serde::{Deserialize, Serialize};

/// Opaque handle to a loaded model, owned by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetHandle(pub u64);

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset `{name}` not found")]
    NotFound { name: String },
    #[error("failed to load asset `{name}`: {reason}")]
    Load { name: String, reason: String },
}

/// Model names requested from the loader.
pub const POT_ASSET: &str = "pot";

pub fn obstacle_asset(kind: ObstacleKind) -> &'static str {
    match kind {
        ObstacleKind::Crate => "crate",
        ObstacleKind::Rock => "rock",
    }
}

pub trait AssetLoader {
    fn load(&mut self, name: &str) -> Result<AssetHandle, AssetError>;
}

/// Loader that hands out sequential handles and remembers what was asked for.
#[derive(Clone, Debug, Default)]
pub struct InMemoryAssets {
    pub loaded: Vec<(String, AssetHandle)>,
}

impl AssetLoader for InMemoryAssets {
    fn load(&mut self, name: &str) -> Result<AssetHandle, AssetError> {
        let handle = AssetHandle(self.loaded.len() as u64);
        self.loaded.push((name.to_string(), handle));
        Ok(handle)
    }
}

pub trait SceneGraph {
    fn attach_geometry(&mut self, plant: PlantId, geometry: &PlantGeometry);
    fn detach_geometry(&mut self, plant: PlantId);
}

/// Push geometry changes from `events` into `scene`. Prior geometry is
/// always detached before the replacement is attached.
pub fn publish_events(events: &[SimEvent], state: &SimState, scene: &mut dyn SceneGraph) {
    for event in events {
        let plant_id = match &event.kind {
            SimEventKind::GrowthAdvanced { plant_id, .. }
            | SimEventKind::FoliageSpawned { plant_id, .. } => *plant_id,
            _ => continue,
        };
        let Some(plant) = state.plants.get(&plant_id) else {
            continue;
        };
        scene.detach_geometry(plant_id);
        scene.attach_geometry(plant_id, &plant.geometry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::SimCommand;
    use crate::config::GardenConfig;
    use crate::scheduler::GrowthRoll;
    use crate::sim::TickInput;
    use glam::Vec3;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct RecordingScene {
        attached: BTreeMap<PlantId, usize>,
        detaches: usize,
    }

    impl SceneGraph for RecordingScene {
        fn attach_geometry(&mut self, plant: PlantId, geometry: &PlantGeometry) {
            let previous = self.attached.insert(plant, geometry.segments.len());
            assert!(previous.is_none(), "attached without detaching first");
        }

        fn detach_geometry(&mut self, plant: PlantId) {
            if self.attached.remove(&plant).is_some() {
                self.detaches += 1;
            }
        }
    }

    #[test]
    fn in_memory_assets_hand_out_sequential_handles() {
        let mut assets = InMemoryAssets::default();
        assert_eq!(assets.load(POT_ASSET).unwrap(), AssetHandle(0));
        assert_eq!(assets.load("rock").unwrap(), AssetHandle(1));
        assert_eq!(assets.loaded[1].0, "rock");
    }

    #[test]
    fn growth_events_replace_published_geometry() {
        let mut config = GardenConfig::default();
        config.growth.interval_ms = 100;
        config.growth.max_stage = 2;
        let mut state = SimState::with_config(11, config);
        state.growth_roll = GrowthRoll::AlwaysSucceed;
        let mut assets = InMemoryAssets::default();
        let mut events = Vec::new();
        let id = state
            .place_plant(crate::types::GroundPos::new(0.0, 0.0), &mut assets, &mut events)
            .unwrap();

        let mut scene = RecordingScene::default();
        let noon = Vec3::new(0.0, 50.0, 0.0);
        for _ in 0..30 {
            let result = state.step(&[] as &[SimCommand], TickInput::new(0.05, noon));
            publish_events(&result.events, &state, &mut scene);
        }
        assert_eq!(state.plants[&id].growth.stage, 2);
        assert_eq!(scene.attached.get(&id), Some(&state.plants[&id].geometry.segments.len()));
        // Two growth steps and one foliage spawn, each replacing the last.
        assert_eq!(scene.detaches, 2);
    }
}
