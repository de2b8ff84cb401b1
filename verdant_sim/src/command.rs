// Commands that mutate garden state from outside the sim.
//
// All external mutations go through `SimCommand`. The sim is a function
// `(state, commands, tick input) -> (new state, events)`; commands are
// applied at the start of `SimState::step()`, before time advances.
//
// Current commands:
// - `WaterPlant`: add one watering's worth of water to a pot (the host maps
//   a click on the pot to this).
// - `WaterAll`: water every pot.
// - `SetSimSpeed`: pause / normal / fast-forward.
// - `RefreshShading`: recompute neighbor shading from current positions.
//
// A command naming an unknown plant is a silent no-op.
//
// See also: `sim.rs` for `apply_command()` which dispatches these, `types.rs`
// for the ID and speed types used here.
//
// **Critical constraint: determinism.** Commands are the sole external input
// to the sim besides the per-tick `TickInput`.

use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SimCommand {
    WaterPlant { plant_id: PlantId },
    WaterAll,
    SetSimSpeed { speed: SimSpeed },
    RefreshShading,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prng::GardenRng;

    #[test]
    fn command_serialization_roundtrip() {
        let mut rng = GardenRng::new(42);
        let commands = vec![
            SimCommand::WaterPlant {
                plant_id: PlantId::new(&mut rng),
            },
            SimCommand::SetSimSpeed {
                speed: SimSpeed::Fast,
            },
            SimCommand::RefreshShading,
        ];
        let json = serde_json::to_string(&commands).unwrap();
        let restored: Vec<SimCommand> = serde_json::from_str(&json).unwrap();
        assert_eq!(commands, restored);
    }

    #[test]
    fn commands_survive_bincode() {
        let cmd = SimCommand::SetSimSpeed {
            speed: SimSpeed::Paused,
        };
        let bytes = bincode::serialize(&cmd).unwrap();
        let restored: SimCommand = bincode::deserialize(&bytes).unwrap();
        assert_eq!(cmd, restored);
    }
}
