// Garden events: the internal scheduling queue and the outward event stream.
//
// This file defines two related but distinct concepts:
// - `ScheduledEvent`: internal events in a priority queue ordered by
//   `(at_ms, sequence)`, drained as the sim clock passes them. Used for
//   periodic work that is not tied to a single plant (shading refresh).
// - `SimEvent`: host-visible events emitted as the output of each step.
//   Every `SimEvent` has a one-line `Display` form used as the garden's
//   status log.
//
// Per-plant growth timing lives on each plant's `GrowthState`, not in the
// queue: a plant may need to retry every tick while its gates are closed.
//
// See also: `sim.rs` for the step loop that drains the queue and emits
// `SimEvent`s, `scene.rs` which forwards geometry events to the renderer.
//
// **Critical constraint: determinism.** The `(at_ms, sequence)` key gives
// scheduled events a total order.

use crate::plant::ObstacleKind;
use crate::scheduler::GrowthBlock;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;

// ---------------------------------------------------------------------------
// Internal scheduled events (priority queue)
// ---------------------------------------------------------------------------

/// An event scheduled for future processing by the simulation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScheduledEvent {
    /// Sim time in whole milliseconds at which this event fires.
    pub at_ms: u64,
    /// Tiebreaker within the same millisecond; lower fires first.
    pub sequence: u64,
    pub kind: ScheduledEventKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduledEventKind {
    /// Recompute neighbor shading and reschedule.
    ShadingRefresh,
}

// We want a min-heap: lowest (at_ms, sequence) fires first.
// Rust's BinaryHeap is a max-heap, so we reverse the ordering.
impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.at_ms == other.at_ms && self.sequence == other.sequence
    }
}

impl Eq for ScheduledEvent {}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .at_ms
            .cmp(&self.at_ms)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Min-heap of scheduled events (earliest fires first).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EventQueue {
    heap: BinaryHeap<ScheduledEvent>,
    next_sequence: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, at_ms: u64, kind: ScheduledEventKind) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.heap.push(ScheduledEvent {
            at_ms,
            sequence,
            kind,
        });
    }

    pub fn peek_time(&self) -> Option<u64> {
        self.heap.peek().map(|e| e.at_ms)
    }

    /// Pop the next event if it fires at or before `up_to_ms`.
    pub fn pop_if_ready(&mut self, up_to_ms: u64) -> Option<ScheduledEvent> {
        if self.heap.peek().is_some_and(|e| e.at_ms <= up_to_ms) {
            self.heap.pop()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Host-visible events (output)
// ---------------------------------------------------------------------------

/// An event emitted by the simulation for the host and the status log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    /// Sim time in whole milliseconds when the event occurred.
    pub at_ms: u64,
    pub kind: SimEventKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SimEventKind {
    PlantPlaced {
        plant_id: PlantId,
        position: GroundPos,
    },
    ObstaclePlaced {
        obstacle_id: ObstacleId,
        kind: ObstacleKind,
        position: GroundPos,
    },
    PlantWatered {
        plant_id: PlantId,
        water: f32,
    },
    /// The interval elapsed but a hard gate stopped growth. Emitted when the
    /// blocking reason changes, not on every retry.
    GrowthBlocked {
        plant_id: PlantId,
        reason: GrowthBlock,
        water: f32,
        light: f32,
    },
    GrowthRollFailed {
        plant_id: PlantId,
        chance: f32,
    },
    /// A stage was gained and the plant's geometry replaced.
    GrowthAdvanced {
        plant_id: PlantId,
        stage: u32,
        max_stage: u32,
        iterations: u32,
        segments: usize,
    },
    PlantMatured {
        plant_id: PlantId,
    },
    FoliageSpawned {
        plant_id: PlantId,
        leaves: usize,
        tips: usize,
    },
    ShadingRefreshed {
        plants: usize,
    },
    SpeedChanged {
        speed: SimSpeed,
    },
}

impl fmt::Display for SimEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimEventKind::PlantPlaced { plant_id, position } => {
                write!(f, "{plant_id} potted at {position}")
            }
            SimEventKind::ObstaclePlaced {
                obstacle_id,
                kind,
                position,
            } => write!(f, "{obstacle_id} ({kind:?}) placed at {position}"),
            SimEventKind::PlantWatered { plant_id, water } => {
                write!(f, "{plant_id} watered: {water:.0}%")
            }
            SimEventKind::GrowthBlocked {
                plant_id,
                reason,
                water,
                light,
            } => {
                let why = match reason {
                    GrowthBlock::LowWater => "not enough water",
                    GrowthBlock::LowLight => "not enough light",
                    GrowthBlock::LowWaterAndLight => "not enough water or light",
                };
                write!(
                    f,
                    "{plant_id} cannot grow: {why} (water {water:.0}%, light {light:.0}%)"
                )
            }
            SimEventKind::GrowthRollFailed { plant_id, chance } => {
                write!(f, "{plant_id} did not grow this time ({:.0}% chance)", chance * 100.0)
            }
            SimEventKind::GrowthAdvanced {
                plant_id,
                stage,
                max_stage,
                iterations,
                segments,
            } => write!(
                f,
                "{plant_id} grew to stage {stage}/{max_stage} ({iterations} iterations, {segments} segments)"
            ),
            SimEventKind::PlantMatured { plant_id } => {
                write!(f, "{plant_id} reached full growth")
            }
            SimEventKind::FoliageSpawned {
                plant_id,
                leaves,
                tips,
            } => write!(f, "{plant_id} sprouted {leaves} leaves on {tips} tips"),
            SimEventKind::ShadingRefreshed { plants } => {
                write!(f, "shading refreshed for {plants} plants")
            }
            SimEventKind::SpeedChanged { speed } => write!(f, "speed set to {speed:?}"),
        }
    }
}

impl fmt::Display for SimEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:>8.1}s] {}", self.at_ms as f64 / 1000.0, self.kind)
    }
}
