// Per-plant growth scheduling.
//
// Each plant carries a `GrowthState`: its stage, the cap, the sim time of
// its last growth event and a `GrowthPhase`. Once per tick the sim calls
// `GrowthState::evaluate`, which decides whether this tick is a growth
// attempt and, if so, whether it succeeds:
//
// 1. A capped plant is never evaluated again.
// 2. An attempt is due once strictly more than `interval_ms` has elapsed
//    since the last growth event.
// 3. Hard gates: water and light factors must both reach their minimums.
//    A gated attempt consumes nothing; the timer keeps running, so the plant
//    retries every tick until conditions improve.
// 4. Roll: success probability is `water_weight * water + light_weight *
//    light`. A failed roll restarts the timer, so the next attempt waits a
//    full interval.
// 5. Success advances the stage by exactly one and restarts the timer. The
//    caller regenerates geometry and, on reaching the cap, spawns foliage.
//
// `GrowthRoll` lets tests and the headless driver force the roll outcome
// without touching the PRNG.
//
// See also: `plant.rs` which owns `GrowthState`, `sim.rs` which calls
// `evaluate` each tick and turns the decision into events, `config.rs` for
// `GrowthParams`.
//
// **Critical constraint: determinism.** A stochastic roll draws exactly one
// value from the sim PRNG and only when the gates pass.

use crate::config::GrowthParams;
use crate::prng::GardenRng;
use serde::{Deserialize, Serialize};

/// Where a plant is in its growth cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrowthPhase {
    /// Waiting for the interval to elapse.
    #[default]
    Dormant,
    /// Interval elapsed; retrying each tick until the gates pass.
    Evaluating,
    /// Advanced a stage this tick.
    Grown,
    /// Reached the stage cap. Terminal.
    Capped,
}

/// How the growth roll is resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrowthRoll {
    /// Draw from the sim PRNG.
    #[default]
    Stochastic,
    AlwaysSucceed,
    AlwaysFail,
}

/// Which hard gate stopped a growth attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrowthBlock {
    LowWater,
    LowLight,
    LowWaterAndLight,
}

/// Outcome of one `evaluate` call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GrowthDecision {
    /// Interval not yet elapsed.
    Waiting,
    /// Already at the cap.
    Capped,
    Blocked(GrowthBlock),
    RollFailed { chance: f32 },
    Advanced { stage: u32, reached_cap: bool },
}

/// Weighted success probability for a growth roll, in [0, 1].
pub fn growth_chance(water_factor: f32, light_factor: f32, params: &GrowthParams) -> f32 {
    (params.water_weight * water_factor.clamp(0.0, 1.0)
        + params.light_weight * light_factor.clamp(0.0, 1.0))
    .clamp(0.0, 1.0)
}

/// Check the hard gates. `None` means growth may be attempted.
pub fn check_gates(
    water_factor: f32,
    light_factor: f32,
    params: &GrowthParams,
) -> Option<GrowthBlock> {
    let low_water = water_factor < params.min_water_factor;
    let low_light = light_factor < params.min_light_factor;
    match (low_water, low_light) {
        (false, false) => None,
        (true, false) => Some(GrowthBlock::LowWater),
        (false, true) => Some(GrowthBlock::LowLight),
        (true, true) => Some(GrowthBlock::LowWaterAndLight),
    }
}

/// Growth bookkeeping carried by each plant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GrowthState {
    pub stage: u32,
    pub max_stage: u32,
    /// Sim time of the last growth event (or placement), in milliseconds.
    pub last_growth_ms: f64,
    pub phase: GrowthPhase,
    /// Gate that blocked the previous attempt, for change-only reporting.
    pub last_block: Option<GrowthBlock>,
    pub foliage_spawned: bool,
}

impl GrowthState {
    pub fn new(max_stage: u32, now_ms: f64) -> Self {
        Self {
            stage: 0,
            max_stage,
            last_growth_ms: now_ms,
            phase: GrowthPhase::Dormant,
            last_block: None,
            foliage_spawned: false,
        }
    }

    pub fn is_capped(&self) -> bool {
        self.stage >= self.max_stage
    }

    /// Milliseconds since the last growth event. Never negative.
    pub fn elapsed_ms(&self, now_ms: f64) -> f64 {
        (now_ms - self.last_growth_ms).max(0.0)
    }

    pub fn is_due(&self, now_ms: f64, interval_ms: u64) -> bool {
        self.elapsed_ms(now_ms) > interval_ms as f64
    }

    /// Restart the interval timer at `now_ms`.
    pub fn reset_timer(&mut self, now_ms: f64) {
        self.last_growth_ms = now_ms;
    }

    /// Decide this tick's growth outcome and update the state accordingly.
    pub fn evaluate(
        &mut self,
        now_ms: f64,
        water_factor: f32,
        light_factor: f32,
        params: &GrowthParams,
        roll: GrowthRoll,
        rng: &mut GardenRng,
    ) -> GrowthDecision {
        if self.is_capped() {
            self.phase = GrowthPhase::Capped;
            return GrowthDecision::Capped;
        }
        if !self.is_due(now_ms, params.interval_ms) {
            self.phase = GrowthPhase::Dormant;
            return GrowthDecision::Waiting;
        }

        self.phase = GrowthPhase::Evaluating;
        if let Some(block) = check_gates(water_factor, light_factor, params) {
            self.last_block = Some(block);
            return GrowthDecision::Blocked(block);
        }
        self.last_block = None;

        let chance = growth_chance(water_factor, light_factor, params);
        let success = match roll {
            GrowthRoll::Stochastic => rng.random_bool(chance as f64),
            GrowthRoll::AlwaysSucceed => true,
            GrowthRoll::AlwaysFail => false,
        };
        self.reset_timer(now_ms);
        if !success {
            self.phase = GrowthPhase::Dormant;
            return GrowthDecision::RollFailed { chance };
        }

        self.stage += 1;
        let reached_cap = self.is_capped();
        self.phase = if reached_cap {
            GrowthPhase::Capped
        } else {
            GrowthPhase::Grown
        };
        GrowthDecision::Advanced {
            stage: self.stage,
            reached_cap,
        }
    }
}
