// Water and light model for potted plants.
//
// Both resources are percentages in [0, 100]. Water decays continuously with
// elapsed sim time and is replenished by discrete watering events. Light is
// recomputed every tick from the light source's height above the ground
// plane, then attenuated by the plant's neighbor-shading reduction.
//
// Also hosts the day/night orbit of the light source (`SunOrbit`) and the
// coarse `DayPhase` classification used for status lines. The orbit is a
// circle in the XY plane: the source rises in the east, peaks overhead and
// sets in the west, spending half of each period below the horizon.
//
// All functions here are pure; `plant.rs` applies them to plant state once
// per tick.
//
// See also: `shading.rs` for the reduction factor, `scheduler.rs` which
// gates growth on these levels, `config.rs` for `WaterParams`, `LightParams`
// and `SunParams`.

use crate::config::SunParams;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound of both resource scales.
pub const MAX_LEVEL: f32 = 100.0;

/// Clamp a resource level into [0, 100]. NaN collapses to 0.
pub fn clamp_level(level: f32) -> f32 {
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, MAX_LEVEL)
    }
}

/// Normalize a level to a [0, 1] factor.
pub fn level_factor(level: f32) -> f32 {
    clamp_level(level) / MAX_LEVEL
}

/// Water remaining after `delta_seconds` of decay. Never negative.
pub fn decay_water(water: f32, decay_per_second: f32, delta_seconds: f32) -> f32 {
    let loss = decay_per_second.max(0.0) * delta_seconds.max(0.0);
    clamp_level(water - loss)
}

/// Water after one watering event. Never exceeds 100.
pub fn add_water(water: f32, amount: f32) -> f32 {
    clamp_level(water + amount.max(0.0))
}

/// Unshaded light intensity for a source at `source_height` above the
/// ground plane: proportional to height, saturating at `reference_height`.
/// Zero while the source is at or below the plane.
pub fn raw_light(source_height: f32, reference_height: f32) -> f32 {
    if source_height <= 0.0 || reference_height <= 0.0 {
        return 0.0;
    }
    clamp_level(source_height / reference_height * MAX_LEVEL)
}

/// Light after neighbor shading removes `reduction` (a fraction in [0, 1]).
pub fn shaded_light(raw: f32, reduction: f32) -> f32 {
    clamp_level(raw * (1.0 - reduction.clamp(0.0, 1.0)))
}

// ---------------------------------------------------------------------------
// Light source orbit
// ---------------------------------------------------------------------------

/// Circular day/night orbit of the light source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SunOrbit {
    pub radius: f32,
    pub period_seconds: f32,
}

impl SunOrbit {
    pub fn from_params(params: &SunParams) -> Self {
        Self {
            radius: params.orbit_radius,
            period_seconds: params.period_seconds,
        }
    }

    /// Source position after `elapsed_seconds`. At t = 0 it sits on the
    /// eastern horizon; a quarter period later it is directly overhead.
    pub fn position_at(&self, elapsed_seconds: f64) -> Vec3 {
        let phase = (elapsed_seconds / self.period_seconds as f64).fract();
        let angle = (phase * std::f64::consts::TAU) as f32;
        Vec3::new(angle.cos() * self.radius, angle.sin() * self.radius, 0.0)
    }

    pub fn phase_at(&self, elapsed_seconds: f64) -> DayPhase {
        DayPhase::from_height(self.position_at(elapsed_seconds).y, self.radius)
    }
}

/// Coarse time of day derived from the light source's height.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayPhase {
    Night,
    Dusk,
    Sunset,
    Day,
}

impl DayPhase {
    /// Classify by normalized height `(h + r) / 2r`: above 0.7 is day,
    /// above 0.45 sunset, above 0.3 dusk, otherwise night.
    pub fn from_height(height: f32, orbit_radius: f32) -> Self {
        if orbit_radius <= 0.0 {
            return DayPhase::Night;
        }
        let normalized = (height + orbit_radius) / (2.0 * orbit_radius);
        if normalized > 0.7 {
            DayPhase::Day
        } else if normalized > 0.45 {
            DayPhase::Sunset
        } else if normalized > 0.3 {
            DayPhase::Dusk
        } else {
            DayPhase::Night
        }
    }
}

impl fmt::Display for DayPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DayPhase::Night => "night",
            DayPhase::Dusk => "dusk",
            DayPhase::Sunset => "sunset",
            DayPhase::Day => "day",
        };
        f.write_str(name)
    }
}
