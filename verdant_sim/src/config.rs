// Data-driven garden configuration.
//
// All tunable parameters live in `GardenConfig`, loadable from JSON at
// startup. The growth engine never uses magic numbers; it reads from the
// config. `Default` reproduces the reference garden: five pots on a 20x20
// grid, a sun orbiting at radius 50 every 24 seconds, growth attempts every
// 5 seconds up to stage 4.
//
// Plant shape parameters are grouped into a `PlantProfile` with three nested
// groups: `GrammarParams` (axiom + production rules), `TurtleParams` (branch
// angle, length, thickness, taper) and `FoliageParams` (tip threshold and leaf
// scatter). Named preset constructors (`PlantProfile::bush()`, `::fern()`,
// `::sapling()`) produce different plant archetypes from the same parameter
// set.
//
// Loading goes through `GardenConfig::from_json` / `GardenConfig::load`, both
// of which run `validate()`; a config built in code should be validated by
// the caller before it reaches `SimState::with_config`.
//
// See also: `sim.rs` which owns the `GardenConfig` as part of `SimState`,
// `grammar.rs` which compiles `GrammarParams`, `turtle.rs` which scales
// `TurtleParams` by the plant's water/light factors.

use crate::grammar::{GrammarError, RuleSet, SymbolString};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors from loading or validating a `GardenConfig`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("invalid plant grammar: {0}")]
    Grammar(#[from] GrammarError),
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn check_unit(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} is outside [0, 1]")))
    }
}

fn check_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} must be positive and finite")))
    }
}

// ---------------------------------------------------------------------------
// Plant profile: nested parameter groups
// ---------------------------------------------------------------------------

/// One production rule: every `predecessor` symbol is replaced by the
/// `successor` string on each rewrite iteration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionRule {
    pub predecessor: char,
    pub successor: String,
}

impl ProductionRule {
    pub fn new(predecessor: char, successor: &str) -> Self {
        Self {
            predecessor,
            successor: successor.to_string(),
        }
    }
}

/// Rewrite grammar for a plant archetype.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GrammarParams {
    /// Starting string, e.g. `"F"`.
    pub axiom: String,
    /// Production rules. Symbols without a rule rewrite to themselves.
    pub rules: Vec<ProductionRule>,
    /// Nominal rewrite iterations contributed by each growth stage. The
    /// effective count is `floor(stage * iterations_per_stage * light * water)`.
    pub iterations_per_stage: u32,
    /// Hard ceiling on the effective iteration count so a single growth step
    /// always finishes inside one tick.
    pub max_iterations: u32,
}

/// Turtle interpretation parameters, before water/light scaling.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TurtleParams {
    /// Branching angle for the rotate symbols, in degrees.
    pub angle_degrees: f32,
    /// Length of one draw step under ideal conditions, in world units.
    pub base_length: f32,
    /// Thickness of the first segment under ideal conditions.
    pub base_thickness: f32,
    /// Multiplier applied to thickness after each draw (0, 1].
    pub taper: f32,
    /// Uniform jitter range applied to each segment's length.
    pub length_jitter: (f32, f32),
    /// Scale applied at zero water/light. Length scales with light and
    /// thickness with water, linearly from this floor up to 1.0.
    pub condition_floor: f32,
}

/// Leaf scatter parameters for the foliage spawner.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FoliageParams {
    /// An attachment point is a tip if its thickness is below this fraction
    /// of the pass's base thickness.
    pub tip_threshold: f32,
    /// Fraction of tips that receive a leaf (rounded up).
    pub leaf_fraction: f32,
    /// Hard cap on leaves per plant.
    pub max_leaves: u32,
    /// Per-axis random offset applied to each leaf position.
    pub position_jitter: f32,
    /// Random orientation jitter (radians) on pitch and roll.
    pub rotation_jitter: f32,
    /// Uniform jitter range applied to each leaf's scale.
    pub scale_range: (f32, f32),
}

/// Complete plant shape profile.
///
/// Named presets:
/// - `bush()`: the reference grammar `F → FF+[+F-F-F]-[-F+F+F]` (the default)
/// - `fern()`: fronds grown from a non-drawing `X` apex
/// - `sapling()`: a single leader with alternating side shoots
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlantProfile {
    pub grammar: GrammarParams,
    pub turtle: TurtleParams,
    pub foliage: FoliageParams,
}

impl PlantProfile {
    /// Dense bush: the reference grammar.
    pub fn bush() -> Self {
        Self {
            grammar: GrammarParams {
                axiom: "F".into(),
                rules: vec![ProductionRule::new('F', "FF+[+F-F-F]-[-F+F+F]")],
                iterations_per_stage: 1,
                max_iterations: 5,
            },
            turtle: TurtleParams {
                angle_degrees: 22.5,
                base_length: 0.25,
                base_thickness: 0.08,
                taper: 0.7,
                length_jitter: (0.9, 1.1),
                condition_floor: 0.6,
            },
            foliage: FoliageParams {
                tip_threshold: 0.3,
                leaf_fraction: 0.7,
                max_leaves: 50,
                position_jitter: 0.05,
                rotation_jitter: 0.5,
                scale_range: (0.8, 1.2),
            },
        }
    }

    /// Fern: `X` grows fronds but never draws itself.
    pub fn fern() -> Self {
        Self {
            grammar: GrammarParams {
                axiom: "X".into(),
                rules: vec![
                    ProductionRule::new('X', "F+[[X]-X]-F[-FX]+X"),
                    ProductionRule::new('F', "FF"),
                ],
                iterations_per_stage: 1,
                max_iterations: 5,
            },
            turtle: TurtleParams {
                angle_degrees: 25.0,
                base_length: 0.2,
                base_thickness: 0.05,
                taper: 0.75,
                length_jitter: (0.9, 1.1),
                condition_floor: 0.5,
            },
            foliage: FoliageParams {
                tip_threshold: 0.3,
                leaf_fraction: 0.7,
                max_leaves: 50,
                position_jitter: 0.04,
                rotation_jitter: 0.7,
                scale_range: (0.6, 1.0),
            },
        }
    }

    /// Sapling: a tall leader with alternating side shoots.
    pub fn sapling() -> Self {
        Self {
            grammar: GrammarParams {
                axiom: "F".into(),
                rules: vec![ProductionRule::new('F', "F[+F]F[-F]F")],
                iterations_per_stage: 1,
                max_iterations: 5,
            },
            turtle: TurtleParams {
                angle_degrees: 25.7,
                base_length: 0.3,
                base_thickness: 0.1,
                taper: 0.8,
                length_jitter: (0.9, 1.1),
                condition_floor: 0.6,
            },
            foliage: FoliageParams {
                tip_threshold: 0.3,
                leaf_fraction: 0.7,
                max_leaves: 40,
                position_jitter: 0.06,
                rotation_jitter: 0.4,
                scale_range: (0.9, 1.3),
            },
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let grammar = &self.grammar;
        if grammar.axiom.is_empty() {
            return Err(GrammarError::EmptyAxiom.into());
        }
        SymbolString::from(grammar.axiom.as_str()).check_balanced()?;
        RuleSet::from_rules(&grammar.rules)?;
        if grammar.iterations_per_stage == 0 {
            return Err(invalid("grammar.iterations_per_stage", "must be at least 1"));
        }

        let turtle = &self.turtle;
        if !turtle.angle_degrees.is_finite() {
            return Err(invalid("turtle.angle_degrees", "must be finite"));
        }
        check_positive("turtle.base_length", turtle.base_length)?;
        check_positive("turtle.base_thickness", turtle.base_thickness)?;
        check_positive("turtle.taper", turtle.taper)?;
        check_unit("turtle.taper", turtle.taper)?;
        let (lo, hi) = turtle.length_jitter;
        if !(lo > 0.0 && lo <= hi) {
            return Err(invalid(
                "turtle.length_jitter",
                format!("({lo}, {hi}) must satisfy 0 < low <= high"),
            ));
        }
        check_unit("turtle.condition_floor", turtle.condition_floor)?;

        let foliage = &self.foliage;
        check_positive("foliage.tip_threshold", foliage.tip_threshold)?;
        check_unit("foliage.tip_threshold", foliage.tip_threshold)?;
        check_unit("foliage.leaf_fraction", foliage.leaf_fraction)?;
        let (lo, hi) = foliage.scale_range;
        if !(lo > 0.0 && lo <= hi) {
            return Err(invalid(
                "foliage.scale_range",
                format!("({lo}, {hi}) must satisfy 0 < low <= high"),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Environment and scheduling groups
// ---------------------------------------------------------------------------

/// Growth scheduler thresholds and timing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GrowthParams {
    /// Minimum real time between growth attempts, in milliseconds.
    pub interval_ms: u64,
    /// Growth stage at which the plant is capped and foliage is spawned.
    pub max_stage: u32,
    /// Hard gate: `water / 100` must be at least this to attempt growth.
    pub min_water_factor: f32,
    /// Hard gate: `light / 100` must be at least this to attempt growth.
    pub min_light_factor: f32,
    /// Weight of the water factor in the success probability.
    pub water_weight: f32,
    /// Weight of the light factor in the success probability.
    pub light_weight: f32,
}

/// Soil moisture model.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WaterParams {
    /// Water level of a freshly placed pot, in [0, 100].
    pub initial_level: f32,
    /// Continuous loss in percentage points per second.
    pub decay_per_second: f32,
    /// Amount added by one watering event.
    pub watering_amount: f32,
}

/// Light model.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LightParams {
    /// Light source height that yields 100% raw intensity.
    pub reference_height: f32,
    /// Light level of a freshly placed pot before its first tick.
    pub initial_level: f32,
}

/// How often neighbor shading is recomputed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadingRefresh {
    /// Once after the garden is populated (and on explicit request).
    AtSetup,
    /// Periodically, from a fresh position snapshot each time.
    Every { interval_ms: u64 },
}

/// Neighbor shading model.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShadingParams {
    /// Neighbors farther than this (ground-plane distance) cast no shade.
    pub radius: f32,
    /// Reduction contributed by each neighboring plant.
    pub plant_increment: f32,
    /// Reduction contributed by each neighboring obstacle.
    pub obstacle_increment: f32,
    /// Cap on the total reduction; shading never fully blocks light.
    pub max_reduction: f32,
    /// Half-angle of each cardinal direction's cone, in degrees.
    pub cone_half_angle_degrees: f32,
    pub refresh: ShadingRefresh,
}

/// Random garden layout.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LayoutParams {
    /// Side length of the square garden grid, centered on the origin.
    pub grid_size: f32,
    /// Number of pots placed by `SimState::populate`.
    pub plant_count: u32,
    /// Number of obstacles. `None` places `ceil(plant_count / 2)`.
    pub obstacle_count: Option<u32>,
    /// Minimum ground distance between any two placed entities.
    pub min_spacing: f32,
    /// Rejection-sampling attempts per entity before accepting the last candidate.
    pub max_attempts: u32,
}

impl LayoutParams {
    pub fn resolved_obstacle_count(&self) -> u32 {
        self.obstacle_count.unwrap_or(self.plant_count.div_ceil(2))
    }
}

/// Day/night orbit of the light source.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SunParams {
    pub orbit_radius: f32,
    pub period_seconds: f32,
}

// ---------------------------------------------------------------------------
// Top-level garden config
// ---------------------------------------------------------------------------

/// Top-level garden configuration. Loaded from JSON, never mutated at runtime.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GardenConfig {
    pub growth: GrowthParams,
    pub water: WaterParams,
    pub light: LightParams,
    pub shading: ShadingParams,
    pub layout: LayoutParams,
    pub sun: SunParams,
    pub plant_profile: PlantProfile,
}

impl Default for GardenConfig {
    fn default() -> Self {
        Self {
            growth: GrowthParams {
                interval_ms: 5000,
                max_stage: 4,
                min_water_factor: 0.5,
                min_light_factor: 0.2,
                water_weight: 0.6,
                light_weight: 0.4,
            },
            water: WaterParams {
                initial_level: 100.0,
                decay_per_second: 1.0,
                watering_amount: 30.0,
            },
            light: LightParams {
                reference_height: 50.0,
                initial_level: 0.0,
            },
            shading: ShadingParams {
                radius: 4.0,
                plant_increment: 0.15,
                obstacle_increment: 0.25,
                max_reduction: 0.8,
                cone_half_angle_degrees: 45.0,
                refresh: ShadingRefresh::AtSetup,
            },
            layout: LayoutParams {
                grid_size: 20.0,
                plant_count: 5,
                obstacle_count: None,
                min_spacing: 2.0,
                max_attempts: 50,
            },
            sun: SunParams {
                orbit_radius: 50.0,
                period_seconds: 24.0,
            },
            plant_profile: PlantProfile::bush(),
        }
    }
}

impl GardenConfig {
    /// Parse and validate a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GardenConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Check every parameter group for values the engine cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let growth = &self.growth;
        if growth.interval_ms == 0 {
            return Err(invalid("growth.interval_ms", "must be at least 1"));
        }
        if growth.max_stage == 0 {
            return Err(invalid("growth.max_stage", "must be at least 1"));
        }
        check_unit("growth.min_water_factor", growth.min_water_factor)?;
        check_unit("growth.min_light_factor", growth.min_light_factor)?;
        check_unit("growth.water_weight", growth.water_weight)?;
        check_unit("growth.light_weight", growth.light_weight)?;
        if growth.water_weight + growth.light_weight > 1.0 + f32::EPSILON {
            return Err(invalid(
                "growth.water_weight",
                "water_weight + light_weight must not exceed 1",
            ));
        }

        let water = &self.water;
        if !(0.0..=100.0).contains(&water.initial_level) {
            return Err(invalid("water.initial_level", "must be within [0, 100]"));
        }
        if !(water.decay_per_second >= 0.0 && water.decay_per_second.is_finite()) {
            return Err(invalid("water.decay_per_second", "must be non-negative"));
        }
        if !(water.watering_amount >= 0.0 && water.watering_amount.is_finite()) {
            return Err(invalid("water.watering_amount", "must be non-negative"));
        }

        check_positive("light.reference_height", self.light.reference_height)?;
        if !(0.0..=100.0).contains(&self.light.initial_level) {
            return Err(invalid("light.initial_level", "must be within [0, 100]"));
        }

        let shading = &self.shading;
        check_positive("shading.radius", shading.radius)?;
        if shading.plant_increment < 0.0 || shading.obstacle_increment < 0.0 {
            return Err(invalid("shading.plant_increment", "increments must be non-negative"));
        }
        if !(0.0..1.0).contains(&shading.max_reduction) {
            return Err(invalid("shading.max_reduction", "must be within [0, 1)"));
        }
        if !(shading.cone_half_angle_degrees > 0.0 && shading.cone_half_angle_degrees <= 90.0) {
            return Err(invalid(
                "shading.cone_half_angle_degrees",
                "must be within (0, 90]",
            ));
        }
        if let ShadingRefresh::Every { interval_ms: 0 } = shading.refresh {
            return Err(invalid("shading.refresh", "refresh interval must be at least 1 ms"));
        }

        let layout = &self.layout;
        if !(layout.grid_size > 2.0 && layout.grid_size.is_finite()) {
            return Err(invalid("layout.grid_size", "must be greater than 2"));
        }
        if layout.min_spacing < 0.0 {
            return Err(invalid("layout.min_spacing", "must be non-negative"));
        }
        if layout.max_attempts == 0 {
            return Err(invalid("layout.max_attempts", "must be at least 1"));
        }

        check_positive("sun.orbit_radius", self.sun.orbit_radius)?;
        check_positive("sun.period_seconds", self.sun.period_seconds)?;

        self.plant_profile.validate()
    }
}
