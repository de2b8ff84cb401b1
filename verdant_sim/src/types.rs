// Core types shared across the garden simulation.
//
// Defines ground-plane placement (`GroundPos`), entity identifiers
// (strongly-typed UUID v4 wrappers), the four cardinal directions used by
// neighbor shading, and the simulation speed enum. World-space 3D math uses
// `glam::Vec3` throughout (re-exported here for convenience).
//
// Coordinate system (matches the renderer collaborator):
// - X: east  (positive) / west  (negative)
// - Y: up    (positive) / down  (negative)
// - Z: south (positive) / north (negative)
//
// **Critical constraint: determinism.** Entity IDs are generated from the
// sim's `GardenRng`. Do not use external UUID libraries or OS entropy.

use crate::prng::GardenRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub use glam::Vec3;

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// A fixed position on the garden's ground plane. Plants and obstacles never
/// move after placement, so only x and z are stored.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroundPos {
    pub x: f32,
    pub z: f32,
}

impl GroundPos {
    pub const fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    /// Euclidean distance on the ground plane.
    pub fn distance(self, other: Self) -> f32 {
        let dx = other.x - self.x;
        let dz = other.z - self.z;
        (dx * dx + dz * dz).sqrt()
    }
}

impl fmt::Display for GroundPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.z)
    }
}

/// One of the four cardinal directions on the ground plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Cardinal {
    North,
    East,
    South,
    West,
}

impl Cardinal {
    /// Evaluation order for neighbor shading.
    pub const ALL: [Cardinal; 4] = [
        Cardinal::North,
        Cardinal::East,
        Cardinal::South,
        Cardinal::West,
    ];

    /// Unit vector `(dx, dz)` pointing in this direction.
    pub fn unit(self) -> (f32, f32) {
        match self {
            Cardinal::North => (0.0, -1.0),
            Cardinal::East => (1.0, 0.0),
            Cardinal::South => (0.0, 1.0),
            Cardinal::West => (-1.0, 0.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Entity IDs: deterministic UUID v4
// ---------------------------------------------------------------------------

/// A UUID v4, generated deterministically from the simulation PRNG.
///
/// Layout follows RFC 4122: version nibble (bits 48–51) set to `0100` and
/// variant bits (bits 64–65) set to `10`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimUuid([u8; 16]);

impl SimUuid {
    /// Generate a deterministic UUID v4 from the simulation PRNG.
    pub fn new_v4(rng: &mut GardenRng) -> Self {
        let mut bytes = rng.next_128_bits();
        bytes[6] = (bytes[6] & 0x0F) | 0x40;
        bytes[8] = (bytes[8] & 0x3F) | 0x80;
        Self(bytes)
    }

    /// Parse a UUID from its 8-4-4-4-12 hex string representation.
    pub fn parse(s: &str) -> Option<Self> {
        let hex: String = s.chars().filter(|c| *c != '-').collect();
        if hex.len() != 32 || !hex.is_ascii() {
            return None;
        }
        let mut bytes = [0u8; 16];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
        }
        Some(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// First 8 hex digits, for compact log lines.
    pub fn short(&self) -> String {
        format!(
            "{:02x}{:02x}{:02x}{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

// Serialized as the hex string so ids work as JSON map keys.
impl Serialize for SimUuid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SimUuid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        SimUuid::parse(&s).ok_or_else(|| serde::de::Error::custom("invalid UUID format"))
    }
}

impl fmt::Debug for SimUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SimUuid({})", self)
    }
}

impl fmt::Display for SimUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if matches!(i, 4 | 6 | 8 | 10) {
                f.write_str("-")?;
            }
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Strongly-typed entity ID wrappers
// ---------------------------------------------------------------------------

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $tag:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub SimUuid);

        impl $name {
            pub fn new(rng: &mut GardenRng) -> Self {
                Self(SimUuid::new_v4(rng))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $tag, self.0.short())
            }
        }
    };
}

entity_id!(/// Unique identifier for a potted plant.
PlantId, "plant");
entity_id!(/// Unique identifier for a static obstacle (crate, rock).
ObstacleId, "obstacle");

// ---------------------------------------------------------------------------
// Simulation enums
// ---------------------------------------------------------------------------

/// Simulation speed settings. Scales the tick delta before it reaches the
/// growth clock and water decay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimSpeed {
    Paused,
    #[default]
    Normal,
    Fast,
}

impl SimSpeed {
    pub fn multiplier(self) -> f64 {
        match self {
            SimSpeed::Paused => 0.0,
            SimSpeed::Normal => 1.0,
            SimSpeed::Fast => 4.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_v4_version_and_variant_bits() {
        let mut rng = GardenRng::new(42);
        for _ in 0..1000 {
            let uuid = SimUuid::new_v4(&mut rng);
            let bytes = uuid.as_bytes();
            assert_eq!(bytes[6] >> 4, 4, "UUID version must be 4");
            assert_eq!(bytes[8] >> 6, 2, "UUID variant must be RFC 4122");
        }
    }

    #[test]
    fn uuid_display_parses_back() {
        let mut rng = GardenRng::new(42);
        let uuid = SimUuid::new_v4(&mut rng);
        let s = uuid.to_string();
        assert_eq!(s.len(), 36);
        assert_eq!(&s[8..9], "-");
        assert_eq!(&s[23..24], "-");
        assert_eq!(SimUuid::parse(&s), Some(uuid));
    }

    #[test]
    fn uuid_parse_rejects_garbage() {
        assert_eq!(SimUuid::parse("not-a-uuid"), None);
        assert_eq!(SimUuid::parse(&"z".repeat(32)), None);
    }

    #[test]
    fn entity_id_determinism_and_display() {
        let mut rng_a = GardenRng::new(99);
        let mut rng_b = GardenRng::new(99);
        let a = PlantId::new(&mut rng_a);
        assert_eq!(a, PlantId::new(&mut rng_b));
        assert!(a.to_string().starts_with("plant-"));
        assert!(ObstacleId::new(&mut rng_a).to_string().starts_with("obstacle-"));
    }

    #[test]
    fn ground_distance() {
        let a = GroundPos::new(0.0, 0.0);
        let b = GroundPos::new(3.0, 4.0);
        assert_eq!(a.distance(b), 5.0);
        assert_eq!(b.distance(a), 5.0);
    }

    #[test]
    fn cardinal_units_are_orthonormal() {
        for dir in Cardinal::ALL {
            let (dx, dz) = dir.unit();
            assert_eq!(dx * dx + dz * dz, 1.0);
        }
        assert_eq!(Cardinal::North.unit(), (0.0, -1.0));
    }

    #[test]
    fn paused_speed_freezes_time() {
        assert_eq!(SimSpeed::Paused.multiplier(), 0.0);
        assert_eq!(SimSpeed::default(), SimSpeed::Normal);
    }
}
