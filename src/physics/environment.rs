use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Unit systems and ambient physical constants
// ---------------------------------------------------------------------------

/// Unit system a vehicle envelope (and everything downstream) is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitSystem {
    /// ft, ft/s, slug, lbf
    Imperial,
    /// m, m/s, kg, N
    Metric,
}

/// Angle convention an envelope declares for its angular constants.
/// The guidance law computes in radians only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AngleConvention {
    Radians,
    Degrees,
}

pub mod imperial {
    pub const GRAVITY: f64 = 32.17; // ft/s^2
    pub const SEA_LEVEL_DENSITY: f64 = 0.0023769; // slug/ft^3
    pub const EARTH_RADIUS: f64 = 20_902_231.0; // ft, mean spherical
    pub const MPH_TO_FPS: f64 = 5280.0 / 3600.0;
}

pub mod metric {
    pub const GRAVITY: f64 = 9.80665; // m/s^2
    pub const SEA_LEVEL_DENSITY: f64 = 1.225; // kg/m^3
    pub const EARTH_RADIUS: f64 = 6_371_000.0; // m, mean spherical
}

/// Ambient constants resolved from the envelope's unit system.
///
/// Air density is held at the sea-level value: the performance model treats
/// the atmosphere as uniform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub gravity: f64,
    pub air_density: f64,
    pub earth_radius: f64,
}

impl Environment {
    pub fn for_units(units: UnitSystem) -> Self {
        match units {
            UnitSystem::Imperial => Self {
                gravity: imperial::GRAVITY,
                air_density: imperial::SEA_LEVEL_DENSITY,
                earth_radius: imperial::EARTH_RADIUS,
            },
            UnitSystem::Metric => Self {
                gravity: metric::GRAVITY,
                air_density: metric::SEA_LEVEL_DENSITY,
                earth_radius: metric::EARTH_RADIUS,
            },
        }
    }
}
