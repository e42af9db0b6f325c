pub mod dynamics;
pub mod error;
pub mod gnc;
pub mod io;
pub mod physics;
pub mod sim;
pub mod vehicle;

// Primary surface, re-exported at the crate root
pub use error::SimError;
pub use gnc::ControlGains;
pub use physics::{AngleConvention, Environment, UnitSystem};
pub use sim::{
    GuidanceSim, InitialConditions, SimOptions, StateHistory, StateSample, Tolerances,
};
pub use vehicle::{presets, EnvelopeBuilder, VehicleEnvelope};
