pub mod aerodynamics;
pub mod environment;

pub use aerodynamics::{airspeed, alpha_from_lift, drag_from_lift};
pub use environment::{AngleConvention, Environment, UnitSystem};
