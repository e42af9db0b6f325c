pub mod envelope;

pub use envelope::{presets, EnvelopeBuilder, VehicleEnvelope};
