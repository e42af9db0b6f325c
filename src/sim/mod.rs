pub mod engine;
pub mod event;
pub mod history;
pub mod integrator;

pub use engine::{GuidanceSim, InitialConditions, SimOptions};
pub use event::{EventRecorder, EventSink, GuidanceEvent, LogSink};
pub use history::{StateHistory, StateSample};
pub use integrator::{rk45, IntegrationError, Tolerances};
