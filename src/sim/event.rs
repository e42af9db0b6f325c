use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Guidance diagnostics
// ---------------------------------------------------------------------------

/// Non-fatal diagnostics raised while stepping. Saturated channels are
/// clamped, never rejected; the event is the only trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GuidanceEvent {
    ThrustCommandSaturated { commanded: f64, limit: f64 },
    ThrustSaturated { limit: f64 },
    LiftCommandSaturated { commanded: f64, limit: f64 },
    LiftSaturated { limit: f64 },
    BankSaturated { commanded: f64, limit: f64 },
    /// A step was requested before any trajectory was commanded; the engine
    /// did not advance.
    MissingCommand,
}

impl fmt::Display for GuidanceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ThrustCommandSaturated { commanded, limit } => {
                write!(f, "commanded thrust {commanded:.1} exceeds max thrust {limit:.1}")
            }
            Self::ThrustSaturated { limit } => {
                write!(f, "thrust clamped to max thrust {limit:.1}")
            }
            Self::LiftCommandSaturated { commanded, limit } => {
                write!(f, "commanded lift {commanded:.1} exceeds max lift {limit:.1}")
            }
            Self::LiftSaturated { limit } => {
                write!(f, "lift clamped to max lift {limit:.1}")
            }
            Self::BankSaturated { commanded, limit } => {
                write!(
                    f,
                    "commanded bank angle {commanded:.4} exceeds max bank angle |{limit:.4}|"
                )
            }
            Self::MissingCommand => {
                write!(f, "no trajectory has been commanded; step skipped")
            }
        }
    }
}

/// Where step diagnostics go. Injected by the caller; the engine never
/// prints on its own.
pub trait EventSink {
    fn record(&mut self, time: f64, event: &GuidanceEvent);
}

/// Default sink: saturations go to `debug!` (a clamped channel fires once
/// per step), missing-command to `warn!`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn record(&mut self, time: f64, event: &GuidanceEvent) {
        match event {
            GuidanceEvent::MissingCommand => warn!("[t={time:.3}] {event}"),
            _ => debug!("[t={time:.3}] {event}"),
        }
    }
}

/// Collecting sink with a shared handle: clone one side into the engine and
/// read the other side afterwards.
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    events: Rc<RefCell<Vec<(f64, GuidanceEvent)>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<(f64, GuidanceEvent)> {
        self.events.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

impl EventSink for EventRecorder {
    fn record(&mut self, time: f64, event: &GuidanceEvent) {
        self.events.borrow_mut().push((time, event.clone()));
    }
}
