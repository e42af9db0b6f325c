use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::physics::aerodynamics;

// ---------------------------------------------------------------------------
// Commanded trajectory (current set-points + append-only histories)
// ---------------------------------------------------------------------------

/// The operator-commanded trajectory: inertial velocity, flight-path angle,
/// and heading, plus the derived commanded airspeed against the engine's
/// wind vector.
///
/// Histories are seeded from the initial conditions and appended exactly once
/// per committed step, whether or not the command changed, so they stay
/// aligned with the state history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandedTrajectory {
    pub velocity: f64,
    pub flight_path_angle: f64,
    pub heading: f64,
    pub airspeed: f64,
    pub velocity_history: Vec<f64>,
    pub flight_path_angle_history: Vec<f64>,
    pub heading_history: Vec<f64>,
    pub airspeed_history: Vec<f64>,
}

impl CommandedTrajectory {
    pub fn new(velocity: f64, flight_path_angle: f64, heading: f64, wind: &Vector3<f64>) -> Self {
        let airspeed = aerodynamics::airspeed(velocity, flight_path_angle, heading, wind);
        Self {
            velocity,
            flight_path_angle,
            heading,
            airspeed,
            velocity_history: vec![velocity],
            flight_path_angle_history: vec![flight_path_angle],
            heading_history: vec![heading],
            airspeed_history: vec![airspeed],
        }
    }

    /// Replace the set-points and refresh the derived airspeed. Effective on
    /// the next step; the history picks it up at that step's commit.
    pub(crate) fn set(
        &mut self,
        velocity: f64,
        flight_path_angle: f64,
        heading: f64,
        wind: &Vector3<f64>,
    ) {
        self.velocity = velocity;
        self.flight_path_angle = flight_path_angle;
        self.heading = heading;
        self.airspeed = aerodynamics::airspeed(velocity, flight_path_angle, heading, wind);
    }

    /// Record the command active during the step that just committed.
    pub(crate) fn save_history(&mut self) {
        self.velocity_history.push(self.velocity);
        self.flight_path_angle_history.push(self.flight_path_angle);
        self.heading_history.push(self.heading);
        self.airspeed_history.push(self.airspeed);
    }

    pub fn len(&self) -> usize {
        self.velocity_history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.velocity_history.is_empty()
    }
}
