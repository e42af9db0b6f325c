use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Committed simulation state: one sample + column-wise history
// ---------------------------------------------------------------------------

/// One committed row of simulation state. The engine holds the latest sample
/// and appends a copy to the history at the end of every step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateSample {
    pub time: f64,
    pub mass: f64,              // slug / kg
    pub velocity: f64,          // inertial speed, ft/s / m/s
    pub flight_path_angle: f64, // rad
    pub heading: f64,           // rad, clockwise from north
    pub latitude: f64,          // rad
    pub longitude: f64,         // rad
    pub altitude: f64,
    pub airspeed: f64,
    pub alpha: f64,             // rad
    pub drag: f64,
    pub bank: f64,              // rad, wind-axes
    pub thrust: f64,
    pub lift: f64,
    pub alpha_commanded: f64,   // advisory guidance output
    pub altitude_commanded: f64,
}

/// Column-wise state history: one sequence per `StateSample` field, all kept
/// at equal length (steps + 1) by committing whole rows atomically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateHistory {
    pub time: Vec<f64>,
    pub mass: Vec<f64>,
    pub velocity: Vec<f64>,
    pub flight_path_angle: Vec<f64>,
    pub heading: Vec<f64>,
    pub latitude: Vec<f64>,
    pub longitude: Vec<f64>,
    pub altitude: Vec<f64>,
    pub airspeed: Vec<f64>,
    pub alpha: Vec<f64>,
    pub drag: Vec<f64>,
    pub bank: Vec<f64>,
    pub thrust: Vec<f64>,
    pub lift: Vec<f64>,
    pub alpha_commanded: Vec<f64>,
    pub altitude_commanded: Vec<f64>,
}

impl StateHistory {
    pub(crate) fn push(&mut self, s: &StateSample) {
        self.time.push(s.time);
        self.mass.push(s.mass);
        self.velocity.push(s.velocity);
        self.flight_path_angle.push(s.flight_path_angle);
        self.heading.push(s.heading);
        self.latitude.push(s.latitude);
        self.longitude.push(s.longitude);
        self.altitude.push(s.altitude);
        self.airspeed.push(s.airspeed);
        self.alpha.push(s.alpha);
        self.drag.push(s.drag);
        self.bank.push(s.bank);
        self.thrust.push(s.thrust);
        self.lift.push(s.lift);
        self.alpha_commanded.push(s.alpha_commanded);
        self.altitude_commanded.push(s.altitude_commanded);
    }

    /// Reassemble the row committed at `index`.
    pub fn sample(&self, index: usize) -> Option<StateSample> {
        if index >= self.len() {
            return None;
        }
        Some(StateSample {
            time: self.time[index],
            mass: self.mass[index],
            velocity: self.velocity[index],
            flight_path_angle: self.flight_path_angle[index],
            heading: self.heading[index],
            latitude: self.latitude[index],
            longitude: self.longitude[index],
            altitude: self.altitude[index],
            airspeed: self.airspeed[index],
            alpha: self.alpha[index],
            drag: self.drag[index],
            bank: self.bank[index],
            thrust: self.thrust[index],
            lift: self.lift[index],
            alpha_commanded: self.alpha_commanded[index],
            altitude_commanded: self.altitude_commanded[index],
        })
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// True when every column holds the same number of rows.
    pub fn columns_aligned(&self) -> bool {
        let n = self.time.len();
        [
            self.mass.len(),
            self.velocity.len(),
            self.flight_path_angle.len(),
            self.heading.len(),
            self.latitude.len(),
            self.longitude.len(),
            self.altitude.len(),
            self.airspeed.len(),
            self.alpha.len(),
            self.drag.len(),
            self.bank.len(),
            self.thrust.len(),
            self.lift.len(),
            self.alpha_commanded.len(),
            self.altitude_commanded.len(),
        ]
        .iter()
        .all(|&len| len == n)
    }
}
