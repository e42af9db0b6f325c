use serde::{Deserialize, Serialize};

use crate::sim::integrator::{rk45, IntegrationError, Tolerances};

// ---------------------------------------------------------------------------
// Guidance loop primitives: PI + actuator lag, proportional bank law
// ---------------------------------------------------------------------------

/// Trajectory-error terms persisted between steps. Recomputed when a new
/// trajectory is commanded and again at the top of each loop pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorTerms {
    /// Commanded minus current inertial velocity.
    pub velocity: f64,
    /// v_c * (sin(gamma_c) - sin(gamma)): climb-rate error.
    pub climb_rate: f64,
    /// Commanded minus current heading.
    pub heading: f64,
}

/// One pass through a PI loop with actuator lag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopResponse {
    /// Raw PI output before saturation.
    pub raw_command: f64,
    /// Commanded value after the ceiling clamp; drives the actuator lag.
    pub command: f64,
    /// Actuator state after the lag, re-clamped to the ceiling.
    pub output: f64,
    pub command_saturated: bool,
    pub output_saturated: bool,
}

/// PI guidance loop with integral memory and a first-order actuator lag,
/// shared by the thrust and lift channels.
///
/// Per pass: the integral memory advances with the rate `mass * error` held
/// constant across the interval (zeroth-order hold); the PI command is
/// clamped to the ceiling (no floor, a negative command passes through); the
/// actuator state then follows `dy/dt = bandwidth * (command - y)`, genuinely
/// integrated, and is re-clamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiLag {
    pub kp: f64,
    pub ki: f64,
    /// Actuator lag pole, rad/s.
    pub bandwidth: f64,
    integral: f64,
}

impl PiLag {
    pub fn new(kp: f64, ki: f64, bandwidth: f64) -> Self {
        Self { kp, ki, bandwidth, integral: 0.0 }
    }

    /// Accumulated integral memory (mass-weighted error integral).
    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn advance(
        &mut self,
        mass: f64,
        error: f64,
        previous_output: f64,
        ceiling: f64,
        t: f64,
        dt: f64,
        tol: &Tolerances,
    ) -> Result<LoopResponse, IntegrationError> {
        let [x] = rk45(|_, _| [mass * error], t, [self.integral], t + dt, tol)?;
        self.integral = x;

        let raw_command = self.ki * x + self.kp * mass * error;
        let command_saturated = raw_command > ceiling;
        let command = if command_saturated { ceiling } else { raw_command };

        let w = self.bandwidth;
        let [lagged] = rk45(|_, y| [w * (command - y[0])], t, [previous_output], t + dt, tol)?;
        let output_saturated = lagged > ceiling;
        let output = if output_saturated { ceiling } else { lagged };

        Ok(LoopResponse { raw_command, command, output, command_saturated, output_saturated })
    }
}

/// One pass through the proportional bank law.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BankResponse {
    /// Raw proportional output before the clamp.
    pub raw_command: f64,
    /// Bank angle after the symmetric clamp, rad.
    pub command: f64,
    pub saturated: bool,
}

/// Proportional bank-angle law: `mu = k * (v_c / g) * heading_error`, clamped
/// to the symmetric limit preserving sign. No memory, no actuator lag.
pub fn bank_command(
    gain: f64,
    commanded_velocity: f64,
    gravity: f64,
    heading_error: f64,
    limit: f64,
) -> BankResponse {
    let raw_command = gain * (commanded_velocity / gravity) * heading_error;
    if raw_command.abs() > limit {
        BankResponse { raw_command, command: limit.copysign(raw_command), saturated: true }
    } else {
        BankResponse { raw_command, command: raw_command, saturated: false }
    }
}
