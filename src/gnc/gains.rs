use serde::{Deserialize, Serialize};

use crate::error::SimError;

// ---------------------------------------------------------------------------
// Guidance loop gains
// ---------------------------------------------------------------------------

/// PI/P gains for the three guidance loops: thrust (PI), lift (PI), and
/// bank (P only). Set once when the engine is built, immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlGains {
    pub k_thrust_p: f64,
    pub k_thrust_i: f64,
    pub k_lift_p: f64,
    pub k_lift_i: f64,
    pub k_bank_p: f64,
}

impl ControlGains {
    pub fn new(
        k_thrust_p: f64,
        k_thrust_i: f64,
        k_lift_p: f64,
        k_lift_i: f64,
        k_bank_p: f64,
    ) -> Self {
        Self { k_thrust_p, k_thrust_i, k_lift_p, k_lift_i, k_bank_p }
    }

    /// A negative gain flips the feedback sign, so all five must be finite
    /// and non-negative.
    pub fn validate(&self) -> Result<(), SimError> {
        let gains = [
            (self.k_thrust_p, "k_thrust_p"),
            (self.k_thrust_i, "k_thrust_i"),
            (self.k_lift_p, "k_lift_p"),
            (self.k_lift_i, "k_lift_i"),
            (self.k_bank_p, "k_bank_p"),
        ];
        for (gain, field) in gains {
            if !gain.is_finite() || gain < 0.0 {
                return Err(SimError::InvalidGains(format!(
                    "{field} must be finite and non-negative, got {gain}"
                )));
            }
        }
        Ok(())
    }
}
