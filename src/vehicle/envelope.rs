use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::physics::environment::{imperial, AngleConvention, UnitSystem};

// ---------------------------------------------------------------------------
// Vehicle performance envelope (immutable once built)
// ---------------------------------------------------------------------------

/// Performance constants of one airframe.
///
/// The guidance engine takes its own copy at construction; the envelope is
/// never mutated afterwards. Angular constants follow the `angles` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleEnvelope {
    pub name: String,
    pub weight_max: f64,   // lbf (Imperial) / N (Metric)
    pub weight_min: f64,
    pub speed_max: f64,    // ft/s / m/s
    pub speed_min: f64,
    pub kf: f64,           // fuel burn per unit thrust per unit time, slug/(lbf*s)
    pub omega_thrust: f64, // thrust actuator bandwidth, rad/s
    pub omega_lift: f64,   // lift actuator bandwidth, rad/s
    pub omega_mu: f64,     // bank actuator bandwidth, rad/s; the bank loop applies no lag
    pub thrust_max: f64,
    pub k_lift_max: f64,   // lift ceiling coefficient: L_max = k * v^2
    pub mu_max: f64,       // bank angle limit
    pub cd0: f64,          // zero-lift drag coefficient
    pub cl_alpha: f64,     // lift-curve slope, per rad
    pub alpha_0: f64,      // zero-lift angle of attack
    pub wing_area: f64,    // ft^2 / m^2
    pub aspect_ratio: f64,
    pub wing_eff: f64,     // Oswald span efficiency
    pub units: UnitSystem,
    pub angles: AngleConvention,
}

impl VehicleEnvelope {
    /// Fail-fast sanity check of every constant. Called by the builder and
    /// again by the guidance engine at construction.
    pub fn validate(&self) -> Result<(), SimError> {
        let numeric = [
            (self.weight_max, "weight_max"),
            (self.weight_min, "weight_min"),
            (self.speed_max, "speed_max"),
            (self.speed_min, "speed_min"),
            (self.kf, "kf"),
            (self.omega_thrust, "omega_thrust"),
            (self.omega_lift, "omega_lift"),
            (self.omega_mu, "omega_mu"),
            (self.thrust_max, "thrust_max"),
            (self.k_lift_max, "k_lift_max"),
            (self.mu_max, "mu_max"),
            (self.cd0, "cd0"),
            (self.cl_alpha, "cl_alpha"),
            (self.alpha_0, "alpha_0"),
            (self.wing_area, "wing_area"),
            (self.aspect_ratio, "aspect_ratio"),
            (self.wing_eff, "wing_eff"),
        ];
        for (value, field) in numeric {
            if !value.is_finite() {
                return Err(SimError::InvalidEnvelope(format!(
                    "{field} must be finite, got {value}"
                )));
            }
        }

        if self.weight_min <= 0.0 || self.weight_max <= self.weight_min {
            return Err(SimError::InvalidEnvelope(format!(
                "weight bounds must satisfy 0 < weight_min < weight_max, \
                 got [{}, {}]",
                self.weight_min, self.weight_max
            )));
        }
        if self.speed_min <= 0.0 || self.speed_max <= self.speed_min {
            return Err(SimError::InvalidEnvelope(format!(
                "speed bounds must satisfy 0 < speed_min < speed_max, got [{}, {}]",
                self.speed_min, self.speed_max
            )));
        }
        if self.kf < 0.0 {
            return Err(SimError::InvalidEnvelope(format!(
                "fuel burn coefficient must be non-negative, got {}",
                self.kf
            )));
        }
        for (bandwidth, field) in [
            (self.omega_thrust, "omega_thrust"),
            (self.omega_lift, "omega_lift"),
            (self.omega_mu, "omega_mu"),
        ] {
            if bandwidth <= 0.0 {
                return Err(SimError::InvalidEnvelope(format!(
                    "{field} must be positive, got {bandwidth}"
                )));
            }
        }
        if self.thrust_max <= 0.0 {
            return Err(SimError::InvalidEnvelope(format!(
                "thrust_max must be positive, got {}",
                self.thrust_max
            )));
        }
        if self.k_lift_max <= 0.0 {
            return Err(SimError::InvalidEnvelope(format!(
                "k_lift_max must be positive, got {}",
                self.k_lift_max
            )));
        }
        let mu_limit = match self.angles {
            AngleConvention::Radians => std::f64::consts::FRAC_PI_2,
            AngleConvention::Degrees => 90.0,
        };
        if self.mu_max <= 0.0 || self.mu_max > mu_limit {
            return Err(SimError::InvalidEnvelope(format!(
                "mu_max must lie in (0, {mu_limit}], got {}",
                self.mu_max
            )));
        }
        if self.cd0 <= 0.0 || self.cl_alpha <= 0.0 {
            return Err(SimError::InvalidEnvelope(format!(
                "drag and lift-slope coefficients must be positive, got cd0 {} / cl_alpha {}",
                self.cd0, self.cl_alpha
            )));
        }
        if self.wing_area <= 0.0 || self.aspect_ratio <= 0.0 {
            return Err(SimError::InvalidEnvelope(format!(
                "wing geometry must be positive, got area {} / aspect ratio {}",
                self.wing_area, self.aspect_ratio
            )));
        }
        if self.wing_eff <= 0.0 || self.wing_eff > 1.0 {
            return Err(SimError::InvalidEnvelope(format!(
                "wing efficiency must lie in (0, 1], got {}",
                self.wing_eff
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Envelope builder
// ---------------------------------------------------------------------------

pub struct EnvelopeBuilder {
    name: String,
    weight_max: f64,
    weight_min: f64,
    speed_max: f64,
    speed_min: f64,
    kf: f64,
    omega_thrust: f64,
    omega_lift: f64,
    omega_mu: f64,
    thrust_max: f64,
    k_lift_max: f64,
    mu_max: f64,
    cd0: f64,
    cl_alpha: f64,
    alpha_0: f64,
    wing_area: f64,
    aspect_ratio: f64,
    wing_eff: f64,
    units: UnitSystem,
    angles: AngleConvention,
}

impl EnvelopeBuilder {
    /// Generic mid-size transport defaults (Imperial, radians).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weight_max: 100_000.0,
            weight_min: 50_000.0,
            speed_max: 800.0,
            speed_min: 200.0,
            kf: 4.0e-6,
            omega_thrust: 2.0,
            omega_lift: 2.5,
            omega_mu: 1.0,
            thrust_max: 30_000.0,
            k_lift_max: 2.0,
            mu_max: 30.0_f64.to_radians(),
            cd0: 0.02,
            cl_alpha: 5.0,
            alpha_0: -0.01,
            wing_area: 1000.0,
            aspect_ratio: 8.0,
            wing_eff: 0.6,
            units: UnitSystem::Imperial,
            angles: AngleConvention::Radians,
        }
    }

    pub fn weight_max(mut self, v: f64) -> Self { self.weight_max = v; self }
    pub fn weight_min(mut self, v: f64) -> Self { self.weight_min = v; self }
    pub fn speed_max(mut self, v: f64) -> Self { self.speed_max = v; self }
    pub fn speed_min(mut self, v: f64) -> Self { self.speed_min = v; self }
    pub fn kf(mut self, v: f64) -> Self { self.kf = v; self }
    pub fn omega_thrust(mut self, v: f64) -> Self { self.omega_thrust = v; self }
    pub fn omega_lift(mut self, v: f64) -> Self { self.omega_lift = v; self }
    pub fn omega_mu(mut self, v: f64) -> Self { self.omega_mu = v; self }
    pub fn thrust_max(mut self, v: f64) -> Self { self.thrust_max = v; self }
    pub fn k_lift_max(mut self, v: f64) -> Self { self.k_lift_max = v; self }
    pub fn mu_max(mut self, v: f64) -> Self { self.mu_max = v; self }
    pub fn cd0(mut self, v: f64) -> Self { self.cd0 = v; self }
    pub fn cl_alpha(mut self, v: f64) -> Self { self.cl_alpha = v; self }
    pub fn alpha_0(mut self, v: f64) -> Self { self.alpha_0 = v; self }
    pub fn wing_area(mut self, v: f64) -> Self { self.wing_area = v; self }
    pub fn aspect_ratio(mut self, v: f64) -> Self { self.aspect_ratio = v; self }
    pub fn wing_eff(mut self, v: f64) -> Self { self.wing_eff = v; self }
    pub fn units(mut self, v: UnitSystem) -> Self { self.units = v; self }
    pub fn angles(mut self, v: AngleConvention) -> Self { self.angles = v; self }

    pub fn build(self) -> Result<VehicleEnvelope, SimError> {
        let envelope = VehicleEnvelope {
            name: self.name,
            weight_max: self.weight_max,
            weight_min: self.weight_min,
            speed_max: self.speed_max,
            speed_min: self.speed_min,
            kf: self.kf,
            omega_thrust: self.omega_thrust,
            omega_lift: self.omega_lift,
            omega_mu: self.omega_mu,
            thrust_max: self.thrust_max,
            k_lift_max: self.k_lift_max,
            mu_max: self.mu_max,
            cd0: self.cd0,
            cl_alpha: self.cl_alpha,
            alpha_0: self.alpha_0,
            wing_area: self.wing_area,
            aspect_ratio: self.aspect_ratio,
            wing_eff: self.wing_eff,
            units: self.units,
            angles: self.angles,
        };
        envelope.validate()?;
        Ok(envelope)
    }
}

// ---------------------------------------------------------------------------
// Preset airframes
// ---------------------------------------------------------------------------

pub mod presets {
    use super::*;

    /// C-130 Hercules transport (Imperial units, radians).
    pub fn c130() -> VehicleEnvelope {
        VehicleEnvelope {
            name: "C-130".into(),
            weight_max: 327_000.0,
            weight_min: 157_000.0,
            speed_max: 600.0 * imperial::MPH_TO_FPS,
            speed_min: 200.0 * imperial::MPH_TO_FPS,
            kf: 4.0e-6,
            omega_thrust: 2.0,
            omega_lift: 2.5,
            omega_mu: 1.0,
            thrust_max: 72_000.0,
            k_lift_max: 2.6,
            mu_max: 30.0_f64.to_radians(),
            cd0: 0.0183,
            cl_alpha: 0.0920 / 1.0_f64.to_radians(),
            alpha_0: -0.05_f64.to_radians(),
            wing_area: 1745.0,
            aspect_ratio: 10.1,
            wing_eff: 0.613,
            units: UnitSystem::Imperial,
            angles: AngleConvention::Radians,
        }
    }
}
