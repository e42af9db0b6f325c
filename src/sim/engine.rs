use std::fmt;

use log::warn;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::dynamics::ideal;
use crate::error::SimError;
use crate::gnc::{bank_command, CommandedTrajectory, ControlGains, ErrorTerms, PiLag};
use crate::physics::aerodynamics;
use crate::physics::environment::{AngleConvention, Environment};
use crate::sim::event::{EventSink, GuidanceEvent, LogSink};
use crate::sim::history::{StateHistory, StateSample};
use crate::sim::integrator::{rk45, Tolerances};
use crate::vehicle::VehicleEnvelope;

// ---------------------------------------------------------------------------
// Guidance engine: three-loop guidance law + idealized point-mass dynamics
// ---------------------------------------------------------------------------

/// State of the vehicle at engine construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialConditions {
    pub velocity: f64,          // inertial speed, ft/s / m/s
    pub altitude: f64,
    pub flight_path_angle: f64, // rad
    pub heading: f64,           // rad, clockwise from north
    pub latitude: f64,          // rad
    pub longitude: f64,         // rad
    /// Uniform NED wind, held for the whole run.
    pub wind: Vector3<f64>,
    pub weight: f64,            // lbf / N
}

impl InitialConditions {
    pub fn validate(&self) -> Result<(), SimError> {
        let numeric = [
            (self.velocity, "velocity"),
            (self.altitude, "altitude"),
            (self.flight_path_angle, "flight_path_angle"),
            (self.heading, "heading"),
            (self.latitude, "latitude"),
            (self.longitude, "longitude"),
            (self.weight, "weight"),
            (self.wind.x, "wind north component"),
            (self.wind.y, "wind east component"),
            (self.wind.z, "wind down component"),
        ];
        for (value, field) in numeric {
            if !value.is_finite() {
                return Err(SimError::InvalidInitialConditions(format!(
                    "{field} must be finite, got {value}"
                )));
            }
        }
        if self.velocity <= 0.0 {
            return Err(SimError::InvalidInitialConditions(format!(
                "velocity must be positive, got {}",
                self.velocity
            )));
        }
        if self.weight <= 0.0 {
            return Err(SimError::InvalidInitialConditions(format!(
                "weight must be positive, got {}",
                self.weight
            )));
        }
        if self.latitude.abs() >= std::f64::consts::FRAC_PI_2 {
            return Err(SimError::InvalidInitialConditions(format!(
                "latitude must lie strictly between the poles, got {}",
                self.latitude
            )));
        }
        Ok(())
    }
}

/// Knobs that are fixed at construction but independent of the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimOptions {
    /// Simulation clock at the seeded first row, s.
    pub start_time: f64,
    /// Default step size used by [`GuidanceSim::step`], s.
    pub dt: f64,
    pub tolerances: Tolerances,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self { start_time: 0.0, dt: 0.01, tolerances: Tolerances::default() }
    }
}

impl SimOptions {
    pub fn validate(&self) -> Result<(), SimError> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(SimError::InvalidTimeStep(self.dt));
        }
        if !self.start_time.is_finite() {
            return Err(SimError::InvalidOptions(format!(
                "start time must be finite, got {}",
                self.start_time
            )));
        }
        let Tolerances { rtol, atol } = self.tolerances;
        if !rtol.is_finite() || rtol <= 0.0 || !atol.is_finite() || atol <= 0.0 {
            return Err(SimError::InvalidOptions(format!(
                "integrator tolerances must be positive and finite, got rtol {rtol} / atol {atol}"
            )));
        }
        Ok(())
    }
}

/// Actuator outputs of one guidance pass, consumed by the motion stage.
struct GuidanceOutputs {
    thrust: f64,
    lift: f64,
    bank: f64,
    alpha_commanded: f64,
    altitude_commanded: f64,
}

fn default_sink() -> Box<dyn EventSink> {
    Box::new(LogSink)
}

/// Nonlinear three-loop guidance around idealized point-mass flight dynamics.
///
/// Each step runs the thrust (PI + lag), lift (PI + lag) and bank
/// (proportional) loops against the commanded trajectory, then integrates
/// fuel burn, the wind-axes equations of motion and the geodetic position
/// with every right-hand side held at its start-of-step value. The step
/// commits atomically: one row lands in the state history and one in the
/// command history, or (on error) neither.
///
/// Until a trajectory is commanded the engine idles: stepping reports
/// [`GuidanceEvent::MissingCommand`] and changes nothing.
#[derive(Serialize, Deserialize)]
pub struct GuidanceSim {
    vehicle: VehicleEnvelope,
    environment: Environment,
    thrust_loop: PiLag,
    lift_loop: PiLag,
    bank_gain: f64,
    wind: Vector3<f64>,
    dt: f64,
    tolerances: Tolerances,
    command: CommandedTrajectory,
    commanded: bool,
    errors: ErrorTerms,
    current: StateSample,
    history: StateHistory,
    #[serde(skip, default = "default_sink")]
    sink: Box<dyn EventSink>,
}

impl fmt::Debug for GuidanceSim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuidanceSim")
            .field("vehicle", &self.vehicle.name)
            .field("time", &self.current.time)
            .field("steps", &self.steps())
            .field("commanded", &self.commanded)
            .finish_non_exhaustive()
    }
}

impl GuidanceSim {
    pub fn new(
        vehicle: &VehicleEnvelope,
        gains: ControlGains,
        init: &InitialConditions,
    ) -> Result<Self, SimError> {
        Self::with_options(vehicle, gains, init, SimOptions::default())
    }

    pub fn with_options(
        vehicle: &VehicleEnvelope,
        gains: ControlGains,
        init: &InitialConditions,
        options: SimOptions,
    ) -> Result<Self, SimError> {
        vehicle.validate()?;
        if vehicle.angles != AngleConvention::Radians {
            return Err(SimError::UnsupportedAngleConvention(vehicle.angles));
        }
        gains.validate()?;
        init.validate()?;
        options.validate()?;

        // Flying outside the envelope is a modeling smell, not a
        // contradiction in the configuration; warn and carry on.
        if init.velocity < vehicle.speed_min || init.velocity > vehicle.speed_max {
            warn!(
                "initial velocity {:.1} outside envelope speed bounds [{:.1}, {:.1}]",
                init.velocity, vehicle.speed_min, vehicle.speed_max
            );
        }
        if init.weight < vehicle.weight_min || init.weight > vehicle.weight_max {
            warn!(
                "initial weight {:.0} outside envelope weight bounds [{:.0}, {:.0}]",
                init.weight, vehicle.weight_min, vehicle.weight_max
            );
        }

        let environment = Environment::for_units(vehicle.units);
        let airspeed = aerodynamics::airspeed(
            init.velocity,
            init.flight_path_angle,
            init.heading,
            &init.wind,
        );
        // Thrust and lift start at zero: alpha seeds to the zero-lift angle,
        // drag to the parasite term alone.
        let current = StateSample {
            time: options.start_time,
            mass: init.weight / environment.gravity,
            velocity: init.velocity,
            flight_path_angle: init.flight_path_angle,
            heading: init.heading,
            latitude: init.latitude,
            longitude: init.longitude,
            altitude: init.altitude,
            airspeed,
            alpha: aerodynamics::alpha_from_lift(0.0, airspeed, vehicle, environment.air_density),
            drag: aerodynamics::drag_from_lift(0.0, airspeed, vehicle, environment.air_density),
            bank: 0.0,
            thrust: 0.0,
            lift: 0.0,
            alpha_commanded: 0.0,
            altitude_commanded: 0.0,
        };
        let mut history = StateHistory::default();
        history.push(&current);

        Ok(Self {
            thrust_loop: PiLag::new(gains.k_thrust_p, gains.k_thrust_i, vehicle.omega_thrust),
            lift_loop: PiLag::new(gains.k_lift_p, gains.k_lift_i, vehicle.omega_lift),
            bank_gain: gains.k_bank_p,
            environment,
            command: CommandedTrajectory::new(
                init.velocity,
                init.flight_path_angle,
                init.heading,
                &init.wind,
            ),
            commanded: false,
            errors: ErrorTerms::default(),
            wind: init.wind,
            dt: options.dt,
            tolerances: options.tolerances,
            vehicle: vehicle.clone(),
            current,
            history,
            sink: default_sink(),
        })
    }

    /// Command a new trajectory: inertial velocity, flight-path angle and
    /// heading (ft/s or m/s, rad, rad). Takes effect on the next step.
    pub fn set_command_trajectory(
        &mut self,
        velocity: f64,
        flight_path_angle: f64,
        heading: f64,
    ) -> Result<(), SimError> {
        if !velocity.is_finite() || !flight_path_angle.is_finite() || !heading.is_finite() {
            return Err(SimError::InvalidCommand { velocity, flight_path_angle, heading });
        }
        self.command.set(velocity, flight_path_angle, heading, &self.wind);
        self.errors = ErrorTerms {
            velocity: velocity - self.current.velocity,
            climb_rate: velocity
                * (flight_path_angle.sin() - self.current.flight_path_angle.sin()),
            heading: heading - self.current.heading,
        };
        self.commanded = true;
        Ok(())
    }

    /// Advance one step of the default size.
    pub fn step(&mut self) -> Result<(), SimError> {
        self.step_by(self.dt)
    }

    /// Advance one step of the given size, allowing non-uniform stepping.
    pub fn step_by(&mut self, dt: f64) -> Result<(), SimError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(SimError::InvalidTimeStep(dt));
        }
        if !self.commanded {
            self.sink.record(self.current.time, &GuidanceEvent::MissingCommand);
            return Ok(());
        }

        // A failed step must leave the committed state untouched, loop
        // memories and error terms included.
        let thrust_loop = self.thrust_loop.clone();
        let lift_loop = self.lift_loop.clone();
        let errors = self.errors;
        let next = match self.run_guidance(dt).and_then(|g| self.integrate_motion(&g, dt)) {
            Ok(next) => next,
            Err(e) => {
                self.thrust_loop = thrust_loop;
                self.lift_loop = lift_loop;
                self.errors = errors;
                return Err(e);
            }
        };

        self.current = next;
        self.history.push(&self.current);
        self.command.save_history();
        Ok(())
    }

    /// One pass of the three guidance loops at the start-of-step state.
    fn run_guidance(&mut self, dt: f64) -> Result<GuidanceOutputs, SimError> {
        let t = self.current.time;
        let density = self.environment.air_density;

        // Thrust channel: velocity error in, ceiling at max thrust.
        self.errors.velocity = self.command.velocity - self.current.velocity;
        let thrust = self.thrust_loop.advance(
            self.current.mass,
            self.errors.velocity,
            self.current.thrust,
            self.vehicle.thrust_max,
            t,
            dt,
            &self.tolerances,
        )?;
        if thrust.command_saturated {
            self.sink.record(
                t,
                &GuidanceEvent::ThrustCommandSaturated {
                    commanded: thrust.raw_command,
                    limit: self.vehicle.thrust_max,
                },
            );
        }
        if thrust.output_saturated {
            self.sink
                .record(t, &GuidanceEvent::ThrustSaturated { limit: self.vehicle.thrust_max });
        }

        // Lift channel: climb-rate error in, ceiling rebuilt every pass from
        // the current inertial velocity.
        let lift_ceiling = self.vehicle.k_lift_max * self.current.velocity * self.current.velocity;
        self.errors.climb_rate = self.command.velocity
            * (self.command.flight_path_angle.sin() - self.current.flight_path_angle.sin());
        let lift = self.lift_loop.advance(
            self.current.mass,
            self.errors.climb_rate,
            self.current.lift,
            lift_ceiling,
            t,
            dt,
            &self.tolerances,
        )?;
        if lift.command_saturated {
            self.sink.record(
                t,
                &GuidanceEvent::LiftCommandSaturated {
                    commanded: lift.raw_command,
                    limit: lift_ceiling,
                },
            );
        }
        if lift.output_saturated {
            self.sink.record(t, &GuidanceEvent::LiftSaturated { limit: lift_ceiling });
        }

        // Advisory outputs: the angle of attack realizing the clamped lift
        // command at the pre-step airspeed, and the altitude the commanded
        // climb profile reaches by the end of this step.
        let alpha_commanded = aerodynamics::alpha_from_lift(
            lift.command,
            self.current.airspeed,
            &self.vehicle,
            density,
        );
        let altitude_commanded = self.command.flight_path_angle.sin()
            * self.command.velocity
            * (t + dt)
            + self.history.altitude[0];

        // Bank channel: proportional only, no actuator lag.
        self.errors.heading = self.command.heading - self.current.heading;
        let bank = bank_command(
            self.bank_gain,
            self.command.velocity,
            self.environment.gravity,
            self.errors.heading,
            self.vehicle.mu_max,
        );
        if bank.saturated {
            self.sink.record(
                t,
                &GuidanceEvent::BankSaturated {
                    commanded: bank.raw_command,
                    limit: self.vehicle.mu_max,
                },
            );
        }

        Ok(GuidanceOutputs {
            thrust: thrust.output,
            lift: lift.output,
            bank: bank.command,
            alpha_commanded,
            altitude_commanded,
        })
    }

    /// Integrate fuel burn, the wind-axes equations of motion and the
    /// geodetic position over one step, every rate held at its
    /// start-of-interval value (zeroth-order hold).
    fn integrate_motion(
        &self,
        guidance: &GuidanceOutputs,
        dt: f64,
    ) -> Result<StateSample, SimError> {
        let t = self.current.time;
        let tol = &self.tolerances;
        let density = self.environment.air_density;

        // Fuel burn first: the translational equations see the post-burn mass.
        let mass_rate = ideal::fuel_burn_rate(self.vehicle.kf, guidance.thrust);
        let [mass] = rk45(|_, _| [mass_rate], t, [self.current.mass], t + dt, tol)?;

        // Aerodynamic response to the new lift, keyed to the pre-step airspeed.
        let alpha =
            aerodynamics::alpha_from_lift(guidance.lift, self.current.airspeed, &self.vehicle, density);
        let drag =
            aerodynamics::drag_from_lift(guidance.lift, self.current.airspeed, &self.vehicle, density);

        let rates = ideal::wind_axes_rates(
            guidance.thrust,
            drag,
            guidance.lift,
            guidance.bank,
            mass,
            self.current.velocity,
            self.current.flight_path_angle,
            self.environment.gravity,
        );
        let [velocity, flight_path_angle, heading] = rk45(
            |_, _| rates,
            t,
            [self.current.velocity, self.current.flight_path_angle, self.current.heading],
            t + dt,
            tol,
        )?;

        // Airspeed is derived, never integrated.
        let airspeed = aerodynamics::airspeed(velocity, flight_path_angle, heading, &self.wind);

        // Geodetic rates take the new velocity triple against the pre-step
        // altitude and latitude.
        let geodetic = ideal::geodetic_rates(
            velocity,
            flight_path_angle,
            heading,
            self.current.altitude,
            self.current.latitude,
            self.environment.earth_radius,
        );
        let [latitude, longitude, altitude] = rk45(
            |_, _| geodetic,
            t,
            [self.current.latitude, self.current.longitude, self.current.altitude],
            t + dt,
            tol,
        )?;

        Ok(StateSample {
            time: t + dt,
            mass,
            velocity,
            flight_path_angle,
            heading,
            latitude,
            longitude,
            altitude,
            airspeed,
            alpha,
            drag,
            bank: guidance.bank,
            thrust: guidance.thrust,
            lift: guidance.lift,
            alpha_commanded: guidance.alpha_commanded,
            altitude_commanded: guidance.altitude_commanded,
        })
    }

    // --- Queries -----------------------------------------------------------

    /// Simulation clock at the last committed row, s.
    pub fn time(&self) -> f64 {
        self.current.time
    }

    /// Committed steps so far (history rows minus the seeded first row).
    pub fn steps(&self) -> usize {
        self.history.len().saturating_sub(1)
    }

    pub fn current(&self) -> &StateSample {
        &self.current
    }

    pub fn history(&self) -> &StateHistory {
        &self.history
    }

    pub fn command(&self) -> &CommandedTrajectory {
        &self.command
    }

    /// True once a trajectory has been commanded.
    pub fn is_commanded(&self) -> bool {
        self.commanded
    }

    /// Error terms from the most recent guidance pass (or command).
    pub fn errors(&self) -> ErrorTerms {
        self.errors
    }

    pub fn vehicle(&self) -> &VehicleEnvelope {
        &self.vehicle
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn gains(&self) -> ControlGains {
        ControlGains::new(
            self.thrust_loop.kp,
            self.thrust_loop.ki,
            self.lift_loop.kp,
            self.lift_loop.ki,
            self.bank_gain,
        )
    }

    pub fn wind(&self) -> &Vector3<f64> {
        &self.wind
    }

    /// Default step size, s.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn thrust_loop(&self) -> &PiLag {
        &self.thrust_loop
    }

    pub fn lift_loop(&self) -> &PiLag {
        &self.lift_loop
    }

    /// Replace where step diagnostics are delivered.
    pub fn set_event_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sink = sink;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::environment::imperial;
    use crate::sim::event::EventRecorder;
    use crate::vehicle::presets;
    use approx::assert_relative_eq;

    fn gains() -> ControlGains {
        ControlGains::new(0.08, 0.002, 0.5, 0.01, 0.075)
    }

    fn level_init() -> InitialConditions {
        InitialConditions {
            velocity: 400.0 * imperial::MPH_TO_FPS,
            altitude: 0.0,
            flight_path_angle: 0.0,
            heading: 0.0,
            latitude: 33.2098_f64.to_radians(),
            longitude: (-87.5692_f64).to_radians(),
            wind: Vector3::zeros(),
            weight: 300_000.0,
        }
    }

    fn engine() -> GuidanceSim {
        GuidanceSim::new(&presets::c130(), gains(), &level_init()).unwrap()
    }

    #[test]
    fn construction_seeds_one_row() {
        let sim = engine();
        assert_eq!(sim.history().len(), 1);
        assert_eq!(sim.command().len(), 1);
        assert!(!sim.is_commanded());
        assert_eq!(sim.steps(), 0);
        assert_eq!(sim.gains(), gains());

        let s = sim.current();
        assert_relative_eq!(s.mass, 300_000.0 / imperial::GRAVITY, epsilon = 1e-9);
        assert_eq!(s.thrust, 0.0);
        assert_eq!(s.lift, 0.0);
        assert_eq!(s.bank, 0.0);
        assert_relative_eq!(s.alpha, presets::c130().alpha_0, epsilon = 1e-15);
        assert_relative_eq!(s.airspeed, s.velocity, epsilon = 1e-9);
        assert!(s.drag > 0.0, "parasite drag at the initial airspeed");
    }

    #[test]
    fn wind_changes_seeded_airspeed() {
        let mut init = level_init();
        init.wind = Vector3::new(
            25.0 * imperial::MPH_TO_FPS,
            25.0 * imperial::MPH_TO_FPS,
            0.0,
        );
        let sim = GuidanceSim::new(&presets::c130(), gains(), &init).unwrap();
        let expected = aerodynamics::airspeed(init.velocity, 0.0, 0.0, &init.wind);
        assert_relative_eq!(sim.current().airspeed, expected, epsilon = 1e-12);
        assert!(sim.current().airspeed < init.velocity, "net quartering tailwind");
    }

    #[test]
    fn degrees_envelope_is_rejected() {
        let mut vehicle = presets::c130();
        vehicle.angles = AngleConvention::Degrees;
        vehicle.mu_max = 30.0;
        let err = GuidanceSim::new(&vehicle, gains(), &level_init()).unwrap_err();
        assert!(matches!(
            err,
            SimError::UnsupportedAngleConvention(AngleConvention::Degrees)
        ));
    }

    #[test]
    fn bad_initial_conditions_are_rejected() {
        let mut init = level_init();
        init.velocity = 0.0;
        assert!(matches!(
            GuidanceSim::new(&presets::c130(), gains(), &init),
            Err(SimError::InvalidInitialConditions(_))
        ));

        let mut init = level_init();
        init.weight = -100.0;
        assert!(matches!(
            GuidanceSim::new(&presets::c130(), gains(), &init),
            Err(SimError::InvalidInitialConditions(_))
        ));

        let mut init = level_init();
        init.latitude = std::f64::consts::FRAC_PI_2;
        assert!(matches!(
            GuidanceSim::new(&presets::c130(), gains(), &init),
            Err(SimError::InvalidInitialConditions(_))
        ));

        let mut init = level_init();
        init.wind.y = f64::NAN;
        assert!(matches!(
            GuidanceSim::new(&presets::c130(), gains(), &init),
            Err(SimError::InvalidInitialConditions(_))
        ));
    }

    #[test]
    fn bad_options_are_rejected() {
        let opts = SimOptions { dt: 0.0, ..SimOptions::default() };
        assert!(matches!(
            GuidanceSim::with_options(&presets::c130(), gains(), &level_init(), opts),
            Err(SimError::InvalidTimeStep(_))
        ));

        let opts = SimOptions { start_time: f64::NAN, ..SimOptions::default() };
        assert!(matches!(
            GuidanceSim::with_options(&presets::c130(), gains(), &level_init(), opts),
            Err(SimError::InvalidOptions(_))
        ));

        let opts = SimOptions {
            tolerances: Tolerances::new(-1.0e-3, 1.0e-6),
            ..SimOptions::default()
        };
        assert!(matches!(
            GuidanceSim::with_options(&presets::c130(), gains(), &level_init(), opts),
            Err(SimError::InvalidOptions(_))
        ));
    }

    #[test]
    fn step_without_command_is_a_noop() {
        let recorder = EventRecorder::new();
        let mut sim = engine();
        sim.set_event_sink(Box::new(recorder.clone()));

        sim.step().unwrap();
        sim.step().unwrap();

        assert_eq!(sim.history().len(), 1);
        assert_eq!(sim.command().len(), 1);
        assert_eq!(sim.time(), 0.0);
        let events = recorder.snapshot();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], (0.0, GuidanceEvent::MissingCommand));
    }

    #[test]
    fn invalid_time_steps_are_rejected() {
        let mut sim = engine();
        sim.set_command_trajectory(600.0, 0.0, 0.0).unwrap();
        for dt in [0.0, -0.01, f64::NAN, f64::INFINITY] {
            assert!(matches!(sim.step_by(dt), Err(SimError::InvalidTimeStep(_))));
        }
        assert_eq!(sim.history().len(), 1, "no row committed by a rejected step");
    }

    #[test]
    fn non_finite_command_is_rejected() {
        let mut sim = engine();
        let err = sim.set_command_trajectory(f64::NAN, 0.0, 0.0).unwrap_err();
        assert!(matches!(err, SimError::InvalidCommand { .. }));
        assert!(!sim.is_commanded());

        sim.step().unwrap();
        assert_eq!(sim.history().len(), 1, "engine stays idle after a rejected command");
    }

    #[test]
    fn commanding_the_current_state_zeroes_errors() {
        let mut sim = engine();
        let v = sim.current().velocity;
        sim.set_command_trajectory(v, 0.0, 0.0).unwrap();
        let e = sim.errors();
        assert_eq!(e.velocity, 0.0);
        assert_eq!(e.climb_rate, 0.0);
        assert_eq!(e.heading, 0.0);
        assert!(sim.is_commanded());
    }

    #[test]
    fn step_commits_one_aligned_row() {
        let mut sim = engine();
        sim.set_command_trajectory(
            450.0 * imperial::MPH_TO_FPS,
            5.0_f64.to_radians(),
            15.0_f64.to_radians(),
        )
        .unwrap();

        for _ in 0..50 {
            sim.step().unwrap();
        }

        assert_eq!(sim.history().len(), 51);
        assert_eq!(sim.command().len(), 51);
        assert!(sim.history().columns_aligned());
        assert_eq!(sim.steps(), 50);
        assert_relative_eq!(sim.time(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn step_by_overrides_default_step_size() {
        let mut sim = engine();
        sim.set_command_trajectory(450.0 * imperial::MPH_TO_FPS, 0.0, 0.0).unwrap();
        sim.step_by(0.1).unwrap();
        assert_relative_eq!(sim.time(), 0.1, epsilon = 1e-12);
        assert_eq!(sim.history().len(), 2);
    }

    #[test]
    fn zeroth_order_hold_matches_manual_extrapolation() {
        let mut sim = engine();
        let dt = sim.dt();
        let before = *sim.current();
        sim.set_command_trajectory(
            450.0 * imperial::MPH_TO_FPS,
            5.0_f64.to_radians(),
            15.0_f64.to_radians(),
        )
        .unwrap();
        sim.step().unwrap();
        let after = *sim.current();
        let c130 = presets::c130();

        // Mass burns at the committed thrust over the whole interval.
        assert_relative_eq!(after.mass, before.mass - c130.kf * after.thrust * dt, epsilon = 1e-9);

        // Velocity triple: one Euler extrapolation of the frozen rates.
        let rates = ideal::wind_axes_rates(
            after.thrust,
            after.drag,
            after.lift,
            after.bank,
            after.mass,
            before.velocity,
            before.flight_path_angle,
            imperial::GRAVITY,
        );
        assert_relative_eq!(after.velocity, before.velocity + rates[0] * dt, epsilon = 1e-9);
        assert_relative_eq!(
            after.flight_path_angle,
            before.flight_path_angle + rates[1] * dt,
            epsilon = 1e-9
        );
        assert_relative_eq!(after.heading, before.heading + rates[2] * dt, epsilon = 1e-9);

        // Geodetic rates take the post-step velocity triple against the
        // pre-step altitude and latitude.
        let geodetic = ideal::geodetic_rates(
            after.velocity,
            after.flight_path_angle,
            after.heading,
            before.altitude,
            before.latitude,
            imperial::EARTH_RADIUS,
        );
        assert_relative_eq!(after.latitude, before.latitude + geodetic[0] * dt, epsilon = 1e-9);
        assert_relative_eq!(after.longitude, before.longitude + geodetic[1] * dt, epsilon = 1e-9);
        assert_relative_eq!(after.altitude, before.altitude + geodetic[2] * dt, epsilon = 1e-9);

        // Aerodynamic response keyed to the pre-step airspeed.
        assert_relative_eq!(
            after.alpha,
            aerodynamics::alpha_from_lift(
                after.lift,
                before.airspeed,
                &c130,
                imperial::SEA_LEVEL_DENSITY
            ),
            epsilon = 1e-12
        );
    }

    #[test]
    fn altitude_command_projects_commanded_climb() {
        let mut sim = engine();
        let vc = 450.0 * imperial::MPH_TO_FPS;
        let gc = 5.0_f64.to_radians();
        sim.set_command_trajectory(vc, gc, 0.0).unwrap();
        for _ in 0..10 {
            sim.step().unwrap();
        }
        // Initial altitude is zero, so the projection is the profile itself.
        assert_relative_eq!(
            sim.current().altitude_commanded,
            gc.sin() * vc * sim.time(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn thrust_saturation_is_clamped_and_reported() {
        let recorder = EventRecorder::new();
        let hot_gains = ControlGains::new(50.0, 0.002, 0.5, 0.01, 0.075);
        let mut sim = GuidanceSim::new(&presets::c130(), hot_gains, &level_init()).unwrap();
        sim.set_event_sink(Box::new(recorder.clone()));
        sim.set_command_trajectory(600.0 * imperial::MPH_TO_FPS, 0.0, 0.0).unwrap();

        for _ in 0..20 {
            sim.step().unwrap();
        }

        let limit = presets::c130().thrust_max;
        let peak = sim.history().thrust.iter().cloned().fold(0.0, f64::max);
        assert!(peak <= limit + 1e-9, "thrust {peak} above limit {limit}");
        assert!(recorder
            .snapshot()
            .iter()
            .any(|(_, e)| matches!(e, GuidanceEvent::ThrustCommandSaturated { .. })));
    }

    #[test]
    fn bank_saturation_clamps_to_limit() {
        let recorder = EventRecorder::new();
        let mut sim = engine();
        sim.set_event_sink(Box::new(recorder.clone()));
        sim.set_command_trajectory(450.0 * imperial::MPH_TO_FPS, 0.0, 30.0_f64.to_radians())
            .unwrap();
        sim.step().unwrap();

        assert_relative_eq!(sim.current().bank, presets::c130().mu_max, epsilon = 1e-12);
        assert!(recorder
            .snapshot()
            .iter()
            .any(|(_, e)| matches!(e, GuidanceEvent::BankSaturated { .. })));
    }

    #[test]
    fn mass_never_increases() {
        let mut sim = engine();
        sim.set_command_trajectory(
            450.0 * imperial::MPH_TO_FPS,
            5.0_f64.to_radians(),
            15.0_f64.to_radians(),
        )
        .unwrap();
        for _ in 0..200 {
            sim.step().unwrap();
        }
        let mass = &sim.history().mass;
        assert!(mass.windows(2).all(|w| w[1] <= w[0]));
        assert!(mass[mass.len() - 1] < mass[0], "fuel burned while thrusting");
    }

    #[test]
    fn holding_the_entry_trajectory_builds_trim_lift() {
        // Commanding the current state starts with zero errors; the vehicle
        // sags off trim (no thrust, no lift yet) and the loops pull it back.
        let mut sim = engine();
        let init = level_init();
        sim.set_command_trajectory(init.velocity, init.flight_path_angle, init.heading)
            .unwrap();
        for _ in 0..300 {
            sim.step().unwrap();
        }

        let s = sim.current();
        assert!(s.lift > 0.5 * init.weight, "lift {} still far from trim", s.lift);
        assert_eq!(s.heading, 0.0, "no heading error, no turn");
        assert_eq!(s.bank, 0.0);
        assert!(s.flight_path_angle > -0.2 && s.flight_path_angle < 0.05);
        assert!(s.altitude < 1.0 && s.altitude > -2000.0);
        assert!(sim.history().columns_aligned());
    }

    #[test]
    fn commanded_climb_converges_toward_the_trajectory() {
        // Level at 400 mph into a quartering wind; at t=1 s command 450 mph,
        // a 5 degree climb and a 15 degree heading. Within 15 s the loops
        // stay inside the envelope and make visible progress on all three
        // channels without a single saturation.
        let recorder = EventRecorder::new();
        let c130 = presets::c130();
        let mut init = level_init();
        init.wind = Vector3::new(
            25.0 * imperial::MPH_TO_FPS,
            25.0 * imperial::MPH_TO_FPS,
            0.0,
        );
        let mut sim = GuidanceSim::new(&c130, gains(), &init).unwrap();
        sim.set_event_sink(Box::new(recorder.clone()));
        sim.set_command_trajectory(init.velocity, 0.0, 0.0).unwrap();

        let cmd_velocity = 450.0 * imperial::MPH_TO_FPS;
        let mut issued = false;
        while sim.time() < 15.0 {
            if !issued && sim.time() >= 1.0 {
                sim.set_command_trajectory(
                    cmd_velocity,
                    5.0_f64.to_radians(),
                    15.0_f64.to_radians(),
                )
                .unwrap();
                issued = true;
            }
            sim.step().unwrap();
        }

        let history = sim.history();
        assert!(recorder.is_empty(), "unexpected events: {:?}", recorder.snapshot());

        // Saturation invariants hold at every committed row. The lift
        // ceiling of row i was built from the velocity of row i-1.
        for i in 1..history.len() {
            assert!(history.thrust[i] <= c130.thrust_max + 1e-9);
            assert!(history.bank[i].abs() <= c130.mu_max + 1e-12);
            let ceiling = c130.k_lift_max * history.velocity[i - 1] * history.velocity[i - 1];
            assert!(history.lift[i] <= ceiling + 1e-9);
        }

        // Velocity error shrinks monotonically once the thrust response has
        // overcome the climb gravity load (the first second after the
        // command trades speed for pitch).
        let at = |t: f64| {
            history
                .time
                .iter()
                .position(|&x| x >= t)
                .unwrap_or(history.len() - 1)
        };
        let err = |i: usize| (cmd_velocity - history.velocity[i]).abs();
        let settled = at(2.0);
        for i in settled..history.len() - 1 {
            assert!(
                err(i + 1) <= err(i) + 0.05,
                "velocity error grew at t={}",
                history.time[i + 1]
            );
        }
        assert!(err(history.len() - 1) < 0.75 * err(at(1.0)));

        // All three channels made real progress. The climb is the slow
        // channel: the vehicle sags during the trim hold and the lift loop
        // is still winding up at 15 s, so the pitch response is well short
        // of the commanded 5 degrees and the altitude still near zero.
        let s = sim.current();
        assert!(s.flight_path_angle.to_degrees() > 0.3);
        assert!(s.flight_path_angle.to_degrees() <= 5.5);
        assert!(s.heading > 0.12, "heading {} barely moved", s.heading);
        assert!(s.heading < 15.0_f64.to_radians());
        assert!(s.altitude > -300.0 && s.altitude < 1500.0);

        // Thrust never reversed, so mass never grew.
        assert!(history.mass.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn metric_envelope_uses_metric_constants() {
        use crate::physics::environment::metric;
        use crate::vehicle::EnvelopeBuilder;
        use crate::UnitSystem;

        let vehicle = EnvelopeBuilder::new("metric-test")
            .units(UnitSystem::Metric)
            .build()
            .unwrap();
        let init = InitialConditions {
            velocity: 250.0,
            altitude: 0.0,
            flight_path_angle: 0.0,
            heading: 0.0,
            latitude: 0.58,
            longitude: -1.53,
            wind: Vector3::zeros(),
            weight: 700_000.0,
        };
        let mut sim = GuidanceSim::new(&vehicle, gains(), &init).unwrap();
        assert_relative_eq!(sim.environment().gravity, metric::GRAVITY, epsilon = 1e-12);
        assert_relative_eq!(
            sim.current().mass,
            700_000.0 / metric::GRAVITY,
            epsilon = 1e-9
        );

        sim.set_command_trajectory(260.0, 0.0, 0.0).unwrap();
        sim.step().unwrap();
        assert_eq!(sim.history().len(), 2);
    }
}
