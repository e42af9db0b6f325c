use nalgebra::Vector3;

use crate::vehicle::VehicleEnvelope;

// ---------------------------------------------------------------------------
// Performance-model aerodynamics: wind triangle, lift/alpha map, drag polar
// ---------------------------------------------------------------------------

/// Airspeed magnitude from the wind triangle.
///
/// The inertial velocity is decomposed into NED components from flight-path
/// angle and heading, the (uniform, NED) wind vector is subtracted, and the
/// norm of the air-relative velocity is returned. Airspeed is always derived
/// this way; it is never integrated.
pub fn airspeed(velocity: f64, flight_path_angle: f64, heading: f64, wind: &Vector3<f64>) -> f64 {
    let v_ned = Vector3::new(
        velocity * flight_path_angle.cos() * heading.cos(),
        velocity * flight_path_angle.cos() * heading.sin(),
        -velocity * flight_path_angle.sin(),
    );
    (v_ned - wind).norm()
}

/// Angle of attack that produces `lift` at the given airspeed (rad).
/// Inverts L = 0.5 rho S C_La (alpha - alpha_0) v^2. Airspeed must be
/// positive; a vanishing airspeed propagates a non-finite value to the
/// integrator, which rejects it.
pub fn alpha_from_lift(lift: f64, airspeed: f64, vehicle: &VehicleEnvelope, density: f64) -> f64 {
    2.0 * lift / (density * vehicle.wing_area * vehicle.cl_alpha * airspeed * airspeed)
        + vehicle.alpha_0
}

/// Total drag (parasite + lift-induced) at the given lift and airspeed.
pub fn drag_from_lift(lift: f64, airspeed: f64, vehicle: &VehicleEnvelope, density: f64) -> f64 {
    let q_s = 0.5 * density * vehicle.wing_area * airspeed * airspeed;
    let induced = 2.0 * lift * lift
        / (density
            * vehicle.wing_area
            * std::f64::consts::PI
            * vehicle.aspect_ratio
            * vehicle.wing_eff
            * airspeed
            * airspeed);
    q_s * vehicle.cd0 + induced
}
