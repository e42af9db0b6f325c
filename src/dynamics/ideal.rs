// ---------------------------------------------------------------------------
// Idealized rigid-body EOM right-hand sides (wind axes, spherical Earth)
// ---------------------------------------------------------------------------

/// Mass rate from fuel burn at the current thrust setting.
pub fn fuel_burn_rate(kf: f64, thrust: f64) -> f64 {
    -kf * thrust
}

/// Wind-axes translational and attitude rates `[dv, dgamma, dsigma]`.
///
/// All inputs are start-of-step values; the engine holds these rates constant
/// over the integration interval (zeroth-order hold).
#[allow(clippy::too_many_arguments)]
pub fn wind_axes_rates(
    thrust: f64,
    drag: f64,
    lift: f64,
    bank: f64,
    mass: f64,
    velocity: f64,
    flight_path_angle: f64,
    gravity: f64,
) -> [f64; 3] {
    let v_dot = (thrust - drag) / mass - gravity * flight_path_angle.sin();
    let gamma_dot = (lift * bank.cos() / mass - gravity * flight_path_angle.cos()) / velocity;
    let sigma_dot = lift * bank.sin() / (mass * velocity * flight_path_angle.cos());
    [v_dot, gamma_dot, sigma_dot]
}

/// Geodetic kinematic rates `[dlat, dlon, dh]` over a mean spherical Earth.
pub fn geodetic_rates(
    velocity: f64,
    flight_path_angle: f64,
    heading: f64,
    altitude: f64,
    latitude: f64,
    earth_radius: f64,
) -> [f64; 3] {
    let r = earth_radius + altitude;
    let lat_dot = velocity * flight_path_angle.cos() * heading.cos() / r;
    let lon_dot = velocity * flight_path_angle.cos() * heading.sin() / (r * latitude.cos());
    let h_dot = velocity * flight_path_angle.sin();
    [lat_dot, lon_dot, h_dot]
}
