use std::time::Instant;

use anyhow::Result;
use nalgebra::Vector3;

use fixedwing_sim::io;
use fixedwing_sim::physics::environment::imperial;
use fixedwing_sim::{presets, ControlGains, GuidanceSim, InitialConditions};

fn main() -> Result<()> {
    env_logger::init();

    // Optional export paths: fixedwing-sim [HISTORY_CSV] [SNAPSHOT_JSON]
    let csv_path = std::env::args().nth(1);
    let snapshot_path = std::env::args().nth(2);

    // -----------------------------------------------------------------------
    // Vehicle: C-130 transport, level at 400 mph into a quartering wind
    // -----------------------------------------------------------------------
    let vehicle = presets::c130();
    let gains = ControlGains::new(0.08, 0.002, 0.5, 0.01, 0.075);
    let init = InitialConditions {
        velocity: 400.0 * imperial::MPH_TO_FPS,
        altitude: 0.0,
        flight_path_angle: 0.0,
        heading: 0.0,
        latitude: 33.2098_f64.to_radians(),
        longitude: (-87.5692_f64).to_radians(),
        wind: Vector3::new(25.0 * imperial::MPH_TO_FPS, 25.0 * imperial::MPH_TO_FPS, 0.0),
        weight: 300_000.0,
    };

    let mut sim = GuidanceSim::new(&vehicle, gains, &init)?;

    // Hold the entry trajectory until the maneuver is issued.
    sim.set_command_trajectory(init.velocity, init.flight_path_angle, init.heading)?;

    // Maneuver, issued one second into the run:
    // 450 mph, 5 degree climb, heading 15 degrees (NNE)
    let cmd_velocity = 450.0 * imperial::MPH_TO_FPS;
    let cmd_fpa = 5.0_f64.to_radians();
    let cmd_heading = 15.0_f64.to_radians();
    let command_time = 1.0;
    let stop_time = 15.0;

    // -----------------------------------------------------------------------
    // Run simulation
    // -----------------------------------------------------------------------
    let started = Instant::now();
    let mut issued = false;
    while sim.time() < stop_time {
        if !issued && sim.time() >= command_time {
            sim.set_command_trajectory(cmd_velocity, cmd_fpa, cmd_heading)?;
            issued = true;
        }
        sim.step()?;
    }
    let elapsed = started.elapsed();

    // -----------------------------------------------------------------------
    // Print results
    // -----------------------------------------------------------------------
    let history = sim.history();
    let last = sim.current();
    let fuel_burned = (history.mass[0] - last.mass) * sim.environment().gravity;

    println!();
    println!("====================================================================");
    println!("  FIXED-WING GUIDANCE SIMULATION — {}", sim.vehicle().name);
    println!("====================================================================");
    println!();
    println!("  Vehicle Envelope");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  Weight:        {:>8.0} lbf   Max thrust:   {:>8.0} lbf",
        init.weight,
        vehicle.thrust_max
    );
    println!(
        "  Wing area:     {:>8.0} ft^2  Aspect ratio: {:>8.1}",
        vehicle.wing_area, vehicle.aspect_ratio
    );
    println!(
        "  Speed range:   {:>4.0}-{:.0} mph   Bank limit:   {:>8.1} deg",
        vehicle.speed_min / imperial::MPH_TO_FPS,
        vehicle.speed_max / imperial::MPH_TO_FPS,
        vehicle.mu_max.to_degrees()
    );
    println!();

    println!("  Commanded Trajectory (issued at t={command_time:.0} s)");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  Velocity:      {:>8.1} ft/s  ({:.0} mph)",
        cmd_velocity,
        cmd_velocity / imperial::MPH_TO_FPS
    );
    println!("  Flight path:   {:>8.1} deg", cmd_fpa.to_degrees());
    println!("  Heading:       {:>8.1} deg", cmd_heading.to_degrees());
    println!();

    println!("  Final State (t={:.1} s)", last.time);
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  Velocity:      {:>8.1} ft/s  ({:.0} mph, {:.0}% of commanded)",
        last.velocity,
        last.velocity / imperial::MPH_TO_FPS,
        100.0 * last.velocity / cmd_velocity
    );
    println!(
        "  Flight path:   {:>8.2} deg   Heading:      {:>8.2} deg",
        last.flight_path_angle.to_degrees(),
        last.heading.to_degrees()
    );
    println!(
        "  Altitude:      {:>8.0} ft    Airspeed:     {:>8.1} ft/s",
        last.altitude, last.airspeed
    );
    println!(
        "  Thrust:        {:>8.0} lbf   Lift:         {:>8.0} lbf",
        last.thrust, last.lift
    );
    println!(
        "  Bank:          {:>8.2} deg   Alpha:        {:>8.3} deg",
        last.bank.to_degrees(),
        last.alpha.to_degrees()
    );
    println!("  Fuel burned:   {:>8.0} lbf", fuel_burned);
    println!();

    // -----------------------------------------------------------------------
    // Trajectory table (sampled)
    // -----------------------------------------------------------------------
    println!("  Trajectory");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  {:>6}  {:>9}  {:>7}  {:>7}  {:>8}  {:>8}  {:>6}  {:>5}",
        "t (s)", "vel(f/s)", "fpa(d)", "hdg(d)", "alt (ft)", "T (lbf)", "mu(d)", "phase"
    );
    println!("  {}", "─".repeat(66));

    let sample_interval = (history.len() / 30).max(1);
    for i in 0..history.len() {
        let near_command = (history.time[i] - command_time).abs() < sim.dt() * 0.5;
        if i % sample_interval != 0 && i != history.len() - 1 && !near_command {
            continue;
        }
        let phase = if history.time[i] < command_time { "TRIM" } else { "CMD" };
        println!(
            "  {:>6.2}  {:>9.1}  {:>7.3}  {:>7.3}  {:>8.1}  {:>8.0}  {:>6.2}  {:>5}",
            history.time[i],
            history.velocity[i],
            history.flight_path_angle[i].to_degrees(),
            history.heading[i].to_degrees(),
            history.altitude[i],
            history.thrust[i],
            history.bank[i].to_degrees(),
            phase
        );
    }

    println!();
    println!(
        "  Simulation: {} steps, dt={} s, wall {:.1} ms",
        sim.steps(),
        sim.dt(),
        elapsed.as_secs_f64() * 1000.0
    );
    println!("====================================================================");
    println!();

    if let Some(path) = csv_path {
        io::write_history_file(&path, sim.history())?;
        println!("  History written to {path}");
    }
    if let Some(path) = snapshot_path {
        io::write_snapshot_file(&path, &sim)?;
        println!("  Snapshot written to {path}");
    }

    Ok(())
}
