//! End-to-end C-130 case study: level at 400 mph, commanded at t=1 s to
//! 450 mph, a 5 degree climb and a 15 degree heading, stepped at 10 ms
//! for 15 simulated seconds.

use approx::assert_relative_eq;
use nalgebra::Vector3;

use fixedwing_sim::io;
use fixedwing_sim::physics::environment::imperial;
use fixedwing_sim::sim::EventRecorder;
use fixedwing_sim::{presets, ControlGains, GuidanceSim, InitialConditions};

fn gains() -> ControlGains {
    ControlGains::new(0.08, 0.002, 0.5, 0.01, 0.075)
}

fn init() -> InitialConditions {
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

/// Trim until t=1 s, then the climbing-turn command out to 15 s.
fn fly_case_study(sim: &mut GuidanceSim) {
    sim.set_command_trajectory(init().velocity, 0.0, 0.0).unwrap();
    let mut issued = false;
    for _ in 0..1500 {
        if !issued && sim.time() >= 1.0 {
            sim.set_command_trajectory(
                450.0 * imperial::MPH_TO_FPS,
                5.0_f64.to_radians(),
                15.0_f64.to_radians(),
            )
            .unwrap();
            issued = true;
        }
        sim.step().unwrap();
    }
}

#[test]
fn case_study_tracks_the_commanded_trajectory() {
    let recorder = EventRecorder::new();
    let c130 = presets::c130();
    let mut sim = GuidanceSim::new(&c130, gains(), &init()).unwrap();
    sim.set_event_sink(Box::new(recorder.clone()));
    fly_case_study(&mut sim);

    let history = sim.history();
    assert_eq!(sim.steps(), 1500);
    assert_eq!(history.len(), 1501);
    assert_eq!(sim.command().len(), 1501);
    assert!(history.columns_aligned());
    assert_relative_eq!(sim.time(), 15.0, epsilon = 1e-9);

    // Actuator limits hold at every committed row.
    for i in 0..history.len() {
        assert!(
            history.thrust[i] <= c130.thrust_max + 1e-9,
            "thrust {} over limit at t={}",
            history.thrust[i],
            history.time[i]
        );
        assert!(
            history.bank[i].abs() <= c130.mu_max + 1e-12,
            "bank {} over limit at t={}",
            history.bank[i],
            history.time[i]
        );
    }

    // Velocity error magnitude shrinks monotonically once the thrust
    // response overcomes the climb gravity load.
    let cmd_velocity = 450.0 * imperial::MPH_TO_FPS;
    let settled = history.time.iter().position(|&t| t >= 2.0).unwrap();
    for i in settled..history.len() - 1 {
        let e0 = (cmd_velocity - history.velocity[i]).abs();
        let e1 = (cmd_velocity - history.velocity[i + 1]).abs();
        assert!(e1 <= e0 + 0.05, "velocity error grew at t={}", history.time[i + 1]);
    }

    // No channel ever saturated with these gains.
    assert!(recorder.is_empty(), "unexpected events: {:?}", recorder.snapshot());

    // Mass burned down monotonically.
    assert!(history.mass.windows(2).all(|w| w[1] <= w[0]));
    assert!(history.mass[1500] < history.mass[0]);

    // The climbing turn made real progress on every channel. Pitch is the
    // slow channel: the vehicle sags during the trim hold, so at 15 s the
    // flight path is still well below the commanded 5 degrees and the
    // altitude has only just recovered toward zero.
    let s = sim.current();
    assert!(s.flight_path_angle.to_degrees() > 0.3);
    assert!(s.flight_path_angle.to_degrees() <= 5.5);
    assert!(s.heading > 0.12 && s.heading < 15.0_f64.to_radians());
    assert!(s.altitude > -300.0 && s.altitude < 1500.0);
}

#[test]
fn snapshot_replay_reproduces_the_trajectory() {
    let mut sim = GuidanceSim::new(&presets::c130(), gains(), &init()).unwrap();
    sim.set_command_trajectory(
        450.0 * imperial::MPH_TO_FPS,
        5.0_f64.to_radians(),
        15.0_f64.to_radians(),
    )
    .unwrap();
    for _ in 0..500 {
        sim.step().unwrap();
    }

    let mut buf = Vec::new();
    io::write_snapshot(&mut buf, &sim).unwrap();
    let mut restored = io::read_snapshot(buf.as_slice()).unwrap();
    assert_eq!(restored.history(), sim.history());

    // Same subsequent commands and step sizes give bit-identical futures.
    sim.set_command_trajectory(500.0 * imperial::MPH_TO_FPS, 0.0, 0.0).unwrap();
    restored.set_command_trajectory(500.0 * imperial::MPH_TO_FPS, 0.0, 0.0).unwrap();
    for _ in 0..500 {
        sim.step().unwrap();
        restored.step().unwrap();
    }

    assert_eq!(restored.history(), sim.history());
    assert_eq!(restored.command(), sim.command());
    assert_eq!(restored.current(), sim.current());
}

#[test]
fn csv_export_covers_the_whole_run() {
    let mut sim = GuidanceSim::new(&presets::c130(), gains(), &init()).unwrap();
    sim.set_command_trajectory(450.0 * imperial::MPH_TO_FPS, 0.0, 0.0).unwrap();
    for _ in 0..100 {
        sim.step().unwrap();
    }

    let mut buf = Vec::new();
    io::write_history(&mut buf, sim.history()).unwrap();
    let text = String::from_utf8(buf).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 102, "header plus one row per committed sample");
    assert!(lines[0].starts_with("time,mass,velocity"));
    let columns = lines[0].split(',').count();
    assert!(lines[1..].iter().all(|l| l.split(',').count() == columns));
    assert!(lines[1].starts_with("0.0000,"));
    assert!(lines[101].starts_with("1.0000,"));
}

#[test]
fn uniform_wind_offsets_airspeed_throughout() {
    let mut windy = init();
    windy.wind = Vector3::new(-25.0 * imperial::MPH_TO_FPS, 0.0, 0.0);
    let mut sim = GuidanceSim::new(&presets::c130(), gains(), &windy).unwrap();
    sim.set_command_trajectory(windy.velocity, 0.0, 0.0).unwrap();
    for _ in 0..200 {
        sim.step().unwrap();
    }

    // Flying north into a pure headwind: airspeed exceeds inertial speed at
    // every sample (heading stays 0 with no heading error commanded).
    let history = sim.history();
    for i in 0..history.len() {
        assert!(
            history.airspeed[i] > history.velocity[i],
            "headwind airspeed {} not above inertial {} at t={}",
            history.airspeed[i],
            history.velocity[i],
            history.time[i]
        );
    }
}
