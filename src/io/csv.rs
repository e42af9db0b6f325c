use std::io::{self, Write};

use crate::sim::StateHistory;

/// Write the state history to CSV format, one row per committed step.
///
/// Columns: time, mass, velocity, flight_path_angle, heading, latitude,
///          longitude, altitude, airspeed, alpha, drag, bank, thrust, lift,
///          alpha_commanded, altitude_commanded
///
/// Angles are radians; latitude/longitude carry extra digits because a short
/// run moves them by microradians.
pub fn write_history<W: Write>(writer: &mut W, history: &StateHistory) -> io::Result<()> {
    writeln!(
        writer,
        "time,mass,velocity,flight_path_angle,heading,latitude,longitude,\
         altitude,airspeed,alpha,drag,bank,thrust,lift,\
         alpha_commanded,altitude_commanded"
    )?;

    for i in 0..history.len() {
        writeln!(
            writer,
            "{:.4},{:.4},{:.4},{:.6},{:.6},{:.9},{:.9},\
             {:.4},{:.4},{:.6},{:.4},{:.6},{:.4},{:.4},\
             {:.6},{:.4}",
            history.time[i],
            history.mass[i],
            history.velocity[i],
            history.flight_path_angle[i],
            history.heading[i],
            history.latitude[i],
            history.longitude[i],
            history.altitude[i],
            history.airspeed[i],
            history.alpha[i],
            history.drag[i],
            history.bank[i],
            history.thrust[i],
            history.lift[i],
            history.alpha_commanded[i],
            history.altitude_commanded[i],
        )?;
    }

    Ok(())
}

/// Write the state history to a CSV file at the given path.
pub fn write_history_file(path: &str, history: &StateHistory) -> io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_history(&mut file, history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::StateSample;

    fn sample(t: f64) -> StateSample {
        StateSample {
            time: t,
            mass: 9325.0,
            velocity: 586.67,
            flight_path_angle: 0.0,
            heading: 0.0,
            latitude: 0.5796,
            longitude: -1.5284,
            altitude: 0.0,
            airspeed: 586.67,
            alpha: -0.000873,
            drag: 6928.0,
            bank: 0.0,
            thrust: 0.0,
            lift: 0.0,
            alpha_commanded: 0.0,
            altitude_commanded: 0.0,
        }
    }

    #[test]
    fn csv_output_has_header_and_rows() {
        let mut history = StateHistory::default();
        history.push(&sample(0.0));
        history.push(&sample(0.01));

        let mut buf = Vec::new();
        write_history(&mut buf, &history).unwrap();
        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert!(lines[0].starts_with("time,mass,velocity"));
        assert_eq!(lines.len(), 3); // header + 2 data rows
        assert!(lines[1].starts_with("0.0000,"));
        assert_eq!(lines[0].split(',').count(), 16);
        assert_eq!(lines[1].split(',').count(), 16);
    }
}
