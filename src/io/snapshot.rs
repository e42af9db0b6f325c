use std::io::{Read, Write};

use crate::error::SimError;
use crate::sim::GuidanceSim;

/// Serialize the whole engine (envelope, loop memories, command and state
/// histories) as pretty-printed JSON.
pub fn write_snapshot<W: Write>(writer: &mut W, sim: &GuidanceSim) -> Result<(), SimError> {
    serde_json::to_writer_pretty(writer, sim)?;
    Ok(())
}

/// Write an engine snapshot to a file at the given path.
pub fn write_snapshot_file(path: &str, sim: &GuidanceSim) -> Result<(), SimError> {
    let mut file = std::fs::File::create(path)?;
    write_snapshot(&mut file, sim)
}

/// Restore an engine from a snapshot. Stepping resumes exactly where the
/// saved run left off; the event sink resets to the logging default, so
/// reattach any custom sink afterwards.
pub fn read_snapshot<R: Read>(reader: R) -> Result<GuidanceSim, SimError> {
    Ok(serde_json::from_reader(reader)?)
}

/// Restore an engine from a snapshot file.
pub fn read_snapshot_file(path: &str) -> Result<GuidanceSim, SimError> {
    let file = std::fs::File::open(path)?;
    read_snapshot(std::io::BufReader::new(file))
}
