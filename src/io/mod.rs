pub mod csv;
pub mod snapshot;

pub use csv::{write_history, write_history_file};
pub use snapshot::{read_snapshot, read_snapshot_file, write_snapshot, write_snapshot_file};
