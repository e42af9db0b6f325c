pub mod command;
pub mod gains;
pub mod loops;

pub use command::CommandedTrajectory;
pub use gains::ControlGains;
pub use loops::{bank_command, BankResponse, ErrorTerms, LoopResponse, PiLag};
