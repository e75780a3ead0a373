//! Services that talk to the external flasher
//!
//! `flasher` is the process boundary, `runner` schedules and retries
//! invocations on top of it.

pub mod flasher;
pub mod runner;

pub use flasher::*;
pub use runner::*;
