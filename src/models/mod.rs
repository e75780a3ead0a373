//! Data models and types used throughout EMS Deck

pub mod events;
pub mod operation;
pub mod rom;

// Re-export commonly used types
pub use events::*;
pub use operation::*;
pub use rom::*;
