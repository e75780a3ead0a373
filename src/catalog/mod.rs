//! ROM catalog: bank tables, scan parsing and ROM file intake

pub mod rom_file;
pub mod scan;
pub mod store;

pub use rom_file::RomFile;
pub use scan::parse_scan_output;
pub use store::*;
