//! Inspect command implementation

use crate::catalog::RomFile;
use anyhow::Result;
use std::path::PathBuf;

pub fn execute_inspect_command(files: &[PathBuf]) -> Result<()> {
    let mut failures = 0;

    for path in files {
        match RomFile::load(path) {
            Ok(rom) => println!(
                "🎮 {:<16} {:>6} KB  {}",
                rom.title,
                rom.size_kb(),
                path.display()
            ),
            Err(e) => {
                failures += 1;
                eprintln!("❌ {}: {}", path.display(), e);
            }
        }
    }

    if failures > 0 {
        return Err(anyhow::anyhow!("{} file(s) could not be read", failures));
    }
    Ok(())
}
