//! Intake of user-selected ROM files

use std::path::{Path, PathBuf};

use crate::errors::{EmsError, Result};
use crate::models::RomEntry;

/// Extensions accepted by the file selection
pub const ROM_EXTENSIONS: [&str; 2] = ["gb", "gbc"];

const HEADER_TITLE_START: usize = 0x134;
const HEADER_TITLE_END: usize = 0x144;

/// A local `.gb`/`.gbc` file about to be queued
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomFile {
    pub path: PathBuf,
    pub title: String,
    pub size_bytes: u64,
}

impl RomFile {
    pub fn load(path: &Path) -> Result<Self> {
        if !has_rom_extension(path) {
            return Err(EmsError::InvalidRomFile(format!(
                "{} is not a .gb or .gbc file",
                path.display()
            )));
        }

        let data = std::fs::read(path)?;
        if data.is_empty() {
            return Err(EmsError::InvalidRomFile(format!(
                "{} is empty",
                path.display()
            )));
        }

        let title = header_title(&data).unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string())
        });

        Ok(Self {
            path: path.to_path_buf(),
            title,
            size_bytes: data.len() as u64,
        })
    }

    /// Size rounded up to whole kilobytes
    pub fn size_kb(&self) -> u32 {
        u32::try_from(self.size_bytes.div_ceil(1024)).unwrap_or(u32::MAX)
    }

    pub fn into_entry(self) -> RomEntry {
        let size_kb = self.size_kb();
        RomEntry::ready_to_flash(self.title, size_kb, self.path)
    }
}

pub fn has_rom_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            ROM_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

/// Title stored in the cartridge header, if it is printable ASCII
pub fn header_title(data: &[u8]) -> Option<String> {
    let raw = data.get(HEADER_TITLE_START..HEADER_TITLE_END)?;
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    let bytes = &raw[..end];

    // CGB titles are 15 bytes followed by the CGB flag
    let bytes = match bytes.last() {
        Some(&flag) if bytes.len() == raw.len() && (flag == 0x80 || flag == 0xC0) => {
            &bytes[..bytes.len() - 1]
        }
        _ => bytes,
    };

    if bytes.is_empty() || !bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
        return None;
    }

    let title = String::from_utf8_lossy(bytes).trim().to_string();
    (!title.is_empty()).then_some(title)
}
