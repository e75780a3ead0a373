//! Parser for the title listing printed by `ems-flasher --title`
//!
//! The listing is fixed-width text: a header row whose column names mark the
//! start offset of each column, one row per ROM, and a fixed-length footer
//! that carries no row data.

use crate::errors::{EmsError, Result};
use crate::models::RomEntry;

/// Trailing bytes of the listing that are not row data
pub const SCAN_FOOTER_LEN: usize = 79;

const BANK_COLUMN: &str = "Bank";
const TITLE_COLUMN: &str = "Title";
const SIZE_COLUMN: &str = "Size";
const ENHANCEMENTS_COLUMN: &str = "Enhancements";

/// Start offsets of the listing columns, taken from the header row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub bank: usize,
    pub title: usize,
    pub size: usize,
    pub enhancements: usize,
}

impl ColumnLayout {
    pub fn from_header(header: &str) -> Result<Self> {
        let locate = |name: &str| {
            header.find(name).ok_or_else(|| {
                EmsError::ScanFormat(format!("header has no '{}' column: {:?}", name, header))
            })
        };

        let layout = Self {
            bank: locate(BANK_COLUMN)?,
            title: locate(TITLE_COLUMN)?,
            size: locate(SIZE_COLUMN)?,
            enhancements: locate(ENHANCEMENTS_COLUMN)?,
        };

        if !(layout.bank < layout.title
            && layout.title < layout.size
            && layout.size < layout.enhancements)
        {
            return Err(EmsError::ScanFormat(format!(
                "header columns out of order: {:?}",
                header
            )));
        }
        Ok(layout)
    }

    /// Slice one row into a catalog entry; `None` for rows that do not fit the layout.
    pub fn parse_row(&self, row: &str) -> Option<RomEntry> {
        let bank_id = cell(row, self.bank, Some(self.title))?;
        let title = cell(row, self.title, Some(self.size))?;
        let size = cell(row, self.size, Some(self.enhancements))?;
        let enhancements = cell(row, self.enhancements, None)?;

        let digits: String = size.chars().take_while(|c| c.is_ascii_digit()).collect();
        if bank_id.is_empty() || title.is_empty() || digits.is_empty() {
            return None;
        }
        let size_kb = digits.parse::<u32>().ok()?;

        Some(RomEntry::on_cartridge(bank_id, title, size_kb, enhancements))
    }
}

/// Trimmed text between two offsets. Short rows yield empty cells; offsets
/// that split a multi-byte character make the row unusable.
fn cell(row: &str, start: usize, end: Option<usize>) -> Option<&str> {
    let end = end.unwrap_or(row.len()).min(row.len());
    if start >= end {
        return Some("");
    }
    row.get(start..end).map(str::trim)
}

fn is_separator(line: &str) -> bool {
    line.chars().all(|c| matches!(c, '-' | '=' | ' ' | '\t'))
}

/// Drop the footer, backing off to a character boundary if needed
fn strip_footer(raw: &str) -> &str {
    if raw.len() <= SCAN_FOOTER_LEN {
        return "";
    }
    let mut cut = raw.len() - SCAN_FOOTER_LEN;
    while !raw.is_char_boundary(cut) {
        cut -= 1;
    }
    &raw[..cut]
}

/// Parse the raw `--title` output into on-cartridge entries.
///
/// Rows that cannot be sliced are skipped. Output with rows but no usable
/// header is an error so that the caller does not wipe the bank view.
pub fn parse_scan_output(raw: &str) -> Result<Vec<RomEntry>> {
    let body = strip_footer(raw);
    let mut lines = body.lines().filter(|line| !line.trim().is_empty());

    let Some(header) = lines.next() else {
        return Ok(Vec::new());
    };
    let layout = ColumnLayout::from_header(header)?;

    let mut entries = Vec::new();
    for line in lines {
        if is_separator(line) {
            continue;
        }
        match layout.parse_row(line) {
            Some(entry) => entries.push(entry),
            None => log::debug!("{}", EmsError::MalformedScanRow(line.to_string())),
        }
    }

    log::debug!("Parsed {} title(s) from scan output", entries.len());
    Ok(entries)
}
