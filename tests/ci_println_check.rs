//! CI validation tests for println! usage
//!
//! The catalog, the runner and the coordinator report through `log` and
//! notices. Only the CLI layer may print.

use std::fs;
use std::path::Path;

const QUIET_DIRS: [&str; 4] = ["src/catalog", "src/services", "src/app", "src/models"];

fn rust_files(dir: &Path, out: &mut Vec<std::path::PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            rust_files(&path, out);
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            out.push(path);
        }
    }
}

fn offending_lines(content: &str, needle: &str) -> Vec<usize> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| line.contains(needle) && !line.trim_start().starts_with("//"))
        .map(|(n, _)| n + 1)
        .collect()
}

#[test]
fn test_no_println_outside_cli() {
    let mut files = Vec::new();
    for dir in QUIET_DIRS {
        rust_files(Path::new(dir), &mut files);
    }
    assert!(!files.is_empty(), "no sources found, run from the crate root");

    for file_path in &files {
        let content = fs::read_to_string(file_path)
            .unwrap_or_else(|_| panic!("Failed to read {}", file_path.display()));

        // "println!" also matches "eprintln!"
        let lines = offending_lines(&content, "println!");
        if !lines.is_empty() {
            panic!(
                "Found println!/eprintln! in {}: lines {:?}\n\
                 Use log macros or push a Notice instead.",
                file_path.display(),
                lines
            );
        }
    }
}

#[test]
fn test_shell_prints_only_to_stdout() {
    let file_path = "src/cli/shell.rs";
    if Path::new(file_path).exists() {
        let content = fs::read_to_string(file_path)
            .unwrap_or_else(|_| panic!("Failed to read {}", file_path));
        let lines = offending_lines(&content, "eprintln!");
        assert!(
            lines.is_empty(),
            "The shell logs to a file; stderr writes at lines {:?} would garble the prompt",
            lines
        );
    }
}
