#![allow(dead_code)]

pub mod command;
pub mod file;

pub const CONTROL_DIR: &str = ".git-light";

/// Read a file of the control directory, trimmed
pub fn read_control_file(dir: &std::path::Path, name: &str) -> String {
    std::fs::read_to_string(dir.join(CONTROL_DIR).join(name))
        .expect("Failed to read control file")
        .trim()
        .to_string()
}
