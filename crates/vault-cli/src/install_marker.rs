//! First-run welcome marker (spec's CLI-layer responsibility, not the core's).
//!
//! A single presence-only byte under the user config directory. Written on
//! first successful run of any subcommand; read-checked beforehand to decide
//! whether to print a one-line welcome banner ahead of the command's own
//! output.

use std::path::PathBuf;

fn marker_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("vault-cli").join(".installed"))
}

/// Print the welcome banner if this is the first run, then record that a
/// run has happened. Failures to read/write the marker are non-fatal — the
/// banner is cosmetic, not part of the core's contract.
pub fn show_welcome_if_first_run() {
    let Some(path) = marker_path() else { return };

    if path.exists() {
        return;
    }

    println!("Welcome to vault-cli — threshold-vault inspection and recovery.");

    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(&path, [0u8]);
}
