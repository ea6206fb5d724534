//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Name of the environment variable pointing at the root of the software tree.
pub const SW_ROOT_ENV_VAR: &str = "PICAR_SW_ROOT";

/// Get the root directory of the software, as given by the `PICAR_SW_ROOT`
/// environment variable.
pub fn get_picar_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}

/// Get the name of the machine we're running on as reported by the OS, or
/// `None` if it could not be determined.
pub fn get_hostname() -> Option<String> {
    match std::fs::read_to_string("/etc/hostname") {
        Ok(s) => Some(String::from(s.trim())),
        Err(_) => env::var("HOSTNAME").ok()
    }
}
