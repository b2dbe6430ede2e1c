use crate::error::{IgnitionError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const IGNITION_DIR: &str = ".ignition";

pub const CONFIG_FILE: &str = ".ignition/config.yaml";
pub const CHECKPOINT_FILE: &str = ".ignition/checkpoint.json";
pub const HISTORY_FILE: &str = ".ignition/history.json";
pub const ENDPOINTS_FILE: &str = ".ignition/servant_endpoints.txt";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn ignition_dir(root: &Path) -> PathBuf {
    root.join(IGNITION_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn checkpoint_path(root: &Path) -> PathBuf {
    root.join(CHECKPOINT_FILE)
}

pub fn history_path(root: &Path) -> PathBuf {
    root.join(HISTORY_FILE)
}

pub fn endpoints_path(root: &Path) -> PathBuf {
    root.join(ENDPOINTS_FILE)
}

// ---------------------------------------------------------------------------
// Component name validation
// ---------------------------------------------------------------------------

static NAME_RE: OnceLock<Regex> = OnceLock::new();

fn name_re() -> &'static Regex {
    NAME_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9_\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 64 || !name_re().is_match(name) {
        return Err(IgnitionError::InvalidName(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
