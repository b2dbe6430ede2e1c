use crate::component::ComponentSpec;
use crate::error::{IgnitionError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// LaunchConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// Start attempts per component before the sequence halts (or skips).
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Continue past a failed component instead of halting the sequence.
    #[serde(default)]
    pub skip_on_failure: bool,
}

fn default_retries() -> u32 {
    3
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            retries: default_retries(),
            skip_on_failure: false,
        }
    }
}

// ---------------------------------------------------------------------------
// ProviderConfig
// ---------------------------------------------------------------------------

/// Remediation provider consulted by the patch loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: String,
    pub address: String,
    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u64,
}

fn default_provider_timeout() -> u64 {
    90
}

// ---------------------------------------------------------------------------
// RouterConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    #[serde(default = "default_backend_timeout")]
    pub timeout_seconds: u64,
}

fn default_backend_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    pub primary: BackendConfig,
    pub secondary: BackendConfig,
}

// ---------------------------------------------------------------------------
// ServantConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServantConfig {
    pub name: String,
    pub address: String,
    /// Environment variable that overrides `address` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub components: Vec<ComponentSpec>,
    #[serde(default)]
    pub launch: LaunchConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router: Option<RouterConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servants: Vec<ServantConfig>,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 1,
            components: Vec::new(),
            launch: LaunchConfig::default(),
            provider: None,
            router: None,
            servants: Vec::new(),
        }
    }
}

impl Config {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(IgnitionError::ConfigNotFound);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        // 1. Component names must be valid and unique
        let mut seen = HashSet::new();
        for spec in &self.components {
            if paths::validate_name(&spec.name).is_err() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("invalid component name '{}'", spec.name),
                });
            }
            if !seen.insert(spec.name.as_str()) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("duplicate component '{}'", spec.name),
                });
            }

            // 2. Start commands must be non-empty and resolvable
            if spec.command.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("component '{}' has an empty command", spec.name),
                });
            } else if let Some(program) = spec.command.split_whitespace().next() {
                // Only check bare program names; paths and shell syntax are
                // left to runtime.
                if !program.contains('/') && which::which(program).is_err() {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Warning,
                        message: format!(
                            "component '{}': '{}' not found on PATH",
                            spec.name, program
                        ),
                    });
                }
            }

            if spec.health_poll_interval_ms == 0 {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!(
                        "component '{}' has health_poll_interval_ms=0",
                        spec.name
                    ),
                });
            }
        }

        // 3. retries > 10 → warning
        if self.launch.retries > 10 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "launch.retries={} (>10 is unusual)",
                    self.launch.retries
                ),
            });
        }

        // 4. Servant names must be valid; duplicates resolve first-wins at
        //    runtime but are worth flagging here.
        let mut servant_seen = HashSet::new();
        for servant in &self.servants {
            if paths::validate_name(&servant.name).is_err() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("invalid servant name '{}'", servant.name),
                });
            }
            if !servant_seen.insert(servant.name.as_str()) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "duplicate servant '{}' (first declaration wins)",
                        servant.name
                    ),
                });
            }
            if servant.address.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("servant '{}' has an empty address", servant.name),
                });
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
