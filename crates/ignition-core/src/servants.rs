//! Servant endpoint registry and the `servant_endpoints.txt` artifact.
//!
//! Servants are auxiliary model services declared in config. Each resolves
//! to an address (an env var can override the declared one), and the
//! resolved set is published as a plain `name=address` file other processes
//! can read without parsing YAML.

use crate::config::ServantConfig;
use crate::error::Result;
use crate::io;
use crate::paths;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct EndpointRecord {
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, Default)]
pub struct ServantRegistry {
    endpoints: Vec<EndpointRecord>,
}

impl ServantRegistry {
    /// Resolve declared servants to concrete addresses. A servant's `env`
    /// variable, when set and non-empty, overrides the declared address.
    /// Duplicate names keep the first declaration.
    pub fn resolve(servants: &[ServantConfig]) -> Self {
        let mut endpoints: Vec<EndpointRecord> = Vec::new();
        for servant in servants {
            if endpoints.iter().any(|e| e.name == servant.name) {
                tracing::warn!(name = %servant.name, "duplicate servant, keeping first declaration");
                continue;
            }
            let address = servant
                .env
                .as_deref()
                .and_then(|var| std::env::var(var).ok())
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| servant.address.clone());
            endpoints.push(EndpointRecord {
                name: servant.name.clone(),
                address,
            });
        }
        Self { endpoints }
    }

    pub fn endpoints(&self) -> &[EndpointRecord] {
        &self.endpoints
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.endpoints
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.address.as_str())
    }

    /// Write `.ignition/servant_endpoints.txt` atomically, one
    /// `name=address` line per servant, in declaration order.
    pub fn write_endpoints(&self, root: &Path) -> Result<()> {
        let mut out = String::new();
        for e in &self.endpoints {
            out.push_str(&e.name);
            out.push('=');
            out.push_str(&e.address);
            out.push('\n');
        }
        io::atomic_write(&paths::endpoints_path(root), out.as_bytes())
    }
}

/// Parse an endpoints file back into a name→address map. Malformed lines
/// are skipped with a warning so a hand-edited file cannot break startup.
pub fn parse_endpoints(data: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in data.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match line.split_once('=') {
            Some((name, address)) if !name.trim().is_empty() && !address.trim().is_empty() => {
                map.entry(name.trim().to_string())
                    .or_insert_with(|| address.trim().to_string());
            }
            _ => {
                tracing::warn!(line, "skipping malformed endpoint line");
            }
        }
    }
    map
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn servant(name: &str, address: &str, env: Option<&str>) -> ServantConfig {
        ServantConfig {
            name: name.to_string(),
            address: address.to_string(),
            env: env.map(String::from),
        }
    }

    #[test]
    fn resolves_declared_addresses() {
        let registry = ServantRegistry::resolve(&[
            servant("deepseek", "http://localhost:9400", None),
            servant("mistral", "http://localhost:9500", None),
        ]);
        assert_eq!(registry.get("deepseek"), Some("http://localhost:9400"));
        assert_eq!(registry.get("mistral"), Some("http://localhost:9500"));
        assert_eq!(registry.get("absent"), None);
    }

    #[test]
    fn env_var_overrides_address() {
        // Env var names are unique per test to avoid cross-test interference.
        std::env::set_var("IGNITION_TEST_SERVANT_URL", "http://override:1234");
        let registry = ServantRegistry::resolve(&[servant(
            "deepseek",
            "http://localhost:9400",
            Some("IGNITION_TEST_SERVANT_URL"),
        )]);
        assert_eq!(registry.get("deepseek"), Some("http://override:1234"));
        std::env::remove_var("IGNITION_TEST_SERVANT_URL");
    }

    #[test]
    fn unset_env_var_falls_back() {
        let registry = ServantRegistry::resolve(&[servant(
            "deepseek",
            "http://localhost:9400",
            Some("IGNITION_TEST_UNSET_VAR"),
        )]);
        assert_eq!(registry.get("deepseek"), Some("http://localhost:9400"));
    }

    #[test]
    fn empty_env_var_falls_back() {
        std::env::set_var("IGNITION_TEST_EMPTY_VAR", "  ");
        let registry = ServantRegistry::resolve(&[servant(
            "deepseek",
            "http://localhost:9400",
            Some("IGNITION_TEST_EMPTY_VAR"),
        )]);
        assert_eq!(registry.get("deepseek"), Some("http://localhost:9400"));
        std::env::remove_var("IGNITION_TEST_EMPTY_VAR");
    }

    #[test]
    fn duplicate_names_keep_first() {
        let registry = ServantRegistry::resolve(&[
            servant("deepseek", "http://first", None),
            servant("deepseek", "http://second", None),
        ]);
        assert_eq!(registry.endpoints().len(), 1);
        assert_eq!(registry.get("deepseek"), Some("http://first"));
    }

    #[test]
    fn writes_endpoint_file_in_order() {
        let dir = TempDir::new().unwrap();
        let registry = ServantRegistry::resolve(&[
            servant("b-servant", "http://b", None),
            servant("a-servant", "http://a", None),
        ]);
        registry.write_endpoints(dir.path()).unwrap();
        let data = std::fs::read_to_string(paths::endpoints_path(dir.path())).unwrap();
        assert_eq!(data, "b-servant=http://b\na-servant=http://a\n");
    }

    #[test]
    fn empty_registry_writes_empty_file() {
        let dir = TempDir::new().unwrap();
        let registry = ServantRegistry::resolve(&[]);
        registry.write_endpoints(dir.path()).unwrap();
        let data = std::fs::read_to_string(paths::endpoints_path(dir.path())).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn parse_skips_malformed_lines() {
        let data = "deepseek=http://a\n\n# comment\nnot-a-pair\n=no-name\nmistral=http://b\n";
        let map = parse_endpoints(data);
        assert_eq!(map.len(), 2);
        assert_eq!(map["deepseek"], "http://a");
        assert_eq!(map["mistral"], "http://b");
    }

    #[test]
    fn parse_keeps_first_duplicate() {
        let map = parse_endpoints("x=http://one\nx=http://two\n");
        assert_eq!(map["x"], "http://one");
    }
}
