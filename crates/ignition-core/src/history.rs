//! Run history with best-sequence tracking.
//!
//! Every orchestration run appends a record; the run with the highest
//! success rate (ties broken by lower total time) is remembered as the best
//! known sequence. Corrupt history degrades to empty, like the checkpoint.

use crate::error::{IgnitionError, Result};
use crate::io;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Keep only the most recent runs on disk.
const MAX_RUNS: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentRun {
    pub name: String,
    pub attempts: u32,
    pub success: bool,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub components: Vec<ComponentRun>,
    pub success_rate: f64,
    pub total_ms: u64,
}

impl RunRecord {
    pub fn new(components: Vec<ComponentRun>, total_ms: u64) -> Self {
        let success_rate = if components.is_empty() {
            0.0
        } else {
            components.iter().filter(|c| c.success).count() as f64 / components.len() as f64
        };
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at: chrono::Utc::now(),
            components,
            success_rate,
            total_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BestSequence {
    pub run_id: String,
    pub component_names: Vec<String>,
    pub success_rate: f64,
    pub total_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct History {
    #[serde(default)]
    pub runs: Vec<RunRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_sequence: Option<BestSequence>,
}

impl History {
    /// Load history, treating a missing or corrupt file as empty.
    pub fn load(root: &Path) -> Self {
        let path = paths::history_path(root);
        let Ok(data) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        match serde_json::from_str(&data) {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "history file corrupt, starting fresh");
                Self::default()
            }
        }
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::history_path(root);
        let data = serde_json::to_vec_pretty(self)?;
        io::atomic_write(&path, &data)
            .map_err(|e| IgnitionError::Persistence(format!("{}: {e}", path.display())))
    }

    /// Append a run, updating the best sequence when it improves on the
    /// current one (higher success rate, or same rate but faster).
    pub fn record(&mut self, run: RunRecord) {
        let improves = match &self.best_sequence {
            None => true,
            Some(best) => {
                run.success_rate > best.success_rate
                    || (run.success_rate == best.success_rate && run.total_ms < best.total_ms)
            }
        };
        if improves {
            self.best_sequence = Some(BestSequence {
                run_id: run.run_id.clone(),
                component_names: run.components.iter().map(|c| c.name.clone()).collect(),
                success_rate: run.success_rate,
                total_ms: run.total_ms,
            });
        }
        self.runs.push(run);
        if self.runs.len() > MAX_RUNS {
            let excess = self.runs.len() - MAX_RUNS;
            self.runs.drain(..excess);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn run(names: &[(&str, bool)], total_ms: u64) -> RunRecord {
        let components = names
            .iter()
            .map(|(name, success)| ComponentRun {
                name: name.to_string(),
                attempts: 1,
                success: *success,
                duration_ms: 10,
            })
            .collect();
        RunRecord::new(components, total_ms)
    }

    #[test]
    fn success_rate_computed() {
        let r = run(&[("a", true), ("b", false)], 100);
        assert_eq!(r.success_rate, 0.5);
    }

    #[test]
    fn empty_run_has_zero_rate() {
        let r = RunRecord::new(vec![], 0);
        assert_eq!(r.success_rate, 0.0);
    }

    #[test]
    fn load_missing_is_empty() {
        let dir = TempDir::new().unwrap();
        let history = History::load(dir.path());
        assert!(history.runs.is_empty());
        assert!(history.best_sequence.is_none());
    }

    #[test]
    fn load_corrupt_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = paths::history_path(dir.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{{{{").unwrap();
        let history = History::load(dir.path());
        assert!(history.runs.is_empty());
    }

    #[test]
    fn save_then_load_roundtrips() {
        let dir = TempDir::new().unwrap();
        let mut history = History::default();
        history.record(run(&[("a", true)], 50));
        history.save(dir.path()).unwrap();
        let loaded = History::load(dir.path());
        assert_eq!(loaded.runs.len(), 1);
        assert_eq!(loaded.runs[0].components[0].name, "a");
    }

    #[test]
    fn first_run_becomes_best() {
        let mut history = History::default();
        history.record(run(&[("a", false)], 100));
        let best = history.best_sequence.as_ref().unwrap();
        assert_eq!(best.success_rate, 0.0);
    }

    #[test]
    fn higher_rate_replaces_best() {
        let mut history = History::default();
        history.record(run(&[("a", false), ("b", true)], 100));
        history.record(run(&[("a", true), ("b", true)], 200));
        let best = history.best_sequence.as_ref().unwrap();
        assert_eq!(best.success_rate, 1.0);
        assert_eq!(best.total_ms, 200);
    }

    #[test]
    fn equal_rate_faster_replaces_best() {
        let mut history = History::default();
        history.record(run(&[("a", true)], 300));
        history.record(run(&[("a", true)], 100));
        let best = history.best_sequence.as_ref().unwrap();
        assert_eq!(best.total_ms, 100);
    }

    #[test]
    fn worse_run_keeps_best() {
        let mut history = History::default();
        history.record(run(&[("a", true)], 100));
        let best_id = history.best_sequence.as_ref().unwrap().run_id.clone();
        history.record(run(&[("a", false)], 50));
        assert_eq!(history.best_sequence.as_ref().unwrap().run_id, best_id);
    }

    #[test]
    fn runs_trimmed_to_recent() {
        let mut history = History::default();
        for _ in 0..(MAX_RUNS + 10) {
            history.record(run(&[("a", true)], 10));
        }
        assert_eq!(history.runs.len(), MAX_RUNS);
    }
}
