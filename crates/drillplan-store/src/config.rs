//! drillplan configuration and store factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use drillplan_core::memory::MemoryStore;
use drillplan_core::review::ReviewPolicy;
use drillplan_core::traits::ProgressStore;
use drillplan_core::SchedulerConfig;

use crate::json_file::JsonFileStore;

/// Config file name looked up in the current directory.
pub const CONFIG_FILE: &str = "drillplan.toml";

/// Which progress store backs the scheduler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// `progress.json` inside `data_dir`.
    #[default]
    Json,
    /// Nothing is persisted.
    Memory,
}

/// Top-level drillplan configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrillplanConfig {
    /// Directory holding the progress file.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Curriculum TOML file.
    #[serde(default = "default_curriculum")]
    pub curriculum: PathBuf,
    #[serde(default)]
    pub store: StoreKind,
    /// Bound on each store round-trip, in milliseconds.
    #[serde(default = "default_store_timeout")]
    pub store_timeout_ms: u64,
    #[serde(default)]
    pub review: ReviewPolicy,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".drillplan")
}
fn default_curriculum() -> PathBuf {
    PathBuf::from("curricula/thirty-day.toml")
}
fn default_store_timeout() -> u64 {
    10_000
}

impl Default for DrillplanConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            curriculum: default_curriculum(),
            store: StoreKind::default(),
            store_timeout_ms: default_store_timeout(),
            review: ReviewPolicy::default(),
        }
    }
}

impl DrillplanConfig {
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            review: self.review.clone(),
            store_timeout: Duration::from_millis(self.store_timeout_ms),
        }
    }

    /// Serialize back to TOML (used by `drillplan init`).
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize config")
    }

    /// Resolve `${VAR}` references and make relative paths relative to
    /// `base` (the directory of the config file).
    fn resolve_paths(&mut self, base: Option<&Path>) {
        self.data_dir = resolve_path(&self.data_dir, base);
        self.curriculum = resolve_path(&self.curriculum, base);
    }

    /// Apply `DRILLPLAN_*` overrides from `lookup`.
    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("DRILLPLAN_DATA_DIR") {
            self.data_dir = PathBuf::from(resolve_env_vars(&dir));
        }
        if let Some(path) = lookup("DRILLPLAN_CURRICULUM") {
            self.curriculum = PathBuf::from(resolve_env_vars(&path));
        }
    }
}

fn resolve_path(path: &Path, base: Option<&Path>) -> PathBuf {
    let path = PathBuf::from(resolve_env_vars(&path.to_string_lossy()));
    match base {
        Some(base) if path.is_relative() => base.join(path),
        _ => path,
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are not scanned again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        let var_name = &rest[start + 2..start + end];
        result.push_str(&rest[..start]);
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

/// Load configuration.
///
/// Search order:
/// 1. `path`, when given (it must exist)
/// 2. `drillplan.toml` in the current directory
/// 3. `~/.config/drillplan/config.toml`
///
/// Defaults are used when no file is found. Environment variable overrides:
/// `DRILLPLAN_DATA_DIR`, `DRILLPLAN_CURRICULUM`.
pub fn load_config_from(path: Option<&Path>) -> Result<DrillplanConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from(CONFIG_FILE);
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match &config_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let mut config = toml::from_str::<DrillplanConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            let base = path.parent().filter(|p| !p.as_os_str().is_empty());
            config.resolve_paths(base);
            tracing::debug!("loaded config from {}", path.display());
            config
        }
        None => DrillplanConfig::default(),
    };

    config.apply_env_overrides(|name| std::env::var(name).ok());

    if config.review.intervals.is_empty() {
        anyhow::bail!("review.intervals must list at least one interval");
    }
    if config.review.intervals.contains(&0) {
        anyhow::bail!("review.intervals must be at least one day");
    }

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("drillplan"))
}

/// Create the progress store selected by `config`.
pub async fn create_store(config: &DrillplanConfig) -> Result<Arc<dyn ProgressStore>> {
    match config.store {
        StoreKind::Json => {
            let store = JsonFileStore::open(&config.data_dir).await.with_context(|| {
                format!("failed to open progress store in {}", config.data_dir.display())
            })?;
            Ok(Arc::new(store))
        }
        StoreKind::Memory => {
            tracing::warn!("using in-memory store; progress will not be saved");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_DRILLPLAN_TEST_VAR", "plans");
        assert_eq!(resolve_env_vars("${_DRILLPLAN_TEST_VAR}"), "plans");
        assert_eq!(
            resolve_env_vars("/srv/${_DRILLPLAN_TEST_VAR}/data"),
            "/srv/plans/data"
        );
        assert_eq!(resolve_env_vars("${unterminated"), "${unterminated");
        std::env::remove_var("_DRILLPLAN_TEST_VAR");
    }

    #[test]
    fn resolved_values_are_not_expanded_again() {
        std::env::set_var("_DRILLPLAN_SELF_REF", "${_DRILLPLAN_SELF_REF}");
        assert_eq!(
            resolve_env_vars("${_DRILLPLAN_SELF_REF}/data"),
            "${_DRILLPLAN_SELF_REF}/data"
        );
        std::env::remove_var("_DRILLPLAN_SELF_REF");
    }

    #[test]
    fn default_config() {
        let config = DrillplanConfig::default();
        assert_eq!(config.store, StoreKind::Json);
        assert_eq!(config.store_timeout_ms, 10_000);
        assert_eq!(config.review.intervals, vec![1, 3, 7, 14]);
        assert_eq!(config.scheduler_config().store_timeout, Duration::from_secs(10));
    }

    #[test]
    fn parse_partial_review_table() {
        let toml_str = r#"
data_dir = "/var/lib/drillplan"
store = "memory"

[review]
intervals = [2, 5]
max_items = 5
"#;
        let config: DrillplanConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.review.intervals, vec![2, 5]);
        assert_eq!(config.review.max_items, 5);
        assert_eq!(config.review.fallback_limit, 3);
        assert_eq!(config.curriculum, default_curriculum());
    }

    #[test]
    fn relative_paths_follow_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "data_dir = \"state\"\ncurriculum = \"/abs/plan.toml\"\n").unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.data_dir, dir.path().join("state"));
        assert_eq!(config.curriculum, PathBuf::from("/abs/plan.toml"));
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let err = load_config_from(Some(Path::new("/nonexistent/drillplan.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn empty_intervals_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[review]\nintervals = []\n").unwrap();
        assert!(load_config_from(Some(&path)).is_err());
    }

    #[test]
    fn zero_day_interval_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[review]\nintervals = [0, 3]\n").unwrap();
        let err = load_config_from(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("at least one day"));
    }

    #[test]
    fn env_overrides_replace_paths() {
        let vars = HashMap::from([
            ("DRILLPLAN_DATA_DIR", "/tmp/progress"),
            ("DRILLPLAN_CURRICULUM", "plan.toml"),
        ]);
        let mut config = DrillplanConfig::default();
        config.apply_env_overrides(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/progress"));
        assert_eq!(config.curriculum, PathBuf::from("plan.toml"));
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = DrillplanConfig::default();
        let text = config.to_toml().unwrap();
        let parsed: DrillplanConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.review, config.review);
        assert_eq!(parsed.data_dir, config.data_dir);
    }

    #[tokio::test]
    async fn factory_builds_each_store_kind() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DrillplanConfig {
            data_dir: dir.path().join("data"),
            ..DrillplanConfig::default()
        };
        assert_eq!(create_store(&config).await.unwrap().name(), "json");

        config.store = StoreKind::Memory;
        assert_eq!(create_store(&config).await.unwrap().name(), "memory");
    }
}
