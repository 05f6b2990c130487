//! Process-wide runtime settings.
//!
//! Values come from an optional JSON file named by `SHARDNUM_CONFIG`, then
//! individual environment variables override single fields. The result is
//! read once and cached for the lifetime of the process.

use std::env;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use log::{debug, warn};
use serde::Deserialize;

pub const DEFAULT_MAX_DIM: usize = 4;
pub const MAX_DIM_LIMIT: usize = 32;
pub const DEFAULT_PARALLEL_MIN_ELEMENTS: usize = 1 << 15;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Highest array rank the runtime supports.
    pub max_dim: usize,
    /// Worker threads for the reduction pool; `None` lets rayon decide.
    pub threads: Option<usize>,
    pub parallel: bool,
    /// Inputs smaller than this are reduced on the calling thread.
    pub parallel_min_elements: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_dim: DEFAULT_MAX_DIM,
            threads: None,
            parallel: true,
            parallel_min_elements: DEFAULT_PARALLEL_MIN_ELEMENTS,
        }
    }
}

impl RuntimeConfig {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RuntimeConfig>(text).map(RuntimeConfig::normalized)
    }

    /// Applies `SHARDNUM_*` overrides looked up through `lookup`.
    /// Unparseable values are ignored.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(max_dim) = lookup("SHARDNUM_MAX_DIM").and_then(|v| v.trim().parse().ok()) {
            self.max_dim = max_dim;
        }
        if let Some(threads) = lookup("SHARDNUM_THREADS").and_then(|v| v.trim().parse().ok()) {
            self.threads = Some(threads);
        }
        if let Some(min) = lookup("SHARDNUM_PARALLEL_MIN_ELEMENTS")
            .and_then(|v| v.trim().parse().ok())
        {
            self.parallel_min_elements = min;
        }
        if let Some(parallel) = lookup("SHARDNUM_PARALLEL").and_then(|v| parse_bool(&v)) {
            self.parallel = parallel;
        }
        self.normalized()
    }

    fn normalized(mut self) -> Self {
        self.max_dim = self.max_dim.clamp(1, MAX_DIM_LIMIT);
        self.threads = self.threads.filter(|&threads| threads > 0);
        self
    }
}

pub fn runtime() -> &'static RuntimeConfig {
    static CONFIG: OnceLock<RuntimeConfig> = OnceLock::new();
    CONFIG.get_or_init(load)
}

pub fn max_dim() -> usize {
    runtime().max_dim
}

fn load() -> RuntimeConfig {
    let base = env::var("SHARDNUM_CONFIG")
        .ok()
        .and_then(|path| load_file(Path::new(&path)))
        .unwrap_or_default();
    let config = base.apply_overrides(|name| env::var(name).ok());
    debug!("runtime configuration: {config:?}");
    config
}

fn load_file(path: &Path) -> Option<RuntimeConfig> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            warn!("ignoring config file {}: {err}", path.display());
            return None;
        }
    };
    match RuntimeConfig::from_json(&text) {
        Ok(config) => Some(config),
        Err(err) => {
            warn!("ignoring config file {}: {err}", path.display());
            None
        }
    }
}

pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Dedicated pool for reduction lanes, or `None` when parallelism is off or
/// only one worker would be available.
pub(crate) fn thread_pool() -> Option<&'static rayon::ThreadPool> {
    static POOL: OnceLock<Option<rayon::ThreadPool>> = OnceLock::new();
    POOL.get_or_init(|| {
        let config = runtime();
        if !config.parallel {
            return None;
        }
        let builder = match config.threads {
            Some(threads) => rayon::ThreadPoolBuilder::new().num_threads(threads),
            None => rayon::ThreadPoolBuilder::new(),
        };
        match builder.thread_name(|i| format!("shardnum-{i}")).build() {
            Ok(pool) if pool.current_num_threads() > 1 => {
                debug!("reduction pool with {} threads", pool.current_num_threads());
                Some(pool)
            }
            Ok(_) => None,
            Err(err) => {
                warn!("falling back to sequential reductions: {err}");
                None
            }
        }
    })
    .as_ref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_match_the_usual_runtime_build() {
        let config = RuntimeConfig::default();
        assert_eq!(config.max_dim, 4);
        assert!(config.parallel);
        assert_eq!(config.threads, None);
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let config = RuntimeConfig::from_json(r#"{"max_dim": 6}"#).unwrap();
        assert_eq!(config.max_dim, 6);
        assert_eq!(config.parallel_min_elements, DEFAULT_PARALLEL_MIN_ELEMENTS);
        assert!(RuntimeConfig::from_json("not json").is_err());
    }

    #[test]
    fn environment_overrides_win_and_are_clamped() {
        let config = RuntimeConfig::default().apply_overrides(lookup(&[
            ("SHARDNUM_MAX_DIM", "99"),
            ("SHARDNUM_THREADS", "3"),
            ("SHARDNUM_PARALLEL", "off"),
            ("SHARDNUM_PARALLEL_MIN_ELEMENTS", "garbage"),
        ]));
        assert_eq!(config.max_dim, MAX_DIM_LIMIT);
        assert_eq!(config.threads, Some(3));
        assert!(!config.parallel);
        assert_eq!(config.parallel_min_elements, DEFAULT_PARALLEL_MIN_ELEMENTS);

        let config = RuntimeConfig::default().apply_overrides(lookup(&[("SHARDNUM_MAX_DIM", "0")]));
        assert_eq!(config.max_dim, 1);
    }

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert_eq!(parse_bool(" Yes "), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
