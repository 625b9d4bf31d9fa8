//! Configuration for autodash.
//!
//! Layers, later ones win:
//!
//! 1. **Built-in defaults**: [`DashConfig::default()`]
//! 2. **User global config**: `~/.autodash/config.toml`
//! 3. **Project local config**: `autodash.toml` in the current directory
//! 4. **Environment variables**: `AUTODASH_*` overrides
//!
//! Every section is `#[serde(default)]`, so a file only needs the keys it
//! changes:
//!
//! ```toml
//! [data]
//! rows = 5000
//! seed = 7
//!
//! [view]
//! top_n = 5
//! default_metric = "commission"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::export::EXPORT_FILENAME;
use crate::data::generate::GeneratorConfig;
use crate::data::model::Metric;
use crate::pipeline::aggregate::TOP_N_LIMIT;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    pub data: GeneratorConfig,
    pub view: ViewConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub top_n: usize,
    pub default_metric: Metric,
}

impl Default for ViewConfig {
    fn default() -> Self {
        ViewConfig {
            top_n: TOP_N_LIMIT,
            default_metric: Metric::SalePrice,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub filename: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            filename: EXPORT_FILENAME.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration. Never fails: unreadable or
/// malformed files are logged and skipped.
pub fn load() -> DashConfig {
    let mut config = DashConfig::default();

    for path in [global_config_path(), project_config_path()]
        .into_iter()
        .flatten()
    {
        if !path.exists() {
            continue;
        }
        match load_file(&path) {
            Ok(layer) => {
                log::info!("Loaded config from {}", path.display());
                // Each file is read with defaults for missing keys, so the
                // later layer replaces the earlier one as a whole.
                config = layer;
            }
            Err(e) => log::warn!("Ignoring config: {e}"),
        }
    }

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

pub fn load_file(path: &Path) -> Result<DashConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config: DashConfig = toml::from_str(&text).map_err(|source| ConfigError::Toml {
        path: path.to_path_buf(),
        source,
    })?;
    if config.view.top_n == 0 {
        log::warn!(
            "Ignoring top_n = 0 in {}; using {TOP_N_LIMIT}",
            path.display()
        );
        config.view.top_n = TOP_N_LIMIT;
    }
    Ok(config)
}

/// `~/.autodash/config.toml`
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".autodash").join("config.toml"))
}

/// `autodash.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join("autodash.toml"))
}

/// Apply environment overrides (highest precedence layer).
///
/// Supported variables:
/// - `AUTODASH_ROWS`: number of generated records
/// - `AUTODASH_SEED`: generator seed
/// - `AUTODASH_TOP_N`: size of the top performers list
fn apply_env_overrides(config: &mut DashConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(rows) = parse_var(&var, "AUTODASH_ROWS") {
        config.data.rows = rows;
    }
    if let Some(seed) = parse_var(&var, "AUTODASH_SEED") {
        config.data.seed = seed;
    }
    match parse_var(&var, "AUTODASH_TOP_N") {
        Some(0) => log::warn!("Ignoring AUTODASH_TOP_N=0: the list needs at least one entry"),
        Some(top_n) => config.view.top_n = top_n,
        None => {}
    }
}

fn parse_var<T: std::str::FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = var(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("Ignoring {key}={raw:?}: not a valid number");
            None
        }
    }
}
