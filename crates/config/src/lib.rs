//! Configuration loading for tagcache.
//!
//! Sources are layered, later ones overriding earlier ones:
//!
//! 1. Built-in defaults ([`Config::default`]).
//! 2. A configuration file: the one passed to [`load`], or
//!    `config.toml` in the platform configuration directory if it exists.
//!    TOML, YAML and JSON are accepted, chosen by file extension.
//! 3. Environment variables prefixed with `TAGCACHE_`, for example
//!    `TAGCACHE_PROBE_AUDIO=false`.

pub mod error;

use directories::ProjectDirs;
use exn::{OptionExt, ResultExt};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::instrument;

use crate::error::{ErrorKind, Result};

const APPLICATION: &str = "tagcache";
const ENV_PREFIX: &str = "TAGCACHE_";
// Used when no platform cache directory exists (no home directory).
const FALLBACK_DATABASE: &str = "tagcache.db";
// The stream prober logs every file it opens at info level.
const DEFAULT_LOG: &str = "info,symphonia=warn";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Location of the SQLite cache database.
    pub database: PathBuf,
    /// Read duration and bit rate from the audio stream.
    pub probe_audio: bool,
    /// Log filter directive, e.g. `info` or `tagcache_cache=debug`.
    /// `RUST_LOG` takes precedence when set.
    pub log: String,
}
impl Default for Config {
    fn default() -> Self {
        let database = project_dirs()
            .map(|dirs| dirs.cache_dir().join("cache.db"))
            .unwrap_or_else(|| PathBuf::from(FALLBACK_DATABASE));
        Self { database, probe_audio: true, log: DEFAULT_LOG.to_string() }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", APPLICATION)
}

/// Location of the default configuration file (which may not exist).
pub fn default_path() -> Result<PathBuf> {
    let dirs = project_dirs().ok_or_raise(|| ErrorKind::NoHomeDirectory)?;
    Ok(dirs.config_dir().join("config.toml"))
}

/// Load the configuration.
///
/// An explicit `path` must exist. Without one, the default file is used when
/// present and silently skipped otherwise.
#[instrument(skip(path), fields(path = ?path))]
pub fn load(path: Option<&Path>) -> Result<Config> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));
    match path {
        Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
        Some(path) => figment = merge_file(figment, path)?,
        None => match default_path() {
            Ok(path) if path.is_file() => figment = merge_file(figment, &path)?,
            Ok(path) => tracing::debug!(path = %path.display(), "No configuration file found; using defaults"),
            Err(err) => tracing::debug!(error = ?err, "Skipping default configuration file"),
        },
    }
    figment.merge(Env::prefixed(ENV_PREFIX)).extract().or_raise(|| ErrorKind::Load)
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or_default();
    tracing::debug!(path = %path.display(), "Loading configuration file");
    Ok(match extension.to_ascii_lowercase().as_str() {
        "toml" => figment.merge(Toml::file(path)),
        "yaml" | "yml" => figment.merge(Yaml::file(path)),
        "json" => figment.merge(Json::file(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
    })
}
