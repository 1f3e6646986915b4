//! Cache-local config file source: <cache dir>/fastbuild.toml

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use std::path::{Path, PathBuf};

/// Name of the per-cache configuration file.
pub const CACHE_CONFIG_FILE: &str = "fastbuild.toml";

pub fn cache_config_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join(CACHE_CONFIG_FILE)
}

/// Add the cache-local config file to builder if it exists.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    cache_dir: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let path = cache_config_path(cache_dir);
    if path.is_file() {
        return Ok(builder.add_source(File::from(path).required(false)));
    }
    Ok(builder)
}
