//! Configuration loader: assembles sources in precedence order.

use crate::config::merge::merge_policy;
use crate::config::sources::{cache_file, environment, global_file};
use crate::config::FastbuildConfig;
use crate::error::ConfigError;
use std::path::Path;
use tracing::debug;

/// Loads `FastbuildConfig` from defaults, config files and the environment
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a run using `cache_dir`
    ///
    /// Precedence (lowest to highest): defaults, global file, cache-local
    /// `fastbuild.toml`, `FASTBUILD__*` environment variables.
    pub fn load(cache_dir: &Path) -> Result<FastbuildConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = cache_file::add_to_builder(builder, cache_dir)?;
        let builder = environment::add_to_builder(builder)?;

        let config: FastbuildConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        debug!(cache_dir = %cache_dir.display(), "Configuration loaded");
        Ok(config)
    }

    /// Load configuration from one explicit file on top of the defaults.
    pub fn load_from_file(path: &Path) -> Result<FastbuildConfig, ConfigError> {
        let config: FastbuildConfig = merge_policy::builder_with_defaults()?
            .add_source(config::File::from(path))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}
