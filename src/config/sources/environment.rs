//! Environment source: FASTBUILD__<SECTION>__<KEY>

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Environment variable prefix (followed by `__`).
pub const ENV_PREFIX: &str = "FASTBUILD";

/// Add environment overrides to builder.
///
/// List-valued keys are split on whitespace, e.g.
/// `FASTBUILD__HASHING__COMMAND="md5sum --binary"`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .list_separator(" ")
            .with_list_parse_key("hashing.command")
            .with_list_parse_key("walker.exclude"),
    ))
}
