use camino::Utf8PathBuf;

use dirs::data_dir;

use crate::logging::LogFormat;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Extension-point group scanned for tools when none is configured.
pub const DEFAULT_TOOL_GROUP: &str = "anvil.tools";

/// Directory, relative to the platform data directory, holding manifests.
pub const PLUGIN_SUBDIRECTORY: &str = "anvil/plugins";

/// Default log filter expression used by the binaries.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Owned extension-point group used where allocation is required.
pub fn default_tool_group() -> String {
    DEFAULT_TOOL_GROUP.to_owned()
}

/// Computes the default manifest directories.
///
/// Returns the platform data directory joined with `anvil/plugins`, or no
/// directories when the platform has no data directory or it is not UTF-8.
pub fn default_plugin_dirs() -> Vec<Utf8PathBuf> {
    data_dir()
        .and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
        .map(|base| vec![base.join(PLUGIN_SUBDIRECTORY)])
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugin_dirs_end_with_anvil_plugins() {
        for dir in default_plugin_dirs() {
            assert!(dir.ends_with(PLUGIN_SUBDIRECTORY), "unexpected dir: {dir}");
        }
    }

    #[test]
    fn tool_group_matches_constant() {
        assert_eq!(default_tool_group(), "anvil.tools");
    }
}
