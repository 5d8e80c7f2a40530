use std::fs;

use camino::Utf8Path;
use serde::Deserialize;

use crate::core::Environment;
use crate::error::ConfigError;
use crate::registry::{AdapterCatalog, HandlerRegistry, RegistryConfig};
use crate::report::ReportOptions;
use crate::task::LoaderRequest;

/// A whole configuration document: which handlers to use, which loaders to
/// create or extend, and whether to report afterwards.
///
/// ```
/// # use loaderkit::Config;
/// let config = Config::from_json_str(r#"{
///     "loaders": [{ "loader": "project", "classpath": ["lib/a.jar"] }],
///     "report": { "hierarchy": "tree" }
/// }"#).unwrap();
///
/// assert_eq!(config.loaders.len(), 1);
/// assert!(config.registry.add_defaults);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub registry: RegistryConfig,
    pub report: Option<ReportOptions>,
    pub loaders: Vec<LoaderRequest>,
}

impl Config {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_path(path: impl AsRef<Utf8Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        tracing::debug!("reading configuration from {}", path);

        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Builds the handler registry, adapters looked up among the built-in ones.
    pub fn registry(&self, env: &Environment) -> Result<HandlerRegistry, ConfigError> {
        let catalog = AdapterCatalog::builtin(env);
        Ok(HandlerRegistry::from_config(&self.registry, env, &catalog)?)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use camino::Utf8PathBuf;

    use super::*;
    use crate::policy::DuplicateEntryPolicy;
    use crate::report::Format;
    use crate::task::LoaderSlot;

    #[test]
    fn test_empty_document() {
        let config = Config::from_json_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_full_document() {
        let config = Config::from_json_str(
            r#"{
                "registry": {
                    "add_defaults": false,
                    "handlers": [{ "loader": "path-loader", "adapter": "path" }]
                },
                "report": { "format": "xml", "report_packages": false },
                "loaders": [
                    {
                        "loader": "thread",
                        "classpath": ["a.jar", "b.jar"],
                        "parent": "system",
                        "duplicate_entry": "warn",
                        "fail_on_error": false
                    }
                ]
            }"#,
        )
        .unwrap();

        assert!(!config.registry.add_defaults);
        assert_eq!(config.registry.handlers[0].adapter, "path");
        assert_eq!(config.report.as_ref().map(ReportOptions::format), Some(Format::Xml));

        let request = &config.loaders[0];
        assert_eq!(request.loader, LoaderSlot::Thread);
        assert_eq!(request.parent, Some(LoaderSlot::System));
        assert_eq!(request.duplicate_entry, DuplicateEntryPolicy::Warn);
        assert!(!request.fail_on_error);

        let registry = config.registry(&Environment::default()).unwrap();
        assert_eq!(registry.registrations().len(), 1);
    }

    #[test]
    fn test_unknown_family() {
        let config = Config::from_json_str(
            r#"{ "registry": { "handlers": [{ "loader": "nope", "adapter": "base" }] } }"#,
        )
        .unwrap();

        assert!(matches!(
            config.registry(&Environment::default()),
            Err(ConfigError::Registry(_))
        ));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "loaders": [{{ "loader": "core", "reset": true }}] }}"#).unwrap();
        let path = Utf8PathBuf::from_path_buf(file.path().to_path_buf()).unwrap();

        let config = Config::from_path(&path).unwrap();
        assert!(config.loaders[0].reset);

        assert!(matches!(
            Config::from_path(path.with_extension("missing")),
            Err(ConfigError::FileSystem(_))
        ));
        assert!(matches!(
            Config::from_json_str("{ nope"),
            Err(ConfigError::Parse(_))
        ));
    }
}
