//! TOML configuration: loading, normalization and validation.
//!
//! The config file is searched upward from the working directory, so
//! commands work from anywhere inside a project tree. Unknown keys are
//! warned about rather than rejected.

mod error;

pub use error::ConfigError;

use crate::cdn::age;
use crate::log;
use crate::path::normalize_path;
use crate::store::Provider;
use chrono::Utc;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CdnpinConfig {
    pub presentation: PresentationConfig,
    pub paths: PathsConfig,
    pub cdn: CdnConfig,
    pub purge: PurgeConfig,
}

/// How URLs are resolved for rendering.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PresentationConfig {
    /// When set, every asset resolves to its local web-root path.
    pub disabled: bool,
    pub always_use_https: bool,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            always_use_https: false,
        }
    }
}

/// Filesystem layout of the project being published.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding the per-asset `.md5` hash records.
    pub hash_dir: PathBuf,
    pub webroot: PathBuf,
    pub app_root: PathBuf,
    /// Literal substitutions applied when flattening a canonical path
    /// into a record stem (for symlinked or plugin layouts).
    pub translations: Vec<Translation>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            hash_dir: PathBuf::from("tmp/cdnpin"),
            webroot: PathBuf::from("webroot"),
            app_root: PathBuf::from("."),
            translations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Translation {
    pub from: String,
    pub to: String,
}

/// Where published objects go and how they are addressed.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CdnConfig {
    pub provider: Provider,
    pub container: String,
    /// Root directory for the `dir` provider.
    pub store_dir: PathBuf,
    /// Public base URL over plain HTTP.
    pub http: String,
    /// Public base URL over HTTPS.
    pub https: String,
    pub auth: AuthConfig,
    /// Per-request timeout for remote providers. The `dir` provider
    /// does blocking local I/O and has no use for it; it is validated
    /// and reserved for when a network-backed provider lands.
    pub timeout_secs: u64,
}

impl Default for CdnConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            container: "assets".to_string(),
            store_dir: PathBuf::from("cdn"),
            http: String::new(),
            https: String::new(),
            auth: AuthConfig::default(),
            timeout_secs: 600,
        }
    }
}

/// Provider credentials. Unused by the `dir` provider.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub username: Option<String>,
    pub key: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PurgeConfig {
    /// Retention floor when `purge` is run without an explicit age.
    pub default_older_than: String,
}

impl Default for PurgeConfig {
    fn default() -> Self {
        Self {
            default_older_than: "-6 months".to_string(),
        }
    }
}

impl CdnpinConfig {
    /// Load, normalize and validate the config at `path`.
    ///
    /// A relative `path` that does not exist is searched for in the
    /// ancestors of the current directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let path = find_config_file(path)?;
        let raw = fs::read_to_string(&path).map_err(|e| ConfigError::Io(path.clone(), e))?;
        let mut config = Self::parse_with_ignored(&raw)?;
        config.normalize(path.parent().unwrap_or(Path::new(".")));
        config.validate()?;
        Ok(config)
    }

    /// Parse TOML, warning about unknown keys instead of failing.
    fn parse_with_ignored(raw: &str) -> Result<Self, ConfigError> {
        let de = toml::Deserializer::new(raw);
        let config = serde_ignored::deserialize(de, |ignored| {
            log!("config"; "unknown key `{ignored}` ignored");
        })?;
        Ok(config)
    }

    /// Make all configured paths absolute, resolving `~` and anchoring
    /// relative paths at the config file's directory.
    fn normalize(&mut self, config_dir: &Path) {
        for path in [
            &mut self.paths.hash_dir,
            &mut self.paths.webroot,
            &mut self.paths.app_root,
            &mut self.cdn.store_dir,
        ] {
            let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
            let expanded = PathBuf::from(expanded);
            *path = if expanded.is_absolute() {
                normalize_path(&expanded)
            } else {
                normalize_path(&config_dir.join(expanded))
            };
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.cdn.container.trim().is_empty() {
            return Err(ConfigError::Validation(
                "cdn.container must not be empty".to_string(),
            ));
        }
        if self.cdn.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "cdn.timeout_secs must be positive".to_string(),
            ));
        }

        // Base URLs only matter when CDN serving is on
        if !self.presentation.disabled {
            for (key, value) in [("cdn.http", &self.cdn.http), ("cdn.https", &self.cdn.https)] {
                let url = Url::parse(value).map_err(|e| {
                    ConfigError::Validation(format!("{key} is not a valid URL (`{value}`): {e}"))
                })?;
                let expected = key.rsplit('.').next().unwrap_or_default();
                if url.scheme() != expected {
                    return Err(ConfigError::Validation(format!(
                        "{key} must use the {expected} scheme, got `{value}`"
                    )));
                }
            }
        }

        if let Err(e) = age::parse_expr(&self.purge.default_older_than, Utc::now()) {
            return Err(ConfigError::Validation(format!(
                "purge.default_older_than: {e}"
            )));
        }
        Ok(())
    }

    /// Record-stem translations as plain pairs.
    pub fn translation_pairs(&self) -> Vec<(String, String)> {
        self.paths
            .translations
            .iter()
            .map(|t| (t.from.clone(), t.to.clone()))
            .collect()
    }
}

/// Resolve the config file path, walking up from the current directory
/// when a relative path does not exist where given.
fn find_config_file(path: &Path) -> Result<PathBuf, ConfigError> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    if path.is_relative()
        && let Ok(cwd) = std::env::current_dir()
    {
        for dir in cwd.ancestors() {
            let candidate = dir.join(path);
            if candidate.exists() {
                return Ok(candidate);
            }
        }
    }
    Err(ConfigError::NotFound(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("cdnpin.toml");
        fs::write(&path, body).unwrap();
        path
    }

    const MINIMAL: &str = r#"
        [cdn]
        container = "assets"
        http = "http://cdn.example.com/assets"
        https = "https://ssl.example.com/assets"
    "#;

    #[test]
    fn test_load_minimal_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, MINIMAL);

        let config = CdnpinConfig::load(&path).unwrap();
        assert!(!config.presentation.disabled);
        assert_eq!(config.cdn.provider, Provider::Dir);
        assert_eq!(config.cdn.timeout_secs, 600);
        assert_eq!(config.purge.default_older_than, "-6 months");
        // relative defaults are anchored at the config directory
        assert_eq!(config.paths.webroot, dir.path().join("webroot"));
        assert_eq!(config.paths.hash_dir, dir.path().join("tmp/cdnpin"));
    }

    #[test]
    fn test_load_full() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
            [presentation]
            always_use_https = true

            [paths]
            webroot = "site/webroot"
            app_root = "site"
            translations = [{ from = "/theme/", to = "/plugins/theme/" }]

            [cdn]
            provider = "dir"
            container = "myapp"
            store_dir = "origin"
            http = "http://cdn.example.com/myapp"
            https = "https://ssl.example.com/myapp"

            [purge]
            default_older_than = "-3 months"
            "#,
        );

        let config = CdnpinConfig::load(&path).unwrap();
        assert!(config.presentation.always_use_https);
        assert_eq!(config.cdn.container, "myapp");
        assert_eq!(config.paths.webroot, dir.path().join("site/webroot"));
        assert_eq!(
            config.translation_pairs(),
            [("/theme/".to_string(), "/plugins/theme/".to_string())]
        );
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
            [cdn]
            http = "not a url"
            https = "https://ssl.example.com"
            "#,
        );
        assert!(matches!(
            CdnpinConfig::load(&path),
            Err(ConfigError::Validation(_))
        ));

        // scheme mismatch
        let path = write_config(
            &dir,
            r#"
            [cdn]
            http = "https://cdn.example.com"
            https = "https://ssl.example.com"
            "#,
        );
        assert!(matches!(
            CdnpinConfig::load(&path),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_disabled_skips_url_validation() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
            [presentation]
            disabled = true
            "#,
        );
        assert!(CdnpinConfig::load(&path).unwrap().presentation.disabled);
    }

    #[test]
    fn test_validate_rejects_bad_retention() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
            [presentation]
            disabled = true

            [purge]
            default_older_than = "whenever"
            "#,
        );
        assert!(matches!(
            CdnpinConfig::load(&path),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_unknown_keys_tolerated() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
            [presentation]
            disabled = true
            typo_key = 1
            "#,
        );
        assert!(CdnpinConfig::load(&path).is_ok());
    }

    #[test]
    fn test_missing_config() {
        assert!(matches!(
            CdnpinConfig::load(Path::new("/nonexistent/cdnpin.toml")),
            Err(ConfigError::NotFound(_))
        ));
    }
}
