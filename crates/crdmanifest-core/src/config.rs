//! Provider configuration
//!
//! Stored in `~/.config/crdmanifest/config.yaml`:
//!
//! ```yaml
//! typePrefix: k8s
//! includeBuiltin: true
//! crdPaths:
//!   - /etc/crds/gateway.yaml
//! fetchTimeout: 30s
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::{Catalog, DEFAULT_TYPE_PREFIX};
use crate::crd::CrdParser;
use crate::error::{CoreError, Result};
use crate::kinds;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Prefix of every type name
    #[serde(default = "default_type_prefix")]
    pub type_prefix: String,

    /// CRD manifests to import
    #[serde(default)]
    pub crd_paths: Vec<PathBuf>,

    /// Register the built-in kinds
    #[serde(default = "default_true")]
    pub include_builtin: bool,

    /// Deadline for a single live read
    #[serde(default = "default_fetch_timeout", with = "humantime_serde")]
    pub fetch_timeout: Duration,
}

fn default_type_prefix() -> String {
    DEFAULT_TYPE_PREFIX.to_string()
}

fn default_true() -> bool {
    true
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            type_prefix: default_type_prefix(),
            crd_paths: Vec::new(),
            include_builtin: true,
            fetch_timeout: default_fetch_timeout(),
        }
    }
}

impl ProviderConfig {
    /// Load configuration from default location
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    ///
    /// Relative `crdPaths` are resolved against the file's directory.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yaml::from_str(&content)?;

        if let Some(base) = path.parent() {
            for crd_path in &mut config.crd_paths {
                if crd_path.is_relative() {
                    *crd_path = base.join(&*crd_path);
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Get default configuration path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| CoreError::InvalidConfig {
            message: "Could not determine config directory".to_string(),
        })?;
        Ok(config_dir.join("crdmanifest").join("config.yaml"))
    }

    pub fn validate(&self) -> Result<()> {
        let valid_prefix = self
            .type_prefix
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !valid_prefix {
            return Err(CoreError::InvalidConfig {
                message: format!(
                    "typePrefix '{}' may only contain lowercase letters, digits and '_'",
                    self.type_prefix
                ),
            });
        }
        if self.fetch_timeout.is_zero() {
            return Err(CoreError::InvalidConfig {
                message: "fetchTimeout must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Assemble the type-name table: built-in kinds, then every imported CRD
    pub fn build_catalog(&self) -> Result<Catalog> {
        let mut catalog = Catalog::new(&self.type_prefix);

        if self.include_builtin {
            for schema in kinds::builtin() {
                catalog.register(schema)?;
            }
        }

        for path in &self.crd_paths {
            let schemas = CrdParser::parse_file(path)?;
            tracing::debug!(path = %path.display(), versions = schemas.len(), "imported CRD file");
            for schema in schemas {
                catalog.register(schema)?;
            }
        }

        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const WIDGET_CRD: &str = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: widgets.example.com
spec:
  group: example.com
  scope: Namespaced
  names:
    kind: Widget
    plural: widgets
  versions:
    - name: v1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
          properties:
            spec:
              type: object
              properties:
                size:
                  type: string
"#;

    #[test]
    fn test_defaults() {
        let config = ProviderConfig::default();
        assert_eq!(config.type_prefix, "k8s");
        assert!(config.include_builtin);
        assert!(config.crd_paths.is_empty());
        assert_eq!(config.fetch_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(
            &path,
            "typePrefix: acme\nincludeBuiltin: false\nfetchTimeout: 5s\ncrdPaths:\n  - crds/widget.yaml\n",
        )
        .unwrap();

        let config = ProviderConfig::load_from(&path).unwrap();
        assert_eq!(config.type_prefix, "acme");
        assert!(!config.include_builtin);
        assert_eq!(config.fetch_timeout, Duration::from_secs(5));
        assert_eq!(config.crd_paths, vec![temp.path().join("crds/widget.yaml")]);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "{}\n").unwrap();

        let config = ProviderConfig::load_from(&path).unwrap();
        assert_eq!(config, ProviderConfig::default());
    }

    #[test]
    fn test_invalid_prefix() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "typePrefix: Not-Valid\n").unwrap();

        let err = ProviderConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig { .. }));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = ProviderConfig {
            fetch_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_build_catalog() {
        let temp = TempDir::new().unwrap();
        let crd_path = temp.path().join("widget.yaml");
        std::fs::write(&crd_path, WIDGET_CRD).unwrap();

        let config = ProviderConfig {
            crd_paths: vec![crd_path],
            ..Default::default()
        };
        let catalog = config.build_catalog().unwrap();

        assert!(
            catalog
                .manifest("k8s_gateway_solo_io_route_option_v1_manifest")
                .is_ok()
        );
        assert!(catalog.manifest("k8s_example_com_widget_v1_manifest").is_ok());
    }

    #[test]
    fn test_build_catalog_without_builtin() {
        let config = ProviderConfig {
            include_builtin: false,
            ..Default::default()
        };
        assert!(config.build_catalog().unwrap().is_empty());
    }

    #[test]
    fn test_missing_crd_file() {
        let config = ProviderConfig {
            crd_paths: vec![PathBuf::from("/nonexistent/crd.yaml")],
            ..Default::default()
        };
        assert!(matches!(
            config.build_catalog().unwrap_err(),
            CoreError::Io(_)
        ));
    }
}
