//! Export and server configuration.
//!
//! Neither struct holds credentials; those live in
//! [`ConnectionDescriptor`](crate::connection::ConnectionDescriptor).

use crate::{Result, catalog::CatalogFilter, error::DumpError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// What to export and where.
///
/// # Example
/// ```rust
/// use sqlobjectdump_core::config::ExportConfig;
///
/// let config = ExportConfig::new("/srv/sql-export")
///     .with_schema("dbo")
///     .with_kind("P")
///     .with_git(Some("git@example.com:dba/schema.git".to_string()));
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.filter().schema.as_deref(), Some("dbo"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Root directory of the export tree
    pub directory: PathBuf,
    /// Restrict to one schema; empty means every non-system schema
    #[serde(default)]
    pub schema: Option<String>,
    /// Restrict to one catalog type code; empty means every exported kind
    #[serde(default)]
    pub kind: Option<String>,
    /// Clone/pull before and commit/push after the export
    #[serde(default)]
    pub git: bool,
    /// Remote to clone into `directory`
    #[serde(default)]
    pub git_address: Option<String>,
    /// Do not write objects whose definition could not be retrieved
    #[serde(default)]
    pub skip_incomplete: bool,
}

impl ExportConfig {
    /// Creates a config exporting everything into `directory`.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            schema: None,
            kind: None,
            git: false,
            git_address: None,
            skip_incomplete: false,
        }
    }

    /// Builder method to set the schema filter.
    #[must_use]
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Builder method to set the object kind filter.
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Builder method to enable git integration with an optional remote.
    #[must_use]
    pub fn with_git(mut self, git_address: Option<String>) -> Self {
        self.git = true;
        self.git_address = git_address;
        self
    }

    /// Builder method to skip writing incomplete definitions.
    #[must_use]
    pub const fn with_skip_incomplete(mut self, skip_incomplete: bool) -> Self {
        self.skip_incomplete = skip_incomplete;
        self
    }

    /// Loads a config from a JSON file.
    ///
    /// # Errors
    /// Returns an I/O error if the file cannot be read and a serialization
    /// error if it is not a valid config document.
    pub fn from_json_file(path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| DumpError::io(format!("Failed to read {}", path.display()), e))?;
        serde_json::from_str(&contents).map_err(|e| DumpError::Serialization {
            context: format!("Invalid config file {}", path.display()),
            source: e,
        })
    }

    /// Catalog filter derived from the schema and kind settings.
    pub fn filter(&self) -> CatalogFilter {
        CatalogFilter::new(self.schema.as_deref(), self.kind.as_deref())
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns a configuration error if the directory is empty, a remote is
    /// given without enabling git, or the kind filter is longer than a
    /// catalog type code.
    pub fn validate(&self) -> Result<()> {
        if self.directory.as_os_str().is_empty() {
            return Err(DumpError::configuration("directory cannot be empty"));
        }

        if self.git_address.as_deref().is_some_and(|a| !a.is_empty()) && !self.git {
            return Err(DumpError::configuration(
                "git_address requires git integration to be enabled",
            ));
        }

        if let Some(kind) = self.kind.as_deref() {
            if kind.trim().chars().count() > 2 {
                return Err(DumpError::configuration(format!(
                    "object type '{kind}' is not a catalog type code (e.g. U, V, P, FN)"
                )));
            }
        }

        Ok(())
    }
}

/// Connection settings that are not part of the descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// TCP connect plus login timeout
    pub connect_timeout: Duration,
    /// Accept the server certificate without validation
    pub trust_server_certificate: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            trust_server_certificate: false,
        }
    }
}

impl ServerConfig {
    /// Validates connection settings.
    ///
    /// # Errors
    /// Returns error if the connect timeout is zero
    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout.is_zero() {
            return Err(DumpError::configuration(
                "connect_timeout must be greater than 0",
            ));
        }
        Ok(())
    }
}
