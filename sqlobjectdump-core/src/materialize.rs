//! Writes annotated definitions to the export tree.
//!
//! Layout:
//! `{root}/{host}/{database}/{schema}/{kind_label}/{schema}_{name}.{code}_{id}.sql`

use crate::{Result, error::DumpError, models::ObjectDescriptor};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of an exported object: `{schema}_{name}.{code}_{id}.sql`.
pub fn object_file_name(descriptor: &ObjectDescriptor) -> String {
    format!(
        "{}_{}.{}_{}.sql",
        descriptor.schema_name,
        descriptor.object_name,
        descriptor.kind.code(),
        descriptor.object_id
    )
}

/// Directory holding objects of one schema and kind.
pub fn object_dir(root: &Path, host: &str, database: &str, descriptor: &ObjectDescriptor) -> PathBuf {
    root.join(host)
        .join(database)
        .join(&descriptor.schema_name)
        .join(&descriptor.kind_label)
}

/// Full path of an exported object. Depends only on its arguments.
pub fn object_path(root: &Path, host: &str, database: &str, descriptor: &ObjectDescriptor) -> PathBuf {
    object_dir(root, host, database, descriptor).join(object_file_name(descriptor))
}

/// Writes objects under `{root}/{host}/{database}`.
#[derive(Debug, Clone)]
pub struct Materializer {
    root: PathBuf,
    host: String,
    database: String,
}

impl Materializer {
    /// Creates a materializer for one server and database.
    pub fn new(root: impl Into<PathBuf>, host: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            host: host.into(),
            database: database.into(),
        }
    }

    /// Path the object will be written to.
    pub fn path_for(&self, descriptor: &ObjectDescriptor) -> PathBuf {
        object_path(&self.root, &self.host, &self.database, descriptor)
    }

    /// Creates the parent directories and writes the definition, replacing
    /// any existing file.
    ///
    /// # Errors
    /// Returns an I/O error naming the directory or file that failed. The
    /// error only concerns this object.
    pub async fn write(&self, descriptor: &ObjectDescriptor) -> Result<PathBuf> {
        let dir = object_dir(&self.root, &self.host, &self.database, descriptor);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| DumpError::io(format!("Failed to create {}", dir.display()), e))?;

        let path = dir.join(object_file_name(descriptor));
        tokio::fs::write(&path, descriptor.definition.as_bytes())
            .await
            .map_err(|e| DumpError::io(format!("Failed to write {}", path.display()), e))?;

        debug!(
            "Wrote {} bytes to {}",
            descriptor.definition.len(),
            path.display()
        );
        Ok(path)
    }
}
