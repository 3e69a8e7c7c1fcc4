//! Error types for catalog extraction and export.
//!
//! Errors carry enough context to identify the failing object or step, but
//! never the connection password. Connection descriptors only ever appear in
//! their redacted `Display` form.

use thiserror::Error;

/// Main error type for sqlobjectdump operations.
#[derive(Debug, Error)]
pub enum DumpError {
    /// Database connection failed
    #[error("Database connection failed: {context}")]
    Connection {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Enumerating objects from the catalog failed
    #[error("Catalog query failed: {context}")]
    Catalog {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Rebuilding the definition of a single object failed
    #[error("Failed to reconstruct definition of {object}")]
    Reconstruction {
        object: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration or argument validation error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A version-control step failed
    #[error("git {step} failed: {output}")]
    VersionControl { step: String, output: String },

    /// I/O operation failed
    #[error("I/O operation failed: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization failed
    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results with `DumpError`
pub type Result<T> = std::result::Result<T, DumpError>;

impl DumpError {
    /// Creates a connection error with context
    pub fn connection_failed<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Connection {
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Creates a catalog error with context
    pub fn catalog_failed<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Catalog {
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Creates a reconstruction error for the named object
    pub fn reconstruction_failed<E>(object: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Reconstruction {
            object: object.into(),
            source: Box::new(error),
        }
    }

    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an I/O error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Creates a version-control error for the given step
    pub fn version_control(step: impl Into<String>, output: impl Into<String>) -> Self {
        Self::VersionControl {
            step: step.into(),
            output: output.into(),
        }
    }

    /// Returns true when the error must end the run.
    ///
    /// Connection, catalog and configuration failures leave nothing to export.
    /// Everything else is scoped to one object or one git step.
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::Catalog { .. } | Self::Configuration { .. }
        )
    }
}
