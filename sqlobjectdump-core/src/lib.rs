//! Core library for sqlobjectdump.
//!
//! Exports the definitions of SQL Server objects to one file per object:
//! the catalog is enumerated, each object's definition is rebuilt (tables
//! from their columns, everything else from the text stored by the server),
//! a provenance header is prepended, and the result is written to a
//! deterministic path. The export tree can optionally be kept in git.
//!
//! # Architecture
//! - [`catalog::CatalogSource`] abstracts the server; [`mssql`] implements it
//! - [`reconstruct`], [`annotate`] and [`materialize`] are the per-object stages
//! - [`vcs`] wraps the run in clone/pull and add/commit/push
//! - [`pipeline::run_export`] drives a whole run sequentially

pub mod annotate;
pub mod catalog;
pub mod config;
pub mod connection;
pub mod error;
pub mod logging;
pub mod materialize;
pub mod models;
#[cfg(feature = "mssql")]
pub mod mssql;
pub mod pipeline;
pub mod reconstruct;
pub mod vcs;

// Re-export commonly used types
pub use catalog::{CatalogFilter, CatalogSource};
pub use config::{ExportConfig, ServerConfig};
pub use connection::ConnectionDescriptor;
pub use error::{DumpError, Result};
pub use logging::init_logging;
pub use models::{
    ColumnDefinition, ExportSummary, ObjectDescriptor, ObjectKind, ReconstructionStrategy,
    VersionControlOutcome,
};
pub use pipeline::{ExportTarget, run_export};
pub use reconstruct::DefinitionBuffer;
pub use vcs::{GitOps, SystemGit};
