//! The export run: list, reconstruct, annotate, write, and optionally
//! commit.
//!
//! Everything runs sequentially over one catalog connection. Only failing
//! to enumerate the catalog ends the run early; per-object and git failures
//! are logged and counted.

use crate::{
    Result,
    annotate::annotate,
    catalog::CatalogSource,
    config::ExportConfig,
    materialize::Materializer,
    models::{ExportSummary, VersionControlOutcome},
    reconstruct::reconstruct,
    vcs::{GitOps, VersionControl},
};
use tracing::{error, info, warn};

/// Where exported files go: the root directory plus the `<host>/<database>`
/// segment of the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTarget {
    pub host: String,
    pub database: String,
}

impl ExportTarget {
    pub fn new(host: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            database: database.into(),
        }
    }
}

/// Runs one export.
///
/// # Errors
/// Returns an error only when the configuration is invalid or the catalog
/// cannot be enumerated. Failures for individual objects and for the git
/// steps are logged and reflected in the returned summary.
pub async fn run_export(
    source: &mut dyn CatalogSource,
    config: &ExportConfig,
    target: &ExportTarget,
    git: &dyn GitOps,
) -> Result<ExportSummary> {
    config.validate()?;

    let mut vcs = config
        .git
        .then(|| VersionControl::new(git, &config.directory, config.git_address.clone()));
    if let Some(vcs) = vcs.as_mut() {
        vcs.prepare();
    }

    let mut objects = source.list_objects(&config.filter()).await.map_err(|e| {
        error!("Failed to list catalog objects: {}", e);
        e
    })?;
    info!("Prepared {} objects for export", objects.len());

    let mut summary = ExportSummary {
        discovered: objects.len(),
        ..ExportSummary::default()
    };

    let total = objects.len();
    for (index, object) in objects.iter_mut().enumerate() {
        info!(
            "{}/{} Retrieving {} Definition for {} [{}]",
            index + 1,
            total,
            object.kind_label,
            object.qualified_name(),
            object.kind
        );
        match reconstruct(source, object).await {
            Ok(()) => summary.reconstructed += 1,
            Err(e) => {
                error!("{}: {}", e, error_chain(&e));
                summary.incomplete += 1;
            }
        }
        annotate(object);
    }

    let materializer = Materializer::new(&config.directory, &target.host, &target.database);
    for object in &objects {
        if config.skip_incomplete && !object.definition_retrieved {
            warn!(
                "Skipping {} [{}]: definition incomplete",
                object.qualified_name(),
                object.kind
            );
            summary.skipped += 1;
            continue;
        }
        match materializer.write(object).await {
            Ok(_) => summary.written += 1,
            Err(e) => {
                error!("{}: {}", e, error_chain(&e));
                summary.failed_writes += 1;
            }
        }
    }

    if let Some(vcs) = vcs.as_mut() {
        summary.version_control = match vcs.commit_and_push() {
            Ok(()) => VersionControlOutcome::Committed,
            Err(e) => {
                error!("{}", e);
                VersionControlOutcome::Failed
            }
        };
    }

    info!(
        "Exported {} of {} objects ({} incomplete, {} skipped, {} write failures)",
        summary.written,
        summary.discovered,
        summary.incomplete,
        summary.skipped,
        summary.failed_writes
    );
    Ok(summary)
}

/// Joins the `source()` chain of an error into one line.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut parts = Vec::new();
    let mut current = error.source();
    while let Some(cause) = current {
        parts.push(cause.to_string());
        current = cause.source();
    }
    parts.join(": ")
}
