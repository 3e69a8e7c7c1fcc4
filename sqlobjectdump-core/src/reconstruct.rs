//! Definition reconstruction.
//!
//! Tables have no stored definition, so one is synthesized from the column
//! catalog as a table variable declaration. Every other kind is exported
//! from the text the server keeps for it.

use crate::{
    Result,
    catalog::CatalogSource,
    models::{ColumnDefinition, ObjectDescriptor, ReconstructionStrategy},
};
use tracing::debug;

/// Ordered lines accumulated while one object is reconstructed.
///
/// Lines are joined by the separator when the buffer is finished. No
/// separator is ever emitted after the last line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefinitionBuffer {
    lines: Vec<String>,
    separator: &'static str,
}

impl DefinitionBuffer {
    /// Buffer that concatenates lines verbatim.
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer that joins lines with `separator`.
    pub const fn with_separator(separator: &'static str) -> Self {
        Self {
            lines: Vec::new(),
            separator,
        }
    }

    /// Appends a line.
    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Joins the buffered lines.
    pub fn finish(self) -> String {
        self.lines.join(self.separator)
    }
}

/// Renders the length suffix of a column type.
///
/// `-1` is the catalog's marker for `(MAX)`; other positive lengths render
/// as `(N)`; no length renders nothing.
pub fn render_length(max_length: Option<i32>) -> String {
    match max_length {
        Some(ColumnDefinition::UNBOUNDED_LENGTH) => "(MAX)".to_string(),
        Some(length) if length > 0 => format!("({length})"),
        _ => String::new(),
    }
}

/// Renders one column as `[name] [type](len) NULL|NOT NULL`.
pub fn render_column(column: &ColumnDefinition) -> String {
    format!(
        "[{}] [{}]{} {}",
        column.name,
        column.data_type,
        render_length(column.max_length),
        if column.is_nullable { "NULL" } else { "NOT NULL" }
    )
}

/// Builds `DECLARE @<name> TABLE (...)` from columns already in ordinal order.
pub fn table_variable_declaration(table_name: &str, columns: &[ColumnDefinition]) -> String {
    let mut body = DefinitionBuffer::with_separator(",\n");
    for column in columns {
        body.push(format!("\t{}", render_column(column)));
    }

    if body.is_empty() {
        format!("DECLARE @{table_name} TABLE (\n);")
    } else {
        format!("DECLARE @{table_name} TABLE (\n{}\n);", body.finish())
    }
}

/// Fills in `descriptor.definition` using the strategy for its kind.
///
/// On success `definition_retrieved` is set. On failure the descriptor
/// keeps whatever was received before the error and the error is returned
/// for the caller to report.
///
/// # Errors
/// Returns the catalog error raised while reading columns or stored text.
pub async fn reconstruct(
    source: &mut dyn CatalogSource,
    descriptor: &mut ObjectDescriptor,
) -> Result<()> {
    descriptor.definition_retrieved = false;

    let outcome = match descriptor.kind.strategy() {
        ReconstructionStrategy::TableVariable => {
            let mut columns = Vec::new();
            let outcome = source
                .table_columns(
                    &descriptor.schema_name,
                    &descriptor.object_name,
                    &mut columns,
                )
                .await;
            debug!(
                "Read {} columns for {}",
                columns.len(),
                descriptor.qualified_name()
            );
            descriptor.definition = table_variable_declaration(&descriptor.object_name, &columns);
            outcome
        }
        ReconstructionStrategy::StoredText => {
            let mut buffer = DefinitionBuffer::new();
            let outcome = source
                .object_text(&descriptor.qualified_name(), &mut buffer)
                .await;
            debug!(
                "Read {} text rows for {}",
                buffer.len(),
                descriptor.qualified_name()
            );
            descriptor.definition = buffer.finish();
            outcome
        }
    };

    outcome?;
    descriptor.definition_retrieved = true;
    Ok(())
}
