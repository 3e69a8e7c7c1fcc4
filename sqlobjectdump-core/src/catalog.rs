//! Catalog access.
//!
//! [`CatalogSource`] is the seam between the export pipeline and the server.
//! The SQL Server implementation lives in [`crate::mssql`]; tests drive the
//! pipeline through in-memory sources.

use crate::{
    Result,
    models::{ColumnDefinition, ObjectDescriptor},
    reconstruct::DefinitionBuffer,
};
use async_trait::async_trait;

/// Catalog type codes that are never exported.
///
/// Defaults, keys, constraints other than CHECK, sequences, synonyms, system
/// and internal tables, and CLR/aggregate stubs have no standalone text.
pub const EXCLUDED_KINDS: &[&str] = &[
    "D", "PK", "SO", "SQ", "UQ", "PC", "FS", "FT", "F", "SN", "S", "IT", "AF",
];

/// Schema hidden unless it is requested explicitly.
pub const SYSTEM_SCHEMA: &str = "sys";

/// Enumerates exportable objects.
///
/// Parameters: `@P1` schema filter length, `@P2` schema filter, `@P3` kind
/// filter length, `@P4` kind filter. A length of zero disables that filter.
pub const LIST_OBJECTS_SQL: &str = "SELECT
        s.[name] AS SchemaName,
        ao.[object_id] AS ObjectId,
        ao.[name] AS ObjectName,
        ao.[type] AS ObjectType,
        ao.[type_desc] AS ObjectTypeDesc
    FROM sys.all_objects ao
    JOIN sys.schemas s ON s.schema_id = ao.schema_id
    WHERE 1=1
    AND ((@P1 = 0 AND ao.schema_id <> SCHEMA_ID('sys')) OR (@P1 > 0 AND ao.schema_id = SCHEMA_ID(@P2)))
    AND ao.[type] NOT IN ('D', 'PK', 'SO', 'SQ', 'UQ', 'PC', 'FS', 'FT', 'F', 'SN', 'S', 'IT', 'AF')
    AND ((@P3 = 0) OR (@P3 > 0 AND ao.[type] = @P4))";

/// Columns of one table in ordinal order. `@P1` schema, `@P2` table.
pub const TABLE_COLUMNS_SQL: &str = "SELECT
        COLUMN_NAME,
        DATA_TYPE,
        CHARACTER_MAXIMUM_LENGTH,
        IS_NULLABLE,
        ORDINAL_POSITION
    FROM INFORMATION_SCHEMA.COLUMNS
    WHERE TABLE_SCHEMA = @P1 AND TABLE_NAME = @P2
    ORDER BY ORDINAL_POSITION ASC";

/// Stored definition text of a module, one row per line. `@P1` is `<schema>.<name>`.
pub const OBJECT_TEXT_SQL: &str = "EXEC sp_helptext @P1";

/// Optional schema and kind restrictions for the catalog query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub schema: Option<String>,
    pub kind: Option<String>,
}

impl CatalogFilter {
    /// Creates a filter; empty or blank values mean "no filter".
    pub fn new(schema: Option<&str>, kind: Option<&str>) -> Self {
        let normalize = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(ToString::to_string)
        };
        Self {
            schema: normalize(schema),
            kind: normalize(kind),
        }
    }

    /// Positional parameters for [`LIST_OBJECTS_SQL`].
    pub fn query_params(&self) -> (i32, &str, i32, &str) {
        let schema = self.schema.as_deref().unwrap_or("");
        let kind = self.kind.as_deref().unwrap_or("");
        (param_len(schema), schema, param_len(kind), kind)
    }

    /// Whether an object with this schema and type code passes the filter.
    ///
    /// Mirrors the `WHERE` clause of [`LIST_OBJECTS_SQL`] under the default
    /// case-insensitive collation, so `DBO` selects `dbo` and `u` selects `U`.
    pub fn admits(&self, schema: &str, kind_code: &str) -> bool {
        let code = kind_code.trim();
        if EXCLUDED_KINDS.iter().any(|k| k.eq_ignore_ascii_case(code)) {
            return false;
        }
        let schema_ok = match self.schema.as_deref() {
            Some(wanted) => schema.eq_ignore_ascii_case(wanted),
            None => !schema.eq_ignore_ascii_case(SYSTEM_SCHEMA),
        };
        let kind_ok = self
            .kind
            .as_deref()
            .is_none_or(|wanted| code.eq_ignore_ascii_case(wanted));
        schema_ok && kind_ok
    }
}

fn param_len(value: &str) -> i32 {
    i32::try_from(value.chars().count()).unwrap_or(i32::MAX)
}

/// Read access to the server catalog over a single connection.
///
/// Calls are made strictly one after another. The per-object methods stream
/// into caller-owned storage so that rows received before a failure are
/// kept.
#[async_trait]
pub trait CatalogSource: Send {
    /// Lists every exportable object admitted by `filter`, in catalog order.
    ///
    /// # Errors
    /// Any failure is fatal for the run.
    async fn list_objects(&mut self, filter: &CatalogFilter) -> Result<Vec<ObjectDescriptor>>;

    /// Appends the columns of `schema.table` to `columns` in ordinal order.
    ///
    /// # Errors
    /// Returns an error if the query fails; rows already appended stay.
    async fn table_columns(
        &mut self,
        schema: &str,
        table: &str,
        columns: &mut Vec<ColumnDefinition>,
    ) -> Result<()>;

    /// Appends the stored definition lines of `qualified_name` to `buffer`.
    ///
    /// # Errors
    /// Returns an error if the query fails; lines already appended stay.
    async fn object_text(
        &mut self,
        qualified_name: &str,
        buffer: &mut DefinitionBuffer,
    ) -> Result<()>;
}
