//! Data models for exported catalog objects.
//!
//! An [`ObjectDescriptor`] is created by the catalog reader, gets its
//! definition filled in by the reconstructor, is prefixed by the annotator
//! and finally read by the materializer.

use serde::{Deserialize, Serialize};

/// Object kinds reported in the catalog `type` column.
///
/// The catalog stores the code in a fixed-width `char(2)` column, so codes
/// are trimmed before they are matched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ObjectKind {
    /// `U`
    UserTable,
    /// `V`
    View,
    /// `P`
    StoredProcedure,
    /// `FN`
    ScalarFunction,
    /// `IF`
    InlineTableFunction,
    /// `TF`
    TableFunction,
    /// `TR`
    Trigger,
    /// `TA`
    ClrTrigger,
    /// `C`
    CheckConstraint,
    /// `R`
    Rule,
    /// `RF`
    ReplicationFilterProcedure,
    /// `X`
    ExtendedProcedure,
    /// `PG`
    PlanGuide,
    /// Any other code the catalog query lets through
    Other(String),
}

/// How the definition of an object is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconstructionStrategy {
    /// Synthesize a `DECLARE @name TABLE (...)` from the column catalog
    TableVariable,
    /// Read the server-stored text through `sp_helptext`
    StoredText,
}

impl ObjectKind {
    /// Parses a catalog type code, ignoring the fixed-width padding.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "U" => Self::UserTable,
            "V" => Self::View,
            "P" => Self::StoredProcedure,
            "FN" => Self::ScalarFunction,
            "IF" => Self::InlineTableFunction,
            "TF" => Self::TableFunction,
            "TR" => Self::Trigger,
            "TA" => Self::ClrTrigger,
            "C" => Self::CheckConstraint,
            "R" => Self::Rule,
            "RF" => Self::ReplicationFilterProcedure,
            "X" => Self::ExtendedProcedure,
            "PG" => Self::PlanGuide,
            other => Self::Other(other.to_string()),
        }
    }

    /// The trimmed catalog code, as used in output file names.
    pub fn code(&self) -> &str {
        match self {
            Self::UserTable => "U",
            Self::View => "V",
            Self::StoredProcedure => "P",
            Self::ScalarFunction => "FN",
            Self::InlineTableFunction => "IF",
            Self::TableFunction => "TF",
            Self::Trigger => "TR",
            Self::ClrTrigger => "TA",
            Self::CheckConstraint => "C",
            Self::Rule => "R",
            Self::ReplicationFilterProcedure => "RF",
            Self::ExtendedProcedure => "X",
            Self::PlanGuide => "PG",
            Self::Other(code) => code,
        }
    }

    /// Selects the reconstruction strategy for this kind.
    pub fn strategy(&self) -> ReconstructionStrategy {
        match self {
            Self::UserTable => ReconstructionStrategy::TableVariable,
            Self::View
            | Self::StoredProcedure
            | Self::ScalarFunction
            | Self::InlineTableFunction
            | Self::TableFunction
            | Self::Trigger
            | Self::ClrTrigger
            | Self::CheckConstraint
            | Self::Rule
            | Self::ReplicationFilterProcedure
            | Self::ExtendedProcedure
            | Self::PlanGuide
            | Self::Other(_) => ReconstructionStrategy::StoredText,
        }
    }
}

impl From<String> for ObjectKind {
    fn from(code: String) -> Self {
        Self::from_code(&code)
    }
}

impl From<ObjectKind> for String {
    fn from(kind: ObjectKind) -> Self {
        kind.code().to_string()
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// One exportable object from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDescriptor {
    pub schema_name: String,
    pub object_id: i32,
    pub object_name: String,
    pub kind: ObjectKind,
    /// Catalog `type_desc`, e.g. `USER_TABLE`
    pub kind_label: String,
    #[serde(default, skip_serializing)]
    pub definition: String,
    #[serde(default)]
    pub definition_retrieved: bool,
}

impl ObjectDescriptor {
    /// Creates a descriptor with an empty definition.
    pub fn new(
        schema_name: impl Into<String>,
        object_id: i32,
        object_name: impl Into<String>,
        kind: ObjectKind,
        kind_label: impl Into<String>,
    ) -> Self {
        Self {
            schema_name: schema_name.into(),
            object_id,
            object_name: object_name.into(),
            kind,
            kind_label: kind_label.into(),
            definition: String::new(),
            definition_retrieved: false,
        }
    }

    /// `<schema>.<name>`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema_name, self.object_name)
    }
}

/// A column row from `INFORMATION_SCHEMA.COLUMNS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: String,
    pub data_type: String,
    /// `CHARACTER_MAXIMUM_LENGTH`; `-1` marks `(MAX)` types
    pub max_length: Option<i32>,
    pub is_nullable: bool,
    pub ordinal_position: i32,
}

impl ColumnDefinition {
    /// Sentinel the catalog uses for `varchar(max)` and friends.
    pub const UNBOUNDED_LENGTH: i32 = -1;

    /// Creates a column definition; ordinal position defaults to 0.
    pub fn new(
        name: impl Into<String>,
        data_type: impl Into<String>,
        max_length: Option<i32>,
        is_nullable: bool,
    ) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            max_length,
            is_nullable,
            ordinal_position: 0,
        }
    }

    /// Builder method to set the ordinal position.
    #[must_use]
    pub const fn with_ordinal(mut self, ordinal_position: i32) -> Self {
        self.ordinal_position = ordinal_position;
        self
    }
}

/// Outcome of the version-control steps of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionControlOutcome {
    Disabled,
    Committed,
    Failed,
}

/// Counters reported at the end of an export run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSummary {
    pub discovered: usize,
    pub reconstructed: usize,
    /// Objects whose definition could not be fully retrieved
    pub incomplete: usize,
    pub written: usize,
    /// Incomplete objects left unwritten because of `skip_incomplete`
    pub skipped: usize,
    /// Objects whose file could not be written
    pub failed_writes: usize,
    pub version_control: VersionControlOutcome,
}

impl Default for ExportSummary {
    fn default() -> Self {
        Self {
            discovered: 0,
            reconstructed: 0,
            incomplete: 0,
            written: 0,
            skipped: 0,
            failed_writes: 0,
            version_control: VersionControlOutcome::Disabled,
        }
    }
}
