//! End-to-end export tests against an in-memory catalog.
//!
//! This test suite covers:
//! - The documented `dbo.Customer` example, header and path included
//! - Schema and kind filter combinations
//! - Isolation of per-object reconstruction and write failures
//! - Idempotent re-export
//! - The git lifecycle around a run

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use sqlobjectdump_core::{
    CatalogFilter, CatalogSource, ColumnDefinition, DefinitionBuffer, DumpError, ExportConfig,
    ExportTarget, GitOps, ObjectDescriptor, ObjectKind, Result, VersionControlOutcome,
    catalog::EXCLUDED_KINDS, run_export,
};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Catalog double that applies the same filter rules as the server query.
#[derive(Default)]
struct FakeCatalog {
    objects: Vec<ObjectDescriptor>,
    columns: HashMap<String, Vec<ColumnDefinition>>,
    texts: HashMap<String, Vec<String>>,
    failing: HashSet<String>,
    requests: Vec<String>,
}

impl FakeCatalog {
    fn with_object(mut self, schema: &str, id: i32, name: &str, code: &str, label: &str) -> Self {
        self.objects.push(ObjectDescriptor::new(
            schema,
            id,
            name,
            ObjectKind::from_code(code),
            label,
        ));
        self
    }

    fn with_columns(mut self, qualified: &str, columns: Vec<ColumnDefinition>) -> Self {
        self.columns.insert(qualified.to_string(), columns);
        self
    }

    fn with_text(mut self, qualified: &str, lines: &[&str]) -> Self {
        self.texts.insert(
            qualified.to_string(),
            lines.iter().map(ToString::to_string).collect(),
        );
        self
    }

    fn failing_on(mut self, qualified: &str) -> Self {
        self.failing.insert(qualified.to_string());
        self
    }

    fn failure(qualified: &str) -> DumpError {
        DumpError::reconstruction_failed(qualified, std::io::Error::other("Invalid object name"))
    }
}

#[async_trait]
impl CatalogSource for FakeCatalog {
    async fn list_objects(&mut self, filter: &CatalogFilter) -> Result<Vec<ObjectDescriptor>> {
        Ok(self
            .objects
            .iter()
            .filter(|o| filter.admits(&o.schema_name, o.kind.code()))
            .cloned()
            .collect())
    }

    async fn table_columns(
        &mut self,
        schema: &str,
        table: &str,
        columns: &mut Vec<ColumnDefinition>,
    ) -> Result<()> {
        let key = format!("{schema}.{table}");
        self.requests.push(key.clone());
        if self.failing.contains(&key) {
            return Err(Self::failure(&key));
        }
        columns.extend(self.columns.get(&key).cloned().unwrap_or_default());
        Ok(())
    }

    async fn object_text(
        &mut self,
        qualified_name: &str,
        buffer: &mut DefinitionBuffer,
    ) -> Result<()> {
        self.requests.push(qualified_name.to_string());
        if self.failing.contains(qualified_name) {
            return Err(Self::failure(qualified_name));
        }
        for line in self.texts.get(qualified_name).into_iter().flatten() {
            buffer.push(line.clone());
        }
        Ok(())
    }
}

/// Git double that records every invocation.
#[derive(Default)]
struct ScriptedGit {
    calls: RefCell<Vec<&'static str>>,
    fail: Option<&'static str>,
}

impl ScriptedGit {
    fn step(&self, name: &'static str) -> Result<()> {
        self.calls.borrow_mut().push(name);
        if self.fail == Some(name) {
            return Err(DumpError::version_control(name, "fatal: simulated"));
        }
        Ok(())
    }
}

impl GitOps for ScriptedGit {
    fn clone_into(&self, _dir: &Path, _remote: &str) -> Result<()> {
        self.step("clone")
    }
    fn pull(&self, _dir: &Path) -> Result<()> {
        self.step("pull")
    }
    fn add_all(&self, _dir: &Path) -> Result<()> {
        self.step("add")
    }
    fn commit(&self, _dir: &Path, _message: &str) -> Result<()> {
        self.step("commit")
    }
    fn push(&self, _dir: &Path) -> Result<()> {
        self.step("push")
    }
}

fn sales_catalog() -> FakeCatalog {
    FakeCatalog::default()
        .with_object("dbo", 101, "Customer", "U ", "USER_TABLE")
        .with_object("dbo", 102, "vCustomer", "V ", "VIEW")
        .with_object("sales", 201, "usp_TopOrders", "P ", "SQL_STORED_PROCEDURE")
        .with_object("sales", 202, "Orders", "U ", "USER_TABLE")
        .with_object("dbo", 103, "PK_Customer", "PK", "PRIMARY_KEY_CONSTRAINT")
        .with_object("dbo", 104, "DF_Customer_Name", "D ", "DEFAULT_CONSTRAINT")
        .with_object("sys", 3, "objects", "V ", "VIEW")
        .with_columns(
            "dbo.Customer",
            vec![
                ColumnDefinition::new("Id", "int", None, false).with_ordinal(1),
                ColumnDefinition::new("Name", "varchar", Some(50), true).with_ordinal(2),
            ],
        )
        .with_columns(
            "sales.Orders",
            vec![
                ColumnDefinition::new("OrderId", "bigint", None, false).with_ordinal(1),
                ColumnDefinition::new("Notes", "nvarchar", Some(-1), true).with_ordinal(2),
            ],
        )
        .with_text(
            "dbo.vCustomer",
            &["CREATE VIEW dbo.vCustomer\r\n", "AS SELECT Id, Name FROM dbo.Customer\r\n"],
        )
        .with_text(
            "sales.usp_TopOrders",
            &["CREATE PROCEDURE sales.usp_TopOrders\r\n", "AS\r\n", "SELECT TOP 10 * FROM sales.Orders\r\n"],
        )
}

fn target() -> ExportTarget {
    ExportTarget::new("db01", "Sales")
}

fn read(root: &Path, relative: &str) -> String {
    std::fs::read_to_string(root.join(relative)).expect(relative)
}

fn exported_files(root: &Path) -> Vec<String> {
    fn walk(dir: &Path, root: &Path, out: &mut Vec<String>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(&path, root, out);
            } else {
                out.push(
                    path.strip_prefix(root)
                        .unwrap()
                        .to_string_lossy()
                        .replace('\\', "/"),
                );
            }
        }
    }
    let mut out = Vec::new();
    if root.exists() {
        walk(root, root, &mut out);
    }
    out.sort();
    out
}

#[tokio::test]
async fn test_integration_customer_example() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = sales_catalog();

    run_export(&mut catalog, &ExportConfig::new(dir.path()), &target(), &ScriptedGit::default())
        .await
        .unwrap();

    assert_eq!(
        read(dir.path(), "db01/Sales/dbo/USER_TABLE/dbo_Customer.U_101.sql"),
        "/* \n\tUSER_TABLE Object Generated by sqlobjectdump\n\n\tdbo.Customer\n\n\t\
         NOTE: User table is generated as table variable for reference purposes only\n*/\n\n\
         DECLARE @Customer TABLE (\n\t[Id] [int] NOT NULL,\n\t[Name] [varchar](50) NULL\n);"
    );
}

#[tokio::test]
async fn test_integration_full_layout() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = sales_catalog();

    let summary = run_export(&mut catalog, &ExportConfig::new(dir.path()), &target(), &ScriptedGit::default())
        .await
        .unwrap();

    assert_eq!(
        exported_files(dir.path()),
        vec![
            "db01/Sales/dbo/USER_TABLE/dbo_Customer.U_101.sql",
            "db01/Sales/dbo/VIEW/dbo_vCustomer.V_102.sql",
            "db01/Sales/sales/SQL_STORED_PROCEDURE/sales_usp_TopOrders.P_201.sql",
            "db01/Sales/sales/USER_TABLE/sales_Orders.U_202.sql",
        ]
    );
    assert_eq!(summary.discovered, 4);
    assert_eq!(summary.written, 4);
    assert_eq!(summary.incomplete, 0);

    let procedure = read(
        dir.path(),
        "db01/Sales/sales/SQL_STORED_PROCEDURE/sales_usp_TopOrders.P_201.sql",
    );
    assert!(procedure.starts_with("/* \n\tSQL_STORED_PROCEDURE Object Generated by sqlobjectdump\n"));
    assert!(procedure.contains("\n\tsales.usp_TopOrders\n"));
    assert!(procedure.contains("NOTE: Object is exported with definition only"));
    assert!(procedure.ends_with(
        "*/\n\nCREATE PROCEDURE sales.usp_TopOrders\r\nAS\r\nSELECT TOP 10 * FROM sales.Orders\r\n"
    ));

    let orders = read(dir.path(), "db01/Sales/sales/USER_TABLE/sales_Orders.U_202.sql");
    assert!(orders.ends_with("\t[Notes] [nvarchar](MAX) NULL\n);"));
}

#[tokio::test]
async fn test_integration_filter_combinations() {
    let cases: [(Option<&str>, Option<&str>, &[&str]); 6] = [
        (None, None, &["dbo.Customer", "dbo.vCustomer", "sales.usp_TopOrders", "sales.Orders"]),
        (Some("sales"), None, &["sales.usp_TopOrders", "sales.Orders"]),
        (None, Some("U"), &["dbo.Customer", "sales.Orders"]),
        (Some("dbo"), Some("V"), &["dbo.vCustomer"]),
        (Some("DBO"), Some("v"), &["dbo.vCustomer"]),
        (Some("Sales"), None, &["sales.usp_TopOrders", "sales.Orders"]),
    ];

    for (schema, kind, expected) in cases {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = sales_catalog();
        let mut config = ExportConfig::new(dir.path());
        config.schema = schema.map(ToString::to_string);
        config.kind = kind.map(ToString::to_string);

        let summary = run_export(&mut catalog, &config, &target(), &ScriptedGit::default())
            .await
            .unwrap();

        assert_eq!(catalog.requests, expected, "schema={schema:?} kind={kind:?}");
        assert_eq!(summary.written, expected.len());
    }
}

#[tokio::test]
async fn test_integration_excluded_kinds_never_exported() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = sales_catalog();
    let config = ExportConfig::new(dir.path()).with_schema("dbo").with_kind("PK");

    let summary = run_export(&mut catalog, &config, &target(), &ScriptedGit::default())
        .await
        .unwrap();

    assert_eq!(summary.discovered, 0);
    for file in exported_files(dir.path()) {
        for code in EXCLUDED_KINDS {
            assert!(!file.contains(&format!(".{code}_")), "{file} exported");
        }
    }
}

#[tokio::test]
async fn test_integration_failed_object_does_not_stop_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = sales_catalog().failing_on("dbo.vCustomer");

    let summary = run_export(&mut catalog, &ExportConfig::new(dir.path()), &target(), &ScriptedGit::default())
        .await
        .unwrap();

    assert_eq!(summary.reconstructed, 3);
    assert_eq!(summary.incomplete, 1);
    assert_eq!(summary.written, 4);

    // Written anyway, with the header and no definition
    let view = read(dir.path(), "db01/Sales/dbo/VIEW/dbo_vCustomer.V_102.sql");
    assert!(view.ends_with("NOTE: Object is exported with definition only\n*/\n\n"));
    assert!(
        dir.path()
            .join("db01/Sales/sales/USER_TABLE/sales_Orders.U_202.sql")
            .is_file()
    );
}

#[tokio::test]
async fn test_integration_skip_incomplete() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = sales_catalog().failing_on("dbo.vCustomer");
    let config = ExportConfig::new(dir.path()).with_skip_incomplete(true);

    let summary = run_export(&mut catalog, &config, &target(), &ScriptedGit::default())
        .await
        .unwrap();

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.written, 3);
    assert!(
        !dir.path()
            .join("db01/Sales/dbo/VIEW/dbo_vCustomer.V_102.sql")
            .exists()
    );
}

#[tokio::test]
async fn test_integration_write_failure_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    // A regular file blocks the VIEW directory of dbo
    std::fs::create_dir_all(dir.path().join("db01/Sales/dbo")).unwrap();
    std::fs::write(dir.path().join("db01/Sales/dbo/VIEW"), "").unwrap();
    let mut catalog = sales_catalog();

    let summary = run_export(&mut catalog, &ExportConfig::new(dir.path()), &target(), &ScriptedGit::default())
        .await
        .unwrap();

    assert_eq!(summary.failed_writes, 1);
    assert_eq!(summary.written, 3);
}

#[tokio::test]
async fn test_integration_reexport_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let config = ExportConfig::new(dir.path());

    run_export(&mut sales_catalog(), &config, &target(), &ScriptedGit::default())
        .await
        .unwrap();
    let first: Vec<(String, Vec<u8>)> = exported_files(dir.path())
        .into_iter()
        .map(|f| {
            let bytes = std::fs::read(dir.path().join(&f)).unwrap();
            (f, bytes)
        })
        .collect();

    run_export(&mut sales_catalog(), &config, &target(), &ScriptedGit::default())
        .await
        .unwrap();
    for (file, bytes) in first {
        assert_eq!(std::fs::read(dir.path().join(&file)).unwrap(), bytes, "{file}");
    }
}

#[tokio::test]
async fn test_integration_git_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let git = ScriptedGit::default();
    let config = ExportConfig::new(dir.path()).with_git(Some("git@example.com:dba/schema.git".into()));

    let summary = run_export(&mut sales_catalog(), &config, &target(), &git)
        .await
        .unwrap();

    assert_eq!(summary.version_control, VersionControlOutcome::Committed);
    assert_eq!(*git.calls.borrow(), vec!["clone", "add", "commit", "push"]);
}

#[tokio::test]
async fn test_integration_commit_failure_skips_push() {
    let dir = tempfile::tempdir().unwrap();
    let git = ScriptedGit {
        fail: Some("commit"),
        ..ScriptedGit::default()
    };
    let config = ExportConfig::new(dir.path()).with_git(None);

    let summary = run_export(&mut sales_catalog(), &config, &target(), &git)
        .await
        .unwrap();

    assert_eq!(summary.version_control, VersionControlOutcome::Failed);
    assert_eq!(summary.written, 4);
    assert_eq!(*git.calls.borrow(), vec!["add", "commit"]);
}
