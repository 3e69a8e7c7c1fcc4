//! SQL Server catalog source built on Tiberius.
//!
//! One TDS connection is opened per run and every query is issued on it in
//! sequence. Row streams are consumed incrementally so that rows received
//! before a mid-stream failure are kept by the caller.

use crate::{
    Result,
    catalog::{
        CatalogFilter, CatalogSource, LIST_OBJECTS_SQL, OBJECT_TEXT_SQL, TABLE_COLUMNS_SQL,
    },
    config::ServerConfig,
    connection::ConnectionDescriptor,
    error::DumpError,
    models::{ColumnDefinition, ObjectDescriptor, ObjectKind},
    reconstruct::DefinitionBuffer,
};
use async_trait::async_trait;
use futures::TryStreamExt;
use tiberius::{AuthMethod, Client, Config, Row};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info};

/// Catalog source over a single SQL Server connection.
pub struct SqlServerCatalog {
    client: Client<Compat<TcpStream>>,
}

/// Builds the Tiberius config for a descriptor.
pub fn tiberius_config(descriptor: &ConnectionDescriptor, server: &ServerConfig) -> Config {
    let mut config = Config::new();
    config.host(&descriptor.host);
    config.port(descriptor.port);
    config.database(&descriptor.database);
    config.authentication(AuthMethod::sql_server(
        &descriptor.username,
        descriptor.password(),
    ));
    if server.trust_server_certificate {
        config.trust_cert();
    }
    config
}

impl SqlServerCatalog {
    /// Opens the connection used for the whole run.
    ///
    /// # Errors
    /// Returns a connection error if the TCP connect or the login fails or
    /// does not finish within the configured timeout.
    pub async fn connect(descriptor: &ConnectionDescriptor, server: &ServerConfig) -> Result<Self> {
        server.validate()?;
        let config = tiberius_config(descriptor, server);
        info!("Connecting to {}", descriptor);

        let connect = async {
            let tcp = TcpStream::connect(config.get_addr())
                .await
                .map_err(|e| DumpError::connection_failed(format!("TCP connect to {descriptor}"), e))?;
            tcp.set_nodelay(true)
                .map_err(|e| DumpError::connection_failed("Failed to configure socket", e))?;
            Client::connect(config, tcp.compat_write())
                .await
                .map_err(|e| DumpError::connection_failed(format!("Login to {descriptor}"), e))
        };

        let client = tokio::time::timeout(server.connect_timeout, connect)
            .await
            .map_err(|e| {
                DumpError::connection_failed(
                    format!("Timed out after {:?} connecting to {descriptor}", server.connect_timeout),
                    e,
                )
            })??;

        debug!("Connected to {}", descriptor);
        Ok(Self { client })
    }
}

fn text_column(row: &Row, name: &str) -> std::result::Result<String, tiberius::error::Error> {
    Ok(row.try_get::<&str, _>(name)?.unwrap_or_default().to_string())
}

fn descriptor_from_row(row: &Row) -> std::result::Result<ObjectDescriptor, tiberius::error::Error> {
    let object_id = row.try_get::<i32, _>("ObjectId")?.unwrap_or_default();
    Ok(ObjectDescriptor::new(
        text_column(row, "SchemaName")?,
        object_id,
        text_column(row, "ObjectName")?,
        ObjectKind::from_code(&text_column(row, "ObjectType")?),
        text_column(row, "ObjectTypeDesc")?,
    ))
}

fn column_from_row(row: &Row) -> std::result::Result<ColumnDefinition, tiberius::error::Error> {
    let nullable = text_column(row, "IS_NULLABLE")?;
    let ordinal = row.try_get::<i32, _>("ORDINAL_POSITION")?.unwrap_or_default();
    Ok(ColumnDefinition::new(
        text_column(row, "COLUMN_NAME")?,
        text_column(row, "DATA_TYPE")?,
        row.try_get::<i32, _>("CHARACTER_MAXIMUM_LENGTH")?,
        nullable.eq_ignore_ascii_case("YES"),
    )
    .with_ordinal(ordinal))
}

#[async_trait]
impl CatalogSource for SqlServerCatalog {
    async fn list_objects(&mut self, filter: &CatalogFilter) -> Result<Vec<ObjectDescriptor>> {
        let (schema_len, schema, kind_len, kind) = filter.query_params();
        let stream = self
            .client
            .query(LIST_OBJECTS_SQL, &[&schema_len, &schema, &kind_len, &kind])
            .await
            .map_err(|e| DumpError::catalog_failed("Failed to query sys.all_objects", e))?;

        let mut rows = stream.into_row_stream();
        let mut objects = Vec::new();
        while let Some(row) = rows
            .try_next()
            .await
            .map_err(|e| DumpError::catalog_failed("Failed to read catalog rows", e))?
        {
            objects.push(
                descriptor_from_row(&row)
                    .map_err(|e| DumpError::catalog_failed("Unexpected catalog row", e))?,
            );
        }
        debug!("Catalog returned {} objects", objects.len());

        Ok(objects)
    }

    async fn table_columns(
        &mut self,
        schema: &str,
        table: &str,
        columns: &mut Vec<ColumnDefinition>,
    ) -> Result<()> {
        let object = format!("{schema}.{table}");
        let stream = self
            .client
            .query(TABLE_COLUMNS_SQL, &[&schema, &table])
            .await
            .map_err(|e| DumpError::reconstruction_failed(&object, e))?;

        let mut rows = stream.into_row_stream();
        while let Some(row) = rows
            .try_next()
            .await
            .map_err(|e| DumpError::reconstruction_failed(&object, e))?
        {
            columns.push(column_from_row(&row).map_err(|e| DumpError::reconstruction_failed(&object, e))?);
        }
        Ok(())
    }

    async fn object_text(
        &mut self,
        qualified_name: &str,
        buffer: &mut DefinitionBuffer,
    ) -> Result<()> {
        let stream = self
            .client
            .query(OBJECT_TEXT_SQL, &[&qualified_name])
            .await
            .map_err(|e| DumpError::reconstruction_failed(qualified_name, e))?;

        let mut rows = stream.into_row_stream();
        while let Some(row) = rows
            .try_next()
            .await
            .map_err(|e| DumpError::reconstruction_failed(qualified_name, e))?
        {
            let line = row
                .try_get::<&str, _>(0)
                .map_err(|e| DumpError::reconstruction_failed(qualified_name, e))?;
            buffer.push(line.unwrap_or_default());
        }
        Ok(())
    }
}
