//! sqlobjectdump: export SQL Server object definitions to files.
//!
//! Connects with a `<username>:<password>@<host>:<port>/<database>`
//! descriptor, writes one `.sql` file per table, view, procedure, function
//! and trigger under the target directory, and optionally commits the tree
//! to git.

use clap::{Args, Parser};
use sqlobjectdump_core::{
    ConnectionDescriptor, ExportConfig, ExportTarget, ServerConfig, SystemGit, init_logging,
    mssql::SqlServerCatalog, run_export,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "sqlobjectdump")]
#[command(about = "Export SQL Server object definitions to a directory tree")]
#[command(version)]
#[command(override_usage = "sqlobjectdump [OPTIONS] --directory <DIR> <username>:<password>@<address>:<port>/<database>")]
#[command(long_about = "
sqlobjectdump - SQL Server object definitions as files

Every table, view, stored procedure, function and trigger visible to the
login is written to

  <directory>/<host>/<database>/<schema>/<type_desc>/<schema>_<name>.<type>_<object_id>.sql

Tables are exported as a DECLARE @name TABLE (...) reference declaration;
all other objects are exported from the definition stored on the server.

EXAMPLES:
  sqlobjectdump --directory ./export sa:secret@localhost:1433/Northwind
  sqlobjectdump -d ./export --schema sales --type P app:pw@db01:1433/Sales
  sqlobjectdump -d ./repo --git --git-address git@example.com:dba/schema.git sa:pw@db01:1433/Sales
")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    /// Connection descriptor
    #[arg(
        value_name = "CONNECTION",
        help = "<username>:<password>@<address>:<port>/<database> (password is never logged)"
    )]
    connection: String,

    /// Root directory to export to
    #[arg(short, long, env = "SQLOBJECTDUMP_DIRECTORY", help = "Root directory to export to")]
    directory: Option<PathBuf>,

    /// Schema filter
    #[arg(short, long, help = "Only export objects of this schema")]
    schema: Option<String>,

    /// Object type filter
    #[arg(
        short = 't',
        long = "type",
        value_name = "TYPE",
        help = "Only export objects of this catalog type code (U, V, P, FN, TR, ...)"
    )]
    kind: Option<String>,

    /// Load export settings from a JSON file; flags override it
    #[arg(long, value_name = "FILE", help = "JSON file with export settings")]
    config: Option<PathBuf>,

    #[command(flatten)]
    git: GitArgs,

    /// Do not write objects whose definition could not be retrieved
    #[arg(long, help = "Skip objects whose definition could not be retrieved")]
    skip_incomplete: bool,

    /// Accept the server certificate without validation
    #[arg(long, help = "Trust the server TLS certificate without validation")]
    trust_server_certificate: bool,

    /// Connect timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS", help = "Connect and login timeout in seconds")]
    connect_timeout: u64,

    /// Print the summary as JSON
    #[arg(long, help = "Print the export summary as JSON on stdout")]
    json: bool,
}

#[derive(Args, Debug)]
struct GitArgs {
    /// Enable git integration
    #[arg(long, help = "Initialize and/or commit the git repository in the directory")]
    git: bool,

    /// Remote repository
    #[arg(long, value_name = "URL", requires = "git", help = "Git repository to clone into the directory")]
    git_address: Option<String>,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        global = true,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true, help = "Suppress all output except errors")]
    quiet: bool,
}

impl Cli {
    /// Merges the optional config file with command-line flags.
    fn export_config(&self) -> sqlobjectdump_core::Result<ExportConfig> {
        let mut config = match (&self.config, &self.directory) {
            (Some(path), _) => ExportConfig::from_json_file(path)?,
            (None, Some(directory)) => ExportConfig::new(directory),
            (None, None) => {
                return Err(sqlobjectdump_core::DumpError::configuration(
                    "--directory is required",
                ));
            }
        };

        if let Some(directory) = &self.directory {
            config.directory.clone_from(directory);
        }
        if self.schema.is_some() {
            config.schema.clone_from(&self.schema);
        }
        if self.kind.is_some() {
            config.kind.clone_from(&self.kind);
        }
        if self.git.git {
            config.git = true;
        }
        if self.git.git_address.is_some() {
            config.git_address.clone_from(&self.git.git_address);
        }
        config.skip_incomplete |= self.skip_incomplete;

        config.validate()?;
        Ok(config)
    }

    const fn server_config(&self) -> ServerConfig {
        ServerConfig {
            connect_timeout: Duration::from_secs(self.connect_timeout),
            trust_server_certificate: self.trust_server_certificate,
        }
    }
}

fn usage_error(message: &str) -> ExitCode {
    let mut command = <Cli as clap::CommandFactory>::command();
    eprintln!("Error: {message}");
    eprintln!("{}", command.render_usage());
    ExitCode::from(2)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.global.verbose, cli.global.quiet) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    let descriptor = match ConnectionDescriptor::parse(&cli.connection) {
        Ok(descriptor) => descriptor,
        Err(e) => return usage_error(&e.to_string()),
    };
    let config = match cli.export_config() {
        Ok(config) => config,
        Err(e) => return usage_error(&e.to_string()),
    };

    match export(&descriptor, &config, &cli.server_config(), cli.json).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn export(
    descriptor: &ConnectionDescriptor,
    config: &ExportConfig,
    server: &ServerConfig,
    json: bool,
) -> anyhow::Result<()> {
    info!("Exporting {} to {}", descriptor, config.directory.display());
    let mut catalog = SqlServerCatalog::connect(descriptor, server).await?;
    let (host, database) = descriptor.export_segment();
    let summary = run_export(
        &mut catalog,
        config,
        &ExportTarget::new(host, database),
        &SystemGit,
    )
    .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}
