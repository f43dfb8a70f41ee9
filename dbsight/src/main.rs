//! Command-line front end for the dbsight library.
//!
//! Shows operators what the instrumentation would record for a statement or
//! connection string: the metric model and operation, the obfuscated SQL,
//! and the instance attributes. Every result is printed as JSON on stdout;
//! logs go to stderr.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use dbsight_core::logging::init_logging;
use dbsight_core::models::{CommandType, ConnectionInfo, DatastoreVendor, ParsedStatement};
use dbsight_core::{
    ConnectionInfoCache, RecordSqlMode, SqlConfig, classify_with_config, is_single_sql_statement,
    obfuscate, redact_connection_string,
};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "dbsight")]
#[command(about = "SQL classification, obfuscation and connection-string attribution")]
#[command(version)]
#[command(long_about = "
dbsight - see what APM datastore instrumentation records for a database call

COMMANDS:
- classify          Report the (model, operation) pair and metric names
- obfuscate         Mask numeric and string literals
- parse-connection  Extract host, port, database and instance
- check             Test whether text holds a single statement

Text arguments may be omitted to read from stdin.

EXAMPLES:
  dbsight classify --vendor mssql 'SELECT * FROM [dbo].[Orders]'
  dbsight obfuscate \"select * from users where ssn = 433871122\"
  dbsight parse-connection --vendor mysql 'Server=db;Port=3306;Database=app'
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true, help = "Suppress all logs except errors")]
    pub quiet: bool,

    /// JSON configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "DBSIGHT_CONFIG",
        help = "Path to a JSON SqlConfig file"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Classify a SQL command
    Classify(ClassifyArgs),
    /// Obfuscate literals in SQL text
    Obfuscate(ObfuscateArgs),
    /// Parse a connection string
    ParseConnection(ParseConnectionArgs),
    /// Check whether SQL text is a single statement
    Check(TextArgs),
}

#[derive(Args)]
pub struct TextArgs {
    /// SQL text; read from stdin when omitted
    pub text: Option<String>,
}

#[derive(Args)]
pub struct ClassifyArgs {
    /// Datastore vendor
    #[arg(long, value_enum, default_value = "other")]
    pub vendor: VendorArg,

    /// How the driver interprets the text
    #[arg(long, value_enum, default_value = "text")]
    pub command_type: CommandTypeArg,

    #[command(flatten)]
    pub input: TextArgs,
}

#[derive(Args)]
pub struct ObfuscateArgs {
    /// Datastore vendor
    #[arg(long, value_enum, default_value = "other")]
    pub vendor: VendorArg,

    /// Recording mode; defaults to the configured `record_sql`
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    #[command(flatten)]
    pub input: TextArgs,
}

#[derive(Args)]
pub struct ParseConnectionArgs {
    /// Datastore vendor
    #[arg(long, value_enum)]
    pub vendor: VendorArg,

    /// Hostname reported for localhost and loopback addresses
    #[arg(long, default_value = "localhost")]
    pub hostname: String,

    /// Connection string; read from stdin when omitted
    pub connection_string: Option<String>,
}

/// Datastore vendors accepted on the command line
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum VendorArg {
    Mssql,
    Mysql,
    Postgres,
    Oracle,
    Db2,
    Redis,
    Odbc,
    Other,
}

impl From<VendorArg> for DatastoreVendor {
    fn from(vendor: VendorArg) -> Self {
        match vendor {
            VendorArg::Mssql => Self::MSSQL,
            VendorArg::Mysql => Self::MySQL,
            VendorArg::Postgres => Self::Postgres,
            VendorArg::Oracle => Self::Oracle,
            VendorArg::Db2 => Self::IBMDB2,
            VendorArg::Redis => Self::Redis,
            VendorArg::Odbc => Self::ODBC,
            VendorArg::Other => Self::Other,
        }
    }
}

/// Command types accepted on the command line
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum CommandTypeArg {
    Text,
    TableDirect,
    StoredProcedure,
}

impl From<CommandTypeArg> for CommandType {
    fn from(command_type: CommandTypeArg) -> Self {
        match command_type {
            CommandTypeArg::Text => Self::Text,
            CommandTypeArg::TableDirect => Self::TableDirect,
            CommandTypeArg::StoredProcedure => Self::StoredProcedure,
        }
    }
}

/// Recording modes accepted on the command line
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ModeArg {
    Off,
    Raw,
    Obfuscated,
}

impl From<ModeArg> for RecordSqlMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Off => Self::Off,
            ModeArg::Raw => Self::Raw,
            ModeArg::Obfuscated => Self::Obfuscated,
        }
    }
}

#[derive(Serialize)]
struct ClassifyOutput {
    vendor: String,
    #[serde(flatten)]
    statement: ParsedStatement,
    statement_metric: Option<String>,
    operation_metric: String,
}

#[derive(Serialize)]
struct ObfuscateOutput {
    mode: RecordSqlMode,
    sql: Option<String>,
}

#[derive(Serialize)]
struct ParseConnectionOutput {
    vendor: String,
    connection_string: String,
    #[serde(flatten)]
    info: ConnectionInfo,
    attributes: serde_json::Map<String, serde_json::Value>,
}

#[derive(Serialize)]
struct CheckOutput {
    single_statement: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet)?;

    let config = load_config(cli.global.config.as_deref())?;

    match cli.command {
        Command::Classify(mut args) => {
            let text = read_input(args.input.text.take())?;
            print_json(&classify_command(&config, &args, &text))
        }
        Command::Obfuscate(args) => {
            let text = read_input(args.input.text)?;
            let mode = args.mode.map_or(config.record_sql, RecordSqlMode::from);
            let sql = obfuscate(&text, mode, args.vendor.into());
            print_json(&ObfuscateOutput { mode, sql })
        }
        Command::ParseConnection(args) => {
            let connection_string = read_input(args.connection_string)?;
            let output = parse_connection(
                &config,
                args.vendor.into(),
                &connection_string,
                &args.hostname,
            );
            print_json(&output)
        }
        Command::Check(args) => {
            let text = read_input(args.text)?;
            print_json(&CheckOutput {
                single_statement: is_single_sql_statement(&text),
            })
        }
    }
}

/// Loads and validates the configuration file, or the defaults.
fn load_config(path: Option<&Path>) -> Result<SqlConfig> {
    let Some(path) = path else {
        debug!("No configuration file given, using defaults");
        return Ok(SqlConfig::default());
    };

    info!("Loading configuration from {}", path.display());
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
    let config = SqlConfig::from_json(&json)
        .with_context(|| format!("Invalid configuration file {}", path.display()))?;
    Ok(config)
}

fn read_input(argument: Option<String>) -> Result<String> {
    if let Some(text) = argument {
        return Ok(text);
    }

    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("Failed to read input from stdin")?;
    Ok(text.trim_end_matches(['\r', '\n']).to_string())
}

fn classify_command(config: &SqlConfig, args: &ClassifyArgs, text: &str) -> ClassifyOutput {
    let vendor = DatastoreVendor::from(args.vendor);
    let statement = classify_with_config(config, vendor, args.command_type.into(), text);
    ClassifyOutput {
        vendor: vendor.to_string(),
        statement_metric: statement.statement_metric_name(vendor),
        operation_metric: statement.operation_metric_name(vendor),
        statement,
    }
}

fn parse_connection(
    config: &SqlConfig,
    vendor: DatastoreVendor,
    connection_string: &str,
    hostname: &str,
) -> ParseConnectionOutput {
    let cache = ConnectionInfoCache::new(config.connection_cache_capacity);
    let info = cache.get_or_parse(vendor, connection_string, hostname);
    let attributes = info
        .attributes(config)
        .into_iter()
        .map(|(key, value)| (key.to_string(), serde_json::Value::String(value)))
        .collect();

    ParseConnectionOutput {
        vendor: vendor.to_string(),
        connection_string: redact_connection_string(connection_string),
        info: (*info).clone(),
        attributes,
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
