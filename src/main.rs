use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, error, info, level_filters::LevelFilter, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use sqlgo::codegen::{CodeGenConfig, GoGenerator};
use sqlgo::config::{ConnectionArgs, DbConfig, RunConfig};
use sqlgo::generate;
use sqlgo::introspect::{adapter_for, Connection};

#[derive(Parser, Debug)]
#[command(name = "sqlgo")]
#[command(version, about = "Generate Go structs from MySQL or PostgreSQL tables", long_about = None)]
struct Cli {
    /// Database driver: mysql or postgres [env: DB_DRIVER]
    #[arg(long)]
    driver: Option<String>,

    /// Database host [env: DB_HOST, default: localhost]
    #[arg(long)]
    host: Option<String>,

    /// Database port [env: DB_PORT]
    #[arg(long)]
    port: Option<String>,

    /// Database user [env: DB_USER]
    #[arg(long)]
    user: Option<String>,

    /// Database password [env: DB_PASSWORD]
    #[arg(long, alias = "pwd")]
    password: Option<String>,

    /// Database name [env: DB_NAME]
    #[arg(long, alias = "dbname")]
    database: Option<String>,

    /// PostgreSQL schema to read [env: DB_SCHEMA, default: public]
    #[arg(long)]
    schema: Option<String>,

    /// Only generate this table (default: all tables)
    #[arg(long)]
    table: Option<String>,

    /// Output directory
    #[arg(short, long, alias = "outdir", default_value = "./go_output")]
    output: PathBuf,

    /// Go package name of the generated files
    #[arg(long, default_value = "model")]
    package: String,

    /// Add gorm/json struct tags with the original column names
    #[arg(long, alias = "gorm")]
    tags: bool,

    /// Fail on SQL types without a Go mapping instead of using string
    #[arg(long)]
    strict_types: bool,

    /// Path to .env file for connection config
    #[arg(long, default_value = "./.env")]
    env_file: PathBuf,

    /// Verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    if let Err(e) = run() {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    info!("sqlgo v{}", env!("CARGO_PKG_VERSION"));

    let args = ConnectionArgs {
        driver: cli.driver,
        host: cli.host,
        port: cli.port,
        user: cli.user,
        password: cli.password,
        database: cli.database,
        schema: cli.schema,
    };
    let db = DbConfig::load(&args, &cli.env_file)
        .context("Failed to load database configuration")?;
    debug!(connection = ?db.redacted_connection_string(), "Loaded configuration");

    let codegen = CodeGenConfig::new(cli.output)
        .with_package_name(cli.package)
        .with_tag_mode(cli.tags)
        .with_strict_types(cli.strict_types);
    let config = RunConfig::new(db, codegen).with_table(cli.table);

    info!(
        driver = ?config.driver(),
        table = ?config.table,
        output = ?config.codegen.output_path,
        package = ?config.codegen.package_name,
        tag_mode = ?config.codegen.tag_mode,
        "Starting code generation"
    );

    let adapter = adapter_for(config.driver())?;
    let mut connection = Connection::open(adapter, &config.db)?;

    let generator = GoGenerator::new();
    let written = generate::run(&config, &mut connection, &generator)
        .context("Code generation failed")?;

    for path in &written {
        debug!(path = ?path, "Written");
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    // RUST_LOG wins over -v when set
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_aliases() {
        let cli = Cli::try_parse_from([
            "sqlgo", "--pwd", "s3cret", "--outdir", "models", "--dbname", "shop", "--gorm",
        ])
        .unwrap();

        assert_eq!(cli.password.as_deref(), Some("s3cret"));
        assert_eq!(cli.output, PathBuf::from("models"));
        assert_eq!(cli.database.as_deref(), Some("shop"));
        assert!(cli.tags);
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["sqlgo"]).unwrap();

        assert_eq!(cli.output, PathBuf::from("./go_output"));
        assert_eq!(cli.package, "model");
        assert!(!cli.tags);
        assert_eq!(cli.password, None);
    }
}
