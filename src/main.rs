//! testdb - create and drop throwaway test databases from the command line.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use testdb::config::{ConnectionConfig, Settings};
use testdb::database::{
    Database, DatabaseOptions, Engine, MySql, PostgreSql, Protocol, TemplateConfig,
};
use testdb::error::{TestDbError, TestDbResult};
use testdb::executor::{ProcessRunner, SystemRunner};

/// Exit code for errors that leave a database missing or behind.
const EXIT_FATAL: u8 = 2;

const ENVIRONMENT_HELP: &str = "ENVIRONMENT:
    MYSQL_HOST, MYSQL_USER, MYSQL_PASS
    POSTGRESQL_HOST, POSTGRESQL_USER, POSTGRESQL_PASS
    RUST_LOG               Overrides the configured log level";

#[derive(Parser, Debug)]
#[command(name = "testdb")]
#[command(about = "Create and drop throwaway MySQL and PostgreSQL databases for test suites")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(after_help = ENVIRONMENT_HELP)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Create a test database and print its DSN
    Create {
        /// mysql or postgresql
        protocol: Protocol,

        /// SQL script to load into the new database
        #[arg(long, value_name = "FILE")]
        schema: Option<PathBuf>,

        /// Database name [default: <prefix>-<random>]
        #[arg(long)]
        name: Option<String>,

        /// Prefix for generated names [default: from config, else testdb]
        #[arg(long)]
        prefix: Option<String>,

        /// Cache the schema in this template database (postgresql)
        #[arg(long)]
        template: Option<String>,

        /// Rebuild the template even if it is current
        #[arg(long)]
        force_template: bool,

        /// Database encoding (postgresql)
        #[arg(long)]
        encoding: Option<String>,

        /// Print name, protocol and DSN as JSON
        #[arg(long)]
        json: bool,
    },

    /// Drop a test database
    Drop {
        /// mysql or postgresql
        protocol: Protocol,
        name: String,
    },

    /// Print the DSN for a database name without touching the server
    Dsn {
        /// mysql or postgresql
        protocol: Protocol,
        name: String,
    },
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version land here too
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let settings = match &cli.config {
        Some(path) => match Settings::load(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error loading configuration: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => Settings::default(),
    };

    init_logging(&settings);

    let runner: Arc<dyn ProcessRunner> =
        Arc::new(SystemRunner::new(settings.execution.command_timeout()));

    match run(cli.command, &settings, runner) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, fatal = e.is_fatal(), "testdb failed");
            eprintln!("Error: {}", e);
            if e.is_fatal() {
                ExitCode::from(EXIT_FATAL)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run(
    command: Command,
    settings: &Settings,
    runner: Arc<dyn ProcessRunner>,
) -> TestDbResult<String> {
    let defaults = &settings.provisioning;
    let base_options =
        DatabaseOptions::default().with_drop_retry_delay(settings.execution.drop_retry_delay());

    match command {
        Command::Create {
            protocol,
            schema,
            name,
            prefix,
            template,
            force_template,
            encoding,
            json,
        } => {
            let mut options =
                base_options.with_prefix(prefix.unwrap_or_else(|| defaults.prefix.clone()));
            options.schema_path = schema;
            options.db_name = name;

            match protocol {
                Protocol::Mysql => {
                    if template.is_some() || encoding.is_some() {
                        return Err(TestDbError::Unsupported {
                            message: "--template and --encoding only apply to postgresql"
                                .to_string(),
                        });
                    }
                    create_database(mysql(runner), options, json)
                }
                Protocol::Postgresql => {
                    let mut engine = postgresql(runner);
                    if let Some(encoding) = encoding.or_else(|| defaults.encoding.clone()) {
                        engine = engine.with_encoding(encoding);
                    }
                    if let Some(template) = template.or_else(|| defaults.template.clone()) {
                        let force = force_template || defaults.force_template;
                        engine = engine.with_template(TemplateConfig::new(template).forced(force));
                    }
                    create_database(engine, options, json)
                }
            }
        }
        Command::Drop { protocol, name } => {
            let options = base_options.with_name(name);
            match protocol {
                Protocol::Mysql => drop_database(mysql(runner), options),
                Protocol::Postgresql => drop_database(postgresql(runner), options),
            }
        }
        Command::Dsn { protocol, name } => {
            let options = base_options.with_name(name);
            let dsn = match protocol {
                Protocol::Mysql => Database::new(mysql(runner), options)?.dsn().to_string(),
                Protocol::Postgresql => {
                    Database::new(postgresql(runner), options)?.dsn().to_string()
                }
            };
            Ok(dsn)
        }
    }
}

fn mysql(runner: Arc<dyn ProcessRunner>) -> MySql {
    MySql::new(ConnectionConfig::from_env(Protocol::Mysql), runner)
}

fn postgresql(runner: Arc<dyn ProcessRunner>) -> PostgreSql {
    PostgreSql::new(ConnectionConfig::from_env(Protocol::Postgresql), runner)
}

fn create_database<E: Engine>(engine: E, options: DatabaseOptions, json: bool) -> TestDbResult<String> {
    let db = Database::new(engine, options)?;
    db.create()?;

    if json {
        let body = serde_json::json!({
            "name": db.name(),
            "protocol": db.engine().protocol().as_str(),
            "dsn": db.dsn(),
        });
        Ok(serde_json::to_string(&body)?)
    } else {
        Ok(db.dsn().to_string())
    }
}

fn drop_database<E: Engine>(engine: E, options: DatabaseOptions) -> TestDbResult<String> {
    let db = Database::new(engine, options)?;
    db.drop()?;
    Ok(format!("Dropped {}", db.name()))
}

/// Initialize logging based on settings. Logs go to stderr so stdout only
/// carries the DSN.
fn init_logging(settings: &Settings) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    match settings.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}
