//! `workforce` binary: creates the demo tables, seeds workers, and reads the
//! store back through either database driver.

mod config;

use clap::{Args, Parser, Subcommand, ValueEnum};
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use workforce_db::{Database, EngineError, ExecutionMode};
use workforce_queries::{core, orm, QueryError};

use crate::config::{Config, ConfigError, LoggingConfig};

#[derive(Parser, Debug)]
#[command(
    name = "workforce",
    author,
    version,
    about = "Create, seed, and inspect the workers/resume store"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Drop and recreate the workers and resume tables
    CreateTables(CreateTablesArgs),
    /// Insert the seed workers
    Insert(InsertArgs),
    /// Print every worker and resume as JSON
    List,
    /// Print the SQLite version reported by the async driver
    Version,
}

#[derive(Args, Debug)]
struct CreateTablesArgs {
    /// Which metadata registry to build the tables from
    #[arg(long, value_enum, default_value_t = Style::Core)]
    style: Style,
}

#[derive(Args, Debug)]
struct InsertArgs {
    /// Raw multi-row insert or mapped objects through a session
    #[arg(long, value_enum, default_value_t = Style::Core)]
    style: Style,

    /// Engine used for `orm` inserts: blocking or async
    #[arg(long, default_value_t = ExecutionMode::Blocking)]
    mode: ExecutionMode,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    /// Standalone table descriptors
    Core,
    /// Mapped types
    Orm,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}

fn resolve_config_path(cli_arg: Option<String>) -> (Option<String>, &'static str) {
    if let Some(path) = cli_arg.filter(|value| !value.trim().is_empty()) {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("WORKFORCE_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn run(command: Commands, config: &Config) -> Result<(), CliError> {
    let settings = config.database_settings()?;
    let db = Database::connect(&settings)?;

    match command {
        Commands::CreateTables(args) => {
            let engine = db.sync_engine().clone();
            tokio::task::spawn_blocking(move || match args.style {
                Style::Core => core::create_tables(&engine),
                Style::Orm => orm::create_tables(&engine),
            })
            .await??;
        }
        Commands::Insert(args) => match args.style {
            Style::Core => {
                if args.mode == ExecutionMode::Async {
                    tracing::warn!("core inserts always run on the blocking engine");
                }
                let engine = db.sync_engine().clone();
                let rows = tokio::task::spawn_blocking(move || core::insert_data(&engine)).await??;
                println!("inserted {rows} workers");
            }
            Style::Orm => {
                let ids = orm::insert_data(&db, args.mode).await?;
                println!("inserted workers {ids:?}");
            }
        },
        Commands::List => {
            let engine = db.sync_engine().clone();
            let (workers, resumes) = tokio::task::spawn_blocking(move || {
                Ok::<_, QueryError>((orm::list_workers(&engine)?, orm::list_resumes(&engine)?))
            })
            .await??;
            let listing = serde_json::json!({ "workers": workers, "resumes": resumes });
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        Commands::Version => {
            let version = core::server_version(db.async_engine()).await?;
            println!("{version}");
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let (resolved_config_path, config_source) = resolve_config_path(cli.config.clone());
    let selected_config_path = resolved_config_path.as_deref().or(Some("workforce.toml"));

    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration; fix the file or unset WORKFORCE_CONFIG_PATH");

    init_tracing(&config.logging);

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    if let Err(e) = run(cli.command, &config).await {
        tracing::error!(error = %e, "command failed");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn insert_defaults_to_core_blocking() {
        let cli = Cli::try_parse_from(["workforce", "insert"]).expect("should parse");
        match cli.command {
            Commands::Insert(args) => {
                assert_eq!(args.style, Style::Core);
                assert_eq!(args.mode, ExecutionMode::Blocking);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn insert_accepts_orm_async() {
        let cli = Cli::try_parse_from([
            "workforce", "--config", "w.toml", "insert", "--style", "orm", "--mode", "async",
        ])
        .expect("should parse");
        assert_eq!(cli.config.as_deref(), Some("w.toml"));
        match cli.command {
            Commands::Insert(args) => {
                assert_eq!(args.style, Style::Orm);
                assert_eq!(args.mode, ExecutionMode::Async);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(Cli::try_parse_from(["workforce", "insert", "--mode", "threads"]).is_err());
    }

    #[test]
    fn create_tables_takes_style() {
        let cli = Cli::try_parse_from(["workforce", "create-tables", "--style", "orm"])
            .expect("should parse");
        assert!(matches!(
            cli.command,
            Commands::CreateTables(CreateTablesArgs { style: Style::Orm })
        ));
    }

    #[test]
    fn cli_arg_wins_config_resolution() {
        let (path, source) = resolve_config_path(Some("custom.toml".to_string()));
        assert_eq!(path.as_deref(), Some("custom.toml"));
        assert_eq!(source, "cli-arg");
    }

    #[tokio::test]
    async fn run_creates_seeds_and_lists() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("cli.db");
        let mut config = Config::default();
        config.database.url_sync = path.display().to_string();
        config.database.url_async = format!("sqlite://{}", path.display());
        config.database.pool_size = 1;

        let create = Commands::CreateTables(CreateTablesArgs { style: Style::Orm });
        run(create, &config).await.expect("create-tables should succeed");

        let insert = Commands::Insert(InsertArgs {
            style: Style::Orm,
            mode: ExecutionMode::Async,
        });
        run(insert, &config).await.expect("insert should succeed");
        run(Commands::List, &config).await.expect("list should succeed");
        run(Commands::Version, &config).await.expect("version should succeed");
    }

    #[tokio::test]
    async fn run_rejects_invalid_config() {
        let mut config = Config::default();
        config.database.pool_size = 0;
        let err = run(Commands::Version, &config).await.expect_err("should fail");
        assert!(matches!(err, CliError::Config(ConfigError::Invalid(_))));
    }
}
