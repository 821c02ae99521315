use std::path::{Path, PathBuf};
use std::time::Duration;

use accounts::{require_bearer, Accounts, AccountsConfig};
use anyhow::{bail, Context, Result};
use axum::{middleware::from_fn_with_state, Router};
use clap::{Parser, Subcommand};
use crudkit::{finish_router, HttpOptions, Module};
use crudkit_db::{connect, redact_credentials_in_dsn, ConnectOpts};
use fleet::Fleet;
use mimalloc::MiMalloc;
use notifications::Notifications;
use runtime::{AppConfig, CliArgs};
use sea_orm::DatabaseConnection;
use tokio::net::TcpListener;

mod shutdown;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// TMS Server - transport management backend
#[derive(Parser)]
#[command(name = "tms-server")]
#[command(about = "TMS Server - customers, vehicles, invoices and payments")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration, database connectivity and migrations
    Check,
    /// Replace all users with the ones listed in a JSON file
    SeedUsers {
        /// `{"data": [{email, password, first_name, ...}]}`
        file: PathBuf,
    },
}

/// The domain modules in migration order.
struct Modules {
    accounts: Accounts,
    notifications: Notifications,
    fleet: Fleet,
}

impl Modules {
    fn new(config: &AppConfig, db: &DatabaseConnection) -> Result<Self> {
        let accounts = Accounts::new(db.clone(), config.module_config::<AccountsConfig>("accounts")?);
        let notifications = Notifications::new(db.clone());
        let fleet = Fleet::new(db.clone(), notifications.notifier());
        Ok(Self {
            accounts,
            notifications,
            fleet,
        })
    }

    fn all(&self) -> [&dyn Module; 3] {
        [&self.accounts, &self.notifications, &self.fleet]
    }

    async fn migrate(&self, db: &DatabaseConnection) -> Result<()> {
        for module in self.all() {
            module
                .migrate(db)
                .await
                .with_context(|| format!("migrations of module '{}' failed", module.name()))?;
        }
        Ok(())
    }

    /// `/api/...` with bearer authentication on everything but the public routes.
    fn router(&self, config: &AppConfig) -> Result<Router> {
        let mut protected = Router::new();
        let mut public = Router::new();
        for module in self.all() {
            protected = module.register_rest(protected)?;
            public = module.register_public(public)?;
        }
        let protected =
            protected.layer(from_fn_with_state(self.accounts.authenticator(), require_bearer));

        let opts = HttpOptions {
            timeout: Duration::from_secs(config.server.timeout_sec),
            cors: config.server.cors_enabled,
            ..HttpOptions::default()
        };
        Ok(finish_router(
            Router::new().nest("/api", protected.merge(public)),
            &opts,
        ))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    let logging_config = config.logging.clone().unwrap_or_default();
    runtime::init_logging_from_config(&logging_config, &config.home_dir());
    tracing::info!(home_dir = %config.server.home_dir, "TMS Server starting");

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(config).await,
        Commands::SeedUsers { file } => seed_users(config, &file).await,
    }
}

async fn connect_db(config: &AppConfig) -> Result<DatabaseConnection> {
    let (Some(url), Some(db)) = (config.database_url(), config.database.as_ref()) else {
        bail!("Database URL not configured");
    };
    let opts = ConnectOpts {
        max_conns: db.max_conns,
        acquire_timeout: db.acquire_timeout_sec.map(Duration::from_secs),
        ..ConnectOpts::default()
    };

    tracing::info!(dsn = %redact_credentials_in_dsn(&url), "Connecting to database");
    connect(&url, opts)
        .await
        .with_context(|| format!("cannot connect to {}", redact_credentials_in_dsn(&url)))
}

async fn run_server(config: AppConfig) -> Result<()> {
    let db = connect_db(&config).await?;
    let modules = Modules::new(&config, &db)?;
    modules.migrate(&db).await?;
    let app = modules.router(&config)?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("cannot bind {addr}"))?;
    tracing::info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::signal())
        .await?;
    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    let db = connect_db(&config).await?;
    let modules = Modules::new(&config, &db)?;
    modules.migrate(&db).await?;
    let _app = modules.router(&config)?;

    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}

async fn seed_users(config: AppConfig, file: &Path) -> Result<()> {
    let db = connect_db(&config).await?;
    let modules = Modules::new(&config, &db)?;
    modules.accounts.migrate(&db).await?;

    let count = accounts::load_users(&db, file).await?;
    println!("Loaded {count} users from {}", file.display());
    Ok(())
}
