// Kanri server entry point: bootstrap, CLI commands, and initialization.
// Handlers, routes, and business logic live in the library modules.

pub use kanri_server::*;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use dotenvy::{Error as DotenvError, dotenv};
use kanri_core::{config::AppConfig, db::Database, user::UserStore};
use kanri_server::utils::db::{is_unique_violation, run_migrations};
use std::path::{Path, PathBuf};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Kanri server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server
    Serve,
    /// Run database migrations
    Migrate,
    /// Create or update a user account
    CreateUser {
        /// Email for the account
        email: String,
        /// Password for the account
        password: String,
        /// Optional display name
        #[arg(long, value_name = "NAME")]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_status = load_env_file();
    init_tracing();
    report_env_status(&env_status);

    let cli = Cli::parse();
    let config = AppConfig::load()?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => run_serve(config).await,
        Command::Migrate => run_migrate(config).await,
        Command::CreateUser {
            email,
            password,
            name,
        } => run_create_user(config, email, password, name).await,
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init();
}

async fn run_serve(config: AppConfig) -> anyhow::Result<()> {
    info!(
        database_path = %config.database_path,
        "Starting server"
    );
    let database = Database::connect(&config).await?;
    run_migrations(database.pool())
        .await
        .context("failed to apply migrations")?;
    let state = build_state(&database);

    let app = router::build_router(state);

    let listener = TcpListener::bind(config.bind_address)
        .await
        .context("failed to bind socket")?;
    let actual_addr = listener
        .local_addr()
        .context("failed to read local address")?;

    info!("listening on {actual_addr}");

    if let Err(error) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(?error, "server terminated with error");
    }

    Ok(())
}

async fn run_migrate(config: AppConfig) -> anyhow::Result<()> {
    let database = Database::connect(&config).await?;
    run_migrations(database.pool()).await?;
    info!("migrations completed");
    Ok(())
}

async fn run_create_user(
    config: AppConfig,
    email: String,
    password: String,
    name: Option<String>,
) -> anyhow::Result<()> {
    let email = email.trim().to_owned();
    if email.is_empty() {
        bail!("email must not be empty");
    }
    if password.is_empty() {
        bail!("password must not be empty");
    }

    let database = Database::connect(&config).await?;
    run_migrations(database.pool()).await?;
    let user_store = UserStore::new(&database);
    let password_hash = auth::generate_password_hash(&password)
        .map_err(|err| anyhow::anyhow!("failed to hash password: {err}"))?;

    match user_store
        .create(&email, &password_hash, name.as_deref())
        .await
    {
        Ok(_) => {
            info!("created user {email}");
        }
        Err(err) => {
            if is_unique_violation(&err) {
                if let Some(existing) = user_store.find_by_email(&email).await? {
                    user_store
                        .update_password(existing.id.as_str(), &password_hash)
                        .await?;
                    info!("updated password for user {email}");
                } else {
                    return Err(err);
                }
            } else {
                return Err(err);
            }
        }
    }

    Ok(())
}

enum EnvLoadStatus {
    Loaded(PathBuf),
    NotFound,
    Failed(DotenvError),
}

fn load_env_file() -> EnvLoadStatus {
    match dotenv() {
        Ok(path) => {
            let display_path = make_relative(&path).unwrap_or_else(|| path.clone());
            EnvLoadStatus::Loaded(display_path)
        }
        Err(DotenvError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            EnvLoadStatus::NotFound
        }
        Err(err) => EnvLoadStatus::Failed(err),
    }
}

fn report_env_status(status: &EnvLoadStatus) {
    match status {
        EnvLoadStatus::Loaded(path) => {
            info!("Loaded environment variables from {}", path.display());
        }
        EnvLoadStatus::NotFound => {
            info!("No .env file found; using process environment only");
        }
        EnvLoadStatus::Failed(err) => {
            warn!("Failed to load .env file: {err:?}");
        }
    }
}

fn make_relative(path: &Path) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    path.strip_prefix(&cwd).map(|p| p.to_path_buf()).ok()
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        let mut int = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");

        tokio::select! {
            _ = term.recv() => {},
            _ = int.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
