pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod entities;
pub mod services;
pub mod state;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{AuthorityCommands, Cli, Commands, FlagChanges, UserCommands};
pub use config::Config;
use config::LogFormat;
pub use state::SharedState;

/// Install the global tracing subscriber. `RUST_LOG` wins over the config level.
pub fn init_tracing(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    // A subscriber may already be installed (e.g. by a test harness)
    let _ = match config.general.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    if let Commands::Init { path } = &cli.command {
        init_tracing(&Config::default());
        return cli::cmd_init(path);
    }

    let config_path = Config::locate(cli.config.as_deref());
    let config = match &config_path {
        Some(path) => Config::load_from_path(path)?,
        None => Config::default(),
    };

    init_tracing(&config);

    match &config_path {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => info!("No config file found, using defaults"),
    }

    let state = SharedState::from_config(config)
        .await
        .context("Failed to initialise identity store")?;

    match cli.command {
        Commands::Init { .. } => Ok(()),

        Commands::Login { username } => cli::cmd_login(&state, &username).await,

        Commands::User { command } => match command {
            UserCommands::Add {
                username,
                authorities,
                disabled,
                attributes,
            } => cli::cmd_user_add(&state, &username, authorities, disabled, attributes).await,
            UserCommands::List => cli::cmd_user_list(&state).await,
            UserCommands::Show { username } => cli::cmd_user_show(&state, &username).await,
            UserCommands::Update {
                username,
                enabled,
                locked,
                credentials_expired,
                expired,
                authorities,
                reset_password,
            } => {
                let changes = FlagChanges {
                    enabled,
                    locked,
                    credentials_expired,
                    expired,
                };
                cli::cmd_user_update(&state, &username, changes, authorities, reset_password)
                    .await
            }
            UserCommands::Passwd { username } => cli::cmd_user_passwd(&state, &username).await,
            UserCommands::Remove { username } => cli::cmd_user_remove(&state, &username).await,
        },

        Commands::Authority { command } => match command {
            AuthorityCommands::Add { name } => cli::cmd_authority_add(&state, &name).await,
            AuthorityCommands::List => cli::cmd_authority_list(&state).await,
            AuthorityCommands::Show { name } => cli::cmd_authority_show(&state, &name).await,
            AuthorityCommands::Rename { name, new_name } => {
                cli::cmd_authority_rename(&state, &name, &new_name).await
            }
            AuthorityCommands::Remove { name } => cli::cmd_authority_remove(&state, &name).await,
        },
    }
}
