//! Core application

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api::ApiServer;
use crate::api::auth::{Role, TokenKeys};
use crate::core::cli::{self, CliConfig, Commands, TokenCommands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::core::shutdown::ShutdownService;

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub keys: Arc<TokenKeys>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        match command {
            Some(Commands::Token {
                command: TokenCommands::Issue { subject, role, ttl },
            }) => Self::issue_token(&cli_config, &subject, role, ttl),
            Some(Commands::Serve) | None => {
                let app = Self::init(&cli_config)?;
                Self::start_server(app).await
            }
        }
    }

    fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        let keys = Arc::new(config.auth.token_keys());

        tracing::debug!(
            leeway_secs = config.auth.leeway_secs,
            "Token verification keys ready"
        );

        Ok(Self {
            shutdown: ShutdownService::new(),
            config,
            keys,
        })
    }

    fn issue_token(cli: &CliConfig, subject: &str, role: Role, ttl: Option<u64>) -> Result<()> {
        let config = AppConfig::load(cli)?;
        let ttl_secs = ttl.unwrap_or(config.auth.token_ttl_secs);
        let ttl = chrono::Duration::try_seconds(
            i64::try_from(ttl_secs).context("Token lifetime is too large")?,
        )
        .context("Token lifetime is too large")?;

        let token = config
            .auth
            .token_keys()
            .issue(subject, role, ttl)
            .context("Failed to issue token")?;

        tracing::debug!(subject, role = %role, ttl_secs, "Issued token");
        println!("{}", token);
        Ok(())
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn start_server(app: Self) -> Result<()> {
        app.shutdown.install_signal_handlers();

        tracing::info!(
            host = %app.config.server.host,
            port = app.config.server.port,
            origins = ?app.config.server.cors_origins,
            "Starting EventHub gateway"
        );

        let server = ApiServer::new(app);
        server.start().await?;

        tracing::info!("Shutdown complete");
        Ok(())
    }
}
