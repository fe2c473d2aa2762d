use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{
    ENV_CONFIG, ENV_CORS_ORIGINS, ENV_HOST, ENV_JWT_LEEWAY_SECS, ENV_JWT_TTL_SECS, ENV_PORT,
};
use crate::api::auth::Role;

#[derive(Parser)]
#[command(name = "eventhub")]
#[command(version, about = "College events auth gateway", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Allowed CORS origin (repeatable, or comma-separated in the env var)
    #[arg(long = "cors-origin", global = true, env = ENV_CORS_ORIGINS, value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    /// Tolerated clock skew in seconds when checking token expiry
    #[arg(long, global = true, env = ENV_JWT_LEEWAY_SECS)]
    pub leeway: Option<u64>,

    /// Lifetime in seconds of tokens issued by `token issue`
    #[arg(long, global = true, env = ENV_JWT_TTL_SECS)]
    pub token_ttl: Option<u64>,
}

fn parse_role(s: &str) -> Result<Role, String> {
    s.parse::<Role>().map_err(|e| e.to_string())
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the gateway server (default)
    Serve,
    /// Token utilities
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum TokenCommands {
    /// Print a signed token for the given subject and role
    Issue {
        #[arg(long)]
        subject: String,
        #[arg(long, value_parser = parse_role)]
        role: Role,
        /// Override the configured token lifetime (seconds)
        #[arg(long)]
        ttl: Option<u64>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub config: Option<PathBuf>,
    pub cors_origins: Option<Vec<String>>,
    pub leeway: Option<u64>,
    pub token_ttl: Option<u64>,
}

fn split(cli: Cli) -> (CliConfig, Option<Commands>) {
    let config = CliConfig {
        host: cli.host,
        port: cli.port,
        config: cli.config,
        cors_origins: cli.cors_origins,
        leeway: cli.leeway,
        token_ttl: cli.token_ttl,
    };
    (config, cli.command)
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    split(Cli::parse())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_from(args: &[&str]) -> (CliConfig, Option<Commands>) {
        split(Cli::try_parse_from(args).unwrap())
    }

    #[test]
    fn test_defaults_to_no_command() {
        let (config, command) = parse_from(&["eventhub", "--port", "9000"]);
        assert!(command.is_none());
        assert_eq!(config.port, Some(9000));
    }

    #[test]
    fn test_repeated_cors_origins() {
        let (config, _) = parse_from(&[
            "eventhub",
            "--cors-origin",
            "http://a.test",
            "--cors-origin",
            "http://b.test,http://c.test",
        ]);
        assert_eq!(
            config.cors_origins.unwrap(),
            vec!["http://a.test", "http://b.test", "http://c.test"]
        );
    }

    #[test]
    fn test_token_issue() {
        let (_, command) = parse_from(&[
            "eventhub", "token", "issue", "--subject", "u1", "--role", "organizer",
        ]);
        match command {
            Some(Commands::Token {
                command: TokenCommands::Issue { subject, role, ttl },
            }) => {
                assert_eq!(subject, "u1");
                assert_eq!(role, Role::Organizer);
                assert_eq!(ttl, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_token_issue_rejects_unknown_role() {
        for role in ["root", "Admin"] {
            assert!(
                Cli::try_parse_from([
                    "eventhub", "token", "issue", "--subject", "u1", "--role", role
                ])
                .is_err()
            );
        }
    }
}
