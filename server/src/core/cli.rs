use std::path::PathBuf;

use clap::Parser;

use super::constants::{ENV_CONFIG, ENV_DATABASE, ENV_HOST, ENV_PORT};

#[derive(Parser)]
#[command(name = "assetdesk")]
#[command(version, about = "Filtered, paged listings over configured entities", long_about = None)]
pub struct Cli {
    /// Server host address
    #[arg(long, short = 'H', env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', env = ENV_PORT)]
    pub port: Option<u16>,

    /// SQLite database: file path, sqlite: URL or :memory:
    #[arg(long, short = 'd', env = ENV_DATABASE)]
    pub database: Option<String>,

    /// Path to config file
    #[arg(long, short = 'c', env = ENV_CONFIG)]
    pub config: Option<PathBuf>,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub config: Option<PathBuf>,
}

impl From<Cli> for CliConfig {
    fn from(cli: Cli) -> Self {
        Self {
            host: cli.host,
            port: cli.port,
            database: cli.database,
            config: cli.config,
        }
    }
}

/// Parse CLI arguments
pub fn parse() -> CliConfig {
    Cli::parse().into()
}
