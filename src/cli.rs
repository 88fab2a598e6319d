use std::path::PathBuf;

use clap::Parser;

use crate::config::DEFAULT_CONFIG_PATH;

#[derive(Debug, Parser)]
#[command(name = "bittrex-ingest")]
#[command(about = "Poll public exchange market data into Postgres")]
#[command(version)]
pub struct Cli {
    /// Path to the exchange/database/pipeline config JSON
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_bundled_config() {
        let cli = Cli::parse_from(["bittrex-ingest"]);
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
    }

    #[test]
    fn accepts_config_override() {
        let cli = Cli::parse_from(["bittrex-ingest", "--config", "/etc/ingest.json"]);
        assert_eq!(cli.config, PathBuf::from("/etc/ingest.json"));
    }
}
