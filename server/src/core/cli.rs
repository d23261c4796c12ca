use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{
    ENV_CONFIG, ENV_DATABASE_URL, ENV_HOST, ENV_PORT, ENV_TABLE, ENV_TRACING_SERVICE,
    ENV_TRACING_URL,
};
use crate::data::IfExists;

#[derive(Parser)]
#[command(name = "tracetable")]
#[command(version, about = "Pull Jaeger traces into a SQL table and query them", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// SQLite connection URL (e.g. sqlite://traces.db)
    #[arg(long, global = true, env = ENV_DATABASE_URL)]
    pub database_url: Option<String>,

    /// Span table name
    #[arg(long, global = true, env = ENV_TABLE)]
    pub table: Option<String>,

    /// Jaeger query service URL
    #[arg(long, global = true, env = ENV_TRACING_URL)]
    pub tracing_url: Option<String>,

    /// Service whose traces are pulled
    #[arg(long, short = 's', global = true, env = ENV_TRACING_SERVICE)]
    pub service: Option<String>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,
}

/// Parse if-exists policy from CLI string
fn parse_if_exists(s: &str) -> Result<IfExists, String> {
    match s.to_lowercase().as_str() {
        "fail" => Ok(IfExists::Fail),
        "replace" => Ok(IfExists::Replace),
        "append" => Ok(IfExists::Append),
        _ => Err(format!(
            "Invalid if-exists policy '{}'. Valid options: fail, replace, append",
            s
        )),
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the HTTP query server (default command)
    Serve,
    /// Pull a window of traces and write them to the span table
    Sync {
        /// Window start, microseconds since epoch (default: 24h ago)
        #[arg(long)]
        start: Option<i64>,
        /// Window end, microseconds since epoch (default: now)
        #[arg(long)]
        end: Option<i64>,
        /// Maximum traces to pull (default: from config)
        #[arg(long)]
        limit: Option<u32>,
        /// What to do when the table exists: fail, replace, append
        #[arg(long, value_parser = parse_if_exists)]
        if_exists: Option<IfExists>,
    },
    /// Run a SQL statement and print the result
    Query {
        sql: String,
        /// Print only the number of rows returned
        #[arg(long)]
        raw: bool,
    },
    /// Run a SQL statement that returns no rows and print rows affected
    Exec { sql: String },
    /// Print the whole span table
    Show,
    /// Create the span table if it does not exist
    Init,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub database_url: Option<String>,
    pub table: Option<String>,
    pub tracing_url: Option<String>,
    pub service: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let cli = Cli::parse();
    let config = CliConfig {
        config: cli.config,
        database_url: cli.database_url,
        table: cli.table,
        tracing_url: cli.tracing_url,
        service: cli.service,
        host: cli.host,
        port: cli.port,
    };
    (config, cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_if_exists() {
        assert_eq!(parse_if_exists("fail"), Ok(IfExists::Fail));
        assert_eq!(parse_if_exists("REPLACE"), Ok(IfExists::Replace));
        assert_eq!(parse_if_exists("append"), Ok(IfExists::Append));
        assert!(parse_if_exists("upsert").unwrap_err().contains("Valid options"));
    }

    #[test]
    fn test_parse_sync_command() {
        let cli = Cli::try_parse_from([
            "tracetable",
            "--service",
            "agent.traces",
            "sync",
            "--limit",
            "50",
            "--if-exists",
            "replace",
        ])
        .unwrap();
        assert_eq!(cli.service.as_deref(), Some("agent.traces"));
        match cli.command {
            Some(Commands::Sync {
                limit, if_exists, start, ..
            }) => {
                assert_eq!(limit, Some(50));
                assert_eq!(if_exists, Some(IfExists::Replace));
                assert_eq!(start, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_query_command_with_global_after() {
        let cli = Cli::try_parse_from([
            "tracetable",
            "query",
            "SELECT 1",
            "--raw",
            "--database-url",
            "sqlite::memory:",
        ])
        .unwrap();
        assert_eq!(cli.database_url.as_deref(), Some("sqlite::memory:"));
        assert!(matches!(cli.command, Some(Commands::Query { raw: true, .. })));
    }

    #[test]
    fn test_no_subcommand() {
        let cli = Cli::try_parse_from(["tracetable"]).unwrap();
        assert!(cli.command.is_none());
    }
}
