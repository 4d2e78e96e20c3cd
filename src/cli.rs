use clap::{Parser, Subcommand};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "myexpenses")]
#[command(about = "MyExpenses - personal expense tracking API", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Database management commands
    #[command(subcommand)]
    Db(DbCommands),

    /// Validate and print the effective configuration
    Config,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum DbCommands {
    /// Run database migrations
    Migrate,
}

pub fn handle_config_validate(config: &Config) -> anyhow::Result<()> {
    config.socket_addr()?;

    println!("Configuration is valid:");
    println!("  listen address:    {}:{}", config.server_host, config.server_port);
    println!("  storage backend:   {:?}", config.storage_backend);
    println!("  database url:      {}", config.redacted_database_url());
    println!("  max connections:   {}", config.db_max_connections);
    match config.request_timeout {
        Some(timeout) => println!("  request timeout:   {}s", timeout.as_secs()),
        None => println!("  request timeout:   disabled"),
    }
    println!("  log format:        {:?}", config.log_format);

    Ok(())
}
