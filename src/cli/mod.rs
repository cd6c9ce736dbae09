pub mod account;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "comanda")]
#[command(about = "Tasks / restaurant orders backend", long_about = None)]
pub struct Cli {
    /// Path to the TOML config file (created with defaults if missing)
    #[arg(long, global = true, default_value = "comanda.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve {
        #[arg(long)]
        port: Option<u16>,
        /// tasks | orders
        #[arg(long)]
        service: Option<crate::config::ServiceKind>,
    },
    /// Account management against the users file
    Account {
        #[command(subcommand)]
        cmd: account::AccountCommands,
    },
    /// Print the order catalog as JSON
    Menu,
}
