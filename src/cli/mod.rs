//! CLI module - Command-line interface for Signdesk
//!
//! Running without a subcommand starts the HTTP server.

mod commands;

use clap::{Parser, Subcommand};

/// Signdesk - Digital signage admin backend
#[derive(Parser)]
#[command(name = "signdesk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API until Ctrl+C
    #[command(alias = "daemon")]
    Serve,

    /// Create default config file
    #[command(alias = "init")]
    InitConfig,

    /// Insert a user directly into the database
    CreateUser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Grant administrator rights
        #[arg(long)]
        admin: bool,
    },

    /// List registered users
    #[command(alias = "users")]
    ListUsers,
}

pub use commands::*;
