//! CLI module - Command-line interface for Hearth
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// Hearth - household finance tracking backend
#[derive(Parser)]
#[command(name = "hearth")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API server (default)
    #[command(alias = "server", alias = "web")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Create a family and its admin user
    CreateFamily {
        /// Name of the family
        name: String,
        /// Email of the admin user
        #[arg(long)]
        email: String,
        /// Admin password
        #[arg(long, env = "HEARTH_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

pub use commands::*;
