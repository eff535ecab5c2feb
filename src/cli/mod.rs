//! CLI module - Command-line interface for gatekeep
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// gatekeep - identity store with authority-based access
#[derive(Parser)]
#[command(name = "gatekeep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a config file (overrides the default lookup)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create default config file
    Init {
        /// Where to write the config
        #[arg(default_value = "config.toml")]
        path: PathBuf,
    },

    /// Manage accounts
    #[command(alias = "u")]
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Manage authorities
    #[command(alias = "a")]
    Authority {
        #[command(subcommand)]
        command: AuthorityCommands,
    },

    /// Check credentials for an account (password read from stdin)
    Login {
        username: String,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create an account (password read from stdin)
    Add {
        username: String,
        /// Authority to grant; repeatable
        #[arg(short, long = "authority")]
        authorities: Vec<String>,
        /// Create the account disabled
        #[arg(long)]
        disabled: bool,
        /// Extension attribute as KEY=VALUE; repeatable
        #[arg(long = "attr", value_parser = parse_key_val)]
        attributes: Vec<(String, String)>,
    },
    /// List all accounts
    #[command(alias = "ls")]
    List,
    /// Show one account
    Show {
        username: String,
    },
    /// Change account state; unspecified fields keep their current value
    Update {
        username: String,
        #[arg(long)]
        enabled: Option<bool>,
        #[arg(long)]
        locked: Option<bool>,
        #[arg(long)]
        credentials_expired: Option<bool>,
        #[arg(long)]
        expired: Option<bool>,
        /// Replace the authority set; repeatable
        #[arg(short, long = "authority")]
        authorities: Option<Vec<String>>,
        /// Prompt for a new password
        #[arg(long)]
        reset_password: bool,
    },
    /// Change an account's password after verifying the current one
    Passwd {
        username: String,
    },
    /// Delete an account
    #[command(alias = "rm")]
    Remove {
        username: String,
    },
}

#[derive(Subcommand)]
pub enum AuthorityCommands {
    /// Create an authority
    Add {
        name: String,
    },
    /// List authorities with their holders
    #[command(alias = "ls")]
    List,
    /// Show one authority
    Show {
        name: String,
    },
    /// Rename an authority
    Rename {
        name: String,
        new_name: String,
    },
    /// Delete an authority (unlinks it from all accounts)
    #[command(alias = "rm")]
    Remove {
        name: String,
    },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no `=` found in `{s}`"))?;
    if key.is_empty() {
        return Err(format!("invalid KEY=VALUE: empty key in `{s}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

pub use commands::*;
