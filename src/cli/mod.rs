//! CLI module for the catalog API
//!
//! Provides the `serve` subcommand that runs the HTTP service.

pub mod serve;

use clap::{Parser, Subcommand};

/// Catalog API - key-gated catalog service
#[derive(Parser)]
#[command(name = "catalog-api")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the API server
    Serve,
}
