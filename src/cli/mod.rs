//! CLI module for the geographic data gateway

pub mod serve;

use clap::{Parser, Subcommand};

/// Geographic data gateway - API-key gated access with usage metering
#[derive(Parser)]
#[command(name = "geoapi-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the gateway HTTP server
    Serve,
}
