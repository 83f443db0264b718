//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// fleetcast - publish game server lifecycle events to a message broker
#[derive(Debug, Parser)]
#[command(name = "fleetcast")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Broker receiving the events
    #[arg(long, value_enum, env = "FLEETCAST_BROKER", default_value_t = BrokerKind::Stdout)]
    pub broker: BrokerKind,

    /// Newline-delimited watch notifications (defaults to stdin)
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Retries for a notification whose dispatch failed
    #[arg(long, default_value_t = 5)]
    pub max_retries: u32,

    /// Log at debug level regardless of RUST_LOG
    #[arg(short, long)]
    pub verbose: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BrokerKind {
    /// Log envelopes only
    Stdout,
    /// Google Cloud Pub/Sub
    Pubsub,
    /// Kafka (requires the `kafka` feature)
    Kafka,
    /// In-memory index of ready game servers served over HTTP
    Http,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}
