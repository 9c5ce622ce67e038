//! Command-line interface definitions and parsing

use clap::{Parser, ValueEnum};

#[derive(Parser)]
#[command(name = "dashlink", author, version, about = "Peer sensor relay for the car dashboard", long_about = None)]
pub struct Cli {
    /// Transport to relay over
    #[arg(short, long, value_enum, default_value = "wifi")]
    pub transport: TransportArg,

    /// Role this device plays
    #[arg(short, long, value_enum, default_value = "receiver")]
    pub role: RoleArg,

    /// Sender IP address (required for the wifi receiver)
    #[arg(long)]
    pub ip: Option<String>,

    /// Demo sample cadence in milliseconds (sender role)
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<String>,
}

/// Which physical link to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportArg {
    /// Bluetooth Low Energy (GATT)
    Ble,
    /// Local WiFi (WebSocket)
    Wifi,
}

/// Which side of the relay to play
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    /// Stream demo sensor samples out
    Sender,
    /// Display relayed samples
    Receiver,
}
