//! Command line interface for the `bleframe` demo binary.
//!
//! The binary wires an initiator and an acceptor together over an in-memory
//! link and echoes a few messages through them, logging each fragment
//! exchange.

use std::num::NonZeroUsize;

use clap::Parser;

/// Command line arguments for the `bleframe` binary.
#[derive(Debug, Parser)]
#[command(
    name = "bleframe",
    version,
    about = "Echo messages over a simulated low-MTU link"
)]
pub struct Cli {
    /// Link MTU in bytes, including the marker byte.
    #[arg(long, default_value_t = 20)]
    pub mtu: usize,

    /// Completed messages that may wait unread before delivery blocks.
    #[arg(long, default_value_t = 1)]
    pub queue_capacity: usize,

    /// Largest reassembled message accepted, in bytes. Unlimited when unset.
    #[arg(long)]
    pub max_message_size: Option<NonZeroUsize>,

    /// Seconds to wait for discovery before giving up.
    #[arg(long, default_value_t = 10)]
    pub discovery_timeout: u64,

    /// Number of messages to echo.
    #[arg(short, long, default_value_t = 3)]
    pub count: u32,

    /// Message text to send.
    #[arg(short, long, default_value = "Hello from the initiator")]
    pub message: String,

    /// Print a Prometheus snapshot of the link metrics on exit.
    #[arg(long)]
    pub metrics: bool,
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use clap::{CommandFactory, Parser};

    use super::Cli;

    #[test]
    fn defaults_match_twenty_byte_link() {
        let cli = Cli::parse_from(["bleframe"]);
        assert_eq!(cli.mtu, 20);
        assert_eq!(cli.queue_capacity, 1);
        assert_eq!(cli.discovery_timeout, 10);
        assert_eq!(cli.count, 3);
        assert_eq!(cli.max_message_size, None);
        assert!(!cli.metrics);
    }

    #[test]
    fn command_definition_is_consistent() { Cli::command().debug_assert(); }

    #[test]
    fn parses_message_size_cap() {
        let cli = Cli::parse_from(["bleframe", "--max-message-size", "512"]);
        assert_eq!(cli.max_message_size, NonZeroUsize::new(512));
    }

    #[test]
    fn rejects_zero_message_size_cap() {
        assert!(Cli::try_parse_from(["bleframe", "--max-message-size", "0"]).is_err());
    }

    #[test]
    fn parses_overrides() {
        let cli = Cli::parse_from(["bleframe", "--mtu", "185", "-c", "5", "-m", "ping"]);
        assert_eq!(cli.mtu, 185);
        assert_eq!(cli.count, 5);
        assert_eq!(cli.message, "ping");
    }
}
