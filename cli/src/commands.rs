pub mod sweep;

use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};
use sweepr_common::config::{self, Config};

#[derive(Parser)]
#[command(name = "sweepr", version)]
#[command(about = "Fan a probe out over every address:port combination.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Reduce output (-q hides headers and progress, -qq also per-target lines)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub quiet: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Announce every target without touching the network
    #[command(alias = "a")]
    Announce {
        #[command(flatten)]
        sweep: SweepArgs,
    },
    /// Connect to every target over TCP
    #[command(alias = "t")]
    Tcp {
        #[command(flatten)]
        sweep: SweepArgs,
        #[command(flatten)]
        probe: ProbeArgs,
    },
    /// Send a datagram to every target over UDP
    #[command(alias = "u")]
    Udp {
        #[command(flatten)]
        sweep: SweepArgs,
        #[command(flatten)]
        probe: ProbeArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct SweepArgs {
    /// Comma-separated addresses, e.g. 10.0.0.1,10.0.0.2
    #[arg(short, long, value_name = "LIST")]
    pub addresses: String,

    /// Comma-separated ports, e.g. 22,80,443
    #[arg(short, long, value_name = "LIST")]
    pub ports: String,

    /// Print one additional line per target
    #[arg(short, long)]
    pub verbose: bool,

    /// Maximum number of targets processed at once
    #[arg(short, long, default_value_t = config::DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Targets buffered ahead of the workers before enumeration pauses
    #[arg(long = "queue", value_name = "N", default_value_t = config::DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Per-target timeout in milliseconds
    #[arg(long = "timeout", value_name = "MS", default_value_t = config::DEFAULT_TIMEOUT.as_millis() as u64)]
    pub timeout_ms: u64,

    /// Stop dispatching after the first failed target
    #[arg(long)]
    pub fail_fast: bool,

    /// Expand CIDR blocks (10.0.0.0/30), IPv4 ranges (10.0.0.1-9) and port ranges (8000-8010)
    #[arg(long)]
    pub expand: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ProbeArgs {
    /// Request sent to every target; \r \n \t and \\ escapes are decoded
    #[arg(long)]
    pub payload: Option<String>,

    /// Maximum bytes of response kept per target
    #[arg(long, value_name = "BYTES", default_value_t = 512)]
    pub read_limit: usize,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl SweepArgs {
    pub fn to_config(&self, quiet: u8) -> Config {
        Config {
            verbose: self.verbose,
            quiet,
            concurrency: self.concurrency,
            queue_capacity: self.queue_capacity,
            timeout: Duration::from_millis(self.timeout_ms),
            fail_fast: self.fail_fast,
            expand: self.expand,
        }
    }
}

impl ProbeArgs {
    pub fn payload_bytes(&self) -> Option<Vec<u8>> {
        self.payload.as_deref().map(|raw| decode_escapes(raw).into_bytes())
    }
}

/// Decodes `\r`, `\n`, `\t` and `\\`. Unknown escapes are kept verbatim.
pub fn decode_escapes(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
