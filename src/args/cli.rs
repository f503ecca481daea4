use clap::Parser;
use std::path::PathBuf;

use super::parsers::{parse_host_port, parse_port};
use super::types::HostPort;

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Launch workers on behalf of a master, locally or on a pool of remote hosts."
)]
pub struct NodeManagerArgs {
    /// Verbose output
    #[arg(long)]
    pub verbose: bool,

    /// If present, launch on these hosts. Can be passed multiple times.
    #[arg(long = "host")]
    pub host: Vec<String>,

    /// Worker binary to launch
    #[arg(long = "worker", default_value = "./worker")]
    pub worker: String,

    /// Port to listen on
    #[arg(value_parser = parse_port)]
    pub port: u16,

    /// All excess arguments are passed to the worker.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub worker_args: Vec<String>,
}

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Create work from a trace file and measure per-request latency against a master."
)]
pub struct WorkGenArgs {
    /// Verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Address of the master as host:port
    #[arg(value_parser = parse_host_port)]
    pub address: HostPort,

    /// Trace file as a stream of newline-delimited JSON objects (defaults
    /// to standard input)
    pub tracefile: Option<PathBuf>,
}
