use crate::cli::FrameTunnelCli;
use clap::Parser;

/// Initialise the CLI and logging for the frame tunnel runner.
pub fn init() -> FrameTunnelCli {
    env_logger::init();

    FrameTunnelCli::parse()
}
