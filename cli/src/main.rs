mod commands;
mod terminal;

use std::process::ExitCode;

use commands::{CommandLine, Commands, sweep};
use terminal::logging;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.quiet)?;

    let code = match commands.command {
        Commands::Announce { sweep: args } => {
            sweep::sweep(sweep::Mode::Announce, &args, commands.quiet).await
        }
        Commands::Tcp { sweep: args, probe } => {
            sweep::sweep(sweep::Mode::Tcp(probe), &args, commands.quiet).await
        }
        Commands::Udp { sweep: args, probe } => {
            sweep::sweep(sweep::Mode::Udp(probe), &args, commands.quiet).await
        }
    };

    Ok(code)
}
