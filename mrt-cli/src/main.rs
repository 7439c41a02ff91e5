//! MRT CLI - Command line tool for meter.ac rainfall data.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "mrt-cli",
    version,
    about = "Meteo rainfall analysis toolkit"
)]
struct Cli {
    #[command(subcommand)]
    command: mrt_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    mrt_cmd::run(cli.command).await
}
