use crate::commands::{run_match, run_verify, MatchArgs, VerifyArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use crewmatch::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "crewmatch",
    about = "Serve and inspect the crew marketplace identity and matching core",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Verify a bearer token and print the normalized claim
    Verify(VerifyArgs),
    /// Match candidates for an opening against a directory snapshot
    Match(MatchArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Verify(args) => run_verify(args),
        Command::Match(args) => run_match(args).await,
    }
}
