use crate::commands::{
    run_encapsulate, run_rank, run_restore, EncapsulateArgs, RankArgs, RestoreArgs,
};
use crate::server;
use capsule_core::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Capsule",
    about = "Rank encapsulation strategies against a preservation scenario and apply them",
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
    /// Rank the bundled algorithms against the start scenario
    Rank(RankArgs),
    /// Package a carrier and its payloads into the artifact store
    Encapsulate(EncapsulateArgs),
    /// Restore carrier and payloads from an artifact
    Restore(RestoreArgs),
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
        Command::Rank(args) => run_rank(args),
        Command::Encapsulate(args) => run_encapsulate(args),
        Command::Restore(args) => run_restore(args),
    }
}
