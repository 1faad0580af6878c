use crate::demo::{run_demo, run_dues_report, DemoArgs, DuesArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use villapay::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "VillaPay Payment Engine",
    about = "Demonstrate and run the VillaPay fee and permit payment engine from the command line",
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
    /// Assess dues for a fee amount and due date without touching a store
    Dues(DuesArgs),
    /// Run an end-to-end CLI demo covering fee and permit payment workflows
    Demo(DemoArgs),
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
        Command::Dues(args) => run_dues_report(args),
        Command::Demo(args) => run_demo(args).await,
    }
}
