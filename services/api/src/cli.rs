use crate::demo::{run_demo, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use pulse_score::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "PulseScore",
    about = "Score culture pulse surveys and certify units from the command line",
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
    /// Run an end-to-end scoring and certification demo against in-memory storage
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
    /// Enroll a pending roster for this unit before serving
    #[arg(long)]
    pub(crate) seed_unit: Option<String>,
    /// Number of respondents enrolled for --seed-unit (ids emp-1..emp-N)
    #[arg(long, default_value_t = 10)]
    pub(crate) roster_size: usize,
    /// Contact address receiving certification notices for --seed-unit
    #[arg(long)]
    pub(crate) contact: Option<String>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Demo(args) => run_demo(args),
    }
}
