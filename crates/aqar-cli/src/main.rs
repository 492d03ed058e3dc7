mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "aqar-cli")]
#[command(about = "AqarMatch operational command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Inspect the district adjacency data.
    Districts {
        #[command(subcommand)]
        command: DistrictsCommands,
    },
    /// Score a listing against a preference without persisting a match.
    Score(ScoreArgs),
    /// Force a learning pass for an identity.
    Relearn(RelearnArgs),
}

#[derive(Debug, Subcommand)]
enum DistrictsCommands {
    /// Load and validate the adjacency file, printing counts.
    Validate {
        /// Path to the adjacency YAML; defaults to the configured path.
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Print a district's neighbors.
    Neighbors {
        #[arg(long)]
        city: String,
        #[arg(long)]
        district: String,
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
struct ScoreArgs {
    #[arg(long)]
    listing: i64,
    #[arg(long)]
    preference: i64,
}

#[derive(Debug, Args)]
struct RelearnArgs {
    /// Registered buyer id. Mutually exclusive with --session.
    #[arg(long, conflicts_with = "session")]
    user: Option<Uuid>,
    /// Anonymous session id. Mutually exclusive with --user.
    #[arg(long)]
    session: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Districts { command } => match command {
            DistrictsCommands::Validate { path } => commands::validate_districts(path.as_deref()),
            DistrictsCommands::Neighbors {
                city,
                district,
                path,
            } => commands::print_neighbors(path.as_deref(), &city, &district),
        },
        Commands::Score(args) => commands::score_pair(args.listing, args.preference).await,
        Commands::Relearn(args) => commands::force_relearn(args.user, args.session).await,
    }
}
