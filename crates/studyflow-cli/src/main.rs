use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "studyflow", version, about = "Studyflow study planner CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Weekly unavailable time
    Block {
        #[command(subcommand)]
        action: commands::block::BlockAction,
    },
    /// Ranking, auto-scheduling and packing
    Schedule {
        #[command(subcommand)]
        action: commands::schedule::ScheduleAction,
    },
    /// Show what to work on today
    Today {
        /// Minute budget (default: daily.max_daily_minutes)
        #[arg(long)]
        budget: Option<u32>,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Refresh task urgency once per day
    Tick,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

const LOG_ENV: &str = "STUDYFLOW_LOG";

/// Log to stderr so stdout stays parseable.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn main() {
    init_logging();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Task { action } => commands::task::run(action),
        Commands::Block { action } => commands::block::run(action),
        Commands::Schedule { action } => commands::schedule::run(action),
        Commands::Today { budget, json } => commands::today::run(budget, json),
        Commands::Tick => commands::today::tick(),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
