use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "timeblock-cli", version, about = "Timeblock CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Block management
    Block {
        #[command(subcommand)]
        action: commands::block::BlockAction,
    },
    /// Reminder management
    Reminder {
        #[command(subcommand)]
        action: commands::reminder::ReminderAction,
    },
    /// Usage statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Reset every block to its full length and clear today's stats
    Refresh,
    /// Print the current engine state as JSON
    Status,
    /// Run blocks in the foreground, reading commands from stdin
    Run(commands::run::RunArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Block { action } => commands::block::run(action),
        Commands::Reminder { action } => commands::reminder::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Refresh => commands::refresh(),
        Commands::Status => commands::status(),
        Commands::Run(args) => commands::run::run(args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
