//! Cinder CLI - Headless host for Verlet particle scenes

mod commands;
mod fountain;
mod scene;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{run, validate};

#[derive(Parser)]
#[command(name = "cinder")]
#[command(about = "Run fixed-capacity Verlet particle scenes headlessly", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a scene for a number of fixed steps and report the result
    Run {
        /// Path to scene file
        scene: String,

        /// Number of fixed steps to run
        #[arg(long, default_value = "600")]
        ticks: u64,

        /// Override the scene's force sampling seed
        #[arg(long)]
        seed: Option<u64>,

        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = parse_format)]
        format: String,
    },

    /// Check a scene's settings and list the values that would be replaced
    Validate {
        /// Path to scene file
        scene: String,
    },
}

fn parse_format(s: &str) -> Result<String, String> {
    match s {
        "text" | "json" => Ok(s.to_string()),
        _ => Err(format!("unknown format '{}'; valid values: text, json", s)),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if cli.verbose > 0 {
        log::set_max_level(match cli.verbose {
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        });
    } else if cli.quiet {
        log::set_max_level(log::LevelFilter::Error);
    }

    match cli.command {
        Commands::Run {
            scene,
            ticks,
            seed,
            format,
        } => run::run(run::RunArgs {
            scene,
            ticks,
            seed,
            format,
        }),
        Commands::Validate { scene } => validate::run(&scene),
    }
}
