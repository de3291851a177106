//! Main application entry point

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

mod config;
mod script;
mod shell;

use config::ShellConfig;
use shell::Shell;

#[derive(Parser, Debug)]
#[command(name = "tabnav")]
#[command(about = "Drive a headless tab navigator from scripts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// JSON shell configuration; built-in tabs when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a script file, or read commands from stdin
    Run {
        script: Option<PathBuf>,

        /// Keep going after a failing command
        #[arg(long)]
        keep_going: bool,
    },

    /// Print the effective configuration as JSON
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => ShellConfig::load(path)?,
        None => ShellConfig::default(),
    };

    match cli.command.unwrap_or(Commands::Run { script: None, keep_going: false }) {
        Commands::Run { script, keep_going } => run(config, script, keep_going),
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(config: ShellConfig, script: Option<PathBuf>, keep_going: bool) -> Result<()> {
    let mut shell = Shell::new(config)?;
    info!("Shell ready on tab {:?}", shell.navigator().current_tab());

    let lines: Vec<String> = match &script {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?
            .lines()
            .map(str::to_string)
            .collect(),
        None => io::stdin().lock().lines().collect::<io::Result<_>>()?,
    };

    let mut out = io::stdout().lock();
    for notice in shell.take_notices() {
        writeln!(out, "{}", notice)?;
    }

    for (number, line) in lines.iter().enumerate() {
        let outcome = script::parse_line(line).and_then(|command| match command {
            Some(command) => shell.execute(command),
            None => Ok(()),
        });

        for notice in shell.take_notices() {
            writeln!(out, "{}", notice)?;
        }

        if let Err(e) = outcome {
            error!("Line {}: {:#}", number + 1, e);
            if !keep_going {
                return Err(e.context(format!("Script failed at line {}", number + 1)));
            }
        }
    }

    info!("Script finished with {} views hosted", shell.container().len());
    Ok(())
}
