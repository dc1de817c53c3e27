use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use tracing::error;

mod config;
mod logging;
mod run;

use config::UserConfig;

#[derive(Parser)]
#[command(name = "metarepo")]
#[command(version, about = "Mirror remote configuration metadata into a git repository", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "./config.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match UserConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {:#}", "Configuration error:".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(&config.logger) {
        eprintln!("{} {:#}", "Logging setup failed:".red().bold(), e);
        return ExitCode::FAILURE;
    }

    match run::run(config).await {
        Ok(summary) => {
            println!();
            println!("{}", "✓ Mirror run completed".green().bold());
            println!("  {}: {}", "Run".bold(), summary.run_id);
            println!("  {}: {}", "Collections".bold(), summary.collections);
            println!("  {}: {}", "Records".bold(), summary.records);
            println!("  {}: {}", "Commits".bold(), summary.commits);
            println!(
                "  {}: {}",
                "Pushed".bold(),
                if summary.pushed {
                    "yes".green()
                } else {
                    "no".yellow()
                }
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:#}", e);
            eprintln!("{} {:#}", "✗ Mirror run failed:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
