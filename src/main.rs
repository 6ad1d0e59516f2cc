//! `doctriage` command line.
//!
//! ```bash
//! doctriage classify ./inbox            # classify every file, print JSON
//! doctriage feedback fatura123.pdf conta_luz --positive
//! doctriage correct scan_0001.pdf rg
//! doctriage report
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{ArgGroup, Parser, Subcommand};
use serde::Serialize;

use doctriage_lib::config::ClassifierConfig;
use doctriage_lib::core_state::{CoreError, CoreState};
use doctriage_lib::pipeline::jobs::{BatchSource, JobStatus};
use doctriage_lib::pipeline::learning::FeedbackRequest;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(name = "doctriage", version, about = "Sort documents into categories with rules and learned patterns")]
struct Cli {
    /// Pattern database. Defaults to learning_data.db in the data directory.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every file in a folder and print the results.
    Classify {
        folder: PathBuf,

        /// Batch identifier. Defaults to a random id.
        #[arg(long)]
        batch_id: Option<String>,
    },

    /// Like or dislike a verdict.
    #[command(group(ArgGroup::new("polarity").required(true).args(["positive", "negative"])))]
    Feedback {
        filename: String,
        category: String,
        #[arg(long)]
        positive: bool,
        #[arg(long)]
        negative: bool,
    },

    /// Replace the latest verdict for a file with the right category.
    Correct { filename: String, category: String },

    /// Print learning and accuracy statistics.
    Report,
}

fn main() -> ExitCode {
    doctriage_lib::init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, CoreError> {
    let config = ClassifierConfig::from_env();
    let state = match &cli.db {
        Some(path) => CoreState::open(config, path)?,
        None => CoreState::open_default(config)?,
    };

    match cli.command {
        Commands::Classify { folder, batch_id } => {
            let batch_id = batch_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            state.submit_batch(&batch_id, BatchSource::Folder(folder))?;

            let snapshot = loop {
                let snapshot = state.batch_status(&batch_id)?;
                if snapshot.status.is_terminal() {
                    break snapshot;
                }
                std::thread::sleep(POLL_INTERVAL);
            };
            print_json(&snapshot)?;
            Ok(if snapshot.status == JobStatus::Completed {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Feedback {
            filename,
            category,
            positive,
            negative: _,
        } => {
            let receipt = state.submit_feedback(FeedbackRequest {
                filename: Some(filename),
                category: Some(category),
                positive: Some(positive),
            })?;
            print_json(&receipt)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Correct { filename, category } => match state.record_correction(&filename, &category)? {
            Some(patterns) => {
                println!("{filename}: corrected to {category} ({patterns} patterns learned)");
                Ok(ExitCode::SUCCESS)
            }
            None => {
                eprintln!("{filename} has no classification history");
                Ok(ExitCode::FAILURE)
            }
        },
        Commands::Report => {
            print_json(&state.performance_report()?)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CoreError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
