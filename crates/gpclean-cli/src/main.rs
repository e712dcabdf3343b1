use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

use gpclean_core::{
    CancellationToken, CancelledError, Counters, ExifTool, FillOptions, MoveOptions,
};

#[derive(Parser)]
#[command(
    name = "gpclean",
    version,
    about = "Google Photos Takeout cleanup - reconcile capture dates, then move dated media"
)]
struct Cli {
    /// Increase verbosity (-v: per-file info, -vv: debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write capture dates from Takeout sidecars / folder names into media metadata
    SetExifFromMetadata {
        /// Directory to process
        directory: PathBuf,

        /// Actually modify files (default is dry-run)
        #[arg(long)]
        execute: bool,

        /// Number of parallel workers (default: logical CPU count)
        #[arg(short, long)]
        jobs: Option<usize>,
    },
    /// Move files whose metadata carries a trustworthy capture date
    MoveWithExif {
        /// Directory to search
        input_dir: PathBuf,

        /// Directory to move dated files into (created on --execute)
        output_dir: PathBuf,

        /// Actually move files (default is dry-run)
        #[arg(long)]
        execute: bool,

        /// Number of parallel workers (default: logical CPU count)
        #[arg(short, long)]
        jobs: Option<usize>,
    },
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let token = CancellationToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupted, draining in-flight files...");
        handler_token.cancel();
    })?;

    let tool = ExifTool::default();
    let counters = Counters::new();
    let started = Instant::now();
    let progress = move |stage: &str, current: u64, total: u64, _message: &str| {
        let elapsed = started.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 {
            current as f64 / elapsed
        } else {
            0.0
        };
        eprint!("\r[{stage}] {current}/{total} ({rate:.1}/s, {elapsed:.0}s)        ");
    };

    let result = match &cli.command {
        Commands::SetExifFromMetadata {
            directory,
            execute,
            jobs,
        } => {
            eprintln!(
                "Mode: {}",
                if *execute { "execute" } else { "dry-run" }
            );
            let options = FillOptions {
                input: directory.clone(),
                execute: *execute,
                jobs: *jobs,
            };
            gpclean_core::run_fill(&options, &tool, &token, &counters, &progress).map(|report| {
                format!(
                    "{} files, {} written, {} already dated, {} without a date source",
                    report.total, report.written, report.already_dated, report.no_date_source
                )
            })
        }
        Commands::MoveWithExif {
            input_dir,
            output_dir,
            execute,
            jobs,
        } => {
            eprintln!(
                "Mode: {}",
                if *execute { "execute" } else { "dry-run" }
            );
            let options = MoveOptions {
                input: input_dir.clone(),
                output: output_dir.clone(),
                execute: *execute,
                jobs: *jobs,
            };
            gpclean_core::run_move(&options, &tool, &token, &counters, &progress).map(|report| {
                if *execute {
                    format!(
                        "{} candidates, {} moved, {} failed, {} without a date",
                        report.total, report.moved, report.failed, report.not_moved
                    )
                } else {
                    format!(
                        "{} candidates, {} movable, {} duplicates, {} without a date",
                        report.total, report.movable, report.duplicates, report.not_moved
                    )
                }
            })
        }
    };

    eprintln!(); // terminate the progress line

    match result {
        Ok(done_line) => {
            eprintln!("{}", counters.summary_table());
            eprintln!(
                "Done! {} ({:.2}s)",
                done_line,
                started.elapsed().as_secs_f64()
            );
            Ok(())
        }
        Err(e) => {
            if e.downcast_ref::<CancelledError>().is_some() {
                eprintln!("{}", counters.summary_table());
                eprintln!("Processing interrupted; completed work is durable, re-run to continue.");
                std::process::exit(130); // standard exit code for Ctrl+C
            }
            Err(e)
        }
    }
}
