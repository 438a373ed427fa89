use anyhow::{bail, Result};
use clap::Parser;
use colored::Colorize;
use elftrim_core::{trim_in_place, trim_to_output, TrimOptions, TrimStats};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

/// Truncate ELF binaries to the bytes the runtime loader actually needs
#[derive(Parser)]
#[command(
    name = "elftrim",
    about = "Trim ELF executables and shared objects to their loader-relevant footprint",
    version,
    author
)]
struct Cli {
    /// ELF executables or shared objects to trim
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Also discard trailing zero padding below the structural footprint
    #[arg(short = 'z', long)]
    strip_zeros: bool,

    /// Write the trimmed result to this path instead of modifying the
    /// input (requires exactly one input file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Emit a JSON report instead of human-readable lines
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Report {
    path: String,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_before: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_after: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bytes_saved: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn percent_saved(stats: &TrimStats) -> f64 {
    if stats.size_before == 0 {
        0.0
    } else {
        stats.bytes_saved() as f64 * 100.0 / stats.size_before as f64
    }
}

fn main() -> Result<ExitCode> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.output.is_some() && cli.files.len() != 1 {
        bail!("--output requires exactly one input file");
    }

    let options = TrimOptions {
        strip_zeros: cli.strip_zeros,
    };
    log::debug!(
        "trimming {} file(s), strip_zeros={}",
        cli.files.len(),
        options.strip_zeros
    );

    let mut reports = Vec::with_capacity(cli.files.len());
    let mut failures = 0usize;
    let mut total_saved = 0u64;

    for file in &cli.files {
        let shown = file.display().to_string();
        let result = match &cli.output {
            Some(dest) => trim_to_output(file, dest, &options),
            None => trim_in_place(file, &options),
        };

        match result {
            Ok(stats) => {
                total_saved += stats.bytes_saved();
                if !cli.json {
                    println!(
                        "{} {shown}: {} -> {} bytes (saved {}, {:.1}%)",
                        "OK".green().bold(),
                        stats.size_before,
                        stats.size_after,
                        stats.bytes_saved(),
                        percent_saved(&stats)
                    );
                }
                reports.push(Report {
                    path: shown,
                    ok: true,
                    size_before: Some(stats.size_before),
                    size_after: Some(stats.size_after),
                    bytes_saved: Some(stats.bytes_saved()),
                    error: None,
                });
            }
            Err(err) => {
                failures += 1;
                if !cli.json {
                    eprintln!("{} {shown}: {err}", "FAIL".red().bold());
                }
                reports.push(Report {
                    path: shown,
                    ok: false,
                    size_before: None,
                    size_after: None,
                    bytes_saved: None,
                    error: Some(err.to_string()),
                });
            }
        }
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else if cli.files.len() > 1 {
        let trimmed = cli.files.len() - failures;
        let summary = format!(
            "trimmed {trimmed} of {} files, {total_saved} bytes saved",
            cli.files.len()
        );
        if failures == 0 {
            println!("{}", summary.green());
        } else {
            println!("{}", summary.yellow());
        }
    }

    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
