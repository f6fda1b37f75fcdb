//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::cli::{collect_inputs, format_duration, format_megabytes};
use crate::engine::ConversionConfig;
use crate::error::Result;
use crate::session::{AddReport, FailedFile, Services, Session, SourceFile};

/// Read every input from disk; unreadable files are reported and skipped.
///
/// # Returns
/// The loaded files and the number that could not be read
pub async fn load_sources(inputs: &[PathBuf]) -> (Vec<SourceFile>, usize) {
    let mut files = Vec::new();
    let mut unreadable = 0;

    for path in collect_inputs(inputs) {
        match SourceFile::load(&path).await {
            Ok(file) => files.push(file),
            Err(e) => {
                warn!("Cannot read {}: {}", path.display(), e);
                println!("Failed: {} [{}]: {}", path.display(), e.error_code(), e);
                unreadable += 1;
            }
        }
    }

    (files, unreadable)
}

fn print_failure(failed: &FailedFile) {
    println!(
        "Failed: {} [{}]: {}",
        failed.name,
        failed.error.error_code(),
        failed.error
    );
}

fn print_add_report(report: &AddReport) {
    for skipped in &report.skipped {
        println!("Skipped: {} ({})", skipped.name, skipped.reason);
    }
    report.failed.iter().for_each(print_failure);
}

/// Convert all inputs and write them to `output`.
///
/// # Returns
/// `true` when every input was read, decoded and saved
pub async fn convert(inputs: &[PathBuf], output: &Path, config: ConversionConfig) -> Result<bool> {
    info!(
        "Converting to {} Hz, {}-bit, channels {}",
        config.sample_rate,
        config.bit_depth(),
        config.channel_mode
    );

    let (files, unreadable) = load_sources(inputs).await;
    let mut session = Session::new(Services::local(output), config)?;

    let added = session.add(files).await;
    print_add_report(&added);

    let saved = session.save_all().await;
    saved.failed.iter().for_each(print_failure);

    println!(
        "Converted {} file(s) to {}",
        saved.saved.len(),
        output.display()
    );
    for name in &saved.saved {
        println!("  {}", name);
    }

    Ok(unreadable == 0 && added.is_complete() && saved.is_complete())
}

/// Print duration and size estimates for all inputs.
///
/// # Returns
/// `true` when every input was read and decoded
pub async fn inspect(inputs: &[PathBuf], config: ConversionConfig) -> Result<bool> {
    info!("Inspecting {} input(s)", inputs.len());

    let (files, unreadable) = load_sources(inputs).await;
    let mut session = Session::new(Services::local(Path::new(".")), config)?;

    let added = session.add(files).await;
    print_add_report(&added);

    println!(
        "Target: {} Hz, {}-bit, channels {}",
        config.sample_rate,
        config.bit_depth(),
        config.channel_mode
    );
    for summary in session.summaries() {
        println!(
            "{:>3}  {:<40} {:>6}  {:>8} -> {:>8}",
            summary.index,
            summary.name,
            format_duration(summary.duration_secs),
            format_megabytes(summary.source_byte_size as u64),
            format_megabytes(summary.estimated_output_size),
        );
    }

    Ok(unreadable == 0 && added.is_complete())
}
