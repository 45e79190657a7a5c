//! Display utilities for the hoard CLI.

use anyhow::Result;
use hoard_lib::prelude::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner shown while an export is running.
pub(crate) fn status_spinner(quiet: bool, id: &str) -> Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.set_message(format!("{id} CREATED"));
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

/// Print a finished (or current) status with the size of its data blob.
pub(crate) fn print_status(status: &ExportStatus, stored_bytes: usize) {
    println!("Export: {}", status.id);
    println!("Status: {}", status.status);
    println!("Data key: {}", status.data_key());
    println!("Stored: {stored_bytes} bytes");
}
