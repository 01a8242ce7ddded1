//! CLI subcommand implementations for the `metromap` binary.

pub mod config_cmd;
pub mod digest_cmd;
pub mod layout_cmd;
pub mod output;
pub mod scan_cmd;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::pipeline;
use crate::types::ScanResult;

/// Read page markup from a file, or from stdin when `input` is `-`.
pub fn read_markup(input: &Path) -> Result<String> {
    if input.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read markup from stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))
}

/// Read the input and run the scan off the async runtime.
pub async fn scan_input(input: &Path, url: &str, config: &Config) -> Result<ScanResult> {
    let markup = read_markup(input)?;
    let url = url.to_string();
    let config = config.clone();
    tokio::task::spawn_blocking(move || pipeline::scan(&markup, &url, &config))
        .await
        .context("scan task failed")
}
