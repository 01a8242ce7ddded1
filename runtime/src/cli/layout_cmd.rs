//! `metromap layout <FILE> --url <URL>`: scan and print the map geometry as JSON.

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::output::{self, Styled};
use crate::config::Config;
use crate::pipeline;

pub async fn run(input: &Path, url: &str, config: &Config) -> Result<()> {
    let scan = super::scan_input(input, url, config).await?;
    let layout_config = config.clone();
    let result = tokio::task::spawn_blocking(move || pipeline::layout(&scan, &layout_config))
        .await
        .context("layout task failed")?;

    println!("{}", serde_json::to_string_pretty(&result)?);

    if !output::is_json() && !output::is_quiet() {
        let s = Styled::new();
        eprintln!(
            "  {} {} lines, {} transfers placed",
            s.ok_sym(),
            result.lines.len(),
            result.transfers.len()
        );
        if !result.skipped_transfers.is_empty() {
            eprintln!(
                "  {} skipped: {}",
                s.warn_sym(),
                result.skipped_transfers.join(", ")
            );
        }
    }
    Ok(())
}
