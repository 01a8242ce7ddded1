//! `metromap digest <FILE> --url <URL>`: the text digest an insight provider would receive.

use std::path::Path;

use anyhow::Result;

use crate::cli::output;
use crate::config::Config;
use crate::insight;

pub async fn run(input: &Path, url: &str, per_category: usize, config: &Config) -> Result<()> {
    let scan = super::scan_input(input, url, config).await?;
    let text = insight::digest(&scan, per_category);
    if output::is_json() {
        output::print_json(&serde_json::json!({
            "url": scan.source_url,
            "per_category": per_category,
            "digest": text,
        }));
    } else {
        print!("{text}");
    }
    Ok(())
}
