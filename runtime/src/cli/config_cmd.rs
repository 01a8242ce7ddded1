//! `metromap config`: print the effective configuration.

use std::path::Path;

use anyhow::Result;

use crate::cli::output::{self, Styled};
use crate::config::Config;

pub async fn run(explicit: Option<&Path>, config: &Config) -> Result<()> {
    if !output::is_json() && !output::is_quiet() {
        let s = Styled::new();
        let source = match explicit {
            Some(path) => path.display().to_string(),
            None if Config::default_path().exists() => Config::default_path().display().to_string(),
            None => "built-in defaults".to_string(),
        };
        eprintln!("  {} {}", s.bold("Config"), s.dim(&source));
    }
    output::print_json(&serde_json::to_value(config)?);
    Ok(())
}
