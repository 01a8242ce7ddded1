//! `metromap scan <FILE> --url <URL>`: extract stations and lines from a page.

use std::path::Path;

use anyhow::Result;
use clap::ValueEnum;

use crate::cli::output::{self, Styled};
use crate::config::Config;
use crate::export::{self, BusinessRecord};
use crate::types::ScanResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ScanFormat {
    #[default]
    Summary,
    Json,
    Csv,
    Record,
}

pub async fn run(input: &Path, url: &str, format: ScanFormat, config: &Config) -> Result<()> {
    let scan = super::scan_input(input, url, config).await?;

    // --json forces the JSON document regardless of --format.
    let format = if output::is_json() { ScanFormat::Json } else { format };
    match format {
        ScanFormat::Json => println!("{}", export::to_json(&scan)?),
        ScanFormat::Csv => print!("{}", export::to_csv(&scan)),
        ScanFormat::Record => {
            let record = BusinessRecord::from_scan(&scan);
            output::print_json(&serde_json::to_value(&record)?);
        }
        ScanFormat::Summary => {
            if !output::is_quiet() {
                print_summary(&Styled::new(), &scan);
            }
        }
    }
    Ok(())
}

fn print_summary(s: &Styled, scan: &ScanResult) {
    output::print_header(s);
    eprintln!("  {} {}", s.bold("Site"), scan.source_url);
    if !scan.title.is_empty() {
        eprintln!("  {} {}", s.bold("Title"), scan.title);
    }
    eprintln!();

    let total = scan.station_count();
    for category in scan.categories.iter().filter(|c| c.visible) {
        output::print_section(
            s,
            &format!(
                "{} {} {}",
                category.display_name,
                output::progress_bar(category.data_points.len(), total, 12),
                s.dim(&format!("{} stations", category.data_points.len()))
            ),
        );
        let shown = if output::is_verbose() {
            category.data_points.len()
        } else {
            6
        };
        for point in category.data_points.iter().take(shown) {
            eprintln!(
                "    {} {} {:<16} {}",
                s.station_sym(),
                s.confidence(point.confidence),
                point.label,
                point.value
            );
        }
        let hidden = category.data_points.len().saturating_sub(shown);
        if hidden > 0 {
            eprintln!("    {}", s.dim(&format!("... {hidden} more (use --verbose)")));
        }
        eprintln!();
    }

    if !scan.relationships.is_empty() {
        output::print_section(s, "Transfers");
        for rel in &scan.relationships {
            output::print_check(
                s.ok_sym(),
                &format!("{} / {}", rel.category_ids.0, rel.category_ids.1),
                &s.cyan(&rel.reason),
            );
        }
        eprintln!();
    }
    eprintln!(
        "  {} stations on {} lines, {} transfers",
        total,
        scan.categories.iter().filter(|c| c.visible).count(),
        scan.relationships.len()
    );
}
