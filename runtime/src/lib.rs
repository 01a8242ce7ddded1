//! Metromap runtime: mine a single web page into evidence-backed data points,
//! bucket them into lines, link them with transfers, and lay the result out
//! as a deterministic metro map.
//!
//! The core (`parser` through `layout`) is synchronous and never fails;
//! `pipeline` strings it together and is where degradations are logged.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod dynamic;
pub mod error;
pub mod export;
pub mod extract;
pub mod insight;
pub mod layout;
pub mod parser;
pub mod pipeline;
pub mod relationships;
pub mod scoring;
pub mod types;

pub use config::Config;
pub use error::{MetroError, Result};
pub use layout::{LayoutEngine, LayoutResult};
pub use pipeline::{scan, scan_at};
pub use types::{Category, DataPoint, Evidence, EvidenceSource, Relationship, ScanResult};
