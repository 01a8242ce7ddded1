//! Tunable constants for scanning and layout, loadable from JSON.
//!
//! Every magic number the pipeline relies on lives here with its default so
//! that tests can sweep ranges of values.

use crate::error::{MetroError, Result};
use crate::parser::SOCIAL_FALLBACK_COUNT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How data point ids are produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// `{category}-{fnv(label|value)}`; stable regardless of extraction order.
    #[default]
    ContentHash,
    /// `{category}-{n}` counting per category in extraction order.
    Sequential,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub dynamic_categories: bool,
    pub max_dynamic_categories: usize,
    pub min_categories: usize,
    /// Character cap for list items picked up under headings.
    pub list_item_cap: usize,
    /// How many following siblings of a heading are searched for a list.
    pub heading_sibling_window: usize,
    pub social_fallback_count: usize,
    pub id_strategy: IdStrategy,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            dynamic_categories: true,
            max_dynamic_categories: 5,
            min_categories: 3,
            list_item_cap: 80,
            heading_sibling_window: 3,
            social_fallback_count: SOCIAL_FALLBACK_COUNT,
            id_strategy: IdStrategy::ContentHash,
        }
    }
}

impl ScanConfig {
    /// Replace zero caps and windows with their defaults.
    pub fn validated(mut self) -> Self {
        let defaults = ScanConfig::default();
        if self.max_dynamic_categories == 0 {
            self.max_dynamic_categories = defaults.max_dynamic_categories;
        }
        if self.list_item_cap == 0 {
            self.list_item_cap = defaults.list_item_cap;
        }
        if self.heading_sibling_window == 0 {
            self.heading_sibling_window = defaults.heading_sibling_window;
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub margin: f64,
    /// Preferred distance between consecutive stations on a line.
    pub station_spacing: f64,
    pub min_line_length: f64,
    /// Fraction of a line reserved at each end before the first/last station.
    pub end_padding: f64,
    /// Transfers farther than this from either station fall back to the station midpoint.
    pub max_transfer_distance: f64,
    /// Arc-length step used when sampling polylines for closest-point queries.
    pub sample_step: f64,
    pub corner_radius: f64,
    pub max_transfers_per_pair: usize,
    /// Layouts kept by [`crate::layout::LayoutCache`]; 0 disables caching.
    pub cache_capacity: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            canvas_width: 1200.0,
            canvas_height: 800.0,
            margin: 80.0,
            station_spacing: 70.0,
            min_line_length: 240.0,
            end_padding: 0.06,
            max_transfer_distance: 200.0,
            sample_step: 8.0,
            corner_radius: 12.0,
            max_transfers_per_pair: 2,
            cache_capacity: 32,
        }
    }
}

impl LayoutConfig {
    /// Clamp values into ranges the router and placer can work with.
    pub fn validated(mut self) -> Self {
        let defaults = LayoutConfig::default();
        if !self.canvas_width.is_finite() || self.canvas_width <= 0.0 {
            self.canvas_width = defaults.canvas_width;
        }
        if !self.canvas_height.is_finite() || self.canvas_height <= 0.0 {
            self.canvas_height = defaults.canvas_height;
        }
        let max_margin = self.canvas_width.min(self.canvas_height) / 4.0;
        if !self.margin.is_finite() {
            self.margin = defaults.margin;
        }
        self.margin = self.margin.clamp(0.0, max_margin);
        if !self.station_spacing.is_finite() || self.station_spacing <= 0.0 {
            self.station_spacing = defaults.station_spacing;
        }
        if !self.min_line_length.is_finite() || self.min_line_length < 0.0 {
            self.min_line_length = defaults.min_line_length;
        }
        if !self.end_padding.is_finite() {
            self.end_padding = defaults.end_padding;
        }
        self.end_padding = self.end_padding.clamp(0.0, 0.45);
        if !self.max_transfer_distance.is_finite() || self.max_transfer_distance <= 0.0 {
            self.max_transfer_distance = defaults.max_transfer_distance;
        }
        if !self.sample_step.is_finite() || self.sample_step <= 0.0 {
            self.sample_step = defaults.sample_step;
        }
        if !self.corner_radius.is_finite() || self.corner_radius < 0.0 {
            self.corner_radius = 0.0;
        }
        self
    }

    /// Width available to a line between the side margins.
    pub fn usable_width(&self) -> f64 {
        (self.canvas_width - 2.0 * self.margin).max(0.0)
    }

    pub fn usable_height(&self) -> f64 {
        (self.canvas_height - 2.0 * self.margin).max(0.0)
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanConfig,
    pub layout: LayoutConfig,
}

impl Config {
    /// Load a configuration file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| MetroError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(text)?;
        if config.scan.min_categories > 12 {
            return Err(MetroError::Config(format!(
                "min_categories must be at most 12, got {}",
                config.scan.min_categories
            )));
        }
        Ok(config.validated())
    }

    pub fn validated(self) -> Self {
        Config {
            scan: self.scan.validated(),
            layout: self.layout.validated(),
        }
    }

    /// `~/.metromap/config.json`.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".metromap")
            .join("config.json")
    }

    /// Load the explicit path if given, else the default file if it exists, else defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = Config::from_json(r#"{"layout": {"end_padding": 0.1}}"#).unwrap();
        assert_eq!(config.layout.end_padding, 0.1);
        assert_eq!(config.layout.max_transfer_distance, 200.0);
        assert_eq!(config.scan, ScanConfig::default());
    }

    #[test]
    fn test_validated_clamps_padding_and_step() {
        let config = LayoutConfig {
            end_padding: 0.9,
            sample_step: -1.0,
            ..LayoutConfig::default()
        }
        .validated();
        assert_eq!(config.end_padding, 0.45);
        assert_eq!(config.sample_step, 8.0);
    }

    #[test]
    fn test_zero_scan_caps_fall_back_to_defaults() {
        let config = Config::from_json(
            r#"{"scan": {"list_item_cap": 0, "max_dynamic_categories": 0, "heading_sibling_window": 0, "social_fallback_count": 0}}"#,
        )
        .unwrap();
        let defaults = ScanConfig::default();
        assert_eq!(config.scan.list_item_cap, defaults.list_item_cap);
        assert_eq!(config.scan.max_dynamic_categories, defaults.max_dynamic_categories);
        assert_eq!(config.scan.heading_sibling_window, defaults.heading_sibling_window);
        assert_eq!(config.scan.social_fallback_count, 0);
    }

    #[test]
    fn test_rejects_unreasonable_min_categories() {
        let err = Config::from_json(r#"{"scan": {"min_categories": 40}}"#).unwrap_err();
        assert!(matches!(err, MetroError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"scan": {{"id_strategy": "sequential"}}}}"#).unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.scan.id_strategy, IdStrategy::Sequential);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = Config::load(Path::new("/nonexistent/metromap.json")).unwrap_err();
        assert!(matches!(err, MetroError::Io { .. }));
    }
}
