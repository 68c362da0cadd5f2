//! Tunables for a layout and styling pass.
//!
//! Every section deserializes with defaults, so a config file only needs the
//! keys it wants to change:
//!
//! ```json
//! { "layout": { "strategy": "pyramid" }, "style": { "widthCurve": "linear" } }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub layout: LayoutConfig,
    pub style: StyleConfig,
    pub mood: MoodConfig,
}

impl EngineConfig {
    pub fn from_json_str(source: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&source)
    }

    pub fn validate(&self) -> Result<()> {
        let layout = &self.layout;
        for (name, value) in [
            ("layout.columnWidth", layout.column_width),
            ("layout.rowHeight", layout.row_height),
            ("layout.jitter", layout.jitter),
            ("layout.tierSpacingX", layout.tier_spacing_x),
            ("layout.tierSpacingY", layout.tier_spacing_y),
            ("layout.edgePush", layout.edge_push),
            ("style.baseWidth", self.style.base_width),
            ("style.widthScale", self.style.width_scale),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be a finite, non-negative number (got {value})"
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.style.opacity) {
            return Err(Error::InvalidConfig(format!(
                "style.opacity must be within [0, 1] (got {})",
                self.style.opacity
            )));
        }

        if self.mood.antagonist_keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(Error::InvalidConfig(
                "mood.antagonistKeywords must not contain empty entries".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutStrategy {
    /// Two rows per column fanning out to the right of the anchor.
    #[default]
    ColumnPair,
    /// Tiers of 1, 2, 3, ... entities below the anchor.
    Pyramid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub strategy: LayoutStrategy,
    pub column_width: f64,
    pub row_height: f64,
    /// Maximum vertical jitter for the column-pair strategy; `0` disables it.
    pub jitter: f64,
    /// Seed used when the engine builds its own jitter source. `None` draws
    /// from the thread RNG.
    pub jitter_seed: Option<u64>,
    pub tier_spacing_x: f64,
    pub tier_spacing_y: f64,
    pub edge_push: f64,
    pub edge_push_tiers: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            strategy: LayoutStrategy::ColumnPair,
            column_width: 800.0,
            row_height: 250.0,
            jitter: 25.0,
            jitter_seed: None,
            tier_spacing_x: 320.0,
            tier_spacing_y: 260.0,
            edge_push: 120.0,
            edge_push_tiers: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidthCurve {
    Linear,
    #[default]
    Quadratic,
}

impl WidthCurve {
    pub fn apply(&self, strength: f64) -> f64 {
        match self {
            WidthCurve::Linear => strength,
            WidthCurve::Quadratic => strength * strength,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleConfig {
    pub width_curve: WidthCurve,
    pub base_width: f64,
    pub width_scale: f64,
    pub opacity: f64,
    pub negative_color: String,
    pub positive_color: String,
    pub neutral_color: String,
    pub dash_pattern: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            width_curve: WidthCurve::Quadratic,
            base_width: 3.0,
            width_scale: 15.0,
            opacity: 0.9,
            negative_color: "#ef4444".to_string(),
            positive_color: "#10b981".to_string(),
            neutral_color: "#fbbf24".to_string(),
            dash_pattern: "8,4".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MoodConfig {
    pub antagonist_keywords: Vec<String>,
}

impl Default for MoodConfig {
    fn default() -> Self {
        Self {
            antagonist_keywords: ["queen", "duchess", "knave", "villain"]
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config =
            EngineConfig::from_json_str(r#"{ "layout": { "strategy": "pyramid" } }"#).unwrap();
        assert_eq!(config.layout.strategy, LayoutStrategy::Pyramid);
        assert_eq!(config.layout.column_width, 800.0);
        assert_eq!(config.style, StyleConfig::default());
    }

    #[test]
    fn empty_object_is_default_config() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn rejects_negative_spacing() {
        let err = EngineConfig::from_json_str(r#"{ "layout": { "rowHeight": -1 } }"#)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(msg) if msg.contains("rowHeight")));
    }

    #[test]
    fn rejects_out_of_range_opacity() {
        let err = EngineConfig::from_json_str(r#"{ "style": { "opacity": 1.5 } }"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = EngineConfig::from_json_str("{ layout").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn width_curves() {
        assert_eq!(WidthCurve::Linear.apply(0.5), 0.5);
        assert_eq!(WidthCurve::Quadratic.apply(0.5), 0.25);
    }
}
