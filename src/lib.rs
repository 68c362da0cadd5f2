pub mod config;
pub mod engine;
pub mod error;
pub mod layout;
pub mod model;
pub mod mood;
pub mod preview;
pub mod rank;
pub mod routing;
pub mod style;
pub mod utils;

use serde::{Deserialize, Serialize};

pub use config::{EngineConfig, LayoutConfig, LayoutStrategy, MoodConfig, StyleConfig, WidthCurve};
pub use engine::{GraphEngine, GraphSnapshot, Node, ViewState};
pub use error::{Error, Result};
pub use layout::{Jitter, NoJitter, SeededJitter, ThreadRngJitter, assign_positions};
pub use model::{Chapter, Entity, GraphDocument, RawEdge, Relationship};
pub use mood::{AntagonistClassifier, KeywordClassifier};
pub use rank::rank_by_importance;
pub use routing::{Anchors, EdgeParams, floating_endpoints, route};
pub use style::{EdgeData, EdgeKind, EdgeStyle, Flow, StyledEdge, style_edge};

/// Fallback for missing `importance` and `strength` values.
pub const DEFAULT_WEIGHT: f64 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Compass side of a node that an edge leaves from or arrives at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Top => Side::Bottom,
            Side::Bottom => Side::Top,
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Top => "top",
            Side::Bottom => "bottom",
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Sentiment {
    /// Unknown or empty values read as neutral.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "positive" => Sentiment::Positive,
            "negative" => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }

    pub fn score(&self) -> i32 {
        match self {
            Sentiment::Positive => 1,
            Sentiment::Negative => -1,
            Sentiment::Neutral => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Summary,
    #[default]
    Story,
}

impl ViewMode {
    pub fn is_summary(&self) -> bool {
        matches!(self, ViewMode::Summary)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Summary => "summary",
            ViewMode::Story => "story",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    #[default]
    Neutral,
    Happy,
    Sad,
    Angry,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Neutral => "neutral",
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Angry => "angry",
        }
    }
}
