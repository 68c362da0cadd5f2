use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::config::StyleConfig;
use crate::model::{Entity, Relationship};
use crate::routing::route;
use crate::*;

/// Which animated glyph, if any, the presentation layer draws for an edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Conflict: crossed swords travelling along the edge.
    Battle,
    /// Bond: two figures travelling along the edge.
    Friendship,
    #[default]
    Plain,
}

impl EdgeKind {
    pub fn is_animated(&self) -> bool {
        !matches!(self, EdgeKind::Plain)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Battle => "battle",
            EdgeKind::Friendship => "friendship",
            EdgeKind::Plain => "plain",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyle {
    pub stroke: String,
    pub stroke_width: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_dasharray: Option<String>,
    pub opacity: f64,
}

/// Direction an animated glyph travels along the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    /// Source to target.
    Forward,
    /// Target to source.
    Reverse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeData {
    pub source_importance: f64,
    pub target_importance: f64,
    pub flow: Flow,
}

impl EdgeData {
    /// Motion runs from the more important endpoint to the less important
    /// one; equal importance runs source to target.
    pub fn new(source_importance: f64, target_importance: f64) -> Self {
        let flow = if source_importance >= target_importance {
            Flow::Forward
        } else {
            Flow::Reverse
        };
        Self {
            source_importance,
            target_importance,
            flow,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyledEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub sentiment: Sentiment,
    pub strength: f64,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
    pub animated: bool,
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<Side>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<Side>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<EdgeStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<EdgeData>,
}

impl StyledEdge {
    /// An edge whose endpoints could not be resolved. It stays in the output
    /// so callers can see it, but carries nothing renderable.
    pub fn hidden(relationship: &Relationship) -> Self {
        Self {
            id: relationship.id.clone(),
            source: relationship.source.clone(),
            target: relationship.target.clone(),
            sentiment: relationship.sentiment,
            strength: relationship.strength,
            kind: EdgeKind::Plain,
            animated: false,
            hidden: true,
            source_handle: None,
            target_handle: None,
            style: None,
            data: None,
        }
    }

    pub fn is_renderable(&self) -> bool {
        !self.hidden && self.style.is_some()
    }
}

fn edge_kind(sentiment: Sentiment, mode: ViewMode) -> EdgeKind {
    match (mode, sentiment) {
        (ViewMode::Story, Sentiment::Negative) => EdgeKind::Battle,
        (ViewMode::Story, Sentiment::Positive) => EdgeKind::Friendship,
        _ => EdgeKind::Plain,
    }
}

/// Routes and styles one relationship between two positioned entities.
pub fn style_edge(
    relationship: &Relationship,
    source: &Entity,
    target: &Entity,
    mode: ViewMode,
    config: &StyleConfig,
) -> StyledEdge {
    let anchors = route(source.position, target.position);
    let kind = edge_kind(relationship.sentiment, mode);

    let stroke = match relationship.sentiment {
        Sentiment::Negative => &config.negative_color,
        Sentiment::Positive => &config.positive_color,
        Sentiment::Neutral => &config.neutral_color,
    };

    // Animated glyphs carry the visual weight in story mode.
    let stroke_width = if kind.is_animated() {
        0.0
    } else {
        config.base_width + config.width_curve.apply(relationship.strength) * config.width_scale
    };

    let stroke_dasharray = (mode.is_summary() && relationship.sentiment == Sentiment::Positive)
        .then(|| config.dash_pattern.clone());

    StyledEdge {
        id: relationship.id.clone(),
        source: relationship.source.clone(),
        target: relationship.target.clone(),
        sentiment: relationship.sentiment,
        strength: relationship.strength,
        kind,
        animated: kind.is_animated(),
        hidden: false,
        source_handle: Some(anchors.source),
        target_handle: Some(anchors.target),
        style: Some(EdgeStyle {
            stroke: stroke.clone(),
            stroke_width,
            stroke_dasharray,
            opacity: config.opacity,
        }),
        data: Some(EdgeData::new(source.importance, target.importance)),
    }
}

/// Styles every relationship against the positioned entity set. Edges with
/// an unknown endpoint come back hidden.
pub fn style_relationships(
    relationships: &[Relationship],
    entities: &[Entity],
    mode: ViewMode,
    config: &StyleConfig,
) -> Vec<StyledEdge> {
    let by_id: HashMap<&str, &Entity> = entities.iter().map(|e| (e.id.as_str(), e)).collect();

    relationships
        .iter()
        .map(|relationship| {
            match (
                by_id.get(relationship.source.as_str()),
                by_id.get(relationship.target.as_str()),
            ) {
                (Some(source), Some(target)) => {
                    style_edge(relationship, source, target, mode, config)
                }
                _ => {
                    debug!(
                        edge = %relationship.id,
                        source = %relationship.source,
                        target = %relationship.target,
                        "hiding edge with unknown endpoint"
                    );
                    StyledEdge::hidden(relationship)
                }
            }
        })
        .collect()
}
