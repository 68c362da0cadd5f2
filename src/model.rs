use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::warn;

use crate::*;

/// Reads `importance`/`strength`: absent or non-numeric input falls back to
/// [`DEFAULT_WEIGHT`], everything else is clamped to `[0, 1]`.
pub fn normalize_weight(raw: Option<f64>) -> f64 {
    match raw {
        Some(value) if value.is_finite() => value.clamp(0.0, 1.0),
        _ => DEFAULT_WEIGHT,
    }
}

fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_f64()))
}

/// Ids are strings, but numeric ids are accepted and read as their decimal
/// text.
fn id_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_as_id(&value).ok_or_else(|| {
        <D::Error as serde::de::Error>::custom(format!(
            "expected a string or number id, got {value}"
        ))
    })
}

fn value_as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_str().map(str::to_string)))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCharacter {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub importance: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub image_url: Option<String>,
}

/// Flat node record: `{ id, data: { label, importance, imageUrl } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub data: Option<RawCharacterData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCharacterData {
    #[serde(default, deserialize_with = "lenient_string")]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub importance: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEdge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(deserialize_with = "id_string")]
    pub source: String,
    #[serde(deserialize_with = "id_string")]
    pub target: String,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub sentiment: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub strength: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<RawEdgeData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEdgeData {
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub sentiment: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub strength: Option<f64>,
}

impl RawEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: None,
            source: source.into(),
            target: target.into(),
            sentiment: None,
            strength: None,
            data: None,
        }
    }

    pub fn with_sentiment(mut self, sentiment: Sentiment) -> Self {
        self.sentiment = Some(sentiment.as_str().to_string());
        self
    }

    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = Some(strength);
        self
    }

    /// Top-level fields win over the nested `data` record.
    pub fn sentiment(&self) -> Sentiment {
        self.sentiment
            .as_deref()
            .or_else(|| self.data.as_ref().and_then(|d| d.sentiment.as_deref()))
            .map(Sentiment::parse)
            .unwrap_or_default()
    }

    pub fn strength(&self) -> f64 {
        normalize_weight(
            self.strength
                .or_else(|| self.data.as_ref().and_then(|d| d.strength)),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Chapter {
    pub title: String,
    pub edges: Vec<RawEdge>,
    pub active_characters: Vec<String>,
}

/// A roster and/or relationship document as it arrives from the asset loader.
///
/// Parsing is lenient: a field of the wrong shape is treated as absent and a
/// record that cannot be read is skipped, both with a warning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphDocument {
    pub characters: Vec<RawCharacter>,
    pub nodes: Vec<RawNode>,
    pub edges: Vec<RawEdge>,
    pub chapters: Vec<Chapter>,
}

impl GraphDocument {
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            if !value.is_null() {
                warn!("graph document is not a JSON object; treating it as empty");
            }
            return Self::default();
        };

        Self {
            characters: lenient_records(object.get("characters"), "characters"),
            nodes: lenient_records(object.get("nodes"), "nodes"),
            edges: lenient_records(object.get("edges"), "edges"),
            chapters: lenient_chapters(object.get("chapters")),
        }
    }

    /// Like [`GraphDocument::from_value`], but a syntax error degrades to an
    /// empty document instead of failing.
    pub fn from_json_str(source: &str) -> Self {
        match serde_json::from_str::<Value>(source) {
            Ok(value) => Self::from_value(&value),
            Err(err) => {
                warn!(%err, "graph document is not valid JSON; treating it as empty");
                Self::default()
            }
        }
    }

    /// Normalized entities in document order. `characters` wins over `nodes`
    /// when both are present. Only the first record of a repeated id is kept.
    pub fn entities(&self) -> Vec<Entity> {
        let entities: Vec<Entity> = if !self.characters.is_empty() {
            self.characters.iter().map(Entity::from_character).collect()
        } else {
            self.nodes.iter().map(Entity::from_node).collect()
        };

        let mut seen: HashSet<String> = HashSet::new();
        entities
            .into_iter()
            .enumerate()
            .filter_map(|(index, entity)| {
                if seen.insert(entity.id.clone()) {
                    Some(entity)
                } else {
                    warn!(id = %entity.id, index, "skipping duplicate character id");
                    None
                }
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
            && self.nodes.is_empty()
            && self.edges.is_empty()
            && self.chapters.is_empty()
    }
}

fn lenient_records<T: DeserializeOwned>(value: Option<&Value>, field: &str) -> Vec<T> {
    let Some(value) = value else {
        return Vec::new();
    };
    let Some(items) = value.as_array() else {
        if !value.is_null() {
            warn!(field, "expected an array; ignoring field");
        }
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match T::deserialize(item) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(field, index, %err, "skipping unreadable record");
                None
            }
        })
        .collect()
}

/// Chapters are read field by field so a bad record inside one never drops
/// the chapter itself; the list keeps its length and order.
fn lenient_chapters(value: Option<&Value>) -> Vec<Chapter> {
    let Some(value) = value else {
        return Vec::new();
    };
    let Some(items) = value.as_array() else {
        if !value.is_null() {
            warn!(field = "chapters", "expected an array; ignoring field");
        }
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| Chapter::from_value(item, index))
        .collect()
}

impl Chapter {
    fn from_value(value: &Value, index: usize) -> Self {
        let Some(object) = value.as_object() else {
            warn!(index, "chapter is not a JSON object; keeping it empty");
            return Self::default();
        };

        let title = object
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let active_characters = match object.get("activeCharacters") {
            Some(Value::Array(ids)) => ids
                .iter()
                .filter_map(|id| {
                    let parsed = value_as_id(id);
                    if parsed.is_none() {
                        warn!(chapter = index, %id, "skipping unreadable active character");
                    }
                    parsed
                })
                .collect(),
            Some(Value::Null) | None => Vec::new(),
            Some(_) => {
                warn!(chapter = index, "activeCharacters is not an array; ignoring field");
                Vec::new()
            }
        };

        Self {
            title,
            edges: lenient_records(object.get("edges"), "chapters.edges"),
            active_characters,
        }
    }
}

/// A character with its layout position. Mood and idle state live on
/// [`crate::engine::Node`] because they depend on the view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    pub label: String,
    pub importance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub position: Point,
}

impl Entity {
    pub fn new(id: impl Into<String>, importance: Option<f64>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            importance: normalize_weight(importance),
            image_url: None,
            position: Point::ORIGIN,
        }
    }

    pub fn from_character(raw: &RawCharacter) -> Self {
        Self {
            id: raw.id.clone(),
            label: non_empty(raw.name.as_deref()).unwrap_or(&raw.id).to_string(),
            importance: normalize_weight(raw.importance),
            image_url: raw.image_url.clone(),
            position: Point::ORIGIN,
        }
    }

    pub fn from_node(raw: &RawNode) -> Self {
        let data = raw.data.clone().unwrap_or_default();
        Self {
            id: raw.id.clone(),
            label: non_empty(data.label.as_deref()).unwrap_or(&raw.id).to_string(),
            importance: normalize_weight(data.importance),
            image_url: data.image_url,
            position: Point::ORIGIN,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    pub source: String,
    pub target: String,
    pub sentiment: Sentiment,
    pub strength: f64,
}

impl Relationship {
    /// Edges without an id get `e-{source}-{target}`, plus `-{chapter}` when
    /// they come from a chapter.
    pub fn from_raw(raw: &RawEdge, chapter: Option<usize>) -> Self {
        let id = match (raw.id.as_deref().and_then(|id| non_empty(Some(id))), chapter) {
            (Some(id), _) => id.to_string(),
            (None, Some(index)) => format!("e-{}-{}-{}", raw.source, raw.target, index),
            (None, None) => format!("e-{}-{}", raw.source, raw.target),
        };
        Self {
            id,
            source: raw.source.clone(),
            target: raw.target.clone(),
            sentiment: raw.sentiment(),
            strength: raw.strength(),
        }
    }

    pub fn touches(&self, entity_id: &str) -> bool {
        self.source == entity_id || self.target == entity_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn weights_default_and_clamp() {
        assert_eq!(normalize_weight(None), 0.5);
        assert_eq!(normalize_weight(Some(f64::NAN)), 0.5);
        assert_eq!(normalize_weight(Some(0.0)), 0.0);
        assert_eq!(normalize_weight(Some(1.7)), 1.0);
        assert_eq!(normalize_weight(Some(-0.2)), 0.0);
    }

    #[test]
    fn reads_character_roster() {
        let doc = GraphDocument::from_value(&json!({
            "characters": [
                { "id": "alice", "name": "Alice", "importance": 1.0, "imageUrl": "alice.png" },
                { "id": "rabbit", "name": "White Rabbit" },
                { "id": "cat", "importance": "very" }
            ]
        }));

        let entities = doc.entities();
        assert_eq!(entities.len(), 3);
        assert_eq!(entities[0].label, "Alice");
        assert_eq!(entities[0].image_url.as_deref(), Some("alice.png"));
        assert_eq!(entities[1].importance, 0.5);
        assert_eq!(entities[2].label, "cat");
        assert_eq!(entities[2].importance, 0.5);
    }

    #[test]
    fn reads_flat_node_records() {
        let doc = GraphDocument::from_value(&json!({
            "nodes": [
                { "id": "a", "data": { "label": "Ay", "importance": 0.9 } },
                { "id": "b" }
            ]
        }));
        let entities = doc.entities();
        assert_eq!(entities[0].label, "Ay");
        assert_eq!(entities[0].importance, 0.9);
        assert_eq!(entities[1].label, "b");
        assert_eq!(entities[1].importance, 0.5);
    }

    #[test]
    fn skips_unreadable_records() {
        let doc = GraphDocument::from_value(&json!({
            "characters": [{ "name": "no id" }, { "id": "ok" }],
            "edges": "not-a-list"
        }));
        assert_eq!(doc.characters.len(), 1);
        assert!(doc.edges.is_empty());
    }

    #[test]
    fn non_object_documents_are_empty() {
        assert!(GraphDocument::from_value(&json!([1, 2, 3])).is_empty());
        assert!(GraphDocument::from_value(&Value::Null).is_empty());
        assert!(GraphDocument::from_json_str("{ not json").is_empty());
    }

    #[test]
    fn numeric_ids_read_as_strings() {
        let doc = GraphDocument::from_value(&json!({
            "characters": [{ "id": 7, "importance": 0.3 }, { "id": true }],
            "edges": [{ "source": 7, "target": "alice" }]
        }));
        assert_eq!(doc.characters.len(), 1);
        assert_eq!(doc.characters[0].id, "7");
        assert_eq!(doc.edges[0].source, "7");
    }

    #[test]
    fn duplicate_character_ids_keep_the_first_record() {
        let doc = GraphDocument::from_value(&json!({
            "characters": [
                { "id": "alice", "importance": 1.0 },
                { "id": "bill" },
                { "id": "alice", "importance": 0.2, "name": "Other Alice" }
            ]
        }));
        let entities = doc.entities();
        let ids: Vec<_> = entities.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["alice", "bill"]);
        assert_eq!(entities[0].importance, 1.0);
        assert_eq!(entities[0].label, "alice");
    }

    #[test]
    fn bad_records_inside_a_chapter_keep_the_chapter() {
        let doc = GraphDocument::from_value(&json!({
            "chapters": [
                { "title": "One", "edges": [{ "source": "alice" }, { "source": "alice", "target": "bill" }] },
                { "title": "Two", "activeCharacters": ["alice", 3, null] },
                { "title": null, "edges": "nope" },
                "not a chapter"
            ]
        }));
        let titles: Vec<_> = doc.chapters.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["One", "Two", "", ""]);
        assert_eq!(doc.chapters[0].edges.len(), 1);
        assert_eq!(doc.chapters[1].active_characters, ["alice", "3"]);
        assert!(doc.chapters[2].edges.is_empty());
    }

    #[test]
    fn edge_fields_fall_back_to_nested_data() {
        let raw: RawEdge = serde_json::from_value(json!({
            "source": "a",
            "target": "b",
            "data": { "sentiment": "negative", "strength": 0.8 }
        }))
        .unwrap();
        assert_eq!(raw.sentiment(), Sentiment::Negative);
        assert_eq!(raw.strength(), 0.8);

        let raw: RawEdge = serde_json::from_value(json!({
            "source": "a",
            "target": "b",
            "sentiment": "POSITIVE",
            "data": { "sentiment": "negative" }
        }))
        .unwrap();
        assert_eq!(raw.sentiment(), Sentiment::Positive);
        assert_eq!(raw.strength(), 0.5);
    }

    #[test]
    fn relationship_ids() {
        let raw = RawEdge::new("alice", "queen");
        assert_eq!(Relationship::from_raw(&raw, None).id, "e-alice-queen");
        assert_eq!(Relationship::from_raw(&raw, Some(3)).id, "e-alice-queen-3");

        let mut named = raw.clone();
        named.id = Some("trial".to_string());
        assert_eq!(Relationship::from_raw(&named, Some(3)).id, "trial");
    }

    #[test]
    fn chapters_round_trip_camel_case() {
        let chapter = Chapter {
            title: "Down the Rabbit-Hole".to_string(),
            edges: vec![RawEdge::new("alice", "rabbit")],
            active_characters: vec!["alice".to_string()],
        };
        let value = serde_json::to_value(&chapter).unwrap();
        assert_eq!(value["activeCharacters"], json!(["alice"]));
        assert_eq!(serde_json::from_value::<Chapter>(value).unwrap(), chapter);
    }
}
