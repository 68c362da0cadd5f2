//! The graph data processor: raw documents in, one immutable snapshot out.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::layout::{Jitter, NoJitter, SeededJitter, ThreadRngJitter, assign_positions};
use crate::model::{Chapter, Entity, GraphDocument, RawEdge, Relationship};
use crate::mood::{AntagonistClassifier, KeywordClassifier, MoodState, chapter_moods};
use crate::rank::rank_by_importance;
use crate::style::{StyledEdge, style_relationships};
use crate::*;

const ACTIVE_OPACITY: f64 = 1.0;
const GHOST_OPACITY: f64 = 0.1;
const UNFOCUSED_OPACITY: f64 = 0.05;

/// Everything the caller knows about the current view. The engine keeps no
/// view state of its own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub mode: ViewMode,
    /// Index of the active chapter; used to keep generated edge ids unique
    /// across chapters.
    pub chapter_index: Option<usize>,
    /// Relationships of the active chapter. Mood and idle state are derived
    /// from these alone.
    pub chapter_edges: Vec<RawEdge>,
    /// Ids present in the chapter scene. `None` treats everyone as present.
    pub active_characters: Option<Vec<String>>,
    pub focus: Option<String>,
}

impl ViewState {
    pub fn summary() -> Self {
        Self {
            mode: ViewMode::Summary,
            ..Self::default()
        }
    }

    pub fn for_chapter(chapter: &Chapter, index: usize) -> Self {
        Self {
            mode: ViewMode::Story,
            chapter_index: Some(index),
            chapter_edges: chapter.edges.clone(),
            active_characters: Some(chapter.active_characters.clone()),
            focus: None,
        }
    }

    pub fn try_story(chapters: &[Chapter], index: usize) -> Result<Self> {
        let chapter = chapters.get(index).ok_or(Error::ChapterOutOfRange {
            index,
            len: chapters.len(),
        })?;
        Ok(Self::for_chapter(chapter, index))
    }

    pub fn with_focus(mut self, entity_id: impl Into<String>) -> Self {
        self.focus = Some(entity_id.into());
        self
    }
}

/// A positioned entity annotated for the current view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    #[serde(flatten)]
    pub entity: Entity,
    pub mood: Mood,
    pub is_idle: bool,
    pub is_active: bool,
    pub opacity: f64,
    pub grayscale: bool,
}

impl Node {
    pub fn id(&self) -> &str {
        &self.entity.id
    }

    pub fn position(&self) -> Point {
        self.entity.position
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<StyledEdge>,
    pub master_nodes: Vec<Entity>,
    pub chapters: Vec<Chapter>,
}

impl GraphSnapshot {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    pub fn edge(&self, id: &str) -> Option<&StyledEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn renderable_edges(&self) -> impl Iterator<Item = &StyledEdge> {
        self.edges.iter().filter(|e| e.is_renderable())
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
            && self.master_nodes.is_empty()
            && self.edges.is_empty()
            && self.chapters.is_empty()
    }
}

pub struct GraphEngine {
    config: EngineConfig,
    classifier: Box<dyn AntagonistClassifier>,
}

impl fmt::Debug for GraphEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GraphEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let classifier = KeywordClassifier::from_config(&config.mood)?;
        Ok(Self {
            config,
            classifier: Box::new(classifier),
        })
    }

    pub fn with_classifier(mut self, classifier: impl AntagonistClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs one pass with the jitter source described by the config: none
    /// when the amplitude is zero, seeded when `jitterSeed` is set, the
    /// thread RNG otherwise.
    pub fn process(&self, roster: &Value, relationships: &Value, view: &ViewState) -> GraphSnapshot {
        let layout = &self.config.layout;
        let mut jitter: Box<dyn Jitter> = match layout.jitter_seed {
            _ if layout.jitter <= 0.0 => Box::new(NoJitter),
            Some(seed) => Box::new(SeededJitter::new(seed)),
            None => Box::new(ThreadRngJitter),
        };
        self.process_with_jitter(roster, relationships, view, &mut *jitter)
    }

    pub fn process_with_jitter(
        &self,
        roster: &Value,
        relationships: &Value,
        view: &ViewState,
        jitter: &mut dyn Jitter,
    ) -> GraphSnapshot {
        let roster = GraphDocument::from_value(roster);
        let relationships = GraphDocument::from_value(relationships);
        self.process_documents(&roster, &relationships, view, jitter)
    }

    pub fn process_documents(
        &self,
        roster: &GraphDocument,
        relationships: &GraphDocument,
        view: &ViewState,
        jitter: &mut dyn Jitter,
    ) -> GraphSnapshot {
        let ranked = rank_by_importance(&roster.entities());
        let master_nodes = assign_positions(&ranked, &self.config.layout, jitter);

        let mut view_relationships: Vec<Relationship> = match view.mode {
            ViewMode::Summary => first_non_empty(&relationships.edges, &roster.edges)
                .iter()
                .map(|raw| Relationship::from_raw(raw, None))
                .collect(),
            ViewMode::Story => view
                .chapter_edges
                .iter()
                .map(|raw| Relationship::from_raw(raw, view.chapter_index))
                .collect(),
        };
        disambiguate_ids(&mut view_relationships);

        let moods = chapter_moods(
            &master_nodes,
            &view_relationships,
            view.mode,
            self.classifier.as_ref(),
        );

        let focus = match view.mode {
            ViewMode::Story => view.focus.as_deref(),
            ViewMode::Summary => None,
        };

        let nodes = annotate_nodes(&master_nodes, &moods, view, focus);

        if let Some(focus) = focus {
            view_relationships.retain(|r| r.touches(focus));
        }
        let edges = style_relationships(
            &view_relationships,
            &master_nodes,
            view.mode,
            &self.config.style,
        );

        let chapters = first_non_empty(&relationships.chapters, &roster.chapters).to_vec();

        debug!(
            mode = view.mode.as_str(),
            chapter = ?view.chapter_index,
            nodes = nodes.len(),
            edges = edges.len(),
            hidden = edges.iter().filter(|e| e.hidden).count(),
            chapters = chapters.len(),
            "graph pass complete"
        );

        GraphSnapshot {
            nodes,
            edges,
            master_nodes,
            chapters,
        }
    }
}

fn first_non_empty<'a, T>(preferred: &'a [T], fallback: &'a [T]) -> &'a [T] {
    if preferred.is_empty() { fallback } else { preferred }
}

/// Repeated ids get `-1`, `-2`, ... appended until they are unique.
fn disambiguate_ids(relationships: &mut [Relationship]) {
    let mut seen: HashSet<String> = HashSet::new();
    let mut repeats: HashMap<String, usize> = HashMap::new();

    for relationship in relationships.iter_mut() {
        if seen.insert(relationship.id.clone()) {
            continue;
        }
        let base = relationship.id.clone();
        let counter = repeats.entry(base.clone()).or_insert(0);
        loop {
            *counter += 1;
            let candidate = format!("{base}-{counter}");
            if seen.insert(candidate.clone()) {
                relationship.id = candidate;
                break;
            }
        }
    }
}

fn annotate_nodes(
    master_nodes: &[Entity],
    moods: &HashMap<String, MoodState>,
    view: &ViewState,
    focus: Option<&str>,
) -> Vec<Node> {
    let present: Option<HashSet<&str>> = match view.mode {
        ViewMode::Story => view
            .active_characters
            .as_ref()
            .map(|ids| ids.iter().map(String::as_str).collect()),
        ViewMode::Summary => None,
    };

    master_nodes
        .iter()
        .map(|entity| {
            let state = moods.get(&entity.id).copied().unwrap_or_default();
            let is_active = present
                .as_ref()
                .is_none_or(|ids| ids.contains(entity.id.as_str()));

            let mut opacity = if is_active {
                ACTIVE_OPACITY
            } else {
                GHOST_OPACITY
            };
            if focus.is_some_and(|f| f != entity.id) {
                opacity = UNFOCUSED_OPACITY;
            }

            Node {
                entity: entity.clone(),
                mood: state.mood,
                is_idle: state.is_idle,
                is_active,
                opacity,
                grayscale: !is_active,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn engine() -> GraphEngine {
        GraphEngine::new(EngineConfig::default()).unwrap()
    }

    fn relationship(id: &str) -> Relationship {
        Relationship {
            id: id.to_string(),
            source: "a".to_string(),
            target: "b".to_string(),
            sentiment: Sentiment::Neutral,
            strength: 0.5,
        }
    }

    #[test]
    fn duplicate_ids_get_suffixes() {
        let mut relationships = vec![
            relationship("e-a-b"),
            relationship("e-a-b"),
            relationship("e-a-b-1"),
            relationship("e-a-b"),
        ];
        disambiguate_ids(&mut relationships);
        let ids: Vec<_> = relationships.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["e-a-b", "e-a-b-1", "e-a-b-1-1", "e-a-b-2"]);
    }

    #[test]
    fn try_story_rejects_out_of_range_index() {
        let chapters = vec![Chapter::default()];
        assert!(ViewState::try_story(&chapters, 0).is_ok());
        let err = ViewState::try_story(&chapters, 3).unwrap_err();
        assert!(matches!(err, Error::ChapterOutOfRange { index: 3, len: 1 }));
    }

    #[test]
    fn ghost_mode_dims_absent_characters() {
        let roster = json!({ "characters": [{ "id": "alice" }, { "id": "dinah" }] });
        let chapter = Chapter {
            title: "Pool of Tears".to_string(),
            edges: Vec::new(),
            active_characters: vec!["alice".to_string()],
        };
        let snapshot = engine().process_with_jitter(
            &roster,
            &Value::Null,
            &ViewState::for_chapter(&chapter, 1),
            &mut NoJitter,
        );

        let alice = snapshot.node("alice").unwrap();
        assert!(alice.is_active);
        assert_eq!(alice.opacity, ACTIVE_OPACITY);
        let dinah = snapshot.node("dinah").unwrap();
        assert!(!dinah.is_active);
        assert!(dinah.grayscale);
        assert_eq!(dinah.opacity, GHOST_OPACITY);
    }

    #[test]
    fn focus_dims_other_nodes_and_filters_edges() {
        let roster = json!({ "characters": [
            { "id": "alice", "importance": 1.0 },
            { "id": "hatter", "importance": 0.7 },
            { "id": "hare", "importance": 0.6 }
        ]});
        let chapter = Chapter {
            title: "A Mad Tea-Party".to_string(),
            edges: vec![
                RawEdge::new("alice", "hatter").with_sentiment(Sentiment::Negative),
                RawEdge::new("hatter", "hare").with_sentiment(Sentiment::Positive),
            ],
            active_characters: vec!["alice".into(), "hatter".into(), "hare".into()],
        };
        let view = ViewState::for_chapter(&chapter, 6).with_focus("alice");
        let snapshot = engine().process_with_jitter(&roster, &Value::Null, &view, &mut NoJitter);

        assert_eq!(snapshot.node("alice").unwrap().opacity, ACTIVE_OPACITY);
        assert_eq!(snapshot.node("hare").unwrap().opacity, UNFOCUSED_OPACITY);
        let ids: Vec<_> = snapshot.edges.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["e-alice-hatter-6"]);
        // Mood still sees the whole chapter.
        assert_eq!(snapshot.node("hare").unwrap().mood, Mood::Happy);
    }

    #[test]
    fn summary_uses_flat_edges_from_either_document() {
        let doc = json!({
            "characters": [{ "id": "alice" }, { "id": "cat" }],
            "edges": [{ "source": "alice", "target": "cat", "data": { "sentiment": "positive" } }]
        });
        let snapshot = engine().process_with_jitter(&doc, &json!({}), &ViewState::summary(), &mut NoJitter);
        assert_eq!(snapshot.edges.len(), 1);
        assert_eq!(snapshot.edges[0].id, "e-alice-cat");
        assert!(snapshot.nodes.iter().all(|n| !n.is_idle && n.mood == Mood::Neutral));
    }

    #[test]
    fn configured_seed_makes_process_reproducible() {
        let mut config = EngineConfig::default();
        config.layout.jitter_seed = Some(42);
        let engine = GraphEngine::new(config).unwrap();
        let roster = json!({ "characters": [
            { "id": "a", "importance": 0.9 }, { "id": "b" }, { "id": "c" }, { "id": "d" }
        ]});
        let view = ViewState::summary();
        assert_eq!(
            engine.process(&roster, &roster, &view),
            engine.process(&roster, &roster, &view)
        );
    }

    #[test]
    fn custom_classifier_replaces_keywords() {
        let engine = engine().with_classifier(|id: &str| id == "caterpillar");
        let roster = json!({ "characters": [{ "id": "alice" }, { "id": "caterpillar" }, { "id": "queen" }] });
        let chapter = Chapter {
            title: "Advice from a Caterpillar".to_string(),
            edges: vec![
                RawEdge::new("alice", "caterpillar").with_sentiment(Sentiment::Negative),
                RawEdge::new("queen", "alice").with_sentiment(Sentiment::Positive),
                RawEdge::new("queen", "alice").with_sentiment(Sentiment::Negative),
            ],
            active_characters: Vec::new(),
        };
        let snapshot = engine.process_with_jitter(
            &roster,
            &Value::Null,
            &ViewState::for_chapter(&chapter, 4),
            &mut NoJitter,
        );
        assert_eq!(snapshot.node("alice").unwrap().mood, Mood::Angry);
        assert_eq!(snapshot.node("caterpillar").unwrap().mood, Mood::Angry);
        assert_eq!(snapshot.node("queen").unwrap().mood, Mood::Neutral);
        assert_eq!(snapshot.edges[2].id, "e-queen-alice-4-1");
    }

    #[test]
    fn snapshot_with_only_master_nodes_is_not_empty() {
        let snapshot = GraphSnapshot {
            master_nodes: vec![Entity::new("alice", Some(1.0))],
            ..GraphSnapshot::default()
        };
        assert!(!snapshot.is_empty());
        assert!(GraphSnapshot::default().is_empty());
    }

    #[test]
    fn engine_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GraphEngine>();
    }
}
