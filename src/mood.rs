//! Chapter-local mood and idle state.

use regex::Regex;
use std::collections::{HashMap, HashSet};

use crate::config::MoodConfig;
use crate::error::{Error, Result};
use crate::model::{Entity, Relationship};
use crate::*;

/// Decides whether an entity plays an antagonist role. Negative scores turn
/// antagonists, and anyone in conflict with one, angry instead of sad.
pub trait AntagonistClassifier: Send + Sync {
    fn is_antagonist(&self, entity_id: &str) -> bool;
}

impl<F> AntagonistClassifier for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_antagonist(&self, entity_id: &str) -> bool {
        self(entity_id)
    }
}

/// Case-insensitive substring match against a keyword list.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    pattern: Option<Regex>,
}

impl KeywordClassifier {
    pub fn new<I, S>(keywords: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let alternatives: Vec<String> = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .map(|k| regex::escape(&k))
            .collect();

        if alternatives.is_empty() {
            return Ok(Self { pattern: None });
        }

        let pattern = Regex::new(&format!("(?i)(?:{})", alternatives.join("|")))
            .map_err(|err| Error::InvalidConfig(format!("antagonist keywords: {err}")))?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    pub fn from_config(config: &MoodConfig) -> Result<Self> {
        Self::new(&config.antagonist_keywords)
    }
}

impl AntagonistClassifier for KeywordClassifier {
    fn is_antagonist(&self, entity_id: &str) -> bool {
        self.pattern
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(entity_id))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoodState {
    pub mood: Mood,
    pub is_idle: bool,
}

/// Mood and idle state for every entity, computed only from `relationships`
/// (the active chapter's edges). Summary mode is always neutral and never
/// idle.
pub fn chapter_moods(
    entities: &[Entity],
    relationships: &[Relationship],
    mode: ViewMode,
    classifier: &dyn AntagonistClassifier,
) -> HashMap<String, MoodState> {
    if mode.is_summary() {
        return entities
            .iter()
            .map(|e| (e.id.clone(), MoodState::default()))
            .collect();
    }

    let mut scores: HashMap<&str, i32> = HashMap::new();
    let mut touched: HashSet<&str> = HashSet::new();
    let mut rivals: HashMap<&str, Vec<&str>> = HashMap::new();

    for relationship in relationships {
        let source = relationship.source.as_str();
        let target = relationship.target.as_str();
        let score = relationship.sentiment.score();

        touched.insert(source);
        touched.insert(target);
        *scores.entry(source).or_default() += score;
        if target != source {
            *scores.entry(target).or_default() += score;
        }

        if relationship.sentiment == Sentiment::Negative {
            rivals.entry(source).or_default().push(target);
            rivals.entry(target).or_default().push(source);
        }
    }

    entities
        .iter()
        .map(|entity| {
            let id = entity.id.as_str();
            let score = scores.get(id).copied().unwrap_or(0);
            let mood = match score {
                s if s > 0 => Mood::Happy,
                s if s < 0 => {
                    let facing_antagonist = rivals
                        .get(id)
                        .is_some_and(|r| r.iter().any(|rival| classifier.is_antagonist(rival)));
                    if classifier.is_antagonist(id) || facing_antagonist {
                        Mood::Angry
                    } else {
                        Mood::Sad
                    }
                }
                _ => Mood::Neutral,
            };
            (
                entity.id.clone(),
                MoodState {
                    mood,
                    is_idle: !touched.contains(id),
                },
            )
        })
        .collect()
}
