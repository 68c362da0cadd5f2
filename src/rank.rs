use crate::model::Entity;

/// Returns a copy of `entities` ordered by descending importance.
///
/// The sort is stable, so entities with equal importance keep their input
/// order and the ranking is reproducible for a given document.
pub fn rank_by_importance(entities: &[Entity]) -> Vec<Entity> {
    let mut ranked = entities.to_vec();
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    ranked
}
