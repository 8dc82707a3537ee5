use tracing::{info, warn};

use crate::fetch::Upstream;
use crate::models::EntityView;
use crate::state::PageError;

/// The entity identifier carried by a route, or `None` when there is nothing to look up.
pub fn entity_id(raw: &str) -> Option<String> {
    let id = raw.trim();
    (!id.is_empty()).then(|| id.to_string())
}

/// Fetch the entity and its species together. Both must succeed; anything else
/// is not-found.
pub async fn load_entity(upstream: &dyn Upstream, raw: &str) -> Result<EntityView, PageError> {
    let id = entity_id(raw).ok_or(PageError::NotFound)?;
    let (entity, species) = tokio::try_join!(upstream.entity(&id), upstream.species(&id))
        .map_err(|error| {
            warn!(%id, %error, "entity lookup failed");
            PageError::NotFound
        })?;
    info!(%id, moves = entity.moves.len(), "entity loaded");
    Ok(EntityView::new(entity, species))
}
