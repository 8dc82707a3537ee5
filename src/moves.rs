use tracing::{info, warn};

use crate::fetch::Upstream;
use crate::models::MoveView;
use crate::state::PageError;

pub fn move_id(raw: &str) -> Option<String> {
    let id = raw.trim().to_lowercase();
    (!id.is_empty()).then_some(id)
}

pub async fn load_move(upstream: &dyn Upstream, raw: &str) -> Result<MoveView, PageError> {
    let id = move_id(raw).ok_or(PageError::NotFound)?;
    let record = upstream.move_record(&id).await.map_err(|error| {
        warn!(%id, %error, "move lookup failed");
        PageError::NotFound
    })?;
    info!(%id, "move loaded");
    Ok(MoveView::new(record))
}
