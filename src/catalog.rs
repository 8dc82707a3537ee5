//! Catalog paging and the best-effort thumbnail fan-out.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::fetch::Upstream;
use crate::models::CatalogPage;
use crate::state::PageError;

pub const PAGE_SIZE: usize = 50;
const THUMBNAIL_CONCURRENCY: usize = 12;

/// Paging arithmetic for one catalog view. `total_count` is `None` until the
/// listing has loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pager {
    pub offset: usize,
    pub total_count: Option<usize>,
}

impl Pager {
    pub fn new(offset: usize, total_count: Option<usize>) -> Self {
        Self {
            offset,
            total_count,
        }
    }

    pub fn current_page(&self) -> usize {
        self.offset / PAGE_SIZE + 1
    }

    pub fn total_pages(&self) -> Option<usize> {
        self.total_count
            .filter(|&total| total > 0)
            .map(|total| total.div_ceil(PAGE_SIZE))
    }

    pub fn can_go_prev(&self) -> bool {
        self.offset > 0
    }

    pub fn can_go_next(&self) -> bool {
        match self.total_count {
            Some(total) => total > 0 && self.offset + PAGE_SIZE < total,
            None => false,
        }
    }

    /// Offset of the previous page, or `None` while Prev is disabled.
    pub fn prev(&self) -> Option<usize> {
        self.can_go_prev()
            .then(|| self.offset.saturating_sub(PAGE_SIZE))
    }

    pub fn next(&self) -> Option<usize> {
        self.can_go_next().then(|| self.offset + PAGE_SIZE)
    }

    /// `Page 2 / 27 · Showing 50 (indices 50–99)`
    pub fn status_line(&self) -> String {
        let pages = match self.total_pages() {
            Some(total) => format!(" / {total}"),
            None => String::new(),
        };
        format!(
            "Page {}{} · Showing {} (indices {}–{})",
            self.current_page(),
            pages,
            PAGE_SIZE,
            self.offset,
            self.offset + PAGE_SIZE - 1
        )
    }
}

pub async fn load_catalog(upstream: &dyn Upstream, offset: usize) -> Result<CatalogPage, PageError> {
    match upstream.catalog(PAGE_SIZE, offset).await {
        Ok(page) => {
            info!(offset, total = page.total_count, entries = page.results.len(), "catalog page loaded");
            Ok(page)
        }
        Err(error) => {
            warn!(offset, %error, "catalog fetch failed");
            Err(PageError::Failed("Failed to fetch Pokédex".to_string()))
        }
    }
}

/// Look up the sprite reference of every entry in parallel. A failed lookup
/// leaves its key out; it never fails the batch.
pub async fn fetch_thumbnails(upstream: Arc<dyn Upstream>, names: Vec<String>) -> HashMap<String, String> {
    let semaphore = Arc::new(Semaphore::new(THUMBNAIL_CONCURRENCY));
    let mut join_set = JoinSet::new();
    for name in names {
        let upstream = Arc::clone(&upstream);
        let semaphore = Arc::clone(&semaphore);
        join_set.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok()?;
            match upstream.entity(&name).await {
                Ok(entity) => Some((name, entity.sprite.unwrap_or_default())),
                Err(error) => {
                    debug!(%name, %error, "thumbnail lookup failed");
                    None
                }
            }
        });
    }

    let mut sprites = HashMap::new();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok(Some((name, sprite))) => {
                sprites.insert(name, sprite);
            }
            Ok(None) => {}
            Err(error) => warn!(%error, "thumbnail task did not complete"),
        }
    }
    sprites
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::fake::FakeUpstream;
    use crate::models::{CatalogEntry, Entity};
    use pretty_assertions::assert_eq;

    #[test]
    fn current_page_follows_offset() {
        for (offset, page) in [(0, 1), (49, 1), (50, 2), (120, 3), (1000, 21)] {
            assert_eq!(Pager::new(offset, None).current_page(), page);
        }
    }

    #[test]
    fn prev_and_next_bounds() {
        let first = Pager::new(0, Some(1302));
        assert!(!first.can_go_prev());
        assert_eq!(first.prev(), None);
        assert_eq!(first.next(), Some(50));

        assert_eq!(Pager::new(120, Some(1302)).prev(), Some(70));
        assert_eq!(Pager::new(30, Some(1302)).prev(), Some(0));

        let last = Pager::new(1300, Some(1302));
        assert!(!last.can_go_next());
        assert_eq!(last.next(), None);
        assert!(!Pager::new(1250, Some(1300)).can_go_next());
        assert!(Pager::new(1249, Some(1300)).can_go_next());
    }

    #[test]
    fn next_disabled_without_total() {
        assert!(!Pager::new(0, None).can_go_next());
        assert!(!Pager::new(0, Some(0)).can_go_next());
        assert_eq!(Pager::new(0, Some(0)).total_pages(), None);
    }

    #[test]
    fn status_line_shows_total_when_known() {
        assert_eq!(
            Pager::new(50, Some(1302)).status_line(),
            "Page 2 / 27 · Showing 50 (indices 50–99)"
        );
        assert_eq!(
            Pager::new(0, None).status_line(),
            "Page 1 · Showing 50 (indices 0–49)"
        );
    }

    #[tokio::test]
    async fn requests_the_page_slice() {
        let mut upstream = FakeUpstream::default();
        upstream.pages.insert(
            100,
            CatalogPage {
                total_count: 1302,
                results: vec![CatalogEntry {
                    name: "bulbasaur".into(),
                    url: String::new(),
                }],
            },
        );
        let page = load_catalog(&upstream, 100).await.unwrap();
        assert_eq!(page.total_count, 1302);
        load_catalog(&upstream, 100).await.unwrap();
        assert_eq!(
            upstream.calls(),
            vec!["pokemon?limit=50&offset=100", "pokemon?limit=50&offset=100"]
        );
    }

    #[tokio::test]
    async fn catalog_failure_is_a_page_error() {
        let upstream = FakeUpstream::default();
        assert_eq!(
            load_catalog(&upstream, 0).await,
            Err(PageError::Failed("Failed to fetch Pokédex".into()))
        );
    }

    #[tokio::test]
    async fn thumbnails_tolerate_individual_failures() {
        let mut upstream = FakeUpstream::default();
        let names: Vec<String> = (0..50).map(|i| format!("mon-{i}")).collect();
        for (i, name) in names.iter().enumerate() {
            if i == 7 || i == 31 {
                continue;
            }
            let sprite = (i != 3).then(|| format!("https://img/{i}.png"));
            upstream.entities.insert(
                name.clone(),
                Entity {
                    name: name.clone(),
                    sprite,
                    ..Entity::default()
                },
            );
        }

        let sprites = fetch_thumbnails(Arc::new(upstream), names).await;
        assert_eq!(sprites.len(), 48);
        assert!(!sprites.contains_key("mon-7"));
        assert!(!sprites.contains_key("mon-31"));
        assert_eq!(sprites.get("mon-3").map(String::as_str), Some(""));
        assert_eq!(
            sprites.get("mon-12").map(String::as_str),
            Some("https://img/12.png")
        );
    }
}
