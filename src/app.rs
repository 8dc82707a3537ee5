//! View state, navigation, and the effects that feed it.
//!
//! `App` never does I/O itself. Each operation returns the [`Effect`]s it
//! needs; the main loop runs them as tasks and feeds the resulting
//! [`AppEvent`]s back through [`App::handle`].

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::catalog::{fetch_thumbnails, load_catalog, Pager};
use crate::entity::{entity_id, load_entity};
use crate::fetch::Upstream;
use crate::models::{CatalogPage, EntityView, MoveView};
use crate::moves::{load_move, move_id};
use crate::nav::{History, Route};
use crate::sprite::{load_sprite, SpriteThumb};
use crate::state::{PageError, Tracked};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    LoadCatalog { offset: usize },
    LoadThumbnails { names: Vec<String> },
    LoadEntity { name: String },
    LoadMove { name: String },
    LoadSprite { url: String },
}

/// A finished load, tagged with the key it was requested for.
#[derive(Debug)]
pub enum AppEvent {
    CatalogDidLoad {
        offset: usize,
        outcome: Result<CatalogPage, PageError>,
    },
    ThumbnailsDidLoad {
        names: Vec<String>,
        sprites: HashMap<String, String>,
    },
    EntityDidLoad {
        name: String,
        outcome: Result<EntityView, PageError>,
    },
    MoveDidLoad {
        name: String,
        outcome: Result<MoveView, PageError>,
    },
    SpriteDidLoad {
        url: String,
        outcome: Result<SpriteThumb, PageError>,
    },
}

/// Run one effect to completion.
pub async fn run_effect(effect: Effect, upstream: Arc<dyn Upstream>) -> AppEvent {
    match effect {
        Effect::LoadCatalog { offset } => AppEvent::CatalogDidLoad {
            offset,
            outcome: load_catalog(upstream.as_ref(), offset).await,
        },
        Effect::LoadThumbnails { names } => {
            let sprites = fetch_thumbnails(upstream, names.clone()).await;
            AppEvent::ThumbnailsDidLoad { names, sprites }
        }
        Effect::LoadEntity { name } => {
            let outcome = load_entity(upstream.as_ref(), &name).await;
            AppEvent::EntityDidLoad { name, outcome }
        }
        Effect::LoadMove { name } => {
            let outcome = load_move(upstream.as_ref(), &name).await;
            AppEvent::MoveDidLoad { name, outcome }
        }
        Effect::LoadSprite { url } => {
            let outcome = load_sprite(upstream.as_ref(), &url).await;
            AppEvent::SpriteDidLoad { url, outcome }
        }
    }
}

pub struct App {
    pub history: History,
    pub catalog: Tracked<usize, CatalogPage>,
    pub thumbnails: Tracked<Vec<String>, HashMap<String, String>>,
    pub entity: Tracked<String, EntityView>,
    pub move_detail: Tracked<String, MoveView>,
    pub sprite: Tracked<String, SpriteThumb>,
    /// Catalog grid cell or entity move row, depending on the view.
    pub selected: usize,
    /// Written by the renderer so Up/Down can step a whole grid row.
    pub grid_columns: usize,
    pub show_help: bool,
    pub show_sprites: bool,
    /// Go-to input while the prompt is open.
    pub prompt: Option<String>,
    pub prompt_error: Option<String>,
}

impl App {
    pub fn new(start: Route, show_sprites: bool) -> Self {
        Self {
            history: History::new(start),
            catalog: Tracked::default(),
            thumbnails: Tracked::default(),
            entity: Tracked::default(),
            move_detail: Tracked::default(),
            sprite: Tracked::default(),
            selected: 0,
            grid_columns: 1,
            show_help: false,
            show_sprites,
            prompt: None,
            prompt_error: None,
        }
    }

    pub fn route(&self) -> &Route {
        self.history.current()
    }

    pub fn pager(&self) -> Pager {
        let offset = match self.route() {
            Route::Catalog { offset } => *offset,
            _ => 0,
        };
        let total = self
            .catalog
            .success()
            .filter(|_| self.catalog.is_for(&offset))
            .map(|page| page.total_count);
        Pager::new(offset, total)
    }

    /// (Re)start the current route's state machine.
    pub fn enter(&mut self) -> Vec<Effect> {
        self.selected = 0;
        self.sprite.reset();
        info!(route = %self.route(), "entering view");
        match self.route().clone() {
            Route::Catalog { offset } => {
                self.thumbnails.reset();
                self.catalog.start(offset);
                vec![Effect::LoadCatalog { offset }]
            }
            Route::Entity { name } => match entity_id(&name) {
                Some(id) => {
                    self.entity.start(id.clone());
                    vec![Effect::LoadEntity { name: id }]
                }
                None => {
                    self.entity.not_found(name);
                    Vec::new()
                }
            },
            Route::Move { name } => match move_id(&name) {
                Some(id) => {
                    self.move_detail.start(id.clone());
                    vec![Effect::LoadMove { name: id }]
                }
                None => {
                    self.move_detail.not_found(name);
                    Vec::new()
                }
            },
        }
    }

    pub fn open(&mut self, route: Route) -> Vec<Effect> {
        self.history.push(route);
        self.enter()
    }

    pub fn back(&mut self) -> Vec<Effect> {
        if self.history.back() {
            self.enter()
        } else {
            Vec::new()
        }
    }

    pub fn reload(&mut self) -> Vec<Effect> {
        self.enter()
    }

    pub fn next_page(&mut self) -> Vec<Effect> {
        self.turn_page(self.pager().next())
    }

    pub fn prev_page(&mut self) -> Vec<Effect> {
        self.turn_page(self.pager().prev())
    }

    fn on_catalog(&self) -> bool {
        matches!(self.route(), Route::Catalog { .. })
    }

    fn turn_page(&mut self, offset: Option<usize>) -> Vec<Effect> {
        match offset {
            Some(offset) if self.on_catalog() => {
                self.history.replace(Route::Catalog { offset });
                self.enter()
            }
            _ => Vec::new(),
        }
    }

    /// Follow the link under the cursor.
    pub fn activate(&mut self) -> Vec<Effect> {
        let target = match self.route() {
            Route::Catalog { .. } => self
                .selected_entry()
                .map(|name| Route::Entity { name: name.to_string() }),
            Route::Entity { .. } => self
                .entity
                .success()
                .and_then(|view| view.moves.get(self.selected))
                .map(|name| Route::Move { name: name.clone() }),
            Route::Move { .. } => None,
        };
        match target {
            Some(route) => self.open(route),
            None => Vec::new(),
        }
    }

    pub fn open_ancestor(&mut self) -> Vec<Effect> {
        let ancestor = match self.route() {
            Route::Entity { .. } => self.entity.success().and_then(|view| view.ancestor.clone()),
            _ => None,
        };
        match ancestor {
            Some(name) => self.open(Route::Entity { name }),
            None => Vec::new(),
        }
    }

    pub fn selected_entry(&self) -> Option<&str> {
        self.catalog
            .success()
            .and_then(|page| page.results.get(self.selected))
            .map(|entry| entry.name.as_str())
    }

    fn selectable(&self) -> usize {
        match self.route() {
            Route::Catalog { .. } => self.catalog.success().map_or(0, |page| page.results.len()),
            Route::Entity { .. } => self.entity.success().map_or(0, |view| view.moves.len()),
            Route::Move { .. } => 0,
        }
    }

    fn step(&mut self, delta: isize) -> Vec<Effect> {
        let count = self.selectable();
        if count == 0 {
            return Vec::new();
        }
        let target = self.selected as isize + delta;
        self.selected = target.clamp(0, count as isize - 1) as usize;
        self.sprite_effects()
    }

    fn row_step(&self) -> isize {
        if self.on_catalog() {
            self.grid_columns.max(1) as isize
        } else {
            1
        }
    }

    pub fn select_up(&mut self) -> Vec<Effect> {
        self.step(-self.row_step())
    }

    pub fn select_down(&mut self) -> Vec<Effect> {
        self.step(self.row_step())
    }

    pub fn select_left(&mut self) -> Vec<Effect> {
        if self.on_catalog() {
            self.step(-1)
        } else {
            Vec::new()
        }
    }

    /// Step right; from the last column or the last entry, turn the page.
    pub fn select_right(&mut self) -> Vec<Effect> {
        if !self.on_catalog() {
            return Vec::new();
        }
        let count = self.selectable();
        let cols = self.grid_columns.max(1);
        if count > 0 && ((self.selected + 1) % cols == 0 || self.selected + 1 >= count) {
            return self.next_page();
        }
        self.step(1)
    }

    /// The sprite the current view wants to preview, if any.
    fn wanted_sprite(&self) -> Option<String> {
        if !self.show_sprites {
            return None;
        }
        let url = match self.route() {
            Route::Catalog { .. } => {
                let name = self.selected_entry()?;
                self.thumbnails.success()?.get(name).cloned()
            }
            Route::Entity { .. } => self.entity.success()?.sprite.clone(),
            Route::Move { .. } => None,
        };
        url.filter(|u| !u.is_empty())
    }

    fn sprite_effects(&mut self) -> Vec<Effect> {
        match self.wanted_sprite() {
            Some(url) if self.sprite.is_for(&url) => Vec::new(),
            Some(url) => {
                self.sprite.start(url.clone());
                vec![Effect::LoadSprite { url }]
            }
            None => {
                self.sprite.reset();
                Vec::new()
            }
        }
    }

    /// Apply a finished load. Results for keys the view has moved past are dropped.
    pub fn handle(&mut self, event: AppEvent) -> Vec<Effect> {
        match event {
            AppEvent::CatalogDidLoad { offset, outcome } => {
                if !self.catalog.resolve(&offset, outcome) {
                    debug!(offset, "dropping stale catalog page");
                    return Vec::new();
                }
                match self.catalog.success() {
                    Some(page) if !page.results.is_empty() => {
                        let names = page.names();
                        self.thumbnails.start(names.clone());
                        vec![Effect::LoadThumbnails { names }]
                    }
                    _ => Vec::new(),
                }
            }
            AppEvent::ThumbnailsDidLoad { names, sprites } => {
                if !self.thumbnails.resolve(&names, Ok(sprites)) {
                    debug!(count = names.len(), "dropping stale thumbnails");
                    return Vec::new();
                }
                self.sprite_effects()
            }
            AppEvent::EntityDidLoad { name, outcome } => {
                if !self.entity.resolve(&name, outcome) {
                    debug!(%name, "dropping stale entity");
                    return Vec::new();
                }
                self.sprite_effects()
            }
            AppEvent::MoveDidLoad { name, outcome } => {
                if !self.move_detail.resolve(&name, outcome) {
                    debug!(%name, "dropping stale move");
                }
                Vec::new()
            }
            AppEvent::SpriteDidLoad { url, outcome } => {
                if !self.sprite.resolve(&url, outcome) {
                    debug!(%url, "dropping stale sprite");
                }
                Vec::new()
            }
        }
    }

    pub fn open_prompt(&mut self) {
        self.prompt = Some(String::new());
        self.prompt_error = None;
    }

    pub fn close_prompt(&mut self) {
        self.prompt = None;
        self.prompt_error = None;
    }

    pub fn prompt_input(&mut self, c: char) {
        if let Some(input) = &mut self.prompt {
            input.push(c);
        }
    }

    pub fn prompt_backspace(&mut self) {
        if let Some(input) = &mut self.prompt {
            input.pop();
        }
    }

    /// Open the typed route. A route that does not parse keeps the prompt open
    /// and shows why.
    pub fn submit_prompt(&mut self) -> Vec<Effect> {
        let Some(input) = self.prompt.take() else {
            return Vec::new();
        };
        match Route::parse(&input) {
            Ok(route) => {
                self.prompt_error = None;
                self.open(route)
            }
            Err(error) => {
                self.prompt_error = Some(error.to_string());
                self.prompt = Some(input);
                Vec::new()
            }
        }
    }
}
