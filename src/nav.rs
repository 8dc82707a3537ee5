//! Query-string routes and the back stack.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Catalog { offset: usize },
    Entity { name: String },
    Move { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("unknown view `{0}`")]
    UnknownPath(String),
    #[error("invalid offset `{0}`")]
    BadOffset(String),
}

impl Default for Route {
    fn default() -> Self {
        Route::Catalog { offset: 0 }
    }
}

impl Route {
    /// Parse `/`, `/?offset=50`, `/pokemon?name=eevee`, `/move_det?move=tackle`,
    /// or a bare entity name. A missing parameter yields an empty identifier,
    /// which the view then reports as not-found.
    pub fn parse(input: &str) -> Result<Route, RouteError> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Route::default());
        }
        if !input.starts_with('/') && !input.contains('?') {
            return Ok(Route::Entity {
                name: input.to_string(),
            });
        }

        let (path, query) = input.split_once('?').unwrap_or((input, ""));
        let param = |key: &str| query_param(query, key).unwrap_or_default();
        match path.trim_end_matches('/') {
            "" => {
                let raw = param("offset");
                if raw.is_empty() {
                    return Ok(Route::default());
                }
                raw.parse()
                    .map(|offset| Route::Catalog { offset })
                    .map_err(|_| RouteError::BadOffset(raw))
            }
            "/pokemon" => Ok(Route::Entity {
                name: param("name"),
            }),
            "/move_det" => Ok(Route::Move {
                name: param("move"),
            }),
            other => Err(RouteError::UnknownPath(other.to_string())),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Catalog { .. } => "Catalog",
            Route::Entity { .. } => "Pokémon",
            Route::Move { .. } => "Move",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Catalog { offset: 0 } => write!(f, "/"),
            Route::Catalog { offset } => write!(f, "/?offset={offset}"),
            Route::Entity { name } => write!(f, "/pokemon?name={}", urlencoding::encode(name)),
            Route::Move { name } => write!(f, "/move_det?move={}", urlencoding::encode(name)),
        }
    }
}

fn query_param(query: &str, key: &str) -> Option<String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| {
            let v = v.replace('+', " ");
            urlencoding::decode(&v)
                .map(|decoded| decoded.into_owned())
                .unwrap_or(v)
        })
}

/// Navigation history. There is always a current route.
#[derive(Debug, Clone)]
pub struct History {
    current: Route,
    previous: Vec<Route>,
}

impl History {
    pub fn new(start: Route) -> Self {
        Self {
            current: start,
            previous: Vec::new(),
        }
    }

    pub fn current(&self) -> &Route {
        &self.current
    }

    pub fn push(&mut self, route: Route) {
        let prior = std::mem::replace(&mut self.current, route);
        self.previous.push(prior);
    }

    /// Swap the current route without adding a history entry.
    pub fn replace(&mut self, route: Route) {
        self.current = route;
    }

    /// Returns `false` when there is nothing to go back to.
    pub fn back(&mut self) -> bool {
        match self.previous.pop() {
            Some(route) => {
                self.current = route;
                true
            }
            None => false,
        }
    }

    pub fn depth(&self) -> usize {
        self.previous.len()
    }
}
