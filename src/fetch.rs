use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::{stat_text, CatalogEntry, CatalogPage, Entity, FlavorText, Move, Species, Stat};

pub const DEFAULT_API_BASE: &str = "https://pokeapi.co/api/v2";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("upstream returned status {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("response parse error: {0}")]
    Decode(String),
    #[error("image decode error: {0}")]
    Image(String),
}

/// The four read-only endpoints plus raw sprite bytes.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn catalog(&self, limit: usize, offset: usize) -> Result<CatalogPage, FetchError>;
    async fn entity(&self, id: &str) -> Result<Entity, FetchError>;
    async fn species(&self, id: &str) -> Result<Species, FetchError>;
    async fn move_record(&self, id: &str) -> Result<Move, FetchError>;
    async fn sprite(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

#[derive(Debug, Deserialize)]
struct NamedResource {
    name: String,
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    count: usize,
    #[serde(default)]
    results: Vec<NamedResource>,
}

#[derive(Debug, Deserialize)]
struct PokemonResponse {
    name: String,
    #[serde(default)]
    sprites: Sprites,
    #[serde(default)]
    types: Vec<TypeSlot>,
    #[serde(default)]
    stats: Vec<StatSlot>,
    #[serde(default)]
    moves: Vec<MoveSlot>,
}

#[derive(Debug, Default, Deserialize)]
struct Sprites {
    front_default: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TypeSlot {
    #[serde(rename = "type")]
    type_info: NamedResource,
}

#[derive(Debug, Deserialize)]
struct StatSlot {
    base_stat: u32,
    stat: NamedResource,
}

#[derive(Debug, Deserialize)]
struct MoveSlot {
    #[serde(rename = "move")]
    move_info: NamedResource,
}

#[derive(Debug, Deserialize)]
struct SpeciesResponse {
    #[serde(default)]
    flavor_text_entries: Vec<FlavorTextEntry>,
    evolves_from_species: Option<NamedResource>,
}

#[derive(Debug, Deserialize)]
struct FlavorTextEntry {
    flavor_text: String,
    language: NamedResource,
}

#[derive(Debug, Deserialize)]
struct MoveResponse {
    name: String,
    #[serde(rename = "type")]
    type_info: Option<NamedResource>,
    damage_class: Option<NamedResource>,
    #[serde(default)]
    flavor_text_entries: Vec<FlavorTextEntry>,
    #[serde(default)]
    power: Value,
    #[serde(default)]
    accuracy: Value,
    #[serde(default)]
    pp: Value,
}

impl From<CatalogResponse> for CatalogPage {
    fn from(response: CatalogResponse) -> Self {
        CatalogPage {
            total_count: response.count,
            results: response
                .results
                .into_iter()
                .map(|r| CatalogEntry {
                    name: r.name,
                    url: r.url,
                })
                .collect(),
        }
    }
}

impl From<PokemonResponse> for Entity {
    fn from(response: PokemonResponse) -> Self {
        Entity {
            name: response.name,
            sprite: response.sprites.front_default,
            types: response
                .types
                .into_iter()
                .map(|slot| slot.type_info.name)
                .collect(),
            stats: response
                .stats
                .into_iter()
                .map(|slot| Stat {
                    name: slot.stat.name,
                    base: slot.base_stat,
                })
                .collect(),
            moves: response
                .moves
                .into_iter()
                .map(|slot| slot.move_info.name)
                .collect(),
        }
    }
}

impl From<SpeciesResponse> for Species {
    fn from(response: SpeciesResponse) -> Self {
        Species {
            flavor_text_entries: flavor_entries(response.flavor_text_entries),
            evolves_from: response.evolves_from_species.map(|s| s.name),
        }
    }
}

impl From<MoveResponse> for Move {
    fn from(response: MoveResponse) -> Self {
        Move {
            name: response.name,
            type_name: response.type_info.map(|t| t.name),
            category: response.damage_class.map(|c| c.name),
            flavor_text_entries: flavor_entries(response.flavor_text_entries),
            power: stat_text(&response.power),
            accuracy: stat_text(&response.accuracy),
            pp: stat_text(&response.pp),
        }
    }
}

fn flavor_entries(entries: Vec<FlavorTextEntry>) -> Vec<FlavorText> {
    entries
        .into_iter()
        .map(|e| FlavorText {
            language: e.language.name,
            text: e.flavor_text,
        })
        .collect()
}

/// PokeAPI over HTTP. One client is shared by every request.
pub struct HttpUpstream {
    client: reqwest::Client,
    base: String,
}

impl HttpUpstream {
    pub fn new(base: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: base.trim_end_matches('/').to_string(),
        }
    }

    fn catalog_url(&self, limit: usize, offset: usize) -> String {
        format!("{}/pokemon?limit={}&offset={}", self.base, limit, offset)
    }

    /// `{base}/{kind}/{id}` with the identifier lower-cased and percent-encoded.
    fn resource_url(&self, kind: &str, id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base,
            kind,
            urlencoding::encode(&id.to_lowercase())
        )
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!(url, "GET");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "upstream returned non-success status");
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let bytes = self.get_bytes(url).await?;
        serde_json::from_slice(&bytes).map_err(|err| {
            warn!(url, error = %err, "failed to decode upstream response");
            FetchError::Decode(err.to_string())
        })
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn catalog(&self, limit: usize, offset: usize) -> Result<CatalogPage, FetchError> {
        let response: CatalogResponse = self.get_json(&self.catalog_url(limit, offset)).await?;
        Ok(response.into())
    }

    async fn entity(&self, id: &str) -> Result<Entity, FetchError> {
        let response: PokemonResponse = self.get_json(&self.resource_url("pokemon", id)).await?;
        Ok(response.into())
    }

    async fn species(&self, id: &str) -> Result<Species, FetchError> {
        let response: SpeciesResponse = self
            .get_json(&self.resource_url("pokemon-species", id))
            .await?;
        Ok(response.into())
    }

    async fn move_record(&self, id: &str) -> Result<Move, FetchError> {
        let response: MoveResponse = self.get_json(&self.resource_url("move", id)).await?;
        Ok(response.into())
    }

    async fn sprite(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.get_bytes(url).await
    }
}

/// Scripted upstream for tests: anything not registered answers 404.
#[cfg(test)]
pub mod fake {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct FakeUpstream {
        pub pages: HashMap<usize, CatalogPage>,
        pub entities: HashMap<String, Entity>,
        pub species: HashMap<String, Species>,
        pub moves: HashMap<String, Move>,
        pub sprites: HashMap<String, Vec<u8>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeUpstream {
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    fn found<T: Clone>(value: Option<&T>) -> Result<T, FetchError> {
        value.cloned().ok_or(FetchError::Status(404))
    }

    #[async_trait]
    impl Upstream for FakeUpstream {
        async fn catalog(&self, limit: usize, offset: usize) -> Result<CatalogPage, FetchError> {
            self.record(format!("pokemon?limit={limit}&offset={offset}"));
            found(self.pages.get(&offset))
        }

        async fn entity(&self, id: &str) -> Result<Entity, FetchError> {
            self.record(format!("pokemon/{id}"));
            found(self.entities.get(id))
        }

        async fn species(&self, id: &str) -> Result<Species, FetchError> {
            self.record(format!("pokemon-species/{id}"));
            found(self.species.get(id))
        }

        async fn move_record(&self, id: &str) -> Result<Move, FetchError> {
            self.record(format!("move/{id}"));
            found(self.moves.get(id))
        }

        async fn sprite(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            self.record(format!("sprite {url}"));
            found(self.sprites.get(url))
        }
    }
}
