use std::path::PathBuf;

use clap::Parser;

use crate::fetch::DEFAULT_API_BASE;
use crate::nav::{Route, RouteError};

#[derive(Parser, Debug)]
#[command(name = "pokedex-browser")]
#[command(about = "Browse the PokeAPI catalog from the terminal")]
pub struct Args {
    /// Base URL of the PokeAPI v2 REST endpoints.
    #[arg(long, env = "POKEDEX_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Route to open first, e.g. `/?offset=100`, `/pokemon?name=eevee` or just `eevee`.
    #[arg(long, default_value = "/")]
    pub open: String,

    /// Write logs here. Nothing is logged otherwise since the UI owns the terminal.
    #[arg(long, env = "POKEDEX_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Skip downloading sprite previews.
    #[arg(long)]
    pub no_sprites: bool,
}

impl Args {
    pub fn start_route(&self) -> Result<Route, RouteError> {
        Route::parse(&self.open)
    }
}
