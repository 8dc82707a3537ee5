//! Read-only projections of upstream records, plus the view models built from them.
//!
//! Placeholders are resolved here once; the renderer never invents its own defaults.

use serde_json::Value;

/// Shown wherever an upstream value is absent.
pub const MISSING: &str = "—";

/// Shown when a species carries no usable flavor text.
pub const NO_DESCRIPTION: &str = "No description available.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogPage {
    /// Size of the whole catalog, not just this page.
    pub total_count: usize,
    pub results: Vec<CatalogEntry>,
}

impl CatalogPage {
    pub fn names(&self) -> Vec<String> {
        self.results.iter().map(|e| e.name.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlavorText {
    pub language: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Stat {
    pub name: String,
    pub base: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Entity {
    pub name: String,
    pub sprite: Option<String>,
    pub types: Vec<String>,
    pub stats: Vec<Stat>,
    pub moves: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Species {
    pub flavor_text_entries: Vec<FlavorText>,
    pub evolves_from: Option<String>,
}

/// A move record. The numeric stats hold display text already run through
/// [`stat_text`], so `None` always means "render the placeholder".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Move {
    pub name: String,
    pub type_name: Option<String>,
    pub category: Option<String>,
    pub flavor_text_entries: Vec<FlavorText>,
    pub power: Option<String>,
    pub accuracy: Option<String>,
    pub pp: Option<String>,
}

/// Everything the entity detail view shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityView {
    pub name: String,
    pub sprite: Option<String>,
    pub types: Vec<String>,
    pub stats: Vec<Stat>,
    pub moves: Vec<String>,
    pub description: String,
    pub ancestor: Option<String>,
}

impl EntityView {
    pub fn new(entity: Entity, species: Species) -> Self {
        Self {
            description: describe(&species.flavor_text_entries),
            ancestor: species.evolves_from.filter(|a| !a.is_empty()),
            name: entity.name,
            sprite: entity.sprite.filter(|s| !s.is_empty()),
            types: entity.types,
            stats: entity.stats,
            moves: entity.moves,
        }
    }

    pub fn types_label(&self) -> &'static str {
        if self.types.len() > 1 {
            "Types"
        } else {
            "Type"
        }
    }
}

/// Everything the move detail view shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveView {
    pub name: String,
    pub type_name: Option<String>,
    pub category: Option<String>,
    /// English flavor text with line breaks kept; `None` hides the section.
    pub flavor: Option<String>,
    pub power: Option<String>,
    pub accuracy: Option<String>,
    pub pp: Option<String>,
}

impl MoveView {
    pub fn new(mv: Move) -> Self {
        let flavor = mv
            .flavor_text_entries
            .iter()
            .find(|e| e.language == "en")
            .map(|e| pre_line(&e.text))
            .filter(|t| !t.is_empty());
        Self {
            name: mv.name,
            type_name: mv.type_name,
            category: mv.category,
            flavor,
            power: mv.power,
            accuracy: mv.accuracy,
            pp: mv.pp,
        }
    }

    pub fn type_text(&self) -> &str {
        or_missing(&self.type_name)
    }

    pub fn category_text(&self) -> &str {
        or_missing(&self.category)
    }

    /// `(label, value)` rows of the stats block, in display order.
    pub fn stat_rows(&self) -> [(&'static str, &str); 3] {
        [
            ("Power", or_missing(&self.power)),
            ("Accuracy", or_missing(&self.accuracy)),
            ("PP", or_missing(&self.pp)),
        ]
    }
}

pub fn or_missing(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(MISSING)
}

/// Pick the description for a species: English first, then whatever comes
/// first, then the empty placeholder.
pub fn describe(entries: &[FlavorText]) -> String {
    let raw = entries
        .iter()
        .find(|e| e.language == "en")
        .or_else(|| entries.first())
        .map(|e| e.text.as_str())
        .unwrap_or("");
    let text = normalize_flavor_text(raw);
    if text.is_empty() {
        NO_DESCRIPTION.to_string()
    } else {
        text
    }
}

/// Collapse every whitespace run (including the form feeds PokeAPI embeds) to one space.
pub fn normalize_flavor_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep line breaks but collapse whitespace inside each line.
pub fn pre_line(raw: &str) -> String {
    raw.replace('\u{c}', "\n")
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Display text for a move stat. Any number (zero included) is shown as-is and so
/// is any other truthy value; null, `false` and empty strings become `None`.
pub fn stat_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn flavor(language: &str, text: &str) -> FlavorText {
        FlavorText {
            language: language.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn description_prefers_english() {
        let entries = vec![flavor("ja", "でんき"), flavor("en", "An\nelectric\u{c}mouse.")];
        assert_eq!(describe(&entries), "An electric mouse.");
    }

    #[test]
    fn description_falls_back_to_first_entry() {
        let entries = vec![flavor("ja", "  ほっぺたの\n りょうがわに  ")];
        assert_eq!(describe(&entries), "ほっぺたの りょうがわに");
    }

    #[test]
    fn description_placeholder_when_empty() {
        assert_eq!(describe(&[]), NO_DESCRIPTION);
        assert_eq!(describe(&[flavor("en", " \n ")]), NO_DESCRIPTION);
    }

    #[test]
    fn stat_text_keeps_zero() {
        assert_eq!(stat_text(&json!(0)), Some("0".to_string()));
        assert_eq!(stat_text(&json!(90)), Some("90".to_string()));
        assert_eq!(stat_text(&Value::Null), None);
        assert_eq!(stat_text(&json!(false)), None);
        assert_eq!(stat_text(&json!("")), None);
    }

    #[test]
    fn move_view_renders_placeholders() {
        let view = MoveView::new(Move {
            name: "growl".into(),
            power: None,
            accuracy: Some("100".into()),
            pp: Some("0".into()),
            ..Move::default()
        });
        assert_eq!(view.type_text(), MISSING);
        assert_eq!(view.category_text(), MISSING);
        assert_eq!(
            view.stat_rows(),
            [("Power", MISSING), ("Accuracy", "100"), ("PP", "0")]
        );
        assert_eq!(view.flavor, None);
    }

    #[test]
    fn move_flavor_is_english_only_and_keeps_lines() {
        let view = MoveView::new(Move {
            name: "tackle".into(),
            flavor_text_entries: vec![
                flavor("fr", "Charge"),
                flavor("en", "A physical  attack\nin which the user\u{c}charges."),
            ],
            ..Move::default()
        });
        assert_eq!(
            view.flavor.as_deref(),
            Some("A physical attack\nin which the user\ncharges.")
        );

        let none = MoveView::new(Move {
            flavor_text_entries: vec![flavor("de", "Tackle")],
            ..Move::default()
        });
        assert_eq!(none.flavor, None);
    }

    #[test]
    fn ancestor_only_when_declared() {
        let with = EntityView::new(
            Entity::default(),
            Species {
                evolves_from: Some("pichu".into()),
                ..Species::default()
            },
        );
        assert_eq!(with.ancestor.as_deref(), Some("pichu"));
        let without = EntityView::new(Entity::default(), Species::default());
        assert_eq!(without.ancestor, None);
    }
}
