//! Static prompt catalog
//!
//! Sessions receive a copy of the catalog at construction and draw from it
//! without replacement. Operators can replace the built-in list with a plain
//! text file (one prompt per line).

use crate::error::ConfigError;
use std::path::Path;

/// Built-in prompts used when no catalog file is configured
pub const BUILTIN_PROMPTS: &[&str] = &[
    "The worst thing to say on a first date",
    "A terrible name for a cruise ship",
    "What your houseplants gossip about when you leave",
    "The real reason the dinosaurs went extinct",
    "A rejected flavor of potato chips",
    "The first rule of the office kitchen",
    "Something you should never yell in a library",
    "A surprising item to find in a time capsule",
    "The least helpful superpower",
    "What the fortune cookie should have said",
    "A bad slogan for a dentist",
    "The title of your autobiography",
    "An unexpected thing to bring to a picnic",
    "The worst possible theme for a wedding",
    "What aliens would complain about after visiting Earth",
    "A new, less exciting Olympic sport",
    "The secret ingredient in grandma's cookies",
    "A sign that your roommate is a ghost",
    "The most passive-aggressive note on a fridge",
    "A terrible tagline for a horror movie",
];

/// Owned copy of the built-in catalog
pub fn builtin() -> Vec<String> {
    BUILTIN_PROMPTS.iter().map(|p| p.to_string()).collect()
}

/// Parse catalog text: one prompt per non-empty line, `#` starts a comment line
pub fn parse_catalog(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Load a catalog from a text file
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Vec<String>, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::CatalogIo {
        path: path.display().to_string(),
        source,
    })?;
    let prompts = parse_catalog(&text);
    tracing::info!("Loaded {} prompts from {}", prompts.len(), path.display());
    Ok(prompts)
}
