pub mod normalize;

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::Deserialize;
use shared::Recommendation;

pub const DEFAULT_KEY: &str = "default";

#[derive(Debug, thiserror::Error)]
pub enum TaxonomyError {
    #[error("Failed to read taxonomy file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse taxonomy file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Taxonomy has no \"default\" entry")]
    MissingDefault,
    #[error("Alias \"{alias}\" maps to unknown key \"{target}\"")]
    DanglingAlias { alias: String, target: String },
}

#[derive(Deserialize)]
struct TaxonomyFile {
    diseases: BTreeMap<String, Recommendation>,
    #[serde(default)]
    aliases: HashMap<String, String>,
}

/// Static table of treatment recommendations keyed by canonical disease key,
/// plus the alias table that folds detector-specific disease names onto those
/// keys. Loaded once at startup and shared read-only afterwards.
pub struct TaxonomyStore {
    diseases: BTreeMap<String, Recommendation>,
    aliases: HashMap<String, String>,
}

impl TaxonomyStore {
    pub fn new(
        diseases: BTreeMap<String, Recommendation>,
        aliases: HashMap<String, String>,
    ) -> Self {
        Self { diseases, aliases }
    }

    pub fn load(path: &Path) -> Result<Self, TaxonomyError> {
        let raw = fs::read_to_string(path)?;
        let file: TaxonomyFile = serde_json::from_str(&raw)?;
        let store = Self::new(file.diseases, file.aliases);
        store.validate()?;
        log::info!(
            "Loaded taxonomy with {} disease entries and {} aliases",
            store.diseases.len(),
            store.aliases.len()
        );
        Ok(store)
    }

    fn validate(&self) -> Result<(), TaxonomyError> {
        if !self.diseases.contains_key(DEFAULT_KEY) {
            return Err(TaxonomyError::MissingDefault);
        }
        for (alias, target) in &self.aliases {
            if !self.diseases.contains_key(target) {
                return Err(TaxonomyError::DanglingAlias {
                    alias: alias.clone(),
                    target: target.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn entry(&self, key: &str) -> Option<&Recommendation> {
        self.diseases.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.diseases.contains_key(key)
    }

    pub fn alias(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    /// Canonical keys in lexicographic order. Keyword fallback matching
    /// iterates this, so the order must stay deterministic.
    pub fn canonical_keys(&self) -> impl Iterator<Item = &str> {
        self.diseases.keys().map(String::as_str)
    }
}
