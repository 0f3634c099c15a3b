use shared::{Recommendation, Treatment};

use crate::detect::DetectionResult;
use crate::detect::cloud::GeminiVision;
use crate::taxonomy::normalize::canonical_key;
use crate::taxonomy::{DEFAULT_KEY, TaxonomyStore};

/// Produces the treatment recommendation for a detection. The cloud path
/// tries generative enrichment first; everything else, and every enrichment
/// failure, resolves through the taxonomy. A recommendation always comes back.
pub async fn recommend(
    taxonomy: &TaxonomyStore,
    enrichment: Option<&GeminiVision>,
    detection: &DetectionResult,
) -> Recommendation {
    if let (Some(vision), Some(crop_type)) = (enrichment, detection.crop_type.as_deref()) {
        if let Some(recommendation) = vision
            .detailed_recommendations(&detection.raw_label, crop_type)
            .await
        {
            return recommendation;
        }
        log::info!(
            "Enrichment unavailable for \"{}\", using taxonomy lookup",
            detection.raw_label
        );
    }

    let key = canonical_key(&detection.raw_label, taxonomy);
    log::info!(
        "Resolved \"{}\" to taxonomy key \"{key}\"",
        detection.raw_label
    );
    lookup(taxonomy, &key)
}

/// Taxonomy lookup with layered fallback: the entry itself, then the store's
/// "default" entry, then the in-code generic recommendation.
pub fn lookup(taxonomy: &TaxonomyStore, key: &str) -> Recommendation {
    taxonomy
        .entry(key)
        .or_else(|| taxonomy.entry(DEFAULT_KEY))
        .cloned()
        .unwrap_or_else(generic_fallback)
}

fn generic_fallback() -> Recommendation {
    Recommendation {
        chemical: Treatment {
            name: "Consult Agricultural Expert".to_string(),
            active_ingredient: None,
            description: Some(
                "Disease detected but specific treatment not in database.".to_string(),
            ),
            application_steps: Some(
                "Please consult with your local agricultural officer.".to_string(),
            ),
            where_to_buy: Some("Local agricultural store".to_string()),
            precautions: None,
            ingredients: None,
            effectiveness: None,
        },
        organic: Treatment {
            name: "Neem Oil".to_string(),
            active_ingredient: None,
            description: Some(
                "General organic pesticide for various plant diseases.".to_string(),
            ),
            application_steps: Some(
                "Dilute 5ml per liter of water and spray early morning.".to_string(),
            ),
            where_to_buy: Some("Local agricultural store".to_string()),
            precautions: None,
            ingredients: None,
            effectiveness: None,
        },
        preventive_measures: vec![
            "Maintain proper spacing between plants".to_string(),
            "Ensure good air circulation".to_string(),
            "Water at the base of plants, not on leaves".to_string(),
            "Remove infected plant parts immediately".to_string(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap};

    fn entry(name: &str) -> Recommendation {
        Recommendation {
            chemical: Treatment {
                name: format!("{name} chemical"),
                active_ingredient: None,
                description: None,
                application_steps: None,
                where_to_buy: None,
                precautions: None,
                ingredients: None,
                effectiveness: None,
            },
            organic: Treatment {
                name: format!("{name} organic"),
                active_ingredient: None,
                description: None,
                application_steps: None,
                where_to_buy: None,
                precautions: None,
                ingredients: None,
                effectiveness: None,
            },
            preventive_measures: vec![format!("{name} prevention")],
        }
    }

    #[test]
    fn known_key_returns_its_entry() {
        let mut diseases = BTreeMap::new();
        diseases.insert("rust".to_string(), entry("rust"));
        diseases.insert(DEFAULT_KEY.to_string(), entry("default"));
        let store = TaxonomyStore::new(diseases, HashMap::new());

        assert_eq!(lookup(&store, "rust").chemical.name, "rust chemical");
    }

    #[test]
    fn missing_key_falls_back_to_store_default() {
        let mut diseases = BTreeMap::new();
        diseases.insert(DEFAULT_KEY.to_string(), entry("default"));
        let store = TaxonomyStore::new(diseases, HashMap::new());

        assert_eq!(
            lookup(&store, "anthracnose").chemical.name,
            "default chemical"
        );
    }

    #[test]
    fn absent_default_still_yields_a_complete_recommendation() {
        let store = TaxonomyStore::new(BTreeMap::new(), HashMap::new());
        let recommendation = lookup(&store, DEFAULT_KEY);

        assert!(!recommendation.chemical.name.is_empty());
        assert!(!recommendation.organic.name.is_empty());
        assert_eq!(recommendation.preventive_measures.len(), 4);
    }
}
