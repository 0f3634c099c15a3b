use super::{DEFAULT_KEY, TaxonomyStore};

/// Delimiter used by PlantVillage-style labels ("Tomato___Late_blight").
const CROP_DELIMITER: &str = "___";

/// Crop names that detectors prepend to free-text labels ("Tomato Early blight").
const CROP_PREFIXES: &[&str] = &[
    "tomato",
    "potato",
    "corn",
    "maize",
    "apple",
    "grape",
    "pepper",
    "strawberry",
    "peach",
    "cherry",
    "squash",
    "raspberry",
];

/// Pests get the generic leaf treatment; the taxonomy has no pest entries.
const PEST_KEYWORDS: &[&str] = &[
    "worm",
    "caterpillar",
    "aphid",
    "mite",
    "fly",
    "beetle",
    "borer",
];

const DISEASE_KEYWORDS: &[&str] = &[
    "blight", "spot", "rust", "mildew", "rot", "scab", "virus", "mosaic",
];

const PEST_FALLBACK_KEY: &str = "leaf_spot";

/// Maps a raw detector label onto a canonical taxonomy key.
///
/// The stages form a specificity cascade and their order is load-bearing:
/// exact key, then alias table, then pest keywords, then disease keywords,
/// then "default". Pure function of (label, taxonomy).
pub fn canonical_key(raw_label: &str, taxonomy: &TaxonomyStore) -> String {
    let disease_part = strip_crop(raw_label);
    let normalized = disease_part.to_lowercase().replace(' ', "_");

    if taxonomy.contains(&normalized) {
        return normalized;
    }

    if let Some(mapped) = taxonomy.alias(&normalized) {
        if taxonomy.contains(mapped) {
            return mapped.to_string();
        }
    }

    if PEST_KEYWORDS.iter().any(|kw| normalized.contains(kw))
        && taxonomy.contains(PEST_FALLBACK_KEY)
    {
        return PEST_FALLBACK_KEY.to_string();
    }

    for keyword in DISEASE_KEYWORDS {
        if !normalized.contains(keyword) {
            continue;
        }
        if let Some(key) = taxonomy.canonical_keys().find(|key| key.contains(keyword)) {
            return key.to_string();
        }
    }

    DEFAULT_KEY.to_string()
}

/// Discards the crop portion of a label: the segment before "___", or a
/// leading crop name from the fixed crop list. Unrecognized labels pass
/// through unchanged.
fn strip_crop(label: &str) -> &str {
    let mut segments = label.split(CROP_DELIMITER);
    segments.next();
    if let Some(disease) = segments.next() {
        return disease;
    }

    for crop in CROP_PREFIXES {
        let starts_with_crop = label
            .get(..crop.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(crop));
        if starts_with_crop {
            return label[crop.len()..].trim();
        }
    }

    label
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Recommendation, Treatment};
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
            preventive_measures: vec!["Inspect plants regularly".to_string()],
        }
    }

    fn store() -> TaxonomyStore {
        let mut diseases = BTreeMap::new();
        for key in [
            "leaf_blight",
            "powdery_mildew",
            "rust",
            "black_rot",
            "leaf_spot",
            "mosaic_virus",
            "default",
        ] {
            diseases.insert(key.to_string(), entry(key));
        }

        let mut aliases = HashMap::new();
        for (alias, target) in [
            ("late_blight", "leaf_blight"),
            ("early_blight", "leaf_blight"),
            ("leaf_mold", "powdery_mildew"),
            ("bacterial_spot", "leaf_spot"),
            ("septoria_leaf_spot", "leaf_spot"),
            ("target_spot", "leaf_spot"),
            ("leaf_scorch", "leaf_spot"),
            ("common_rust", "rust"),
            ("apple_scab", "leaf_spot"),
            ("tomato_yellow_leaf_curl_virus", "mosaic_virus"),
            ("tomato_mosaic_virus", "mosaic_virus"),
            ("fall_armyworm", "leaf_spot"),
            ("whitefly", "leaf_spot"),
        ] {
            aliases.insert(alias.to_string(), target.to_string());
        }

        TaxonomyStore::new(diseases, aliases)
    }

    #[test]
    fn plantvillage_delimiter_discards_crop() {
        assert_eq!(canonical_key("Tomato___Late_blight", &store()), "leaf_blight");
        assert_eq!(canonical_key("Apple___Black_rot", &store()), "black_rot");
    }

    #[test]
    fn crop_prefix_is_stripped_before_matching() {
        assert_eq!(canonical_key("Tomato Early blight", &store()), "leaf_blight");
        assert_eq!(canonical_key("potato late blight", &store()), "leaf_blight");
    }

    #[test]
    fn direct_key_wins_over_everything() {
        assert_eq!(canonical_key("Powdery mildew", &store()), "powdery_mildew");
        assert_eq!(canonical_key("rust", &store()), "rust");
    }

    #[test]
    fn alias_lookup_wins_over_keyword_fallback() {
        // "bacterial_spot" also contains the "spot" keyword; the alias table
        // must answer first.
        assert_eq!(canonical_key("Bacterial spot", &store()), "leaf_spot");
        assert_eq!(canonical_key("Apple___Apple_scab", &store()), "leaf_spot");
        assert_eq!(
            canonical_key("Tomato Yellow Leaf Curl Virus", &store()),
            "mosaic_virus"
        );
    }

    #[test]
    fn pest_keywords_map_to_generic_leaf_treatment() {
        assert_eq!(canonical_key("fall_armyworm", &store()), "leaf_spot");
        assert_eq!(canonical_key("whitefly", &store()), "leaf_spot");
        assert_eq!(canonical_key("stem borer", &store()), "leaf_spot");
        assert_eq!(canonical_key("spider mites", &store()), "leaf_spot");
    }

    #[test]
    fn disease_keyword_falls_back_to_first_matching_key() {
        assert_eq!(canonical_key("southern blight", &store()), "leaf_blight");
        assert_eq!(canonical_key("white rust of crucifers", &store()), "rust");
        assert_eq!(canonical_key("stem rot", &store()), "black_rot");
    }

    #[test]
    fn unknown_labels_resolve_to_default() {
        assert_eq!(canonical_key("Unknown_Disease_XYZ", &store()), "default");
        assert_eq!(canonical_key("", &store()), "default");
    }

    #[test]
    fn normalization_is_idempotent() {
        let store = store();
        let first = canonical_key("Tomato___Late_blight", &store);
        let second = canonical_key("Tomato___Late_blight", &store);
        assert_eq!(first, second);
    }

    #[test]
    fn crop_only_label_resolves_to_default() {
        assert_eq!(canonical_key("Tomato___", &store()), "default");
    }
}
