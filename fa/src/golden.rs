//! Golden examples - curated recipes used only as formatting exemplars
//!
//! Loaded once at startup and shared read-only. An exemplar teaches the model
//! the JSON shape; it is always drawn from a crop the query does not mention.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use eyre::{Context, Result};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::{Ingredient, Instruction, Quantity, StructuredRecipe, Task, TimetableEntry};

/// A curated answer for one crop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldenExample {
    #[serde(rename = "crop")]
    pub crop_label: String,
    pub recipe: StructuredRecipe,
}

static BUILTIN_EXEMPLAR: LazyLock<GoldenExample> = LazyLock::new(|| GoldenExample {
    crop_label: "Basil".to_string(),
    recipe: StructuredRecipe {
        name: "Basil nitrogen feeding during vegetative growth".to_string(),
        ingredients: vec![Ingredient {
            name: "Balanced liquid fertilizer (10-10-10)".to_string(),
            quantity: Quantity {
                value: Some(5.0),
                unit: "ml/L".to_string(),
            },
            growth_stage: "Vegetative".to_string(),
        }],
        instructions: vec![
            Instruction {
                step: 1,
                description: "Dilute 5 ml of fertilizer per litre of irrigation water.".to_string(),
            },
            Instruction {
                step: 2,
                description: "Apply to moist soil every 14 days from the fourth true leaf.".to_string(),
            },
        ],
        timetable: vec![
            TimetableEntry {
                period: "Week 3".to_string(),
                tasks: vec![Task {
                    name: "First feeding".to_string(),
                    ingredient: Some("Balanced liquid fertilizer (10-10-10)".to_string()),
                }],
            },
            TimetableEntry {
                period: "Week 5".to_string(),
                tasks: vec![Task {
                    name: "Second feeding".to_string(),
                    ingredient: Some("Balanced liquid fertilizer (10-10-10)".to_string()),
                }],
            },
        ],
        source_citations: vec!["extension.example.edu/basil-nutrition".to_string()],
    },
});

/// The fixed exemplar used when no golden examples are loaded
pub fn builtin_exemplar() -> &'static GoldenExample {
    &BUILTIN_EXEMPLAR
}

/// The process-wide golden example set
#[derive(Debug, Clone, Default)]
pub struct GoldenExamples {
    examples: Vec<GoldenExample>,
}

impl GoldenExamples {
    pub fn new(examples: Vec<GoldenExample>) -> Self {
        Self { examples }
    }

    /// Load a JSON array of `{crop, recipe}`
    ///
    /// A missing file yields an empty set; a present but malformed file is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "GoldenExamples::load: called");

        if !path.exists() {
            info!(path = %path.display(), "No golden examples file, using built-in exemplar");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context(format!("Failed to read golden examples {}", path.display()))?;
        let examples: Vec<GoldenExample> = serde_json::from_str(&content)
            .context(format!("Failed to parse golden examples {}", path.display()))?;

        info!(count = examples.len(), path = %path.display(), "Loaded golden examples");
        Ok(Self { examples })
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn examples(&self) -> &[GoldenExample] {
        &self.examples
    }

    /// Crop labels that appear in the query (case-insensitive substring match)
    pub fn mentioned_crops(&self, query: &str) -> Vec<&str> {
        let query = query.to_lowercase();
        let mut mentioned: Vec<&str> = Vec::new();
        for example in &self.examples {
            let label = example.crop_label.trim();
            if !label.is_empty() && query.contains(&label.to_lowercase()) && !mentioned.contains(&label) {
                mentioned.push(label);
            }
        }
        mentioned
    }

    /// Pick an exemplar for a query
    ///
    /// Uniformly random among examples whose crop the query does not mention;
    /// all examples if that leaves none; the built-in exemplar if the set is empty.
    pub fn select_exemplar<R: Rng + ?Sized>(&self, query: &str, rng: &mut R) -> &GoldenExample {
        let mentioned = self.mentioned_crops(query);
        debug!(?mentioned, total = self.examples.len(), "select_exemplar: called");

        let cross_domain: Vec<&GoldenExample> = self
            .examples
            .iter()
            .filter(|e| !mentioned.iter().any(|m| m.eq_ignore_ascii_case(e.crop_label.trim())))
            .collect();

        let chosen = if !cross_domain.is_empty() {
            cross_domain.choose(rng).copied()
        } else {
            debug!("select_exemplar: every example mentioned, choosing among all");
            self.examples.choose(rng)
        };

        match chosen {
            Some(example) => {
                debug!(crop = %example.crop_label, "select_exemplar: chosen");
                example
            }
            None => {
                debug!("select_exemplar: no examples loaded, using built-in");
                builtin_exemplar()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const CROPS: &[&str] = &["Tomato", "Wheat", "Rice", "Maize", "Potato"];

    fn example(crop: &str) -> GoldenExample {
        let mut recipe = builtin_exemplar().recipe.clone();
        recipe.name = format!("{} recipe", crop);
        GoldenExample {
            crop_label: crop.to_string(),
            recipe,
        }
    }

    fn set(crops: &[&str]) -> GoldenExamples {
        GoldenExamples::new(crops.iter().map(|c| example(c)).collect())
    }

    #[test]
    fn test_builtin_exemplar_is_valid() {
        let recipe = &builtin_exemplar().recipe;
        assert!(recipe.validate().is_ok());
        assert!(recipe.dangling_references().is_empty());
    }

    #[test]
    fn test_mentioned_crops_case_insensitive() {
        let golden = set(CROPS);
        assert_eq!(golden.mentioned_crops("Light for TOMATO seedlings"), vec!["Tomato"]);
        assert!(golden.mentioned_crops("soil pH for blueberries").is_empty());
    }

    #[test]
    fn test_empty_set_uses_builtin() {
        let golden = GoldenExamples::default();
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(golden.select_exemplar("basil feeding", &mut rng), builtin_exemplar());
    }

    #[test]
    fn test_all_mentioned_falls_back_to_all() {
        let golden = set(&["Tomato"]);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(golden.select_exemplar("tomato", &mut rng).crop_label, "Tomato");
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp = tempfile::TempDir::new().unwrap();
        let golden = GoldenExamples::load(temp.path().join("absent.json")).unwrap();
        assert!(golden.is_empty());
    }

    #[test]
    fn test_load_malformed_file_is_error() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("golden.json");
        fs::write(&path, "[{\"crop\": \"Tomato\"}]").unwrap();
        assert!(GoldenExamples::load(&path).is_err());
    }

    #[test]
    fn test_load_valid_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("golden.json");
        fs::write(&path, serde_json::to_string(&vec![example("Wheat"), example("Rice")]).unwrap()).unwrap();

        let golden = GoldenExamples::load(&path).unwrap();
        assert_eq!(golden.len(), 2);
        assert_eq!(golden.examples()[0].crop_label, "Wheat");
    }

    #[test]
    fn test_shipped_golden_examples_parse() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../data/golden_examples.json");
        let golden = GoldenExamples::load(&path).unwrap();
        assert!(golden.len() >= 2);
        for example in golden.examples() {
            assert!(example.recipe.validate().is_ok(), "{} invalid", example.crop_label);
        }
    }

    proptest! {
        #[test]
        fn prop_exemplar_never_matches_mentioned_crop(
            crop_idx in 0usize..CROPS.len(),
            seed in any::<u64>(),
            prefix in "[a-z ]{0,8}",
        ) {
            let golden = set(CROPS);
            let crop = CROPS[crop_idx];
            let query = format!("{}{} fertilizer schedule", prefix, crop.to_lowercase());
            let mut rng = StdRng::seed_from_u64(seed);

            let chosen = golden.select_exemplar(&query, &mut rng);
            prop_assert_ne!(chosen.crop_label.as_str(), crop);
        }
    }
}
