use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::{debug, info};

use super::{defaults::DEFAULT_WORDS, models::WordOption};
use crate::shared::AppError;

/// Static mapping of category -> words
pub trait WordCatalog: Send + Sync {
    fn all_categories(&self) -> BTreeSet<String>;
    fn words_in(&self, category: &str) -> Vec<WordOption>;
}

/// Catalog backed by an in-memory map, built-in or loaded from JSON
#[derive(Debug, Clone)]
pub struct StaticWordCatalog {
    words: BTreeMap<String, Vec<String>>,
}

impl Default for StaticWordCatalog {
    fn default() -> Self {
        let words = DEFAULT_WORDS
            .iter()
            .map(|(category, words)| {
                (
                    category.to_string(),
                    words.iter().map(|w| w.to_string()).collect(),
                )
            })
            .collect();
        Self { words }
    }
}

impl StaticWordCatalog {
    pub fn new(words: BTreeMap<String, Vec<String>>) -> Self {
        let words = words
            .into_iter()
            .map(|(category, mut list)| {
                list.retain(|w| !w.trim().is_empty());
                list.dedup();
                (category, list)
            })
            .filter(|(category, list)| !category.trim().is_empty() && !list.is_empty())
            .collect();
        Self { words }
    }

    /// Parses `{"Category": ["word", ...], ...}`
    pub fn from_json(json: &str) -> Result<Self, AppError> {
        let words: BTreeMap<String, Vec<String>> = serde_json::from_str(json)
            .map_err(|e| AppError::BadRequest(format!("Invalid word catalog: {}", e)))?;
        let catalog = Self::new(words);
        if catalog.words.is_empty() {
            return Err(AppError::BadRequest(
                "Word catalog has no usable categories".to_string(),
            ));
        }
        Ok(catalog)
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            AppError::NotFound(format!("Word catalog {}: {}", path.display(), e))
        })?;
        let catalog = Self::from_json(&json)?;
        info!(
            path = %path.display(),
            categories = catalog.words.len(),
            "Loaded word catalog"
        );
        Ok(catalog)
    }
}

impl WordCatalog for StaticWordCatalog {
    fn all_categories(&self) -> BTreeSet<String> {
        self.words.keys().cloned().collect()
    }

    fn words_in(&self, category: &str) -> Vec<WordOption> {
        self.words
            .get(category)
            .map(|words| {
                words
                    .iter()
                    .map(|word| WordOption::new(word.clone(), category))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Draws the options shown to the starting player
///
/// Samples `category_count` distinct categories without replacement, then up
/// to `words_per_category` distinct words from each. Returns the chosen
/// categories (in draw order) and the flattened word options.
pub fn draw_options<R: Rng + ?Sized>(
    catalog: &dyn WordCatalog,
    rng: &mut R,
    category_count: usize,
    words_per_category: usize,
) -> (Vec<String>, Vec<WordOption>) {
    let categories: Vec<String> = catalog.all_categories().into_iter().collect();
    let chosen: Vec<String> = categories
        .choose_multiple(&mut *rng, category_count)
        .cloned()
        .collect();

    let mut options = Vec::new();
    for category in &chosen {
        let words = catalog.words_in(category);
        options.extend(words.choose_multiple(&mut *rng, words_per_category).cloned());
    }

    debug!(
        categories = ?chosen,
        option_count = options.len(),
        "Drew word options"
    );

    (chosen, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_default_catalog_has_categories() {
        let catalog = StaticWordCatalog::default();
        assert!(catalog.all_categories().len() >= 2);
        assert!(catalog.all_categories().contains("Animals"));
        assert!(catalog
            .words_in("Animals")
            .iter()
            .all(|w| w.category == "Animals"));
    }

    #[test]
    fn test_unknown_category_has_no_words() {
        let catalog = StaticWordCatalog::default();
        assert!(catalog.words_in("Nope").is_empty());
    }

    #[test]
    fn test_draw_picks_distinct_categories_and_words() {
        let catalog = StaticWordCatalog::default();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            let (categories, options) = draw_options(&catalog, &mut rng, 2, 5);
            assert_eq!(categories.len(), 2);
            assert_ne!(categories[0], categories[1]);

            for category in &categories {
                let words: Vec<_> = options.iter().filter(|o| &o.category == category).collect();
                let expected = catalog.words_in(category).len().min(5);
                assert_eq!(words.len(), expected);
                let unique: HashSet<_> = words.iter().map(|o| o.word.clone()).collect();
                assert_eq!(unique.len(), words.len());
            }
        }
    }

    #[test]
    fn test_small_category_yields_fewer_words() {
        let mut words = BTreeMap::new();
        words.insert("Tiny".to_string(), vec!["One".to_string(), "Two".to_string()]);
        words.insert(
            "Big".to_string(),
            (0..8).map(|i| format!("Word{}", i)).collect(),
        );
        let catalog = StaticWordCatalog::new(words);
        let mut rng = StdRng::seed_from_u64(1);

        let (categories, options) = draw_options(&catalog, &mut rng, 2, 5);
        assert_eq!(categories.len(), 2);
        assert_eq!(options.iter().filter(|o| o.category == "Tiny").count(), 2);
        assert_eq!(options.iter().filter(|o| o.category == "Big").count(), 5);
    }

    #[test]
    fn test_from_json() {
        let catalog =
            StaticWordCatalog::from_json(r#"{"Fruit": ["Apple", "Pear"], "Empty": []}"#).unwrap();
        assert_eq!(catalog.all_categories().len(), 1);
        assert_eq!(catalog.words_in("Fruit")[1], WordOption::new("Pear", "Fruit"));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            StaticWordCatalog::from_json("[1, 2, 3]"),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            StaticWordCatalog::from_json("{}"),
            Err(AppError::BadRequest(_))
        ));
    }
}
