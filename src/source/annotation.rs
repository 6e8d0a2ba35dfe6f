use std::collections::HashMap;
use crate::core::error::Result;

/// Free-text annotations keyed by species, then gene symbol. Built once
/// per run and shared read-only by every shard worker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationCache {
    entries: HashMap<String, HashMap<String, String>>,
    len: usize,
}

impl AnnotationCache {
    pub fn new() -> Self {
        AnnotationCache::default()
    }

    pub fn insert(&mut self, species: &str, symbol: &str, comment: &str) {
        let previous = self
            .entries
            .entry(species.to_string())
            .or_default()
            .insert(symbol.to_string(), comment.to_string());
        if previous.is_none() {
            self.len += 1;
        }
    }

    /// Exact match on both keys.
    pub fn get(&self, species: &str, symbol: &str) -> Option<&str> {
        self.entries
            .get(species)
            .and_then(|symbols| symbols.get(symbol))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl FromIterator<(String, String, String)> for AnnotationCache {
    fn from_iter<I: IntoIterator<Item = (String, String, String)>>(iter: I) -> Self {
        let mut cache = AnnotationCache::new();
        for (species, symbol, comment) in iter {
            cache.insert(&species, &symbol, &comment);
        }
        cache
    }
}

/// The graph-side collaborator: consulted once for the annotation cache
/// and once for the hash of the annotation dataset.
pub trait AnnotationSource {
    fn annotations(&self) -> Result<AnnotationCache>;

    fn dataset_hash(&self) -> Result<String>;
}

/// Fixed annotations held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticAnnotations {
    pub cache: AnnotationCache,
    pub hash: String,
}

impl StaticAnnotations {
    pub fn new(cache: AnnotationCache, hash: &str) -> Self {
        StaticAnnotations {
            cache,
            hash: hash.to_string(),
        }
    }
}

impl AnnotationSource for StaticAnnotations {
    fn annotations(&self) -> Result<AnnotationCache> {
        Ok(self.cache.clone())
    }

    fn dataset_hash(&self) -> Result<String> {
        Ok(self.hash.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_needs_both_keys_exactly() {
        let mut cache = AnnotationCache::new();
        cache.insert("mouse", "Shh", "limb patterning");
        cache.insert("rat", "Shh", "rat comment");
        cache.insert("mouse", "Shh", "replaced");

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("mouse", "Shh"), Some("replaced"));
        assert_eq!(cache.get("rat", "Shh"), Some("rat comment"));
        assert_eq!(cache.get("mouse", "shh"), None);
        assert_eq!(cache.get("human", "Shh"), None);
        assert!(AnnotationCache::new().is_empty());
    }
}
