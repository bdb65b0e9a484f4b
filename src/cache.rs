use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use crate::canon::{BibleStructure, Book, BookHasher, OtherHasher, VerseReference};

/// Normalize a translation code for cache keying. NASB editions published as
/// "nasb1995" are the same cache as "nasb".
pub fn normalize_code(code: &str) -> String {
    let code = code.to_ascii_lowercase();
    if code == "nasb1995" {
        "nasb".to_string()
    } else {
        code
    }
}

// ------------- VerseCache -------------
/// One translation's growing local copy of the text: book -> chapter ->
/// verse -> text. Entries are never blank and never overwritten; the cache
/// only grows within a run.
pub struct VerseCache {
    verses: HashMap<Book, BTreeMap<u32, BTreeMap<u32, String>>, BookHasher>,
    len: usize,
}

impl VerseCache {
    pub fn new() -> Self {
        Self {
            verses: HashMap::default(),
            len: 0,
        }
    }

    pub fn get(&self, reference: &VerseReference) -> Option<&str> {
        self.verses
            .get(&reference.book())
            .and_then(|chapters| chapters.get(&reference.chapter()))
            .and_then(|verses| verses.get(&reference.verse()))
            .map(|s| s.as_str())
    }

    /// First-writer-wins insert. Returns true when the entry is new; blank
    /// or whitespace-only text is rejected outright.
    pub fn insert_first(&mut self, reference: &VerseReference, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        let slot = self
            .verses
            .entry(reference.book())
            .or_default()
            .entry(reference.chapter())
            .or_default()
            .entry(reference.verse());
        match slot {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(e) => {
                e.insert(text.to_string());
                self.len += 1;
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Percentage of the canonical text present in this cache, measured in
    /// verses against the structure table. O(total verses); only run after a
    /// cache-growing write, never on reads.
    pub fn completion(&self, structure: &BibleStructure) -> f64 {
        let total = structure.total_verses();
        if total == 0 {
            return 0.0;
        }
        let mut cached: u64 = 0;
        for (book, chapter, max_verse) in structure.chapters() {
            if let Some(verses) = self
                .verses
                .get(&book)
                .and_then(|chapters| chapters.get(&chapter))
            {
                cached += verses.range(1..=max_verse).count() as u64;
            }
        }
        (cached as f64 / total as f64) * 100.0
    }
}

// ------------- CacheKeeper -------------
/// Owns one mutex-guarded cache per translation. Caches are created on
/// demand so a first-seen translation code starts from empty; all mutation
/// goes through the retriever, which locks a single translation at a time.
pub struct CacheKeeper {
    kept: Mutex<HashMap<String, Arc<Mutex<VerseCache>>, OtherHasher>>,
}

impl CacheKeeper {
    pub fn new() -> Self {
        Self {
            kept: Mutex::new(HashMap::default()),
        }
    }

    /// The cache for a translation, created empty if not yet kept. The code
    /// is normalized, so "NASB1995" and "nasb" share one cache.
    pub fn keep(&self, translation: &str) -> Arc<Mutex<VerseCache>> {
        let code = normalize_code(translation);
        let mut kept = self.kept.lock().unwrap();
        Arc::clone(
            kept.entry(code)
                .or_insert_with(|| Arc::new(Mutex::new(VerseCache::new()))),
        )
    }

    /// The cache for a translation if one has been kept, without creating
    /// it.
    pub fn find(&self, translation: &str) -> Option<Arc<Mutex<VerseCache>>> {
        let code = normalize_code(translation);
        let kept = self.kept.lock().unwrap();
        kept.get(&code).map(Arc::clone)
    }

    /// Read-only probe; never creates a cache and never mutates one.
    pub fn probe(&self, translation: &str, reference: &VerseReference) -> Option<String> {
        let code = normalize_code(translation);
        let cache = {
            let kept = self.kept.lock().unwrap();
            kept.get(&code).map(Arc::clone)?
        };
        let guard = cache.lock().unwrap();
        guard.get(reference).map(|s| s.to_string())
    }

    /// Translation codes with at least one kept cache, sorted.
    pub fn codes(&self) -> Vec<String> {
        let kept = self.kept.lock().unwrap();
        let mut codes: Vec<String> = kept.keys().cloned().collect();
        codes.sort();
        codes
    }
}
