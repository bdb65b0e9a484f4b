use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::Serialize;

use crate::canon::Book;

// ------------- Statistics -------------
/// Counters the engine exposes as a side channel for the external
/// statistics subsystem. Only the counts live here; presentation is someone
/// else's problem.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Tally {
    pub verses_resolved: u64,
    pub summaries_shown: u64,
    pub verses_cached: u64,
    pub translation_usage: BTreeMap<String, u64>,
    pub book_access: BTreeMap<String, u64>,
    pub source_usage: BTreeMap<String, u64>,
    pub source_failures: BTreeMap<String, u64>,
}

pub struct StatsKeeper {
    tally: Mutex<Tally>,
}

impl StatsKeeper {
    pub fn new() -> Self {
        Self {
            tally: Mutex::new(Tally::default()),
        }
    }
    pub fn record_verse(&self, translation: &str, book: Book, source: &str) {
        let mut tally = self.tally.lock().unwrap();
        tally.verses_resolved += 1;
        *tally
            .translation_usage
            .entry(translation.to_string())
            .or_default() += 1;
        *tally.book_access.entry(book.name().to_string()).or_default() += 1;
        *tally.source_usage.entry(source.to_string()).or_default() += 1;
    }
    pub fn record_summary(&self, book: Book) {
        let mut tally = self.tally.lock().unwrap();
        tally.summaries_shown += 1;
        *tally.book_access.entry(book.name().to_string()).or_default() += 1;
    }
    pub fn record_cached(&self) {
        self.tally.lock().unwrap().verses_cached += 1;
    }
    pub fn record_failure(&self, source: &str) {
        let mut tally = self.tally.lock().unwrap();
        *tally
            .source_failures
            .entry(source.to_string())
            .or_default() += 1;
    }
    pub fn snapshot(&self) -> Tally {
        self.tally.lock().unwrap().clone()
    }
}
