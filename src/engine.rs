use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;
use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use crate::cache::{CacheKeeper, normalize_code};
use crate::canon::{BibleStructure, Book, VerseReference};
use crate::clock::{SlotTarget, TimeFormat, TimeSlot};
use crate::error::Result;
use crate::persist::Persistor;
use crate::select;
use crate::settings::Settings;
use crate::source::{Retriever, VerseRecord};
use crate::stats::{StatsKeeper, Tally};
use crate::summary::SummaryShelf;

/// Sentinel translation code: resolved to a concrete translation by uniform
/// random choice once per call, never passed further down.
pub const RANDOM_TRANSLATION: &str = "random";

/// Translation codes mapped to the names presentation layers show.
pub fn translation_display_names() -> &'static [(&'static str, &'static str)] {
    &[
        ("kjv", "King James Version (KJV)"),
        ("web", "World English Bible (WEB)"),
        ("esv", "English Standard Version (ESV)"),
        ("amp", "Amplified Bible (AMP)"),
        ("nlt", "New Living Translation (NLT)"),
        ("msg", "The Message (MSG)"),
        ("nasb", "New American Standard Bible 1995 (NASB)"),
        ("cev", "Contemporary English Version (CEV)"),
        (RANDOM_TRANSLATION, "Random (changes each interval)"),
    ]
}

// ------------- Resolution -------------
/// A book summary standing in for an exact verse when the current time
/// cannot be matched to one.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BookSummary {
    pub book: Book,
    pub text: String,
}

/// What a resolution call hands the presentation layers: either the verse
/// for the current time or a book summary.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Resolution {
    Verse(VerseRecord),
    Summary(BookSummary),
}

// ------------- Engine -------------
/// The resolution facade. Owns the reference tables, one cache per
/// translation, the persistor and the retriever; sub-components receive
/// them by handle, so there is no process-wide state anywhere.
pub struct Engine {
    settings: Settings,
    structure: Arc<BibleStructure>,
    summaries: SummaryShelf,
    caches: Arc<CacheKeeper>,
    persistor: Arc<Mutex<Persistor>>,
    retriever: Retriever,
    stats: Arc<StatsKeeper>,
    // book summary for the current minute, regenerated when it rolls over
    summary_slot: Mutex<Option<(u32, BookSummary)>>,
}

impl Engine {
    pub fn new(settings: Settings) -> Result<Engine> {
        let structure = Arc::new(match &settings.structure_file {
            Some(path) => BibleStructure::load(Path::new(path))?,
            None => BibleStructure::embedded()?,
        });
        let summaries = match &settings.summaries_file {
            Some(path) => SummaryShelf::load(Path::new(path))?,
            None => SummaryShelf::embedded()?,
        };
        let caches = Arc::new(CacheKeeper::new());
        let mut persistor = Persistor::new(settings.persistence_mode())?;
        let restored = persistor.restore_verses(&caches)?;
        if restored > 0 {
            info!(restored, "restored cached verses from durable storage");
        }
        let persistor = Arc::new(Mutex::new(persistor));
        let stats = Arc::new(StatsKeeper::new());
        let retriever = Retriever::new(
            &settings,
            Arc::clone(&caches),
            Arc::clone(&persistor),
            Arc::clone(&structure),
            Arc::clone(&stats),
        )?;
        let engine = Engine {
            settings,
            structure,
            summaries,
            caches,
            persistor,
            retriever,
            stats,
            summary_slot: Mutex::new(None),
        };
        info!(
            completion = %engine.format_completion_summary(),
            "translation cache engine ready"
        );
        Ok(engine)
    }

    /// The verse to show right now. Never fails: when the time cannot map to
    /// a real verse the result is a book summary, and when every source is
    /// unreachable the record carries annotated fallback text.
    pub fn current_verse(
        &self,
        now: NaiveDateTime,
        format: TimeFormat,
        translation: &str,
    ) -> Resolution {
        self.resolve(TimeSlot::of(now), format, translation)
    }

    /// Like [`Engine::current_verse`], plus one extra independent fetch of
    /// the same reference in a secondary translation, for the
    /// parallel-translation presentation mode.
    pub fn current_verse_pair(
        &self,
        now: NaiveDateTime,
        format: TimeFormat,
        translation: &str,
        secondary: Option<&str>,
    ) -> (Resolution, Option<VerseRecord>) {
        let primary = self.current_verse(now, format, translation);
        let companion = match (&primary, secondary) {
            (Resolution::Verse(record), Some(code)) => {
                let code = self.resolve_translation(code);
                let companion = self.retriever.fetch(&record.reference, &code);
                self.stats.record_verse(
                    &normalize_code(&code),
                    companion.reference.book(),
                    companion.source,
                );
                Some(companion)
            }
            _ => None,
        };
        (primary, companion)
    }

    fn resolve(&self, slot: TimeSlot, format: TimeFormat, translation: &str) -> Resolution {
        let translation = self.resolve_translation(translation);
        match slot.target(format) {
            SlotTarget::Summary => Resolution::Summary(self.summary_for(slot)),
            SlotTarget::Reference { chapter, verse } => {
                let found = select::candidates(&self.structure, chapter, verse);
                match select::choose(slot, &found) {
                    Some(candidate) => {
                        let reference =
                            VerseReference::new(candidate.book, chapter, candidate.verse);
                        let record = self.retriever.fetch(&reference, &translation);
                        self.stats.record_verse(
                            &normalize_code(&translation),
                            candidate.book,
                            record.source,
                        );
                        Resolution::Verse(record)
                    }
                    None => {
                        debug!(
                            chapter,
                            verse, "no book carries the requested reference, showing summary"
                        );
                        Resolution::Summary(self.summary_for(slot))
                    }
                }
            }
        }
    }

    /// Resolve the "random" sentinel to a concrete translation. The sentinel
    /// never travels further down, and since the caller's configured code is
    /// only borrowed here, their stored preference is untouched.
    fn resolve_translation(&self, requested: &str) -> String {
        if requested != RANDOM_TRANSLATION {
            return requested.to_string();
        }
        let pool: Vec<&String> = self
            .settings
            .translations
            .iter()
            .filter(|t| t.as_str() != RANDOM_TRANSLATION)
            .collect();
        match pool.choose(&mut rand::thread_rng()) {
            Some(code) => {
                debug!(translation = %code, "resolved random translation sentinel");
                (*code).clone()
            }
            None => self.settings.default_translation.clone(),
        }
    }

    fn summary_for(&self, slot: TimeSlot) -> BookSummary {
        let key = slot.minute_key();
        let mut cached = self.summary_slot.lock().unwrap();
        if let Some((kept_key, summary)) = cached.as_ref() {
            if *kept_key == key {
                let summary = summary.clone();
                self.stats.record_summary(summary.book);
                return summary;
            }
        }
        let book = self.summaries.pick(slot);
        let summary = BookSummary {
            book,
            text: self.summaries.text(book),
        };
        *cached = Some((key, summary.clone()));
        debug!(book = %summary.book, minute = key, "picked book summary for this minute");
        self.stats.record_summary(summary.book);
        summary
    }

    /// Completion percentage of a translation's cache against the canonical
    /// verse count.
    pub fn completion(&self, translation: &str) -> f64 {
        match self.caches.find(translation) {
            Some(cache) => cache.lock().unwrap().completion(&self.structure),
            None => 0.0,
        }
    }

    /// (translation, completion) for every cache with at least one verse.
    pub fn completion_overview(&self) -> Vec<(String, f64)> {
        self.caches
            .codes()
            .into_iter()
            .map(|code| {
                let completion = self.completion(&code);
                (code, completion)
            })
            .collect()
    }

    pub fn format_completion_summary(&self) -> String {
        let cached: Vec<String> = self
            .completion_overview()
            .into_iter()
            .filter(|(_, pct)| *pct > 0.0)
            .map(|(code, pct)| format!("{}: {:.1}%", code.to_uppercase(), pct))
            .collect();
        if cached.is_empty() {
            return "no translations cached yet".to_string();
        }
        let mut line = format!("{} translations cached - ", cached.len());
        line.push_str(&cached[..cached.len().min(3)].join(", "));
        if cached.len() > 3 {
            line.push_str(&format!(" and {} more", cached.len() - 3));
        }
        line
    }

    /// Ingest a whole translation bundle
    /// (`{"Book": {"chapter": {"verse": "text"}}}`) into the translation's
    /// cache, writing each verse through to storage and recomputing the
    /// completion once at the end. Returns the number of newly cached
    /// verses.
    pub fn import_bundle(&self, translation: &str, json: &str) -> Result<usize> {
        type Bundle = BTreeMap<String, BTreeMap<String, BTreeMap<String, String>>>;
        let bundle: Bundle = serde_json::from_str(json)?;
        let code = normalize_code(translation);
        let cache = self.caches.keep(&code);
        let mut guard = cache.lock().unwrap();
        let mut persistor = self.persistor.lock().unwrap();
        let mut imported = 0;
        for (book_name, chapters) in bundle {
            let Some(book) = Book::from_name(&book_name) else {
                warn!(book = %book_name, "skipping bundle entries for unknown book");
                continue;
            };
            for (chapter_text, verses) in chapters {
                let Ok(chapter) = chapter_text.parse::<u32>() else {
                    warn!(book = %book, chapter = %chapter_text, "skipping bundle chapter with bad key");
                    continue;
                };
                for (verse_text, text) in verses {
                    let Ok(verse) = verse_text.parse::<u32>() else {
                        continue;
                    };
                    let reference = VerseReference::new(book, chapter, verse);
                    if guard.insert_first(&reference, &text) {
                        imported += 1;
                        self.stats.record_cached();
                        if let Err(e) = persistor.persist_verse(&code, &reference, &text) {
                            warn!(%reference, error = %e, "bundle write failed, keeping in-memory entry");
                        }
                    }
                }
            }
        }
        let completion = guard.completion(&self.structure);
        if let Err(e) = persistor.persist_completion(&code, completion) {
            warn!(translation = %code, error = %e, "failed to persist completion record");
        }
        let percentage = format!("{:.1}%", completion);
        info!(translation = %code, imported, completion = %percentage, "imported translation bundle");
        Ok(imported)
    }

    /// Translations callers may ask for, the "random" sentinel included.
    pub fn available_translations(&self) -> Vec<String> {
        let mut translations = self.settings.translations.clone();
        translations.push(RANDOM_TRANSLATION.to_string());
        translations
    }

    pub fn default_translation(&self) -> &str {
        &self.settings.default_translation
    }

    /// Snapshot of the usage counters for the external statistics consumer.
    pub fn statistics(&self) -> Tally {
        self.stats.snapshot()
    }
}
