use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::Path;

use crate::canon::{BOOK_COUNT, Book, BookHasher};
use crate::clock::TimeSlot;
use crate::error::{Result, ScriptoriumError};

static EMBEDDED_SUMMARIES: &str = include_str!("../data/book_summaries.json");

// ------------- SummaryShelf -------------
/// Short descriptive texts for each book, shown whenever the current time
/// cannot be matched to a real verse.
pub struct SummaryShelf {
    texts: HashMap<Book, String, BookHasher>,
}

impl SummaryShelf {
    pub fn embedded() -> Result<Self> {
        Self::from_json(EMBEDDED_SUMMARIES)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let raw: BTreeMap<String, String> = serde_json::from_str(text)?;
        let mut texts: HashMap<Book, String, BookHasher> = HashMap::default();
        for (book_name, summary) in raw {
            let book = Book::from_name(&book_name).ok_or_else(|| {
                ScriptoriumError::DataCorruption {
                    message: format!("unknown book '{}' in summary data", book_name),
                }
            })?;
            texts.insert(book, summary);
        }
        Ok(Self { texts })
    }

    /// The summary text for a book, with a generic sentence for books the
    /// loaded shelf does not cover.
    pub fn text(&self, book: Book) -> String {
        match self.texts.get(&book) {
            Some(summary) => summary.clone(),
            None => format!(
                "{} is a book of the Bible containing wisdom and spiritual guidance.",
                book
            ),
        }
    }

    /// Pick a book for the slot. Hash-shuffled rather than drawn from a
    /// PRNG, so the same instant always lands on the same book while
    /// consecutive minutes and days spread across the catalog.
    pub fn pick(&self, slot: TimeSlot) -> Book {
        // the shuffle index is taken modulo the catalog size
        Book::from_index(slot.shuffle(BOOK_COUNT)).unwrap()
    }
}
