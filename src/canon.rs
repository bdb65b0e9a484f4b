use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt;
use std::hash::BuildHasherDefault;
use std::path::Path;

use seahash::SeaHasher;

use crate::error::{Result, ScriptoriumError};

pub type BookHasher = BuildHasherDefault<SeaHasher>;
pub type OtherHasher = BuildHasherDefault<SeaHasher>;

pub const BOOK_COUNT: usize = 66;

// The sixty-six books in canonical order. Selection rotation and candidate
// ordering both index into this list, so the order itself is load-bearing.
static CATALOG: [&str; BOOK_COUNT] = [
    "Genesis", "Exodus", "Leviticus", "Numbers", "Deuteronomy",
    "Joshua", "Judges", "Ruth", "1 Samuel", "2 Samuel",
    "1 Kings", "2 Kings", "1 Chronicles", "2 Chronicles",
    "Ezra", "Nehemiah", "Esther", "Job", "Psalms", "Proverbs",
    "Ecclesiastes", "Song of Solomon", "Isaiah", "Jeremiah",
    "Lamentations", "Ezekiel", "Daniel", "Hosea", "Joel",
    "Amos", "Obadiah", "Jonah", "Micah", "Nahum", "Habakkuk",
    "Zephaniah", "Haggai", "Zechariah", "Malachi",
    "Matthew", "Mark", "Luke", "John", "Acts", "Romans",
    "1 Corinthians", "2 Corinthians", "Galatians", "Ephesians",
    "Philippians", "Colossians", "1 Thessalonians", "2 Thessalonians",
    "1 Timothy", "2 Timothy", "Titus", "Philemon", "Hebrews",
    "James", "1 Peter", "2 Peter", "1 John", "2 John", "3 John",
    "Jude", "Revelation",
];

// Chapter counts per book, aligned with CATALOG. Only consulted when a book
// is missing from the loaded structure table, to decide chapter existence in
// degraded mode (verse existence is then unknown and treated as invalid).
static CHAPTER_ESTIMATES: [u32; BOOK_COUNT] = [
    50, 40, 27, 36, 34,
    24, 21, 4, 31, 24,
    22, 25, 29, 36,
    10, 13, 10, 42, 150, 31,
    12, 8, 66, 52,
    5, 48, 12, 14, 3,
    9, 1, 4, 7, 3, 3,
    3, 2, 14, 4,
    28, 16, 24, 21, 28, 16,
    16, 13, 6, 6,
    4, 4, 5, 3,
    6, 4, 3, 1, 13,
    5, 5, 3, 5, 1, 1,
    1, 22,
];

// ------------- Book -------------
/// One of the sixty-six canonical books, represented by its position in the
/// catalog so ordering comparisons follow canonical book order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Book(u8);

impl Book {
    pub fn from_name(name: &str) -> Option<Book> {
        CATALOG
            .iter()
            .position(|&n| n == name)
            .map(|i| Book(i as u8))
    }
    pub fn from_index(index: usize) -> Option<Book> {
        if index < BOOK_COUNT {
            Some(Book(index as u8))
        } else {
            None
        }
    }
    pub fn name(&self) -> &'static str {
        CATALOG[self.0 as usize]
    }
    pub fn index(&self) -> usize {
        self.0 as usize
    }
    pub fn estimated_chapters(&self) -> u32 {
        CHAPTER_ESTIMATES[self.0 as usize]
    }
    pub fn all() -> impl Iterator<Item = Book> {
        (0..BOOK_COUNT as u8).map(Book)
    }
}
impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ------------- VerseReference -------------
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct VerseReference {
    book: Book,
    chapter: u32,
    verse: u32,
}
impl VerseReference {
    pub fn new(book: Book, chapter: u32, verse: u32) -> Self {
        Self {
            book,
            chapter,
            verse,
        }
    }
    pub fn book(&self) -> Book {
        self.book
    }
    pub fn chapter(&self) -> u32 {
        self.chapter
    }
    pub fn verse(&self) -> u32 {
        self.verse
    }
}
impl fmt::Display for VerseReference {
    // Zero-padded so the reference mirrors the clock time it came from.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {:02}:{:02}", self.book, self.chapter, self.verse)
    }
}

// ------------- BibleStructure -------------
/// The authoritative chapter/verse table: for each book, the maximum verse
/// number of every chapter. Loaded once at startup and read-only thereafter.
/// A book may be absent when a partial structure file is configured; chapter
/// existence then falls back to the catalog estimates.
pub struct BibleStructure {
    verses: HashMap<Book, BTreeMap<u32, u32>, BookHasher>,
    total_verses: u64,
}

static EMBEDDED_STRUCTURE: &str = include_str!("../data/bible_structure.json");

impl BibleStructure {
    /// The complete built-in table covering all sixty-six books.
    pub fn embedded() -> Result<Self> {
        Self::from_json(EMBEDDED_STRUCTURE)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let raw: BTreeMap<String, BTreeMap<String, u32>> = serde_json::from_str(text)?;
        let mut verses: HashMap<Book, BTreeMap<u32, u32>, BookHasher> = HashMap::default();
        let mut total_verses: u64 = 0;
        for (book_name, chapters) in raw {
            let book = Book::from_name(&book_name).ok_or_else(|| {
                ScriptoriumError::DataCorruption {
                    message: format!("unknown book '{}' in structure data", book_name),
                }
            })?;
            let mut table = BTreeMap::new();
            for (chapter_text, max_verse) in chapters {
                let chapter: u32 = chapter_text.parse().map_err(|_| {
                    ScriptoriumError::DataCorruption {
                        message: format!("bad chapter key '{}' for {}", chapter_text, book),
                    }
                })?;
                if chapter < 1 || max_verse < 1 {
                    return Err(ScriptoriumError::DataCorruption {
                        message: format!(
                            "non-positive chapter or verse count for {} {}",
                            book, chapter
                        ),
                    });
                }
                table.insert(chapter, max_verse);
                total_verses += max_verse as u64;
            }
            verses.insert(book, table);
        }
        Ok(Self {
            verses,
            total_verses,
        })
    }

    /// Total verse count implied by the table, the denominator for
    /// completion percentages.
    pub fn total_verses(&self) -> u64 {
        self.total_verses
    }

    /// The maximum verse number of a chapter, or None when the table has no
    /// entry for it.
    pub fn max_verse(&self, book: Book, chapter: u32) -> Option<u32> {
        self.verses.get(&book).and_then(|c| c.get(&chapter)).copied()
    }

    /// Whether the book has the chapter. Books absent from the table are
    /// judged by the catalog's chapter-count estimate instead.
    pub fn has_chapter(&self, book: Book, chapter: u32) -> bool {
        match self.verses.get(&book) {
            Some(chapters) => chapters.contains_key(&chapter),
            None => chapter >= 1 && chapter <= book.estimated_chapters(),
        }
    }

    /// Validate a reference. Returns the verse number untouched when it
    /// exists and None otherwise; an out-of-range verse is never adjusted
    /// down, so callers can fall back to a book summary rather than show a
    /// wrong reference. In degraded (estimate-only) mode verse existence is
    /// unknown and treated as invalid.
    pub fn validate(&self, book: Book, chapter: u32, verse: u32) -> Option<u32> {
        let max = self.max_verse(book, chapter)?;
        if verse >= 1 && verse <= max { Some(verse) } else { None }
    }

    /// Iterate the (book, chapter, max verse) entries of the table.
    pub fn chapters(&self) -> impl Iterator<Item = (Book, u32, u32)> + '_ {
        self.verses.iter().flat_map(|(book, chapters)| {
            chapters
                .iter()
                .map(move |(chapter, max)| (*book, *chapter, *max))
        })
    }
}
