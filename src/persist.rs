// used for persistence
use rusqlite::{Connection, params};
use tracing::warn;

use crate::cache::CacheKeeper;
use crate::canon::{Book, VerseReference};
use crate::error::Result;

// ------------- Persistence -------------
/// Where the durable copy of the caches lives. In-memory mode keeps the
/// schema but forgets everything on drop, which is what tests want.
#[derive(Clone, Debug)]
pub enum PersistenceMode {
    InMemory,
    File(String),
}

/// SQLite-backed write-through storage for the translation caches. Every
/// successful remote fetch lands here synchronously, one row per verse, so a
/// crash loses at most the row being added. The completion table is a cached
/// convenience only and can always be regenerated from the verse rows.
pub struct Persistor {
    db: Connection,
}

impl Persistor {
    pub fn new(mode: PersistenceMode) -> Result<Persistor> {
        let connection = match &mode {
            PersistenceMode::InMemory => Connection::open_in_memory()?,
            PersistenceMode::File(path) => Connection::open(path)?,
        };
        connection.execute_batch(
            "
            create table if not exists Verse (
                Translation text not null,
                Book text not null,
                Chapter integer not null,
                Verse integer not null,
                Text text not null,
                constraint unique_Verse primary key (
                    Translation,
                    Book,
                    Chapter,
                    Verse
                )
            );
            create table if not exists Completion (
                Translation text not null,
                Percentage real not null,
                constraint referenceable_Translation primary key (
                    Translation
                )
            );
            ",
        )?;
        Ok(Persistor { db: connection })
    }

    /// Write one verse row. `insert or ignore` keeps the first writer's text
    /// even if two processes race on the same key. Returns true when a row
    /// was actually added.
    pub fn persist_verse(
        &mut self,
        translation: &str,
        reference: &VerseReference,
        text: &str,
    ) -> Result<bool> {
        let mut statement = self.db.prepare_cached(
            "
            insert or ignore into Verse (
                Translation,
                Book,
                Chapter,
                Verse,
                Text
            ) values (?, ?, ?, ?, ?)
        ",
        )?;
        let changed = statement.execute(params![
            translation,
            reference.book().name(),
            reference.chapter(),
            reference.verse(),
            text
        ])?;
        Ok(changed > 0)
    }

    pub fn persist_completion(&mut self, translation: &str, percentage: f64) -> Result<()> {
        let mut statement = self.db.prepare_cached(
            "
            insert or replace into Completion (
                Translation,
                Percentage
            ) values (?, ?)
        ",
        )?;
        statement.execute(params![translation, percentage])?;
        Ok(())
    }

    pub fn completion(&mut self, translation: &str) -> Result<Option<f64>> {
        let mut statement = self.db.prepare_cached(
            "
            select Percentage
                from Completion
                where Translation = ?
        ",
        )?;
        let mut rows = statement.query(params![translation])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    /// Load every persisted verse back into the keeper's in-memory caches.
    /// Rows naming a book outside the catalog are skipped with a warning
    /// rather than failing the whole restore.
    pub fn restore_verses(&mut self, keeper: &CacheKeeper) -> Result<usize> {
        let mut statement = self.db.prepare_cached(
            "
            select Translation, Book, Chapter, Verse, Text
                from Verse
        ",
        )?;
        let mut rows = statement.query([])?;
        let mut restored = 0;
        while let Some(row) = rows.next()? {
            let translation: String = row.get(0)?;
            let book_name: String = row.get(1)?;
            let chapter: u32 = row.get(2)?;
            let verse: u32 = row.get(3)?;
            let text: String = row.get(4)?;
            let Some(book) = Book::from_name(&book_name) else {
                warn!(book = %book_name, "skipping persisted verse for unknown book");
                continue;
            };
            let reference = VerseReference::new(book, chapter, verse);
            let cache = keeper.keep(&translation);
            if cache.lock().unwrap().insert_first(&reference, &text) {
                restored += 1;
            }
        }
        Ok(restored)
    }
}
