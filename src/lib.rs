//! Scriptorium – a time-driven scripture resolver with a self-filling
//! translation cache.
//!
//! Given a point in time, the engine deterministically maps the wall clock
//! onto a Bible reference (HH:MM becomes chapter:verse, with summaries for
//! minutes no chapter can carry), retrieves the text in a requested
//! translation through a prioritized chain of sources, and writes every
//! remote success through to a durable local cache — so the longer it runs,
//! the less it needs the network.
//!
//! ## Modules
//! * [`canon`] – The 66-book catalog, the chapter/verse structure table and
//!   the verse validator.
//! * [`clock`] – Pure time → (chapter, verse) resolution and the book
//!   summary signal.
//! * [`select`] – Candidate book enumeration and the deterministic daily
//!   rotation.
//! * [`cache`] – Per-translation verse caches ("keepers") with
//!   first-writer-wins growth.
//! * [`persist`] – SQLite write-through persistence & restoration layer.
//! * [`source`] – Remote source adapters, the per-translation fallback
//!   chains and the retriever.
//! * [`summary`] – Book summary texts and their deterministic selection.
//! * [`settings`] – File + environment configuration.
//! * [`stats`] – Usage counters exposed for the external statistics
//!   consumer.
//! * [`engine`] – The resolution facade tying the above together.
//!
//! ## Resolution flow
//! [`engine::Engine::current_verse`] asks [`clock`] for the slot's target,
//! has [`select`] pick a book whose text actually contains that reference,
//! and hands the reference to the retriever in [`source`], which probes the
//! local cache, walks the translation's source chain and falls back to an
//! annotated promise verse rather than ever failing. Each remote success
//! grows the cache and its completion percentage.
//!
//! ## Quick Start
//! ```
//! use scriptorium::clock::TimeFormat;
//! use scriptorium::engine::{Engine, Resolution};
//! use scriptorium::settings::Settings;
//!
//! // In-memory, offline: resolution runs on cache and fallback content.
//! let settings = Settings { offline: true, ..Settings::default() };
//! let engine = Engine::new(settings).unwrap();
//! let at = chrono::NaiveDate::from_ymd_opt(2025, 3, 14)
//!     .unwrap()
//!     .and_hms_opt(2, 16, 0)
//!     .unwrap();
//! match engine.current_verse(at, TimeFormat::TwelveHour, "kjv") {
//!     Resolution::Verse(record) => assert!(!record.text.is_empty()),
//!     Resolution::Summary(_) => unreachable!("02:16 maps to chapter 2, verse 16"),
//! }
//! ```

pub mod cache;
pub mod canon;
pub mod clock;
pub mod engine;
pub mod error;
pub mod persist;
pub mod select;
pub mod settings;
pub mod source;
pub mod stats;
pub mod summary;
