use chrono::{NaiveDate, NaiveDateTime};

use scriptorium::canon::BibleStructure;
use scriptorium::clock::TimeFormat;
use scriptorium::engine::{Engine, Resolution};
use scriptorium::select::candidates;
use scriptorium::settings::Settings;

fn offline_engine() -> Engine {
    let settings = Settings {
        offline: true,
        ..Settings::default()
    };
    Engine::new(settings).expect("engine")
}

fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 14)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

/// A bundle covering every book that carries the given chapter:verse, so the
/// resolver hits the cache no matter which book the daily rotation picks.
fn bundle_for(chapter: u32, verse: u32) -> String {
    let structure = BibleStructure::embedded().expect("structure");
    let mut bundle = serde_json::Map::new();
    for candidate in candidates(&structure, chapter, verse) {
        let mut verses = serde_json::Map::new();
        verses.insert(
            verse.to_string(),
            serde_json::Value::String(format!(
                "{} text for {}:{}",
                candidate.book, chapter, verse
            )),
        );
        let mut chapters = serde_json::Map::new();
        chapters.insert(chapter.to_string(), serde_json::Value::Object(verses));
        bundle.insert(
            candidate.book.name().to_string(),
            serde_json::Value::Object(chapters),
        );
    }
    serde_json::Value::Object(bundle).to_string()
}

#[test]
fn minute_zero_yields_a_summary() {
    let engine = offline_engine();
    match engine.current_verse(at(10, 0), TimeFormat::TwelveHour, "kjv") {
        Resolution::Summary(summary) => assert!(!summary.text.is_empty()),
        Resolution::Verse(record) => panic!("expected summary at 10:00, got {:?}", record),
    }
}

#[test]
fn high_minutes_yield_a_summary() {
    let engine = offline_engine();
    match engine.current_verse(at(3, 55), TimeFormat::TwelveHour, "kjv") {
        Resolution::Summary(_) => {}
        Resolution::Verse(record) => panic!("expected summary at 03:55, got {:?}", record),
    }
}

#[test]
fn impossible_reference_falls_back_to_summary() {
    // 05:49 maps to chapter 5 verse 49, which no book carries.
    let engine = offline_engine();
    match engine.current_verse(at(5, 49), TimeFormat::TwelveHour, "kjv") {
        Resolution::Summary(_) => {}
        Resolution::Verse(record) => panic!("expected summary at 05:49, got {:?}", record),
    }
}

#[test]
fn cached_verse_resolves_exactly() {
    let engine = offline_engine();
    engine
        .import_bundle("kjv", &bundle_for(2, 16))
        .expect("import");
    match engine.current_verse(at(2, 16), TimeFormat::TwelveHour, "kjv") {
        Resolution::Verse(record) => {
            assert_eq!(record.reference.chapter(), 2);
            assert_eq!(record.reference.verse(), 16);
            assert_eq!(record.source, "local-cache");
            assert_eq!(record.translation, "KJV");
            assert_eq!(
                record.text,
                format!("{} text for 2:16", record.reference.book())
            );
        }
        Resolution::Summary(summary) => panic!("expected a verse at 02:16, got {:?}", summary),
    }
}

#[test]
fn resolution_is_deterministic() {
    let engine = offline_engine();
    engine
        .import_bundle("kjv", &bundle_for(2, 16))
        .expect("import");
    let first = engine.current_verse(at(2, 16), TimeFormat::TwelveHour, "kjv");
    let second = engine.current_verse(at(2, 16), TimeFormat::TwelveHour, "kjv");
    assert_eq!(first, second);
    let summary_first = engine.current_verse(at(3, 55), TimeFormat::TwelveHour, "kjv");
    let summary_second = engine.current_verse(at(3, 55), TimeFormat::TwelveHour, "kjv");
    assert_eq!(summary_first, summary_second);
}

#[test]
fn unsupported_translation_still_yields_text() {
    let engine = offline_engine();
    match engine.current_verse(at(2, 16), TimeFormat::TwelveHour, "xyz") {
        Resolution::Verse(record) => {
            assert_eq!(record.source, "fallback");
            assert_eq!(record.translation, "XYZ (fallback)");
            assert!(record.text.starts_with("[XYZ unavailable]"));
            assert!(record.text.len() > "[XYZ unavailable]".len());
        }
        Resolution::Summary(summary) => panic!("expected a verse record, got {:?}", summary),
    }
}

#[test]
fn random_sentinel_resolves_to_a_concrete_translation() {
    let settings = Settings {
        offline: true,
        default_translation: "random".to_string(),
        ..Settings::default()
    };
    let engine = Engine::new(settings).expect("engine");
    assert!(engine.available_translations().contains(&"random".to_string()));
    for _ in 0..2 {
        match engine.current_verse(at(2, 16), TimeFormat::TwelveHour, "random") {
            Resolution::Verse(record) => {
                assert!(
                    !record.translation.starts_with("RANDOM"),
                    "sentinel leaked into the record: {}",
                    record.translation
                );
            }
            Resolution::Summary(summary) => panic!("expected a verse, got {:?}", summary),
        }
    }
    // the configured preference itself is untouched
    assert_eq!(engine.default_translation(), "random");
}

#[test]
fn summary_is_stable_within_a_minute() {
    let engine = offline_engine();
    let first = engine.current_verse(at(10, 0), TimeFormat::TwelveHour, "kjv");
    let second = engine.current_verse(at(10, 0), TimeFormat::TwelveHour, "kjv");
    assert_eq!(first, second);
}

#[test]
fn secondary_translation_triggers_companion_fetch() {
    let engine = offline_engine();
    engine
        .import_bundle("kjv", &bundle_for(2, 16))
        .expect("import");
    engine
        .import_bundle("web", &bundle_for(2, 16))
        .expect("import");
    let (primary, companion) =
        engine.current_verse_pair(at(2, 16), TimeFormat::TwelveHour, "kjv", Some("web"));
    let Resolution::Verse(record) = primary else {
        panic!("expected a verse at 02:16");
    };
    let companion = companion.expect("companion record");
    assert_eq!(companion.reference, record.reference);
    assert_eq!(companion.translation, "WEB");
    assert_eq!(companion.source, "local-cache");
    // summaries get no companion
    let (_, none) = engine.current_verse_pair(at(10, 0), TimeFormat::TwelveHour, "kjv", Some("web"));
    assert!(none.is_none());
}

#[test]
fn import_grows_completion_and_statistics() {
    let engine = offline_engine();
    assert_eq!(engine.completion("kjv"), 0.0);
    let imported = engine
        .import_bundle("kjv", &bundle_for(2, 16))
        .expect("import");
    assert!(imported > 0);
    let after_first = engine.completion("kjv");
    assert!(after_first > 0.0);
    // importing the same bundle again is idempotent
    let again = engine.import_bundle("kjv", &bundle_for(2, 16)).expect("import");
    assert_eq!(again, 0);
    assert_eq!(engine.completion("kjv"), after_first);
    // a second bundle only grows the percentage
    let second = engine
        .import_bundle("kjv", &bundle_for(3, 16))
        .expect("import");
    assert!(second > 0);
    assert!(engine.completion("kjv") >= after_first);

    engine.current_verse(at(2, 16), TimeFormat::TwelveHour, "kjv");
    engine.current_verse(at(10, 0), TimeFormat::TwelveHour, "kjv");
    let tally = engine.statistics();
    assert_eq!(tally.verses_resolved, 1);
    assert_eq!(tally.summaries_shown, 1);
    assert_eq!(tally.verses_cached, (imported + second) as u64);
    assert_eq!(tally.translation_usage.get("kjv"), Some(&1));
    assert_eq!(tally.source_usage.get("local-cache"), Some(&1));
}

#[test]
fn every_advertised_translation_has_a_display_name() {
    let engine = offline_engine();
    let names = scriptorium::engine::translation_display_names();
    for code in engine.available_translations() {
        assert!(
            names.iter().any(|(c, _)| *c == code),
            "no display name for {code}"
        );
    }
}

#[test]
fn file_backed_engine_restores_its_cache() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir
        .path()
        .join("scriptorium.db")
        .to_string_lossy()
        .to_string();
    let settings = Settings {
        offline: true,
        database: Some(path.clone()),
        ..Settings::default()
    };
    {
        let engine = Engine::new(settings.clone()).expect("engine");
        engine
            .import_bundle("kjv", &bundle_for(2, 16))
            .expect("import");
    }
    // a fresh engine over the same database serves from the restored cache
    let engine = Engine::new(settings).expect("engine");
    match engine.current_verse(at(2, 16), TimeFormat::TwelveHour, "kjv") {
        Resolution::Verse(record) => {
            assert_eq!(record.source, "local-cache");
            assert_eq!(
                record.text,
                format!("{} text for 2:16", record.reference.book())
            );
        }
        Resolution::Summary(summary) => panic!("expected restored verse, got {:?}", summary),
    }
    assert!(engine.completion("kjv") > 0.0);
}
