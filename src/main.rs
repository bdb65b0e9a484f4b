use chrono::Local;
use tracing_subscriber::EnvFilter;

use scriptorium::clock::TimeFormat;
use scriptorium::engine::{Engine, Resolution};
use scriptorium::error::{Result, ScriptoriumError};
use scriptorium::settings::Settings;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    if let Err(e) = run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let settings = Settings::load()?;
    let format: TimeFormat = settings.time_format.parse()?;
    let translation = settings.default_translation.clone();
    let engine = Engine::new(settings)?;

    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        None => {
            let now = Local::now().naive_local();
            match engine.current_verse(now, format, &translation) {
                Resolution::Verse(record) => {
                    println!("{}", record.reference);
                    println!("{}", record.text);
                    println!("— {} [{}]", record.translation, record.source);
                }
                Resolution::Summary(summary) => {
                    println!("{}", summary.book);
                    println!("{}", summary.text);
                }
            }
        }
        Some("completion") => {
            let overview = engine.completion_overview();
            if overview.is_empty() {
                println!("no translations cached yet");
            }
            for (code, percentage) in overview {
                println!("{:>6}: {:.1}%", code.to_uppercase(), percentage);
            }
        }
        Some("stats") => {
            println!("{}", serde_json::to_string_pretty(&engine.statistics())?);
        }
        Some("import") => {
            let (Some(translation), Some(path)) = (args.next(), args.next()) else {
                return Err(ScriptoriumError::Config(
                    "usage: scriptorium import <translation> <file>".to_string(),
                ));
            };
            let text = std::fs::read_to_string(&path)?;
            let imported = engine.import_bundle(&translation, &text)?;
            println!("imported {} verses into {}", imported, translation);
        }
        Some(other) => {
            return Err(ScriptoriumError::Config(format!(
                "unknown command '{}' (expected completion, stats or import)",
                other
            )));
        }
    }
    Ok(())
}
