//! Shared test utilities for engine integration tests

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use edoquest::config::{EngineSettings, StorageSettings};
use edoquest::{Config, GamificationEngine};
use tempfile::TempDir;

/// Two chapters, three quizzes (10, 10 and 20 points)
pub const CATALOG_TOML: &str = r#"
[[chapter]]
id = 1
number = 1
title = "Quel ramo del lago di Como"

[[chapter]]
id = 2
number = 2
title = "Il matrimonio a monte"

[[quiz]]
id = 101
chapter_id = 1
question = "Chi incontra don Abbondio sulla strada?"
options = ["I bravi", "Renzo", "Il cardinale"]
correct_answer = 0
points = 10
explanation = "Due bravi lo aspettano al bivio."

[[quiz]]
id = 102
chapter_id = 1
question = "Quale matrimonio non deve essere fatto?"
options = ["Renzo e Lucia", "Agnese e Tonio"]
correct_answer = 0
points = 10

[[quiz]]
id = 201
chapter_id = 2
question = "Chi rifiuta di celebrare le nozze?"
options = ["Fra Cristoforo", "Don Abbondio"]
correct_answer = 1
points = 20
"#;

/// Config pointing at a database inside `dir`
pub fn config_in(dir: &Path, engine: EngineSettings) -> Config {
    Config {
        storage: StorageSettings {
            path: Some(dir.join("edoquest.db")),
            busy_timeout_ms: 5_000,
        },
        engine,
        ..Config::default()
    }
}

/// File-backed engine seeded with [`CATALOG_TOML`]
pub fn seeded_engine(engine: EngineSettings) -> (TempDir, Config, GamificationEngine) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let catalog_path = temp_dir.path().join("catalog.toml");
    fs::write(&catalog_path, CATALOG_TOML).expect("Failed to write catalog");

    let config = config_in(temp_dir.path(), engine);
    let engine = GamificationEngine::open(&config).expect("Failed to open engine");
    engine
        .import_file(&catalog_path)
        .expect("Failed to import catalog");

    (temp_dir, config, engine)
}
