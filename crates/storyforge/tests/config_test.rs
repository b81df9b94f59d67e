//! Tests for configuration loading.

use std::time::Duration;
use storyforge::{StoryforgeErrorKind, StudioConfig, StudioOptions};
use tempfile::TempDir;

#[test]
fn test_bundled_defaults() {
    let config = StudioConfig::bundled().unwrap();

    assert_eq!(config.image_api().image_format(), "webp");
    assert_eq!(config.image_api().image_quality(), "85");
    assert!(*config.image_api().optimize_size());
    assert_eq!(config.image_api().timeout(), Duration::from_secs(300));
    assert_eq!(config.llm().default_model(), "aion-labs/aion-1.0-mini");
    assert_eq!(config.llm().api_key_env(), "OPENROUTER_API_KEY");
    assert!(config.corpus().detail().contains("afetex.txt"));
    assert_eq!(*config.archive().history_cap(), 20);
    assert_eq!(*config.archive().trash_cap(), 100);
    assert_eq!(*config.storage().quota_bytes(), Some(5_242_880));
    assert_eq!(*config.generation().seed_max(), 1_000_000);
}

#[test]
fn test_file_overrides_bundled_values() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(
        &path,
        r#"
[image_api]
url = "http://localhost:9000"
timeout_secs = 30

[archive]
history_cap = 5

[storage]
dir = "/tmp/storyforge-docs"
"#,
    )
    .unwrap();

    let config = StudioConfig::from_file(&path).unwrap();

    assert_eq!(config.image_api().url(), "http://localhost:9000");
    assert_eq!(config.image_api().timeout(), Duration::from_secs(30));
    // Untouched keys keep their bundled values
    assert_eq!(config.image_api().image_format(), "webp");
    assert_eq!(*config.archive().history_cap(), 5);
    assert_eq!(*config.archive().trash_cap(), 100);
    assert_eq!(
        config.storage().resolve_dir().unwrap(),
        std::path::PathBuf::from("/tmp/storyforge-docs")
    );

    let options = StudioOptions::from_config(&config);
    assert_eq!(*options.timeout(), Duration::from_secs(30));
    assert_eq!(*options.seed_max(), 1_000_000);
}

#[test]
fn test_missing_file_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let err = StudioConfig::from_file(dir.path().join("absent.toml")).unwrap_err();

    assert!(matches!(err.kind(), StoryforgeErrorKind::Config(_)));
}
