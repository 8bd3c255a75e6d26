//! Integration tests for configuration loading

use pkgsmith_config::Config;
use std::path::Path;
use tempfile::tempdir;

#[tokio::test]
async fn missing_file_falls_back_to_defaults() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("config.toml");

    let config = Config::load_or_default(Some(&path)).await.unwrap();
    assert_eq!(config.paths.build_dir, Path::new("/var/cache/pkgsmith"));
}

#[tokio::test]
async fn file_overrides_defaults() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("config.toml");
    tokio::fs::write(
        &path,
        r#"
        [paths]
        build_dir = "/tmp/cache"
        local_dir = "/home/dev/pkgbuilds"

        [aur]
        url = "https://aur.example.org"
        "#,
    )
    .await
    .unwrap();

    let config = Config::load_or_default(Some(&path)).await.unwrap();
    assert_eq!(config.paths.build_dir, Path::new("/tmp/cache"));
    assert_eq!(
        config.paths.local_dir.as_deref(),
        Some(Path::new("/home/dev/pkgbuilds"))
    );
    assert_eq!(config.aur.url, "https://aur.example.org");
}

#[tokio::test]
async fn malformed_file_is_reported() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("config.toml");
    tokio::fs::write(&path, "this is not toml [[[").await.unwrap();

    assert!(Config::load_or_default(Some(&path)).await.is_err());
}
