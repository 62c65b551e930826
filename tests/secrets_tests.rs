use pharmacist_chat::error::SecretError;
use pharmacist_chat::secrets::{SecretLoader, SecretSource};
use std::collections::HashMap;
use std::path::PathBuf;
use tempfile::TempDir;

fn keys() -> Vec<String> {
    vec!["gemini_api_key".into(), "GEMINI_API_KEY".into()]
}

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + Send + Sync + 'static {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn secrets_file_wins_over_environment() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("secrets.toml");
    std::fs::write(&path, "gemini_api_key = \"from-file\"\n").unwrap();

    let loaded = SecretLoader::new(vec![path.clone()], keys())
        .with_env(env_of(&[("gemini_api_key", "from-env")]))
        .load()
        .unwrap();

    assert_eq!(loaded.key.expose(), "from-file");
    assert_eq!(loaded.source, SecretSource::File(path));
    assert_eq!(loaded.name, "gemini_api_key");
}

#[test]
fn missing_file_falls_back_to_environment() {
    let dir = TempDir::new().unwrap();
    let loaded = SecretLoader::new(vec![dir.path().join("absent.toml")], keys())
        .with_env(env_of(&[("GEMINI_API_KEY", "  from-env  ")]))
        .load()
        .unwrap();

    assert_eq!(loaded.key.expose(), "from-env");
    assert_eq!(loaded.source, SecretSource::Env);
    assert_eq!(loaded.name, "GEMINI_API_KEY");
}

#[test]
fn either_key_name_is_accepted_in_files() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("secrets.toml");
    std::fs::write(&path, "other = 1\nGEMINI_API_KEY = \"upper\"\n").unwrap();

    let loaded = SecretLoader::new(vec![path], keys())
        .with_env(env_of(&[]))
        .load()
        .unwrap();
    assert_eq!(loaded.key.expose(), "upper");
    assert_eq!(loaded.name, "GEMINI_API_KEY");
}

#[test]
fn blank_values_do_not_count() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("secrets.toml");
    std::fs::write(&path, "gemini_api_key = \"   \"\n").unwrap();

    let result = SecretLoader::new(vec![path], keys())
        .with_env(env_of(&[("gemini_api_key", "")]))
        .load();
    assert!(matches!(result, Err(SecretError::Missing { .. })));
}

#[test]
fn absent_everywhere_reports_keys_tried() {
    let err = SecretLoader::new(vec![PathBuf::from("/nonexistent/secrets.toml")], keys())
        .with_env(env_of(&[]))
        .load()
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("gemini_api_key"));
    assert!(message.contains("GEMINI_API_KEY"));
}

#[test]
fn malformed_secrets_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("secrets.toml");
    std::fs::write(&path, "gemini_api_key = \n").unwrap();

    let result = SecretLoader::new(vec![path], keys())
        .with_env(env_of(&[("gemini_api_key", "from-env")]))
        .load();
    assert!(matches!(result, Err(SecretError::Parse { .. })));
}
