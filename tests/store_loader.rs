//! Integration tests for writing, loading and deleting settings through a store.

use lazy_settings::prelude::*;
use lazy_settings::sources::{GLOBAL_ENV, StoreConfig, StoreLoader};
use lazy_settings::store::{KeyValueStore, MemoryStore};
use proptest::prelude::*;
use serde_json::{Value, json};
use std::fs;
use tempfile::TempDir;

fn data(key: &str, value: Value) -> SettingsMap {
    SettingsMap::from([(key.to_string(), value)])
}

fn enabled_loader() -> StoreLoader<MemoryStore> {
    let config = StoreConfig {
        host: "localhost".to_string(),
        port: 6379,
        ..StoreConfig::enabled()
    };
    StoreLoader::new(config, MemoryStore::new())
}

#[test]
fn test_store_not_configured() {
    let settings = LazySettings::new();
    let loader = StoreLoader::new(StoreConfig::default(), MemoryStore::new());

    let err = settings
        .write_to(&loader, Some(&data("OTHER_SECRET", json!("redis_works"))))
        .unwrap_err();
    assert!(matches!(err, ConfigError::NotConfigured(_)));
    assert!(err.to_string().contains("export SETTINGS_REDIS_ENABLED=true"));
}

#[test]
fn test_write_without_data() {
    let settings = LazySettings::new();
    let loader = enabled_loader();

    let err = settings.write_to(&loader, None).unwrap_err();
    assert!(matches!(err, ConfigError::MissingArgument(_)));
    assert!(err.to_string().contains("Data must be provided"));
}

#[test]
fn test_write_and_load_with_key() {
    let settings = LazySettings::new();
    let loader = enabled_loader();

    settings
        .write_to(&loader, Some(&data("SECRET", json!("redis_works_with_docker"))))
        .unwrap();
    let loaded = settings.load_from(&loader, Some("SECRET")).unwrap();

    assert_eq!(loaded, Some(json!("redis_works_with_docker")));
    assert_eq!(
        settings.get("SECRET").unwrap(),
        Some(json!("redis_works_with_docker"))
    );
}

#[test]
fn test_write_and_load_without_key() {
    let settings = LazySettings::new();
    let loader = enabled_loader();

    settings
        .write_to(&loader, Some(&data("SECRET", json!("redis_works_perfectly"))))
        .unwrap();
    assert_eq!(settings.load_from(&loader, None).unwrap(), None);

    assert_eq!(
        settings.get("SECRET").unwrap(),
        Some(json!("redis_works_perfectly"))
    );
}

#[test]
fn test_structured_values_round_trip() {
    let settings = LazySettings::new();
    let loader = enabled_loader();

    let mut payload = SettingsMap::new();
    payload.insert("database".to_string(), json!({"url": "postgres://db", "pool": 5}));
    payload.insert("features".to_string(), json!(["a", "b"]));
    payload.insert("debug".to_string(), json!(false));
    settings.write_to(&loader, Some(&payload)).unwrap();
    settings.load_from(&loader, None).unwrap();

    assert_eq!(settings.get_as::<u32>("database.pool").unwrap(), Some(5));
    assert_eq!(settings.get("FEATURES").unwrap(), Some(json!(["a", "b"])));
    assert_eq!(settings.get("DEBUG").unwrap(), Some(json!(false)));
}

#[test]
fn test_delete_from_store() {
    let settings = LazySettings::new();
    let loader = enabled_loader();

    settings
        .write_to(&loader, Some(&data("OTHER_SECRET", json!("redis_works"))))
        .unwrap();
    settings.load_from(&loader, None).unwrap();
    assert_eq!(
        settings.get("OTHER_SECRET").unwrap(),
        Some(json!("redis_works"))
    );

    settings.delete_from(&loader, Some("OTHER_SECRET")).unwrap();
    assert_eq!(settings.get("OTHER_SECRET").unwrap(), None);
    assert_eq!(settings.load_from(&loader, Some("OTHER_SECRET")).unwrap(), None);
    assert_eq!(settings.get("OTHER_SECRET").unwrap(), None);

    // Deleting again is not an error
    settings.delete_from(&loader, Some("OTHER_SECRET")).unwrap();
}

#[test]
fn test_delete_all_from_store() {
    let settings = LazySettings::new();
    let loader = enabled_loader();

    // Empty namespace first
    settings.delete_from(&loader, None).unwrap();
    assert_eq!(settings.load_from(&loader, Some("OTHER_SECRET")).unwrap(), None);

    settings
        .write_to(&loader, Some(&data("OTHER_SECRET", json!("x"))))
        .unwrap();
    settings.delete_from(&loader, None).unwrap();
    assert_eq!(settings.load_from(&loader, Some("OTHER_SECRET")).unwrap(), None);
    assert!(loader.store().namespaces().is_empty());
}

#[test]
fn test_written_values_are_visible_without_load() {
    let settings = LazySettings::new();
    let loader = enabled_loader();

    settings
        .write_to(&loader, Some(&data("secret", json!("redis_works"))))
        .unwrap();

    assert_eq!(settings.get("SECRET").unwrap(), Some(json!("redis_works")));
    let snapshot = settings.snapshot().unwrap();
    let provenance = snapshot.provenance("SECRET").unwrap();
    assert_eq!(provenance.loader, "memory:SETTINGS");
    assert_eq!(provenance.env.as_deref(), Some("DEVELOPMENT"));
}

#[test]
fn test_rejected_write_leaves_settings_untouched() {
    let settings = LazySettings::new();
    let loader = StoreLoader::new(StoreConfig::default(), MemoryStore::new());

    assert!(settings
        .write_to(&loader, Some(&data("SECRET", json!("x"))))
        .is_err());
    assert_eq!(settings.get("SECRET").unwrap(), None);
}

#[test]
fn test_delete_all_keeps_values_from_other_sources() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("settings.json");
    fs::write(&config_path, r#"{"name": "from-file"}"#).unwrap();

    let settings = LazySettings::builder().with_file(&config_path).build();
    let loader = enabled_loader();
    settings
        .write_to(&loader, Some(&data("SECRET", json!("s3cr3t"))))
        .unwrap();
    settings.set("DEBUG", json!(true)).unwrap();

    settings.delete_from(&loader, None).unwrap();

    assert_eq!(settings.get("SECRET").unwrap(), None);
    assert_eq!(settings.get("NAME").unwrap(), Some(json!("from-file")));
    assert_eq!(settings.get("DEBUG").unwrap(), Some(json!(true)));
}

#[test]
fn test_store_in_pipeline_overrides_files() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("settings.yaml");
    fs::write(&config_path, "name: from-file\nport: 8080\n").unwrap();

    let store = MemoryStore::new();
    let writer = StoreLoader::new(StoreConfig::enabled(), store.clone());
    writer
        .write_env("production", Some(&data("NAME", json!("from-store"))))
        .unwrap();
    writer
        .write_env(GLOBAL_ENV, Some(&data("REGION", json!("eu-west-1"))))
        .unwrap();

    let settings = LazySettings::builder()
        .with_file(&config_path)
        .with_source(StoreLoader::new(StoreConfig::enabled(), store))
        .with_environment("production")
        .build();

    assert_eq!(settings.get("NAME").unwrap(), Some(json!("from-store")));
    assert_eq!(settings.get("PORT").unwrap(), Some(json!(8080)));
    assert_eq!(settings.get("REGION").unwrap(), Some(json!("eu-west-1")));

    let snapshot = settings.snapshot().unwrap();
    let provenance = snapshot.provenance("NAME").unwrap();
    assert_eq!(provenance.loader, "memory:SETTINGS");
    assert_eq!(provenance.env.as_deref(), Some("PRODUCTION"));
}

#[test]
fn test_disabled_store_in_pipeline_fails_setup() {
    let settings = LazySettings::builder()
        .with_source(StoreLoader::new(StoreConfig::default(), MemoryStore::new()))
        .build();

    let err = settings.setup().unwrap_err();
    assert!(err.to_string().contains("export SETTINGS_REDIS_ENABLED=true"));
    assert!(!settings.is_configured());
}

#[test]
fn test_prefixes_partition_the_store() {
    let store = MemoryStore::new();
    let app_a = StoreLoader::new(StoreConfig::enabled().with_prefix("app_a"), store.clone());
    let app_b = StoreLoader::new(StoreConfig::enabled().with_prefix("app_b"), store.clone());
    let settings = LazySettings::new();

    settings.write_to(&app_a, Some(&data("TOKEN", json!("a")))).unwrap();
    assert_eq!(settings.load_from(&app_b, Some("TOKEN")).unwrap(), None);
    assert_eq!(
        store.get("APP_A:DEVELOPMENT", "TOKEN").unwrap(),
        Some("\"a\"".to_string())
    );
}

proptest! {
    #[test]
    fn prop_environments_are_isolated(
        key in "[A-Z][A-Z0-9_]{0,12}",
        value in "[a-zA-Z0-9 ]{0,24}",
        env_a in "[a-z]{3,8}",
        env_b in "[a-z]{3,8}",
    ) {
        prop_assume!(env_a != env_b);
        prop_assume!(env_a != "global" && env_b != "global");

        let store = MemoryStore::new();
        let loader = StoreLoader::new(StoreConfig::enabled(), store);
        let writer = LazySettings::builder().with_environment(env_a.as_str()).build();
        let reader = LazySettings::builder().with_environment(env_b.as_str()).build();

        writer.write_to(&loader, Some(&data(&key, json!(value.clone())))).unwrap();

        prop_assert_eq!(reader.load_from(&loader, Some(key.as_str())).unwrap(), None);
        reader.load_from(&loader, None).unwrap();
        prop_assert!(!reader.contains(&key).unwrap());

        prop_assert_eq!(writer.load_from(&loader, Some(key.as_str())).unwrap(), Some(json!(value)));
    }
}

#[cfg(feature = "redis")]
#[test]
#[ignore] // Requires a Redis server on localhost:6379
fn test_live_redis_round_trip() {
    use lazy_settings::store::RedisStore;

    let config = StoreConfig::enabled().with_prefix("lazy_settings_test");
    let loader = StoreLoader::new(config.clone(), RedisStore::connect(&config).unwrap());
    let settings = LazySettings::new();

    settings.delete_from(&loader, None).unwrap();
    settings
        .write_to(&loader, Some(&data("SECRET", json!("redis_works"))))
        .unwrap();
    assert_eq!(
        settings.load_from(&loader, Some("SECRET")).unwrap(),
        Some(json!("redis_works"))
    );
    settings.delete_from(&loader, None).unwrap();
    assert_eq!(settings.load_from(&loader, Some("SECRET")).unwrap(), None);
}
