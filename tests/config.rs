// tests/config.rs
use news_aggregator::registry::{SourceRegistry, StaticRegistry};
use news_aggregator::AppConfig;
use std::path::Path;
use std::{env, fs};

const ENV_KEYS: [&str; 6] = [
    "APP_CONFIG_PATH",
    "ELASTIC_URL",
    "ELASTIC_USERNAME",
    "ELASTIC_PASSWORD",
    "HARVEST_BATCH_SIZE",
    "HARVEST_FRESH_WINDOW_MINS",
];

fn clear_env() {
    for k in ENV_KEYS {
        env::remove_var(k);
    }
}

#[serial_test::serial]
#[test]
fn default_uses_env_path_then_config_dir_then_builtins() {
    clear_env();
    // isolate CWD so the repo's own config/ is not picked up
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();

    // 1) nothing on disk -> built-in defaults
    let cfg = AppConfig::load_default().unwrap();
    assert_eq!(cfg.store.url, "http://localhost:9200");
    assert_eq!(cfg.harvest.batch_size, 8);

    // 2) ./config/app.toml
    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(
        tmp.path().join("config/app.toml"),
        r#"
[store]
url = "http://search.internal:9200"

[harvest]
batch_size = 4
"#,
    )
    .unwrap();
    let cfg = AppConfig::load_default().unwrap();
    assert_eq!(cfg.store.url, "http://search.internal:9200");
    assert_eq!(cfg.harvest.batch_size, 4);
    assert_eq!(cfg.harvest.fresh_window_mins, 20);

    // 3) APP_CONFIG_PATH wins over ./config
    let explicit = tmp.path().join("explicit.toml");
    fs::write(&explicit, "[harvest]\nbatch_size = 2\n").unwrap();
    env::set_var("APP_CONFIG_PATH", explicit.display().to_string());
    let cfg = AppConfig::load_default().unwrap();
    assert_eq!(cfg.harvest.batch_size, 2);

    // 4) ... and must point at something
    env::set_var("APP_CONFIG_PATH", tmp.path().join("missing.toml").display().to_string());
    let err = AppConfig::load_default().unwrap_err();
    assert!(err.to_string().contains("non-existent"), "{err}");

    clear_env();
    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn env_overrides_file_values() {
    clear_env();
    let tmp = tempfile::tempdir().unwrap();
    let p = tmp.path().join("app.toml");
    fs::write(&p, "[harvest]\nbatch_size = 4\nfresh_window_mins = 30\n").unwrap();

    env::set_var("ELASTIC_URL", "https://es.example.test");
    env::set_var("ELASTIC_USERNAME", "elastic");
    env::set_var("ELASTIC_PASSWORD", "changeme");
    env::set_var("HARVEST_BATCH_SIZE", "12");
    let cfg = AppConfig::load_from(&p).unwrap();
    assert_eq!(cfg.store.url, "https://es.example.test");
    assert_eq!(cfg.store.username.as_deref(), Some("elastic"));
    assert_eq!(cfg.store.password.as_deref(), Some("changeme"));
    assert_eq!(cfg.harvest.batch_size, 12);
    assert_eq!(cfg.harvest.fresh_window_mins, 30);

    // blank values are ignored
    env::set_var("HARVEST_BATCH_SIZE", "  ");
    assert_eq!(AppConfig::load_from(&p).unwrap().harvest.batch_size, 4);

    clear_env();
}

#[serial_test::serial]
#[test]
fn bad_env_values_are_errors() {
    clear_env();
    let tmp = tempfile::tempdir().unwrap();
    let p = tmp.path().join("app.toml");
    fs::write(&p, "").unwrap();

    env::set_var("HARVEST_BATCH_SIZE", "eight");
    assert!(AppConfig::load_from(&p).is_err());

    env::set_var("HARVEST_BATCH_SIZE", "0");
    let err = AppConfig::load_from(&p).unwrap_err();
    assert!(err.to_string().contains("batch_size"), "{err}");

    env::remove_var("HARVEST_BATCH_SIZE");
    env::set_var("HARVEST_FRESH_WINDOW_MINS", "-5");
    assert!(AppConfig::load_from(&p).is_err());

    clear_env();
}

#[tokio::test]
async fn shipped_sample_files_load() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let cfg = AppConfig::from_toml_str(&fs::read_to_string(root.join("config/app.toml")).unwrap())
        .unwrap();
    assert!(cfg.harvest.batch_size > 0);

    let registry = StaticRegistry::from_path(&root.join(&cfg.registry.path)).unwrap();
    assert!(registry.count().await.unwrap() > 0);
    let first = registry.find_batch_with_publisher(0, 1).await.unwrap();
    assert_eq!(first.len(), 1);
    assert!(!first[0].publisher.name.is_empty());
}
