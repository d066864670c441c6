use bdg_config::{
    load_layered_yaml, load_layered_yaml_from_strings, report_unused_keys, AppConfig,
    UnusedKeyPolicy, UnusedKeyReport, API_URL_ENV,
};

const BASE_YAML: &str = r#"
api:
  base_url: "http://bodega.local/api/"
  access_token_env: "BODEGA_ACCESS_TOKEN"
  refresh_token_env: "BODEGA_REFRESH_TOKEN"
  timeout_secs: 20
display:
  timezone: "America/Santiago"
  datetime_format: "%d-%m-%Y %H:%M"
export:
  root: "exports"
"#;

const BASE_YAML_REORDERED: &str = r#"
export:
  root: "exports"
display:
  datetime_format: "%d-%m-%Y %H:%M"
  timezone: "America/Santiago"
api:
  timeout_secs: 20
  refresh_token_env: "BODEGA_REFRESH_TOKEN"
  access_token_env: "BODEGA_ACCESS_TOKEN"
  base_url: "http://bodega.local/api/"
"#;

const OVERLAY_YAML: &str = r#"
api:
  base_url: "https://inventario.example.cl/api"
display:
  timezone: "UTC"
"#;

#[test]
fn key_order_does_not_change_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML_REORDERED]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
    assert_eq!(a.canonical_json, b.canonical_json);
    assert_eq!(a.config_hash.len(), 64);
}

#[test]
fn overlay_overrides_and_changes_hash() {
    let base = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let merged = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();
    assert_ne!(base.config_hash, merged.config_hash);

    let cfg = AppConfig::from_config_json(&merged.config_json).unwrap();
    assert_eq!(cfg.api_base_url, "https://inventario.example.cl/api/");
    assert_eq!(cfg.timezone, "UTC");
    // untouched by the overlay
    assert_eq!(cfg.timeout_secs, 20);
    assert_eq!(cfg.datetime_format, "%d-%m-%Y %H:%M");
}

#[test]
fn missing_keys_fall_back_to_defaults() {
    let loaded = load_layered_yaml_from_strings(&["display:\n  timezone: UTC\n"]).unwrap();
    let cfg = AppConfig::from_config_json(&loaded.config_json).unwrap();
    assert_eq!(
        cfg,
        AppConfig {
            timezone: "UTC".to_string(),
            ..AppConfig::default()
        }
    );
}

#[test]
fn wrong_types_are_rejected() {
    let loaded = load_layered_yaml_from_strings(&["api:\n  timeout_secs: soon\n"]).unwrap();
    let err = AppConfig::from_config_json(&loaded.config_json).unwrap_err();
    assert!(err.to_string().contains("/api/timeout_secs"));
}

#[test]
fn token_literals_are_refused() {
    let jwt = "api:\n  access_token_env: \"eyJhbGciOiJIUzI1NiJ9.eyJ1c2VyIjoxfQ.sig\"\n";
    let err = load_layered_yaml_from_strings(&[jwt]).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("CONFIG_SECRET_DETECTED"));
    assert!(msg.contains("/api/access_token_env"));
    assert!(!msg.contains("eyJhbGci"));

    let bearer = "headers:\n  - \"Bearer 0123456789abcdef\"\n";
    assert!(load_layered_yaml_from_strings(&[bearer]).is_err());
}

#[test]
fn unused_keys_warn_or_fail() {
    let extra = "api:\n  retries: 3\nlegacy:\n  theme: dark\n";
    let loaded = load_layered_yaml_from_strings(&[BASE_YAML, extra]).unwrap();

    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn).unwrap();
    assert_eq!(
        report.unused_leaf_pointers,
        vec!["/api/retries".to_string(), "/legacy/theme".to_string()]
    );
    assert!(report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).is_err());

    let clean = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let report = report_unused_keys(&clean.config_json, UnusedKeyPolicy::Fail).unwrap();
    assert!(report.is_clean());
    assert_eq!(
        report,
        UnusedKeyReport {
            unused_leaf_pointers: Vec::new()
        }
    );
}

#[test]
fn env_override_replaces_base_url() {
    let cfg = AppConfig::default().with_env_overrides(|name| {
        (name == API_URL_ENV).then(|| "http://10.0.0.5:8000/api".to_string())
    });
    assert_eq!(cfg.api_base_url, "http://10.0.0.5:8000/api/");

    let unchanged = AppConfig::default().with_env_overrides(|_| Some("  ".to_string()));
    assert_eq!(unchanged, AppConfig::default());
}

#[test]
fn files_load_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("base.yaml");
    let local = dir.path().join("local.yaml");
    std::fs::write(&base, BASE_YAML).unwrap();
    std::fs::write(&local, OVERLAY_YAML).unwrap();

    let from_files = load_layered_yaml(&[&base, &local]).unwrap();
    let from_strings = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();
    assert_eq!(from_files.config_hash, from_strings.config_hash);

    assert!(load_layered_yaml(&[dir.path().join("missing.yaml")]).is_err());
}
