use serial_test::serial;
use std::env;
use std::fs::write;
use tempfile::NamedTempFile;

use trending_digest::load_config::{
    load_config, ApiKeys, Overrides, ENV_ENABLE_ENRICHMENT, ENV_GEMINI_API_KEY,
    ENV_MAX_ENRICH_COUNT, ENV_RECIPIENT_EMAIL, ENV_REPORT_TYPE, ENV_RESEND_API_KEY,
};
use trending_digest_core::config::{EnrichMode, Since, DEFAULT_MODEL};

fn clear_env() {
    for key in [
        ENV_GEMINI_API_KEY,
        ENV_RESEND_API_KEY,
        ENV_RECIPIENT_EMAIL,
        ENV_REPORT_TYPE,
        ENV_ENABLE_ENRICHMENT,
        ENV_MAX_ENRICH_COUNT,
    ] {
        env::remove_var(key);
    }
}

fn yaml_file(content: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("temp file");
    write(file.path(), content).expect("write config");
    file
}

#[test]
#[serial]
fn defaults_without_file_or_env() {
    clear_env();
    let config = load_config(None, &Overrides::default()).expect("defaults load");
    assert_eq!(config.generation.model, DEFAULT_MODEL);
    assert_eq!(config.generation.max_attempts, 3);
    assert_eq!(config.generation.retry_delay_ms, 2_000);
    assert_eq!(config.listing.timeout_ms, 10_000);
    assert!(config.delivery.recipients.is_empty());
    assert!(config.validate().is_err(), "no recipients configured");
}

#[test]
#[serial]
fn yaml_then_env_then_flags() {
    clear_env();
    let file = yaml_file(
        r#"
listing:
  language: python
  since: monthly
enrich:
  max_count: 4
  mode:
    kind: grouped
    size: 3
generation:
  template: htmlReport
  max_attempts: 5
delivery:
  recipients: ["file@example.com"]
"#,
    );
    env::set_var(ENV_RECIPIENT_EMAIL, "a@example.com, b@example.com");
    env::set_var(ENV_REPORT_TYPE, "enhancedReport");
    env::set_var(ENV_MAX_ENRICH_COUNT, "6");

    let config = load_config(
        Some(file.path()),
        &Overrides {
            language: Some("rust".into()),
            ..Overrides::default()
        },
    )
    .expect("config should load");

    assert_eq!(config.listing.language.as_deref(), Some("rust"));
    assert_eq!(config.listing.since, Since::Monthly);
    assert_eq!(config.enrich.mode, EnrichMode::Grouped { size: 3 });
    assert_eq!(config.enrich.max_count, 6);
    assert_eq!(config.generation.max_attempts, 5);
    assert_eq!(config.generation.template, "enhancedReport");
    assert_eq!(
        config.delivery.recipients,
        vec!["a@example.com".to_string(), "b@example.com".to_string()]
    );
    assert!(config.validate().is_ok());
    assert!(config.enrichment_required());
    clear_env();
}

#[test]
#[serial]
fn enrichment_can_be_switched_off_from_env() {
    clear_env();
    env::set_var(ENV_ENABLE_ENRICHMENT, "false");
    env::set_var(ENV_REPORT_TYPE, "insightfulReport");
    let config = load_config(None, &Overrides::default()).unwrap();
    assert!(!config.enrich.enabled);
    assert!(!config.enrichment_required());
    clear_env();
}

#[test]
#[serial]
fn invalid_recipient_fails_validation() {
    clear_env();
    env::set_var(ENV_RECIPIENT_EMAIL, "ok@example.com,broken@");
    let config = load_config(None, &Overrides::default()).unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("broken@"));
    clear_env();
}

#[test]
#[serial]
fn malformed_max_enrich_is_an_error() {
    clear_env();
    env::set_var(ENV_MAX_ENRICH_COUNT, "lots");
    let err = load_config(None, &Overrides::default()).unwrap_err();
    assert!(err.to_string().contains(ENV_MAX_ENRICH_COUNT));
    clear_env();
}

#[test]
#[serial]
fn unreadable_or_malformed_file_is_reported() {
    clear_env();
    let missing = std::path::Path::new("/definitely/not/here.yaml");
    assert!(load_config(Some(missing), &Overrides::default()).is_err());

    let file = yaml_file("listing: [not, a, map]");
    let err = load_config(Some(file.path()), &Overrides::default()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config YAML"));
}

#[test]
#[serial]
fn api_keys_are_required() {
    clear_env();
    env::set_var(ENV_GEMINI_API_KEY, "g-key");
    let err = ApiKeys::from_env().unwrap_err();
    assert!(err.to_string().contains(ENV_RESEND_API_KEY));

    env::set_var(ENV_RESEND_API_KEY, "r-key");
    let keys = ApiKeys::from_env().unwrap();
    assert_eq!(keys.gemini, "g-key");
    assert_eq!(keys.resend, "r-key");
    clear_env();
}
