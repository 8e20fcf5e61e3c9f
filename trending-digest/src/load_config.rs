//! `load_config`: builds a [`DigestConfig`] from its three layers.
//!
//! 1. An optional YAML file with tunables (never secrets). Missing keys take
//!    the defaults from the core crate.
//! 2. Environment variables (`RECIPIENT_EMAIL`, `REPORT_TYPE`,
//!    `ENABLE_ENRICHMENT`, `MAX_ENRICH_COUNT`).
//! 3. Command-line overrides.
//!
//! Validation is left to the caller so `preview` can run without recipients.
//! API keys are read separately through [`ApiKeys::from_env`].

use anyhow::{anyhow, Context, Result};
use std::env;
use std::fs;
use std::path::Path;
use tracing::{error, info, warn};

use trending_digest_core::config::{DigestConfig, Since};
use trending_digest_core::deliver::parse_recipients;

pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_RESEND_API_KEY: &str = "RESEND_API_KEY";
pub const ENV_RECIPIENT_EMAIL: &str = "RECIPIENT_EMAIL";
pub const ENV_REPORT_TYPE: &str = "REPORT_TYPE";
pub const ENV_ENABLE_ENRICHMENT: &str = "ENABLE_ENRICHMENT";
pub const ENV_MAX_ENRICH_COUNT: &str = "MAX_ENRICH_COUNT";

/// Values given on the command line; `None`/`false` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub language: Option<String>,
    pub since: Option<String>,
    pub template: Option<String>,
    pub no_enrich: bool,
    pub max_enrich: Option<usize>,
}

/// Secrets for the two HTTP backends.
#[derive(Clone)]
pub struct ApiKeys {
    pub gemini: String,
    pub resend: String,
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeys")
            .field("gemini", &"<redacted>")
            .field("resend", &"<redacted>")
            .finish()
    }
}

impl ApiKeys {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            gemini: required_env(ENV_GEMINI_API_KEY)?,
            resend: required_env(ENV_RESEND_API_KEY)?,
        })
    }
}

fn required_env(key: &str) -> Result<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => {
            error!(key, "Required environment variable is missing");
            Err(anyhow!("missing required environment variable {key}"))
        }
    }
}

pub fn load_config(path: Option<&Path>, overrides: &Overrides) -> Result<DigestConfig> {
    let mut config = match path {
        Some(path) => read_file(path)?,
        None => {
            info!("No config file given, starting from defaults");
            DigestConfig::default()
        }
    };
    apply_env(&mut config)?;
    apply_overrides(&mut config, overrides)?;
    config.trace_loaded();
    Ok(config)
}

fn read_file(path: &Path) -> Result<DigestConfig> {
    info!(config_path = ?path, "Loading configuration from file");
    let content = fs::read_to_string(path).map_err(|e| {
        error!(error = ?e, config_path = ?path, "Failed to read config file");
        anyhow!("Failed to read config file {:?}: {}", path, e)
    })?;
    // An empty file is a valid "all defaults" config.
    if content.trim().is_empty() {
        return Ok(DigestConfig::default());
    }
    serde_yaml::from_str(&content).map_err(|e| {
        error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
        anyhow!("Failed to parse config YAML {:?}: {e}", path)
    })
}

fn apply_env(config: &mut DigestConfig) -> Result<()> {
    if let Ok(raw) = env::var(ENV_RECIPIENT_EMAIL) {
        config.delivery.recipients = parse_recipients(&raw);
    }
    if let Ok(template) = env::var(ENV_REPORT_TYPE) {
        if !template.trim().is_empty() {
            config.generation.template = template.trim().to_string();
        }
    }
    if let Ok(raw) = env::var(ENV_ENABLE_ENRICHMENT) {
        config.enrich.enabled = Switch::from(raw.as_str()).into();
    }
    if let Ok(raw) = env::var(ENV_MAX_ENRICH_COUNT) {
        config.enrich.max_count = raw
            .trim()
            .parse()
            .with_context(|| {
                format!("{ENV_MAX_ENRICH_COUNT} must be a non-negative integer, got `{raw}`")
            })?;
    }
    Ok(())
}

fn apply_overrides(config: &mut DigestConfig, overrides: &Overrides) -> Result<()> {
    if let Some(language) = &overrides.language {
        config.listing.language = Some(language.clone());
    }
    if let Some(since) = &overrides.since {
        config.listing.since = since.parse::<Since>()?;
    }
    if let Some(template) = &overrides.template {
        config.generation.template = template.clone();
    }
    if overrides.no_enrich {
        config.enrich.enabled = false;
    }
    if let Some(max) = overrides.max_enrich {
        config.enrich.max_count = max;
    }
    Ok(())
}

/// On/off environment flag. Anything unrecognised counts as on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Switch {
    On,
    Off,
}

impl From<&str> for Switch {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "false" | "0" | "no" | "off" => Switch::Off,
            "true" | "1" | "yes" | "on" | "" => Switch::On,
            other => {
                warn!(value = other, "Unrecognised on/off value, treating as on");
                Switch::On
            }
        }
    }
}

impl From<Switch> for bool {
    fn from(s: Switch) -> bool {
        s == Switch::On
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switch_is_lenient() {
        assert_eq!(Switch::from("FALSE"), Switch::Off);
        assert_eq!(Switch::from(" off "), Switch::Off);
        assert_eq!(Switch::from("true"), Switch::On);
        assert_eq!(Switch::from("maybe"), Switch::On);
    }

    #[test]
    fn overrides_win_over_file_values() {
        let mut config = DigestConfig::default();
        config.enrich.max_count = 3;
        apply_overrides(
            &mut config,
            &Overrides {
                language: Some("rust".into()),
                since: Some("weekly".into()),
                template: Some("insightful".into()),
                no_enrich: true,
                max_enrich: Some(7),
            },
        )
        .unwrap();
        assert_eq!(config.listing.language.as_deref(), Some("rust"));
        assert_eq!(config.listing.since, Since::Weekly);
        assert_eq!(config.generation.template, "insightful");
        assert!(!config.enrich.enabled);
        assert_eq!(config.enrich.max_count, 7);
    }

    #[test]
    fn bad_window_override_is_rejected() {
        let mut config = DigestConfig::default();
        let err = apply_overrides(
            &mut config,
            &Overrides {
                since: Some("hourly".into()),
                ..Overrides::default()
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("hourly"));
    }

    #[test]
    fn api_keys_are_redacted_in_debug() {
        let keys = ApiKeys {
            gemini: "secret-g".into(),
            resend: "secret-r".into(),
        };
        let shown = format!("{keys:?}");
        assert!(!shown.contains("secret"));
    }
}
