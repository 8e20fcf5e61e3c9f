//! Runtime configuration for a digest run.
//!
//! A [`DigestConfig`] is built once at start-up (by the CLI loader or a test)
//! and passed explicitly into every component. All sections deserialize from
//! YAML with defaults, so a config file only needs the keys it overrides.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::DigestError;
use crate::template::TemplateKind;

pub const DEFAULT_TRENDING_URL: &str = "https://github.com/trending";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_SENDER: &str = "GitHub Daily <onboarding@resend.dev>";
pub const DEFAULT_SUBJECT_PREFIX: &str = "GitHub Trending Daily";

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    pub listing: ListingConfig,
    pub enrich: EnrichConfig,
    pub generation: GenerationConfig,
    pub delivery: DeliveryConfig,
}

impl DigestConfig {
    pub fn trace_loaded(&self) {
        info!(
            listing_url = %self.listing.listing_url(),
            template = %self.generation.template,
            enrich_enabled = self.enrich.enabled,
            max_enrich = self.enrich.max_count,
            recipients = self.delivery.recipients.len(),
            "Loaded DigestConfig"
        );
        debug!(?self, "DigestConfig loaded (full debug)");
    }

    /// Checks everything that can be checked before touching the network.
    /// Unknown template names are not an error here: they fall back to the
    /// default template when the run starts.
    pub fn validate(&self) -> Result<(), DigestError> {
        self.validate_listing()?;
        if self.generation.model.trim().is_empty() {
            return Err(DigestError::ConfigInvalid("generation model is empty".into()));
        }
        if self.delivery.recipients.is_empty() {
            return Err(DigestError::ConfigInvalid(
                "at least one recipient is required".into(),
            ));
        }
        if let Some(bad) = self
            .delivery
            .recipients
            .iter()
            .find(|r| !EMAIL.is_match(r))
        {
            return Err(DigestError::ConfigInvalid(format!(
                "recipient `{bad}` is not a valid email address"
            )));
        }
        Ok(())
    }

    /// The subset of [`validate`](Self::validate) needed to fetch and format
    /// the listing without generating or sending anything.
    pub fn validate_listing(&self) -> Result<(), DigestError> {
        if self.listing.base_url.trim().is_empty() {
            return Err(DigestError::ConfigInvalid("listing base_url is empty".into()));
        }
        if let EnrichMode::Grouped { size: 0 } = self.enrich.mode {
            return Err(DigestError::ConfigInvalid(
                "grouped enrichment needs a group size of at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Whether the detail enrichment stage should run for this config.
    pub fn enrichment_required(&self) -> bool {
        self.enrich.enabled
            && TemplateKind::resolve(&self.generation.template).requires_enrichment()
    }
}

/// Time window of the trending listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Since {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Since {
    pub fn as_str(&self) -> &'static str {
        match self {
            Since::Daily => "daily",
            Since::Weekly => "weekly",
            Since::Monthly => "monthly",
        }
    }
}

impl std::str::FromStr for Since {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Since::Daily),
            "weekly" => Ok(Since::Weekly),
            "monthly" => Ok(Since::Monthly),
            other => Err(DigestError::ConfigInvalid(format!(
                "unsupported time window `{other}` (expected daily, weekly or monthly)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub base_url: String,
    /// Optional language path segment, e.g. `rust`.
    pub language: Option<String>,
    pub since: Since,
    pub timeout_ms: u64,
    pub selectors: ListingSelectors,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_TRENDING_URL.to_string(),
            language: None,
            since: Since::Daily,
            timeout_ms: 10_000,
            selectors: ListingSelectors::default(),
        }
    }
}

impl ListingConfig {
    pub fn listing_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        match self.language.as_deref().map(str::trim) {
            Some(lang) if !lang.is_empty() => {
                format!("{}/{}?since={}", base, lang, self.since.as_str())
            }
            _ => format!("{}?since={}", base, self.since.as_str()),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// CSS selectors used against the listing markup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingSelectors {
    pub row: String,
    pub name: String,
    pub description: String,
    pub language: String,
    pub stars: String,
    pub today_stars: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            row: "article.Box-row".into(),
            name: "h2 a".into(),
            description: "p".into(),
            language: r#"[itemprop="programmingLanguage"]"#.into(),
            stars: r#"a[href$="/stargazers"]"#.into(),
            today_stars: ".float-sm-right".into(),
        }
    }
}

/// How the enrichment prefix is walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EnrichMode {
    /// One project at a time with a delay between items.
    #[default]
    Sequential,
    /// Fixed-size groups fetched concurrently, with a delay between groups.
    Grouped { size: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichConfig {
    pub enabled: bool,
    /// Number of leading records to enrich; 0 means all of them.
    pub max_count: usize,
    pub mode: EnrichMode,
    pub delay_ms: u64,
    pub timeout_ms: u64,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_count: 10,
            mode: EnrichMode::Sequential,
            delay_ms: 500,
            timeout_ms: 10_000,
        }
    }
}

impl EnrichConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub model: String,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    /// Template name as written in config or env (`htmlReport`, `enhanced_report`, ...).
    pub template: String,
    pub request_timeout_ms: u64,
    pub api_base_url: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_attempts: 3,
            retry_delay_ms: 2_000,
            template: TemplateKind::default().name().to_string(),
            request_timeout_ms: 120_000,
            api_base_url: "https://generativelanguage.googleapis.com".to_string(),
        }
    }
}

impl GenerationConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    pub from: String,
    pub recipients: Vec<String>,
    pub subject_prefix: String,
    pub api_base_url: String,
    pub request_timeout_ms: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            from: DEFAULT_SENDER.to_string(),
            recipients: Vec::new(),
            subject_prefix: DEFAULT_SUBJECT_PREFIX.to_string(),
            api_base_url: "https://api.resend.com".to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(recipients: &[&str]) -> DigestConfig {
        let mut config = DigestConfig::default();
        config.delivery.recipients = recipients.iter().map(|r| r.to_string()).collect();
        config
    }

    #[test]
    fn listing_url_without_language() {
        let listing = ListingConfig::default();
        assert_eq!(listing.listing_url(), "https://github.com/trending?since=daily");
    }

    #[test]
    fn listing_url_with_language_and_window() {
        let listing = ListingConfig {
            language: Some("rust".into()),
            since: Since::Weekly,
            base_url: "https://github.com/trending/".into(),
            ..ListingConfig::default()
        };
        assert_eq!(
            listing.listing_url(),
            "https://github.com/trending/rust?since=weekly"
        );
    }

    #[test]
    fn since_parses_case_insensitively() {
        assert_eq!("Monthly".parse::<Since>().unwrap(), Since::Monthly);
        assert!("yearly".parse::<Since>().is_err());
    }

    #[test]
    fn validate_accepts_well_formed_recipients() {
        assert!(config_with(&["a@example.com", "b@example.org"]).validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_recipients() {
        let err = config_with(&[]).validate().unwrap_err();
        assert!(matches!(err, DigestError::ConfigInvalid(_)));
    }

    #[test]
    fn validate_rejects_malformed_recipient() {
        let err = config_with(&["a@example.com", "not-an-email"])
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("not-an-email"));
    }

    #[test]
    fn validate_rejects_empty_group_size() {
        let mut config = config_with(&["a@example.com"]);
        config.enrich.mode = EnrichMode::Grouped { size: 0 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn enrichment_depends_on_template_and_flag() {
        let mut config = config_with(&["a@example.com"]);
        assert!(!config.enrichment_required(), "default template needs no detail");

        config.generation.template = "enhancedReport".into();
        assert!(config.enrichment_required());

        config.enrich.enabled = false;
        assert!(!config.enrichment_required());
    }

    #[test]
    fn deserializes_partial_yaml_like_json() {
        let config: DigestConfig = serde_json::from_str(
            r#"{"enrich": {"mode": {"kind": "grouped", "size": 3}}, "generation": {"max_attempts": 5}}"#,
        )
        .unwrap();
        assert_eq!(config.enrich.mode, EnrichMode::Grouped { size: 3 });
        assert_eq!(config.generation.max_attempts, 5);
        assert_eq!(config.generation.model, DEFAULT_MODEL);
        assert_eq!(config.listing.since, Since::Daily);
    }
}
