//! # contract: data model and backend interfaces of the digest pipeline
//!
//! Plain data types that flow between stages ([`ProjectRecord`],
//! [`RepositoryDetail`], [`Report`], [`DetailOutcome`], [`DeliveryResult`]) and
//! the three traits behind which every external dependency sits:
//!
//! - [`PageFetcher`]: HTML pages (listing and per-project pages)
//! - [`TextGenerator`]: the generative-text backend
//! - [`MailBackend`]: the email delivery backend
//!
//! ## Mocking & Testing
//! The traits are annotated for `mockall` so integration tests (and
//! downstream crates, via the default `test-export-mocks` feature) get
//! deterministic mocks.

use async_trait::async_trait;
use mockall::automock;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::error::{BackendError, DigestError};
use crate::template::TemplateKind;

pub const UNKNOWN_PROJECT: &str = "unknown project";
pub const NO_DESCRIPTION: &str = "no description";
pub const UNSPECIFIED_LANGUAGE: &str = "unspecified";
pub const ZERO_STARS: &str = "0";
pub const UNKNOWN: &str = "unknown";

/// One trending entry after validation and normalisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectRecord {
    pub name: String,
    pub url: String,
    pub description: String,
    pub language: String,
    pub stars: String,
    pub today_stars: String,
    /// Present only when a detail fetch succeeded for this project.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<RepositoryDetail>,
}

impl ProjectRecord {
    /// Extends the record with detail data, consuming the original.
    pub fn with_detail(self, detail: RepositoryDetail) -> Self {
        Self {
            detail: Some(detail),
            ..self
        }
    }

    pub fn is_enriched(&self) -> bool {
        self.detail.is_some()
    }
}

/// Contributor count scraped from a project page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContributorCount {
    Known(u32),
    #[default]
    Unknown,
}

impl fmt::Display for ContributorCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContributorCount::Known(n) => write!(f, "{n}"),
            ContributorCount::Unknown => f.write_str(UNKNOWN),
        }
    }
}

impl Serialize for ContributorCount {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ContributorCount::Known(n) => serializer.serialize_u32(*n),
            ContributorCount::Unknown => serializer.serialize_str(UNKNOWN),
        }
    }
}

/// Extra data read from a project's own page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryDetail {
    pub full_name: String,
    pub description: String,
    pub topics: Vec<String>,
    pub is_fork: bool,
    pub is_mirror: bool,
    pub is_archived: bool,
    pub readme_excerpt: String,
    pub features: Vec<String>,
    pub last_updated: String,
    pub contributors: ContributorCount,
}

/// Generated HTML report, alive between generation and delivery.
#[derive(Debug, Clone)]
pub struct Report {
    pub html: String,
    pub template: TemplateKind,
    pub project_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailBody {
    Html(String),
    Text(String),
}

/// One outgoing message as handed to a [`MailBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: EmailBody,
}

/// Which message reached the recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeliveryPath {
    Html,
    PlainTextFallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub id: String,
    pub path: DeliveryPath,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { id: String, path: DeliveryPath },
    Failed { error: String },
}

/// Per-recipient result of a batch send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResult {
    pub recipient: String,
    pub outcome: DeliveryOutcome,
}

impl DeliveryResult {
    pub fn success(&self) -> bool {
        matches!(self.outcome, DeliveryOutcome::Delivered { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailResult {
    Attached,
    Failed { error: String },
}

/// Per-project result of a detail fetch during enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailOutcome {
    pub url: String,
    pub result: DetailResult,
}

impl DetailOutcome {
    pub fn attached(&self) -> bool {
        matches!(self.result, DetailResult::Attached)
    }
}

/// Fetches an HTML page within a time limit.
///
/// Implementations map a missing response to [`DigestError::FetchTimeout`],
/// a non-success status to [`DigestError::FetchHttpError`] and anything else
/// to [`DigestError::FetchTransport`].
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str, timeout: Duration) -> Result<String, DigestError>;
}

/// Generative-text backend. One call is one independent request.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Returns the generated text for `prompt`; may be empty.
    async fn generate_text(&self, prompt: &str) -> Result<String, BackendError>;
}

/// Email delivery backend.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait MailBackend: Send + Sync {
    /// Sends one message and returns the backend's delivery id.
    async fn send_email(&self, message: &EmailMessage) -> Result<String, BackendError>;
}
