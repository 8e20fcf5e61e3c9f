//! Prompt template registry.
//!
//! The registry is a closed set: every name either maps to a [`TemplateKind`]
//! or is rejected by [`TemplateKind::parse`]. [`TemplateKind::resolve`] is the
//! lenient form used at run time and falls back to [`TemplateKind::HtmlReport`].

use serde::Serialize;
use std::fmt;
use tracing::warn;

use crate::error::DigestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TemplateKind {
    /// Compact daily report built from the listing alone.
    #[default]
    HtmlReport,
    /// Report that also uses per-project detail (topics, features, activity).
    EnhancedReport,
    /// Analytical report with cross-project trends; uses per-project detail.
    InsightfulReport,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 3] = [
        TemplateKind::HtmlReport,
        TemplateKind::EnhancedReport,
        TemplateKind::InsightfulReport,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TemplateKind::HtmlReport => "htmlReport",
            TemplateKind::EnhancedReport => "enhancedReport",
            TemplateKind::InsightfulReport => "insightfulReport",
        }
    }

    pub fn parse(name: &str) -> Result<Self, DigestError> {
        let key: String = name
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "htmlreport" | "html" | "" => Ok(TemplateKind::HtmlReport),
            "enhancedreport" | "enhanced" => Ok(TemplateKind::EnhancedReport),
            "insightfulreport" | "insightful" => Ok(TemplateKind::InsightfulReport),
            _ => Err(DigestError::UnknownTemplate(name.to_string())),
        }
    }

    pub fn resolve(name: &str) -> Self {
        match Self::parse(name) {
            Ok(kind) => kind,
            Err(e) => {
                warn!(
                    template = name,
                    error = %e,
                    fallback = TemplateKind::default().name(),
                    "Unknown report template, falling back to default"
                );
                TemplateKind::default()
            }
        }
    }

    pub fn requires_enrichment(&self) -> bool {
        matches!(
            self,
            TemplateKind::EnhancedReport | TemplateKind::InsightfulReport
        )
    }

    /// Embeds the formatted project text into this template's prompt.
    pub fn build_prompt(&self, projects_text: &str) -> String {
        let instructions = match self {
            TemplateKind::HtmlReport => HTML_REPORT,
            TemplateKind::EnhancedReport => ENHANCED_REPORT,
            TemplateKind::InsightfulReport => INSIGHTFUL_REPORT,
        };
        format!(
            "{PREAMBLE}\n\n[DATA]\n{projects_text}\n\n[REQUIREMENTS]\n{instructions}\n\n{EMAIL_RULES}"
        )
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const PREAMBLE: &str = "You are a senior developer and technical editor. \
Turn today's GitHub trending data below into a professional HTML newsletter.";

const HTML_REPORT: &str = "\
- One card per project, in ranking order, with a rank badge and the project name linked to its URL.
- For each project give a two or three sentence highlight of why it is trending, then its description, language and star figures.
- Close with a summary: number of projects, most starred project, fastest growing project, main technical areas.";

const ENHANCED_REPORT: &str = "\
- One card per project, in ranking order, with a rank badge and the project name linked to its URL.
- Where a DETAILS entry exists for a project, use its topics, features, activity and contributor count to explain what the project does and who it is for.
- Mark archived, forked or mirrored projects clearly.
- Close with a summary: number of projects, most starred project, fastest growing project, main technical areas.";

const INSIGHTFUL_REPORT: &str = "\
- Open with three to five cross-project trends visible in today's list, each backed by named projects.
- Then one card per project, in ranking order, combining listing data with any DETAILS entry (topics, features, activity, contributors).
- For each project add a short 'why it matters' paragraph aimed at practising engineers.
- Close with a watch list of the projects most likely to keep growing, with one line of reasoning each.";

const EMAIL_RULES: &str = "\
Output rules: a single complete HTML document, 600px wide, inline CSS only, \
web-safe fonts, no JavaScript, no media queries, no external assets. \
Return only the HTML.";
