//! Listing statistics for `preview`.
//!
//! Counts how many records carry real values rather than sentinels, how the
//! listing splits by language, how many detail fetches failed, and roughly how
//! large the prompt is. The token figure is a chars / 4 estimate, not a
//! tokenizer count.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::contract::{
    DetailOutcome, ProjectRecord, NO_DESCRIPTION, UNKNOWN_PROJECT, UNSPECIFIED_LANGUAGE,
    ZERO_STARS,
};

/// Summary of a listing and the prompt built from it, shown by `preview`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingStats {
    pub projects: usize,
    pub enriched: usize,
    pub detail_failures: usize,
    /// Number of records whose field holds a real value rather than a sentinel.
    pub coverage: FieldCoverage,
    pub languages: BTreeMap<String, usize>,
    pub prompt_chars: usize,
    pub estimated_tokens: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FieldCoverage {
    pub name: usize,
    pub url: usize,
    pub description: usize,
    pub language: usize,
    pub stars: usize,
    pub today_stars: usize,
}

impl ListingStats {
    pub fn collect(records: &[ProjectRecord], details: &[DetailOutcome], prompt: &str) -> Self {
        let mut coverage = FieldCoverage::default();
        let mut languages = BTreeMap::new();
        for r in records {
            coverage.name += usize::from(r.name != UNKNOWN_PROJECT);
            coverage.url += usize::from(!r.url.is_empty());
            coverage.description += usize::from(r.description != NO_DESCRIPTION);
            coverage.language += usize::from(r.language != UNSPECIFIED_LANGUAGE);
            coverage.stars += usize::from(r.stars != ZERO_STARS);
            coverage.today_stars += usize::from(r.today_stars != ZERO_STARS);
            *languages.entry(r.language.clone()).or_insert(0) += 1;
        }
        let prompt_chars = prompt.chars().count();
        Self {
            projects: records.len(),
            enriched: records.iter().filter(|r| r.is_enriched()).count(),
            detail_failures: details.iter().filter(|d| !d.attached()).count(),
            coverage,
            languages,
            prompt_chars,
            estimated_tokens: prompt_chars.div_ceil(4),
        }
    }
}

impl fmt::Display for ListingStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.projects;
        let pct = |n: usize| if total == 0 { 0 } else { n * 100 / total };
        writeln!(
            f,
            "Projects: {} ({} enriched, {} detail fetches failed)",
            total, self.enriched, self.detail_failures
        )?;
        writeln!(f, "Field coverage:")?;
        for (field, n) in [
            ("name", self.coverage.name),
            ("url", self.coverage.url),
            ("description", self.coverage.description),
            ("language", self.coverage.language),
            ("stars", self.coverage.stars),
            ("today_stars", self.coverage.today_stars),
        ] {
            writeln!(f, "  {field}: {n}/{total} ({}%)", pct(n))?;
        }
        writeln!(f, "Languages:")?;
        let mut by_count: Vec<_> = self.languages.iter().collect();
        by_count.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (language, n) in by_count {
            writeln!(f, "  {language}: {n}")?;
        }
        writeln!(f, "Prompt length: {} chars", self.prompt_chars)?;
        write!(f, "Estimated tokens: {}", self.estimated_tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::DetailResult;

    fn record(language: &str, description: &str) -> ProjectRecord {
        ProjectRecord {
            name: "o / r".into(),
            url: "https://github.com/o/r".into(),
            description: description.into(),
            language: language.into(),
            stars: "10".into(),
            today_stars: ZERO_STARS.into(),
            detail: None,
        }
    }

    #[test]
    fn counts_coverage_and_languages() {
        let records = vec![
            record("Rust", "fast"),
            record("Rust", NO_DESCRIPTION),
            record(UNSPECIFIED_LANGUAGE, "thing"),
        ];
        let details = vec![
            DetailOutcome {
                url: "https://github.com/o/r".into(),
                result: DetailResult::Attached,
            },
            DetailOutcome {
                url: "https://github.com/o/s".into(),
                result: DetailResult::Failed {
                    error: "timed out".into(),
                },
            },
        ];
        let stats = ListingStats::collect(&records, &details, "abcdefghi");
        assert_eq!(stats.projects, 3);
        assert_eq!(stats.detail_failures, 1);
        assert_eq!(stats.coverage.description, 2);
        assert_eq!(stats.coverage.language, 2);
        assert_eq!(stats.coverage.today_stars, 0);
        assert_eq!(stats.languages.get("Rust"), Some(&2));
        assert_eq!(stats.prompt_chars, 9);
        assert_eq!(stats.estimated_tokens, 3);
    }

    #[test]
    fn display_lists_languages_by_count() {
        let records = vec![record("Go", "a"), record("Rust", "b"), record("Rust", "c")];
        let text = ListingStats::collect(&records, &[], "").to_string();
        let rust = text.find("Rust: 2").unwrap();
        let go = text.find("Go: 1").unwrap();
        assert!(rust < go);
        assert!(text.starts_with("Projects: 3 (0 enriched, 0 detail fetches failed)"));
        assert!(text.contains("description: 3/3 (100%)"));
        assert!(text.ends_with("Estimated tokens: 0"));
    }
}
