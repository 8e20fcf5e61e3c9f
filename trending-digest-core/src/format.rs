//! Prompt text rendering. Pure functions, no I/O.

use crate::contract::ProjectRecord;

/// One numbered block per record, in input order, separated by blank lines.
pub fn format_projects(records: &[ProjectRecord]) -> String {
    records
        .iter()
        .enumerate()
        .map(|(i, p)| {
            format!(
                "{}. Project: {}\n   URL: {}\n   Description: {}\n   Language: {}\n   Total stars: {}\n   Stars today: {}",
                i + 1,
                p.name,
                p.url,
                p.description,
                p.language,
                p.stars,
                p.today_stars
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Detail appendix keyed by the same numbers as [`format_projects`];
/// `None` when no record carries detail.
pub fn format_details(records: &[ProjectRecord]) -> Option<String> {
    let blocks: Vec<String> = records
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.detail.as_ref().map(|d| (i + 1, d)))
        .map(|(n, d)| {
            let mut flags = Vec::new();
            if d.is_archived {
                flags.push("archived");
            }
            if d.is_fork {
                flags.push("fork");
            }
            if d.is_mirror {
                flags.push("mirror");
            }
            let or_none = |s: String| if s.is_empty() { "none".to_string() } else { s };
            format!(
                "#{n} {}\n   About: {}\n   Topics: {}\n   Features: {}\n   Status: {}\n   Last updated: {}\n   Contributors: {}\n   README: {}",
                d.full_name,
                or_none(d.description.clone()),
                or_none(d.topics.join(", ")),
                or_none(d.features.join("; ")),
                if flags.is_empty() { "active".to_string() } else { flags.join(", ") },
                d.last_updated,
                d.contributors,
                or_none(d.readme_excerpt.clone()),
            )
        })
        .collect();

    if blocks.is_empty() {
        None
    } else {
        Some(blocks.join("\n\n"))
    }
}

/// Text handed to the template: the project list plus the detail appendix
/// when there is one.
pub fn prompt_text(records: &[ProjectRecord]) -> String {
    let projects = format_projects(records);
    match format_details(records) {
        Some(details) => format!("{projects}\n\n[DETAILS]\n{details}"),
        None => projects,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{ContributorCount, RepositoryDetail};

    fn record(i: usize) -> ProjectRecord {
        ProjectRecord {
            name: format!("owner / project-{i}"),
            url: format!("https://github.com/owner/project-{i}"),
            description: format!("Description {i}"),
            language: "Rust".into(),
            stars: format!("{}", i * 100),
            today_stars: format!("{i} stars today"),
            detail: None,
        }
    }

    #[test]
    fn one_numbered_block_per_record_in_order() {
        let records: Vec<_> = (1..=4).map(record).collect();
        let text = format_projects(&records);
        let blocks: Vec<&str> = text.split("\n\n").collect();
        assert_eq!(blocks.len(), records.len());
        for (i, (block, r)) in blocks.iter().zip(&records).enumerate() {
            assert!(block.starts_with(&format!("{}. Project: ", i + 1)));
            for value in [&r.name, &r.url, &r.description, &r.language, &r.stars, &r.today_stars] {
                assert!(block.contains(value.as_str()), "{value} missing from {block}");
            }
        }
    }

    #[test]
    fn empty_input_formats_to_empty_text() {
        assert_eq!(format_projects(&[]), "");
        assert_eq!(format_details(&[]), None);
    }

    #[test]
    fn details_appendix_uses_listing_numbers() {
        let detail = RepositoryDetail {
            full_name: "owner/project-2".into(),
            description: String::new(),
            topics: vec!["ml".into(), "rust".into()],
            is_fork: false,
            is_mirror: false,
            is_archived: true,
            readme_excerpt: String::new(),
            features: vec!["fast".into()],
            last_updated: "2025-01-02".into(),
            contributors: ContributorCount::Known(7),
        };
        let records = vec![record(1), record(2).with_detail(detail)];
        let details = format_details(&records).unwrap();
        assert!(details.starts_with("#2 owner/project-2"));
        assert!(details.contains("Topics: ml, rust"));
        assert!(details.contains("Status: archived"));
        assert!(details.contains("Contributors: 7"));
        assert!(details.contains("About: none"));

        let prompt = prompt_text(&records);
        assert!(prompt.contains("\n\n[DETAILS]\n#2"));
    }

    #[test]
    fn prompt_text_without_detail_is_plain_listing() {
        let records = vec![record(1)];
        assert_eq!(prompt_text(&records), format_projects(&records));
    }
}
