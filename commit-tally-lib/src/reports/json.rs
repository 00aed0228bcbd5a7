use crate::Result;
use crate::crawl::{CrawlReport, QueryKind};
use core::fmt::Write;
use serde_json::json;

pub fn generate<W: Write>(report: &CrawlReport, top: usize, writer: &mut W) -> Result<()> {
    let stats = &report.stats;

    let requests: serde_json::Map<String, serde_json::Value> = QueryKind::all()
        .iter()
        .map(|kind| (kind.name().replace(' ', "_"), json!(stats.requests_for(*kind))))
        .collect();

    let output = json!({
        "org": report.org,
        "authors": report.top(top),
        "total_authors": report.tally.author_count(),
        "total_commits": report.tally.total_commits(),
        "stats": {
            "requests": requests,
            "retries": stats.retries,
            "repositories": stats.repositories_completed,
            "branches": stats.branches_completed,
            "merges_skipped": stats.merges_skipped,
        },
        "skipped": report.skipped,
    });

    write!(writer, "{}", serde_json::to_string_pretty(&output)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::{SkippedWork, StatsSnapshot, Tally};

    #[test]
    fn test_generate_json() {
        let tally = Tally::new();
        tally.record_commit("ada@example.com", "Ada");
        tally.record_commit("bob@example.com", "Bob");
        tally.record_commit("bob@example.com", "Bob");

        let report = CrawlReport {
            org: "acme".to_string(),
            tally,
            stats: StatsSnapshot {
                requests: [1, 1, 2, 0],
                retries: 3,
                ..StatsSnapshot::default()
            },
            skipped: vec![SkippedWork {
                repository: "alpha".to_string(),
                branch: None,
                reason: "gave up".to_string(),
            }],
        };

        let mut output = String::new();
        generate(&report, 1, &mut output).unwrap();

        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["org"], "acme");
        assert_eq!(value["authors"].as_array().unwrap().len(), 1);
        assert_eq!(value["authors"][0]["email"], "bob@example.com");
        assert_eq!(value["authors"][0]["commits"], 2);
        assert_eq!(value["total_authors"], 2);
        assert_eq!(value["total_commits"], 3);
        assert_eq!(value["stats"]["requests"]["commits"], 2);
        assert_eq!(value["stats"]["requests"]["default_branch"], 0);
        assert_eq!(value["stats"]["retries"], 3);
        assert_eq!(value["skipped"][0]["repository"], "alpha");
        assert!(value["skipped"][0].get("branch").is_none());
    }
}
