use super::text::format_line;
use crate::Result;
use crate::crawl::{CrawlReport, QueryKind};
use core::fmt::Write;
use owo_colors::OwoColorize;

pub fn generate<W: Write>(report: &CrawlReport, top: usize, use_colors: bool, writer: &mut W) -> Result<()> {
    let ranked = report.top(top);

    let heading = format!("Top {} of {} authors in {}", ranked.len(), report.tally.author_count(), report.org);
    if use_colors {
        writeln!(writer, "{}", heading.bold())?;
    } else {
        writeln!(writer, "{heading}")?;
    }

    writeln!(writer)?;
    for (rank, author) in ranked.iter().enumerate() {
        writeln!(writer, "{}", format_line(rank + 1, author))?;
    }

    let stats = &report.stats;
    writeln!(writer)?;
    writeln!(
        writer,
        "{} commits counted across {} repositories and {} branches ({} merges skipped)",
        stats.commits_counted, stats.repositories_completed, stats.branches_completed, stats.merges_skipped,
    )?;

    let requests = QueryKind::all()
        .iter()
        .map(|kind| format!("{} {kind}", stats.requests_for(*kind)))
        .collect::<Vec<_>>()
        .join(", ");
    writeln!(writer, "{} requests ({requests}), {} retries", stats.total_requests(), stats.retries)?;

    if !report.skipped.is_empty() {
        writeln!(writer)?;
        let warning = format!("Skipped {} unit(s) of work:", report.skipped.len());
        if use_colors {
            writeln!(writer, "{}", warning.yellow().bold())?;
        } else {
            writeln!(writer, "{warning}")?;
        }

        for skipped in &report.skipped {
            writeln!(writer, "  {skipped}")?;
        }
    }

    Ok(())
}
