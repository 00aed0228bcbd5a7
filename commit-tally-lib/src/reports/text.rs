use crate::Result;
use crate::crawl::{AuthorStats, CrawlReport};
use core::fmt::Write;

pub fn generate<W: Write>(report: &CrawlReport, top: usize, writer: &mut W) -> Result<()> {
    for (rank, author) in report.top(top).iter().enumerate() {
        writeln!(writer, "{}", format_line(rank + 1, author))?;
    }

    Ok(())
}

/// Format one ranked author line.
pub(super) fn format_line(rank: usize, author: &AuthorStats) -> String {
    format!("{rank}. {} ({}) - {} commits", author.name, author.email, author.commits)
}
