//! Command dispatch logic for commit-tally

use super::{CrawlArgs, InitArgs, ValidateArgs, init_config, process_crawl, validate_config};
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "commit-tally", author, version, long_about = None)]
#[command(about = "Rank the committers of a GitHub organization")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: TallySubcommand,
}

#[derive(Subcommand, Debug)]
enum TallySubcommand {
    /// Crawl every repository and branch of an organization and rank its commit authors
    Crawl(Box<CrawlArgs>),
    /// Generate a default configuration file
    Init(InitArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// This function parses the command-line arguments and executes the corresponding
/// subcommand. It's designed to be called from main.rs with the program arguments.
///
/// # Arguments
///
/// * `args` - An iterator of command-line arguments (typically from `std::env::args()`)
///
/// # Errors
///
/// Returns an error if command parsing fails or if the executed command fails
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    match &Cli::parse_from(args).command {
        TallySubcommand::Crawl(crawl_args) => process_crawl(host, crawl_args).await,
        TallySubcommand::Init(init_args) => init_config(host, init_args),
        TallySubcommand::Validate(validate_args) => validate_config(host, validate_args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_crawl() {
        let cli = Cli::parse_from(["commit-tally", "crawl", "acme", "--top", "3", "--json", "out.json"]);
        match cli.command {
            TallySubcommand::Crawl(args) => {
                assert_eq!(args.org, "acme");
                assert_eq!(args.top, Some(3));
                assert_eq!(args.json.as_deref().map(|p| p.as_str()), Some("out.json"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
