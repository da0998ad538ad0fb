//! Command-line interface definitions.
//!
//! All options can be given as flags; the user agent can also come from the
//! environment.

use chrono::NaiveDate;
use clap::Parser;

/// Command-line arguments for the sitemap harvester.
///
/// # Examples
///
/// ```sh
/// # Harvest everything PR Newswire has published up to today
/// newswire_sitemaps prnewswire -o ./data
///
/// # Business Wire up to a fixed date, eight fetches in flight, keeping the XML
/// newswire_sitemaps businesswire -o ./data --until 2021-06-30 --concurrency 8 --keep-xml
///
/// # A publisher defined in a profile file
/// newswire_sitemaps globewire -c ./publishers.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Publisher to harvest (prnewswire, canadawire, businesswire, or one from --config)
    pub publisher: String,

    /// Directory the per-publisher dataset folder is created in
    #[arg(short, long, default_value = ".")]
    pub output_dir: String,

    /// Optional YAML file with additional or overriding publisher profiles
    #[arg(short, long)]
    pub config: Option<String>,

    /// Last day to harvest (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub until: Option<NaiveDate>,

    /// Maximum number of sitemap fetches in flight
    #[arg(long, default_value_t = 4)]
    pub concurrency: usize,

    /// Per-sitemap fetch timeout in seconds
    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,

    /// Also keep each decoded sitemap document in the dataset folder
    #[arg(long)]
    pub keep_xml: bool,

    /// User-Agent header for sitemap requests
    #[arg(long, env = "SITEMAP_USER_AGENT")]
    pub user_agent: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["newswire_sitemaps", "prnewswire"]);

        assert_eq!(cli.publisher, "prnewswire");
        assert_eq!(cli.output_dir, ".");
        assert_eq!(cli.concurrency, 4);
        assert_eq!(cli.timeout_secs, 60);
        assert!(cli.until.is_none());
        assert!(cli.config.is_none());
        assert!(!cli.keep_xml);
    }

    #[test]
    fn test_cli_all_flags() {
        let cli = Cli::parse_from([
            "newswire_sitemaps",
            "businesswire",
            "-o",
            "/tmp/data",
            "-c",
            "/tmp/publishers.yaml",
            "--until",
            "2021-06-30",
            "--concurrency",
            "8",
            "--timeout-secs",
            "15",
            "--keep-xml",
        ]);

        assert_eq!(cli.publisher, "businesswire");
        assert_eq!(cli.output_dir, "/tmp/data");
        assert_eq!(cli.config.as_deref(), Some("/tmp/publishers.yaml"));
        assert_eq!(cli.until, NaiveDate::from_ymd_opt(2021, 6, 30));
        assert_eq!(cli.concurrency, 8);
        assert_eq!(cli.timeout_secs, 15);
        assert!(cli.keep_xml);
    }

    #[test]
    fn test_cli_rejects_bad_date() {
        let result = Cli::try_parse_from(["newswire_sitemaps", "prnewswire", "--until", "June"]);
        assert!(result.is_err());
    }
}
