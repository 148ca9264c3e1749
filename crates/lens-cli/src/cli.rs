//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Lens - extract product cards and reviews, then analyze them with an LLM.
#[derive(Debug, Parser)]
#[command(name = "lens")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path (default: ~/.lens/config.toml)
    #[arg(short, long, global = true, env = "LENS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract product cards and reviews from product pages
    Extract(ExtractArgs),

    /// Score every review on sentiment and eight criteria
    Assess(AssessArgs),

    /// Segment the audience of each product
    Audience(AudienceArgs),

    /// Write one marketing description per audience segment
    Describe(DescribeArgs),

    /// List built-in extraction profiles
    Profiles,
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Product page URLs
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Read the page from a saved HTML file instead of fetching it
    #[arg(long)]
    pub html: Option<PathBuf>,

    /// Read the product API payload from a saved JSON file
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Built-in profile name or path to a profile TOML file
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Directory for product.json and reviews.json
    #[arg(short, long, default_value = ".")]
    pub out: PathBuf,

    /// Leave reviews empty instead of substituting placeholders
    #[arg(long)]
    pub no_fallback: bool,
}

/// Arguments for the assess command.
#[derive(Debug, Parser)]
pub struct AssessArgs {
    /// Products file
    #[arg(short, long, default_value = "product.json")]
    pub products: PathBuf,

    /// Reviews file
    #[arg(short, long, default_value = "reviews.json")]
    pub reviews: PathBuf,

    /// Output file
    #[arg(short, long, default_value = "results_criteria.json")]
    pub out: PathBuf,
}

/// Arguments for the audience command.
#[derive(Debug, Parser)]
pub struct AudienceArgs {
    /// Products file
    #[arg(short, long, default_value = "product.json")]
    pub products: PathBuf,

    /// Reviews file
    #[arg(short, long, default_value = "reviews.json")]
    pub reviews: PathBuf,

    /// Output file
    #[arg(short, long, default_value = "audience_analysis_results.json")]
    pub out: PathBuf,
}

/// Arguments for the describe command.
#[derive(Debug, Parser)]
pub struct DescribeArgs {
    /// Products file
    #[arg(short, long, default_value = "product.json")]
    pub products: PathBuf,

    /// Audience analysis file written by `lens audience`
    #[arg(short, long, default_value = "audience_analysis_results.json")]
    pub audience: PathBuf,

    /// Reviews file used for insights (optional)
    #[arg(short, long)]
    pub reviews: Option<PathBuf>,

    /// Output file; a Markdown copy is written next to it
    #[arg(short, long, default_value = "product_descriptions.json")]
    pub out: PathBuf,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_command() {
        let cli = Cli::parse_from([
            "lens",
            "extract",
            "https://www.wildberries.ru/catalog/264196671/detail.aspx",
            "--html",
            "page.html",
            "--no-fallback",
        ]);
        match cli.command {
            Command::Extract(args) => {
                assert_eq!(args.urls.len(), 1);
                assert_eq!(args.html, Some(PathBuf::from("page.html")));
                assert!(args.no_fallback);
                assert_eq!(args.out, PathBuf::from("."));
            }
            _ => panic!("Expected Extract command"),
        }
    }

    #[test]
    fn test_extract_requires_url() {
        assert!(Cli::try_parse_from(["lens", "extract"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["lens", "assess", "--format", "json", "--verbose", "--no-color"]);
        assert_eq!(cli.format, Some(CliFormat::Json));
        assert!(cli.verbose);
        assert!(cli.no_color);
        match cli.command {
            Command::Assess(args) => assert_eq!(args.out, PathBuf::from("results_criteria.json")),
            _ => panic!("Expected Assess command"),
        }
    }

    #[test]
    fn test_describe_reviews_optional() {
        let cli = Cli::parse_from(["lens", "describe", "--audience", "a.json"]);
        match cli.command {
            Command::Describe(args) => {
                assert_eq!(args.audience, PathBuf::from("a.json"));
                assert!(args.reviews.is_none());
            }
            _ => panic!("Expected Describe command"),
        }
    }
}
