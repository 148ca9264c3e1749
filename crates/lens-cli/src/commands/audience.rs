//! Audience command implementation.

use super::write_json;
use crate::cli::AudienceArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use lens_domain::LlmProvider;
use lens_insight::{analyze_audience, load_products, load_reviews, read_json};

/// Execute the audience command.
pub async fn execute_audience(args: AudienceArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let provider = config.llm.provider(config.llm.temperature)?;
    run_audience(&provider, &args, formatter).await
}

/// Segment audiences with any provider.
pub async fn run_audience<P>(provider: &P, args: &AudienceArgs, formatter: &Formatter) -> Result<()>
where
    P: LlmProvider + ?Sized,
{
    let products = load_products(&read_json(&args.products)?)?;
    let reviews = load_reviews(&read_json(&args.reviews)?);
    if reviews.is_empty() {
        println!("{}", formatter.warning("No review texts found; analyzing product cards only"));
    } else {
        println!("{}", formatter.info(&format!("Loaded {} reviews", reviews.len())));
    }

    let reports = analyze_audience(provider, &products, &reviews).await;

    write_json(&args.out, &reports)?;
    println!("{}", formatter.audience(&reports)?);
    println!("{}", formatter.success(&format!("Saved to {}", args.out.display())));
    Ok(())
}
