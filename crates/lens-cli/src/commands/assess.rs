//! Assess command implementation.

use super::write_json;
use crate::cli::AssessArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use lens_domain::LlmProvider;
use lens_insight::{assess_reviews, load_products, load_reviews, read_json};

/// Execute the assess command.
pub async fn execute_assess(args: AssessArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let provider = config.llm.provider(config.llm.temperature)?;
    run_assess(&provider, &args, formatter).await
}

/// Assess with any provider.
pub async fn run_assess<P>(provider: &P, args: &AssessArgs, formatter: &Formatter) -> Result<()>
where
    P: LlmProvider + ?Sized,
{
    let products = load_products(&read_json(&args.products)?)?;
    let reviews = load_reviews(&read_json(&args.reviews)?);
    if reviews.is_empty() {
        return Err(CliError::InvalidInput(format!(
            "No review texts found in {}",
            args.reviews.display()
        )));
    }
    println!(
        "{}",
        formatter.info(&format!("Assessing {} reviews with {}", reviews.len(), provider.model_name()))
    );

    let assessments = assess_reviews(provider, &products, &reviews).await;
    if assessments.len() < reviews.len() {
        println!(
            "{}",
            formatter.warning(&format!(
                "{} reviews skipped: product unknown",
                reviews.len() - assessments.len()
            ))
        );
    }

    let placeholders = assessments.iter().filter(|a| a.synthesized).count();
    if placeholders > 0 {
        println!(
            "{}",
            formatter.warning(&format!("{} assessed reviews are placeholders, not customer text", placeholders))
        );
    }

    write_json(&args.out, &assessments)?;
    println!("{}", formatter.assessments(&assessments)?);
    println!("{}", formatter.success(&format!("Saved to {}", args.out.display())));
    Ok(())
}
