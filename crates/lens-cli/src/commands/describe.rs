//! Describe command implementation.

use super::write_json;
use crate::cli::DescribeArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use lens_domain::LlmProvider;
use lens_insight::{generate_copy, load_products, load_reviews, load_segments, read_json, CopyReport};
use std::fs;

/// Execute the describe command.
pub async fn execute_describe(args: DescribeArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let provider = config.llm.provider(config.llm.copy_temperature)?;
    run_describe(&provider, &args, formatter).await
}

/// Write marketing copy with any provider.
pub async fn run_describe<P>(provider: &P, args: &DescribeArgs, formatter: &Formatter) -> Result<()>
where
    P: LlmProvider + ?Sized,
{
    let products = load_products(&read_json(&args.products)?)?;
    let audience = read_json(&args.audience)?;
    let reviews = match &args.reviews {
        Some(path) if path.exists() => load_reviews(&read_json(path)?),
        Some(path) => {
            println!(
                "{}",
                formatter.warning(&format!("{} not found; writing without review insights", path.display()))
            );
            Vec::new()
        }
        None => Vec::new(),
    };

    let mut reports: Vec<CopyReport> = Vec::new();
    for product in &products {
        let segments = load_segments(&audience, product.id.as_deref());
        if segments.is_empty() {
            println!(
                "{}",
                formatter.warning(&format!("No audience segments for {}, skipping", product.name))
            );
            continue;
        }
        println!(
            "{}",
            formatter.info(&format!("{}: {} segments", product.name, segments.len()))
        );
        let report = generate_copy(provider, product, &segments, &reviews).await;
        println!("{}", formatter.copy(&report)?);
        reports.push(report);
    }

    if reports.is_empty() {
        return Err(CliError::InvalidInput(format!(
            "No audience segments found in {}",
            args.audience.display()
        )));
    }

    write_json(&args.out, &reports)?;
    let markdown_path = args.out.with_extension("md");
    let markdown = reports
        .iter()
        .map(CopyReport::to_markdown)
        .collect::<Vec<_>>()
        .join("\n");
    fs::write(&markdown_path, markdown)?;

    println!(
        "{}",
        formatter.success(&format!(
            "Saved to {} and {}",
            args.out.display(),
            markdown_path.display()
        ))
    );
    Ok(())
}
