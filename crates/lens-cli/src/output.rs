//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use lens_domain::{Entity, Resolution};
use lens_extractor::Profile;
use lens_insight::{Assessment, AudienceReport, CopyReport};
use serde_json::json;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

const MAX_CELL_CHARS: usize = 48;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format the outcome of an extraction batch.
    pub fn extraction_summary(&self, entities: &[Entity]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let summary: Vec<serde_json::Value> = entities
                    .iter()
                    .map(|e| {
                        json!({
                            "id": e.product().id,
                            "name": e.product().name,
                            "price": e.product().price,
                            "currency": e.product().currency,
                            "reviews": e.reviews().len(),
                            "scraped_reviews": e.scraped_review_count(),
                            "fields": e.resolutions(),
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&summary)?)
            }
            OutputFormat::Table => {
                if entities.is_empty() {
                    return Ok(self.colorize("No products extracted.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["ID", "Name", "Price", "Reviews", "Fields"]);
                for entity in entities {
                    let product = entity.product();
                    let price = product
                        .price
                        .map(|p| format!("{} {}", p, product.currency))
                        .unwrap_or_else(|| "-".to_string());
                    let reviews = if entity.has_synthesized_reviews() {
                        format!("{} (placeholder)", entity.reviews().len())
                    } else {
                        entity.reviews().len().to_string()
                    };
                    builder.push_record([
                        product.id.clone(),
                        cell(&product.name),
                        price,
                        reviews,
                        field_summary(entity),
                    ]);
                }
                Ok(self.render(builder))
            }
        }
    }

    /// Format the list of profiles.
    pub fn profiles(&self, profiles: &[Profile]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let list: Vec<serde_json::Value> = profiles
                    .iter()
                    .map(|p| {
                        json!({
                            "name": p.name,
                            "id_prefix": p.id_prefix,
                            "hosts": p.hosts,
                            "fields": p.fields.iter().map(|f| &f.name).collect::<Vec<_>>(),
                            "review_probes": p.reviews.probes.len(),
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&list)?)
            }
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Name", "Prefix", "Hosts", "Fields", "Review probes"]);
                for profile in profiles {
                    let hosts = if profile.hosts.is_empty() {
                        "(any)".to_string()
                    } else {
                        profile.hosts.join(", ")
                    };
                    builder.push_record([
                        profile.name.clone(),
                        profile.id_prefix.clone(),
                        hosts,
                        profile
                            .fields
                            .iter()
                            .map(|f| f.name.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                        profile.reviews.probes.len().to_string(),
                    ]);
                }
                Ok(self.render(builder))
            }
        }
    }

    /// Format review assessments.
    pub fn assessments(&self, assessments: &[Assessment]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(assessments)?),
            OutputFormat::Table => {
                if assessments.is_empty() {
                    return Ok(self.colorize("No reviews assessed.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["Review", "Product", "Sentiment", "Criteria", "Mean score"]);
                for assessment in assessments {
                    let criteria = assessment.criteria();
                    let scores: Vec<u8> = criteria.iter().filter_map(|c| c.score).collect();
                    let mean = if scores.is_empty() {
                        "-".to_string()
                    } else {
                        format!(
                            "{:.1}",
                            scores.iter().map(|&s| f64::from(s)).sum::<f64>() / scores.len() as f64
                        )
                    };
                    let sentiment = if assessment.is_raw() {
                        self.colorize("unparsed", "red")
                    } else {
                        assessment.sentiment().unwrap_or("-").to_string()
                    };
                    let review = if assessment.synthesized {
                        format!("{} {}", assessment.review_id, self.colorize("(placeholder)", "yellow"))
                    } else {
                        assessment.review_id.clone()
                    };
                    builder.push_record([
                        review,
                        assessment.product_id.clone(),
                        sentiment,
                        criteria.len().to_string(),
                        mean,
                    ]);
                }
                Ok(self.render(builder))
            }
        }
    }

    /// Format audience segmentation reports.
    pub fn audience(&self, reports: &[AudienceReport]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(reports)?),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Product", "Segment", "Share", "Message"]);
                for report in reports {
                    let product = cell(&report.product.name);
                    let segments = report.segments();
                    if segments.is_empty() {
                        builder.push_record([
                            product,
                            self.colorize("no segments recovered", "red"),
                            "-".to_string(),
                            "-".to_string(),
                        ]);
                        continue;
                    }
                    for segment in segments {
                        builder.push_record([
                            product.clone(),
                            cell(&segment.name),
                            format!("{}%", segment.share_pct_est),
                            cell(&segment.recommended_message),
                        ]);
                    }
                }
                Ok(self.render(builder))
            }
        }
    }

    /// Format a marketing copy report.
    pub fn copy(&self, report: &CopyReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&report.metadata)?),
            OutputFormat::Table => {
                if report.descriptions.is_empty() {
                    return Ok(self.colorize("No segments to write copy for.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["Segment", "Share", "Characters", "Status"]);
                for copy in &report.descriptions {
                    let status = match &copy.error {
                        Some(e) => self.colorize(&cell(e), "red"),
                        None => self.colorize("ok", "green"),
                    };
                    builder.push_record([
                        cell(&copy.segment_name),
                        format!("{}%", copy.segment_share),
                        copy.description.chars().count().to_string(),
                        status,
                    ]);
                }
                Ok(self.render(builder))
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn render(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Shorten long text for a table cell
fn cell(text: &str) -> String {
    if text.chars().count() <= MAX_CELL_CHARS {
        return text.to_string();
    }
    let mut short: String = text.chars().take(MAX_CELL_CHARS - 1).collect();
    short.push('…');
    short
}

fn field_summary(entity: &Entity) -> String {
    let total = entity.resolutions().len();
    let extracted = entity
        .resolutions()
        .iter()
        .filter(|r| matches!(r.resolution, Resolution::Extracted { .. }))
        .count();
    format!("{}/{} extracted", extracted, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lens_domain::{FieldResolution, Product, Provenance, Review};
    use lens_insight::{ProductRef, SegmentCopy};

    fn entity() -> Entity {
        let product = Product {
            id: "wb_264196671".to_string(),
            name: "Люстра потолочная LED 60W".to_string(),
            url: "https://www.wildberries.ru/catalog/264196671/detail.aspx".to_string(),
            price: Some(1298),
            currency: "RUB".to_string(),
            description: String::new(),
            characteristics: String::new(),
        };
        let review = Review {
            id: "wb_review_1".to_string(),
            product_id: product.id.clone(),
            text: "Отличный товар".to_string(),
            rating: None,
            provenance: Provenance::Synthesized,
        };
        let resolutions = vec![
            FieldResolution {
                field: "name".to_string(),
                resolution: Resolution::Extracted {
                    strategy: "css:h1".to_string(),
                },
            },
            FieldResolution {
                field: "description".to_string(),
                resolution: Resolution::Defaulted,
            },
        ];
        Entity::new(product, vec![review], resolutions)
    }

    #[test]
    fn test_extraction_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.extraction_summary(&[entity()]).unwrap();
        assert!(output.contains("wb_264196671"));
        assert!(output.contains("1298 RUB"));
        assert!(output.contains("1 (placeholder)"));
        assert!(output.contains("1/2 extracted"));
    }

    #[test]
    fn test_extraction_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.extraction_summary(&[entity()]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["scraped_reviews"], 0);
        assert_eq!(value[0]["fields"][0]["outcome"], "extracted");
        assert_eq!(value[0]["fields"][0]["strategy"], "css:h1");
    }

    #[test]
    fn test_empty_extraction() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert!(formatter.extraction_summary(&[]).unwrap().contains("No products extracted"));
    }

    #[test]
    fn test_profiles_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let profiles = Profile::builtins().unwrap();
        let output = formatter.profiles(&profiles).unwrap();
        assert!(output.contains("wildberries"));
        assert!(output.contains("(any)"));
    }

    #[test]
    fn test_audience_table_marks_unrecovered() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let report = AudienceReport {
            product: ProductRef {
                product_id: Some("wb_1".to_string()),
                name: "Люстра".to_string(),
            },
            model: "mock".to_string(),
            sample_size: 0,
            result: json!({"raw_response": "?"}),
        };
        let output = formatter.audience(&[report]).unwrap();
        assert!(output.contains("no segments recovered"));
    }

    #[test]
    fn test_copy_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let report = CopyReport {
            product: lens_insight::ProductInput::default(),
            descriptions: vec![SegmentCopy {
                segment_name: "Молодые семьи".to_string(),
                segment_share: 40.0,
                description: "Текст".to_string(),
                model: "mock".to_string(),
                error: None,
            }],
            metadata: lens_insight::copy::CopyMetadata {
                total_segments: 1,
                failed_segments: 0,
                insights_used: 0,
                model: "mock".to_string(),
            },
        };
        let output = formatter.copy(&report).unwrap();
        assert!(output.contains("Молодые семьи"));
        assert!(output.contains("40%"));
    }

    #[test]
    fn test_long_cells_are_cut() {
        let long = "х".repeat(100);
        assert_eq!(cell(&long).chars().count(), MAX_CELL_CHARS);
        assert_eq!(cell("short"), "short");
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
        assert_eq!(formatter.error("bad"), "✗ bad");
    }
}
