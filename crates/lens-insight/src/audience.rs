//! Audience segmentation
//!
//! One model call per product: the product card plus a small sample of its
//! reviews, answered with audience segments, recommendations and A/B test
//! hypotheses.

use crate::loaders::{ProductInput, ReviewInput};
use lens_domain::LlmProvider;
use lens_extractor::recover_structured;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

/// Reviews shown to the model per product
pub const SAMPLE_SIZE: usize = 5;

const MAX_DESCRIPTION_CHARS: usize = 2000;

const SYSTEM_PROMPT: &str = r#"Ты — аналитик целевой аудитории с практическим опытом маркетинга продукта и анализа отзывов.
Твоя задача — на основе информации о продукте и собранных текстов отзывов сформулировать:
1) основные сегменты целевой аудитории (3-6 сегментов): короткое название сегмента, примерный процент от всех отзывов (оценка), главные потребности и болевые точки,
2) ключевые мотивационные триггеры для каждой группы,
3) рекомендации по позиционированию продукта и точкам улучшения,
4) короткий список гипотез для A/B тестов (2-4 штуки).

Верни строго JSON-объект без поясняющего текста:
{
  "product_id": "...",
  "product_name": "...",
  "summary": "краткая сводка 1-2 предложения",
  "audience_segments": [
    {"name": "...", "share_pct_est": number, "needs": "...", "pain_points": "...", "recommended_message": "..."}
  ],
  "recommendations": ["..."],
  "a_b_test_hypotheses": ["..."]
}"#;

/// One audience segment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Segment {
    /// Short segment name
    pub name: String,
    /// Estimated share of all reviews, in percent
    pub share_pct_est: f64,
    /// Main needs
    pub needs: String,
    /// Pain points
    pub pain_points: String,
    /// Message that should resonate with the segment
    pub recommended_message: String,
}

/// Product reference stored in a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRef {
    /// Product identifier, when known
    pub product_id: Option<String>,
    /// Product title
    pub name: String,
}

/// Segmentation of one product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudienceReport {
    /// Product that was analyzed
    pub product: ProductRef,
    /// Model that produced the result
    pub model: String,
    /// Number of reviews shown to the model
    pub sample_size: usize,
    /// Recovered reply, or a raw-response record when recovery failed
    pub result: Value,
}

impl AudienceReport {
    /// Segments in reply order; an unusable reply has none
    pub fn segments(&self) -> Vec<Segment> {
        segments_in(&self.result)
    }

    /// One-line summary, when the model gave one
    pub fn summary(&self) -> Option<&str> {
        self.result.get("summary").and_then(Value::as_str)
    }
}

/// Read segments out of a recovered segmentation reply
pub fn segments_in(result: &Value) -> Vec<Segment> {
    result
        .get("audience_segments")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value::<Segment>(item.clone()).ok())
                .filter(|segment| !segment.name.trim().is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// First `n` customer review texts for a product; `None` matches every review
///
/// Placeholder reviews never enter a sample.
pub fn sample_reviews(reviews: &[ReviewInput], product_id: Option<&str>, n: usize) -> Vec<String> {
    reviews
        .iter()
        .filter(|r| !r.is_synthesized())
        .filter(|r| product_id.is_none() || r.product_id.as_deref() == product_id)
        .take(n)
        .map(|r| r.text.clone())
        .collect()
}

/// Build the user message for one product
pub fn build_prompt(product: &ProductInput, sample: &[String]) -> String {
    let sample_text = if sample.is_empty() {
        "(нет примеров)".to_string()
    } else {
        sample
            .iter()
            .map(|r| format!("- {}", r))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let description: String = product.description.chars().take(MAX_DESCRIPTION_CHARS).collect();
    let name = if product.name.is_empty() { "Unknown" } else { product.name.as_str() };

    format!(
        "Информация о товаре:\n- name: {}\n- url: {}\n- price: {}\n\n\
Краткое описание:\n{}\n\nКлючевые характеристики:\n{}\n\n\
Примеры отзывов (показаны первые {}):\n{}\n\n\
Дополнительная информация: продукт и отзывы относятся к российским маркетплейсам (Wildberries/Ozon), \
учти ценовую чувствительность покупателей.\n\n\
Действуй согласно системной инструкции: выдели сегменты ЦА, их потребности, болевые точки, триггеры, \
рекомендации по позиционированию и гипотезы для A/B тестов.",
        name,
        product.url,
        product.price,
        description,
        product.characteristics,
        SAMPLE_SIZE,
        sample_text
    )
}

/// Segment the audience of every product
///
/// When a product has no reviews of its own, a sample of all reviews is used
/// instead. With no products at all, one aggregated analysis over all reviews
/// is produced.
pub async fn analyze_audience<P>(provider: &P, products: &[ProductInput], reviews: &[ReviewInput]) -> Vec<AudienceReport>
where
    P: LlmProvider + ?Sized,
{
    if reviews.is_empty() {
        warn!("No review texts found; analyzing product cards only");
    }

    if products.is_empty() {
        warn!("No products found; running one aggregated analysis over all reviews");
        let aggregate = ProductInput {
            name: "Aggregated product".to_string(),
            ..ProductInput::default()
        };
        return vec![analyze_one(provider, &aggregate, sample_reviews(reviews, None, SAMPLE_SIZE)).await];
    }

    let mut reports = Vec::with_capacity(products.len());
    for product in products {
        let mut sample = sample_reviews(reviews, product.id.as_deref(), SAMPLE_SIZE);
        if sample.is_empty() {
            sample = sample_reviews(reviews, None, SAMPLE_SIZE);
            warn!(
                "No reviews for product {:?}, using {} general examples",
                product.id,
                sample.len()
            );
        }
        reports.push(analyze_one(provider, product, sample).await);
    }
    reports
}

async fn analyze_one<P>(provider: &P, product: &ProductInput, sample: Vec<String>) -> AudienceReport
where
    P: LlmProvider + ?Sized,
{
    info!("Segmenting audience of {} ({} sample reviews)", product.name, sample.len());
    let result = match provider.chat(SYSTEM_PROMPT, &build_prompt(product, &sample)).await {
        Ok(reply) => recover_structured(&reply).into_value(),
        Err(e) => {
            warn!("Model call failed for {}: {}", product.name, e);
            json!({"error": e.to_string()})
        }
    };

    AudienceReport {
        product: ProductRef {
            product_id: product.id.clone(),
            name: product.name.clone(),
        },
        model: provider.model_name().to_string(),
        sample_size: sample.len(),
        result,
    }
}
