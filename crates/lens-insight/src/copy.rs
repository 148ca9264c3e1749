//! Segment-targeted marketing copy
//!
//! For one product, one description per audience segment. The reply is
//! free-form prose, so only reasoning blocks are stripped from it.

use crate::audience::{segments_in, Segment};
use crate::loaders::{ProductInput, ReviewInput};
use lens_domain::LlmProvider;
use lens_extractor::strip_reasoning;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Write as _;
use tracing::{info, warn};

/// Review texts passed to the model as insights
pub const MAX_INSIGHTS: usize = 10;

const QUOTES_PER_SIDE: usize = 3;
const QUOTE_CHARS: usize = 200;

/// Keys under which a segmentation result may be stored, in priority order
pub const RESULT_KEYS: &[&str] = &["result", "parsed"];

const SYSTEM_PROMPT: &str = "Ты — профессиональный копирайтер-маркетолог, специализирующийся на \
персонализации контента для маркетплейсов.\n\
Твоя задача — создавать убедительные тексты для товаров, которые максимально точно обращаются к языку, \
ценностям и \"болям\" конкретного сегмента целевой аудитории.";

const ANSWER_STRUCTURE: &str = "\
Структура ответа:
1. СЕГМЕНТ-ЦЕЛЬ
2. СТРАТЕГИЯ ТЕКСТА (1-2 предложения)
3. ЗАГОЛОВОК (H1, 5-10 слов)
4. ЛИД-АБЗАЦ (2-3 предложения)
5. ОСНОВНОЕ ОПИСАНИЕ: ## Что вы получаете, ## Решение ваших задач, ## Что говорят покупатели, ## Идеальные сценарии использования
6. ПОЧЕМУ ВЫБИРАЮТ ИМЕННО ЭТУ МОДЕЛЬ (4 пункта)
7. ПРИЗЫВ К ДЕЙСТВИЮ

Требования: объём 1500-2500 символов, тон соответствует сегменту, конкретные цифры и характеристики, \
пересказ реальных отзывов. Начинай ответ сразу с раздела \"1. СЕГМЕНТ-ЦЕЛЬ\".";

fn quote(text: &str) -> String {
    let mut quoted: String = text.chars().take(QUOTE_CHARS).collect();
    if text.chars().count() > QUOTE_CHARS {
        quoted.push_str("...");
    }
    format!("- {}", quoted)
}

fn insights_block(insights: &[String]) -> String {
    let strengths: Vec<String> = insights
        .iter()
        .filter(|r| r.contains("Достоинства"))
        .take(QUOTES_PER_SIDE)
        .map(|r| quote(r))
        .collect();
    let objections: Vec<String> = insights
        .iter()
        .filter(|r| r.contains("Недостатки"))
        .take(QUOTES_PER_SIDE)
        .map(|r| quote(r))
        .collect();

    if !strengths.is_empty() || !objections.is_empty() {
        return format!(
            "Инсайты из отзывов реальных покупателей:\n\nСильные стороны:\n{}\n\nСлабые места/возражения:\n{}\n",
            strengths.join("\n"),
            objections.join("\n")
        );
    }
    if insights.is_empty() {
        return String::new();
    }
    format!(
        "Отзывы реальных покупателей:\n{}\n",
        insights.iter().map(|r| quote(r)).collect::<Vec<_>>().join("\n")
    )
}

/// Build the user message for one product and segment
pub fn build_prompt(product: &ProductInput, segment: &Segment, insights: &[String]) -> String {
    format!(
        "Информация о товаре:\n\nНазвание: {}\nЦена: {} {}\nТекущее описание: {}\nХарактеристики: {}\n\n\
Целевой сегмент аудитории:\n\nНазвание сегмента: {}\nДоля аудитории: {}%\nОсновные потребности: {}\n\
Болевые точки: {}\nРекомендуемое сообщение: {}\n\n{}\n\
Задача: создай готовое к публикации описание товара для этого сегмента аудитории.\n\n{}",
        product.name,
        product.price,
        product.currency,
        product.description,
        product.characteristics,
        segment.name,
        segment.share_pct_est,
        segment.needs,
        segment.pain_points,
        segment.recommended_message,
        insights_block(insights),
        ANSWER_STRUCTURE
    )
}

/// Pick the segments for a product out of a segmentation document
///
/// Accepts the report list written by the audience stage (the entry for
/// `product_id`, else the first one), or a bare segmentation object.
pub fn load_segments(document: &Value, product_id: Option<&str>) -> Vec<Segment> {
    let result_of = |entry: &Value| -> Option<Value> {
        RESULT_KEYS.iter().find_map(|key| entry.get(*key).cloned()).or_else(|| {
            entry
                .get("models")
                .and_then(Value::as_object)
                .and_then(|models| models.values().find_map(|m| m.get("parsed").cloned()))
        })
    };

    match document {
        Value::Array(entries) => {
            let for_product = entries.iter().find(|entry| {
                product_id.is_some()
                    && entry
                        .get("product")
                        .and_then(|p| p.get("product_id"))
                        .and_then(Value::as_str)
                        == product_id
            });
            for_product
                .or_else(|| entries.first())
                .and_then(result_of)
                .map(|result| segments_in(&result))
                .unwrap_or_default()
        }
        Value::Object(_) if document.get("audience_segments").is_some() => segments_in(document),
        Value::Object(_) => result_of(document).map(|r| segments_in(&r)).unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Description written for one segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentCopy {
    /// Segment the text targets
    pub segment_name: String,
    /// Estimated share of that segment
    pub segment_share: f64,
    /// Generated text; empty when the call failed
    pub description: String,
    /// Model that wrote it
    pub model: String,
    /// Error message when the call failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of a copy run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopyMetadata {
    /// Segments a description was produced for
    pub total_segments: usize,
    /// Segments whose call failed
    pub failed_segments: usize,
    /// Review texts passed as insights
    pub insights_used: usize,
    /// Model used
    pub model: String,
}

/// All descriptions for one product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopyReport {
    /// Product the copy is for
    pub product: ProductInput,
    /// One entry per segment, in segment order
    pub descriptions: Vec<SegmentCopy>,
    /// Run summary
    pub metadata: CopyMetadata,
}

impl CopyReport {
    /// Render the report as a Markdown document
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Персонализированные описания товара\n");
        let _ = writeln!(out, "**Товар:** {}\n", self.product.name);
        let _ = writeln!(out, "---\n");

        for copy in &self.descriptions {
            let _ = writeln!(
                out,
                "## Сегмент: {} ({}% аудитории)\n",
                copy.segment_name, copy.segment_share
            );
            let _ = writeln!(out, "**Модель:** {}\n", copy.model);
            match &copy.error {
                Some(error) => {
                    let _ = writeln!(out, "_Описание не создано: {}_", error);
                }
                None => {
                    let _ = writeln!(out, "{}", copy.description);
                }
            }
            let _ = writeln!(out, "\n---\n");
        }
        out
    }
}

/// Write one description per segment
///
/// Up to `MAX_INSIGHTS` customer review texts of the product are passed along
/// as insights; placeholder reviews are left out. A failed call is recorded
/// on its segment and the run continues.
pub async fn generate_copy<P>(
    provider: &P,
    product: &ProductInput,
    segments: &[Segment],
    reviews: &[ReviewInput],
) -> CopyReport
where
    P: LlmProvider + ?Sized,
{
    let insights: Vec<String> = reviews
        .iter()
        .filter(|r| !r.is_synthesized())
        .filter(|r| r.product_id.is_none() || product.id.is_none() || r.product_id == product.id)
        .take(MAX_INSIGHTS)
        .map(|r| r.text.clone())
        .collect();

    let mut descriptions = Vec::with_capacity(segments.len());
    for (index, segment) in segments.iter().enumerate() {
        info!("[{}/{}] Writing copy for segment {}", index + 1, segments.len(), segment.name);
        let (description, error) = match provider
            .chat(SYSTEM_PROMPT, &build_prompt(product, segment, &insights))
            .await
        {
            Ok(reply) => {
                let text = strip_reasoning(&reply);
                info!("Description of {} chars", text.chars().count());
                (text, None)
            }
            Err(e) => {
                warn!("Copy generation failed for segment {}: {}", segment.name, e);
                (String::new(), Some(e.to_string()))
            }
        };

        descriptions.push(SegmentCopy {
            segment_name: segment.name.clone(),
            segment_share: segment.share_pct_est,
            description,
            model: provider.model_name().to_string(),
            error,
        });
    }

    let failed_segments = descriptions.iter().filter(|d| d.error.is_some()).count();
    CopyReport {
        product: product.clone(),
        metadata: CopyMetadata {
            total_segments: descriptions.len(),
            failed_segments,
            insights_used: insights.len(),
            model: provider.model_name().to_string(),
        },
        descriptions,
    }
}
