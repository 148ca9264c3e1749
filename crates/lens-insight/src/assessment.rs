//! Per-review criteria assessment
//!
//! Every review of a known product is sent to the model together with the
//! product card; the model answers with an overall sentiment and a 1-5 score
//! for each of eight criteria.

use crate::loaders::{ProductInput, ReviewInput};
use lens_domain::LlmProvider;
use lens_extractor::recover_structured;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{info, warn};

/// Criteria every review is scored on, in prompt order
pub const CRITERIA: [&str; 8] = [
    "Информативность",
    "Релевантность",
    "Опыт использования",
    "Ответы на вопросы",
    "Контекст",
    "Сравнение",
    "Нарушение правил",
    "Конфликт интересов",
];

const SYSTEM_PROMPT: &str = "Ты — аналитик отзывов с экспертизой в выявлении скрытых паттернов, \
мотивации пользователя и потенциальных манипуляций.\n\
Твоя задача — не просто суммировать отзыв, а провести его многоаспектную оценку по ключевым критериям.";

const CRITERIA_GUIDE: &str = "\
1) Информативность: Насколько отзыв содержит конкретные факты, данные, детали об использовании продукта (материал, срок службы, точные проблемы/плюсы)?
2) Релевантность: Насколько содержание отзыва соответствует заявленным функциям и назначению продукта?
3) Опыт использования: Передает ли отзыв личный, субъективный опыт автора, его эмоции и ощущения от взаимодействия с продуктом?
4) Ответы на вопросы: Можно ли из отзыва извлечь ответы на типичные вопросы потенциальных покупателей (о качестве, простоте использования, недостатках)?
5) Контекст: Указан ли в отзыве важный контекст использования (климат, уровень навыков, сценарий применения), который влияет на оценку?
6) Сравнение: Сравнивает ли автор продукт с аналогами, предыдущими версиями или ожиданиями?
7) Нарушение правил: Есть ли признаки того, что отзыв может быть фейковым, заказным, оскорбительным, нецензурным или не соответствующим правилам платформы?
8) Конфликт интересов: Обнаруживаются ли признаки, что автор может быть конкурентом, аффилированным лицом или его мнение обусловлено неоправданными ожиданиями?";

const ANSWER_FORMAT: &str = r#"Ответ верни СТРОГО в виде корректного JSON без пояснений вокруг, в формате:
{
  "тональность": "положительный | нейтральный | отрицательный",
  "критерии": [
    {"критерий": "Информативность", "оценка": 1-5, "обоснование": "..."},
    ...
  ]
}"#;

/// Build the user message for one review of one product
pub fn build_prompt(product: &ProductInput, review_text: &str) -> String {
    format!(
        "Пожалуйста, проанализируй предоставленный отзыв на продукт по следующим критериям. \
По каждому пункту дай краткое обоснование (1-2 предложения) и оценку от 1 до 5, \
где 1 — минимальное соответствие, 5 — максимальное.\n\n\
Информация о товаре:\n- Товар: {}\n- Ссылка: {}\n- Цена: {} {}\n\n\
Описание:\n{}\n\nХарактеристики:\n{}\n\n\
Текст отзыва:\n{}\n\n\
Критерии анализа:\n{}\n\n\
Определи общую тональность отзыва: \"положительный\", \"нейтральный\" или \"отрицательный\".\n\n{}",
        product.name,
        product.url,
        product.price,
        product.currency,
        product.description,
        product.characteristics,
        review_text,
        CRITERIA_GUIDE,
        ANSWER_FORMAT
    )
}

/// One criterion score as read back from a model reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionScore {
    /// Criterion name
    pub name: String,
    /// Score 1-5
    pub score: Option<u8>,
    /// Model's rationale
    pub rationale: String,
}

/// Assessment of one review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// Review that was assessed
    pub review_id: String,
    /// Product the review belongs to
    pub product_id: String,
    /// Model that produced the result
    pub model: String,
    /// Recovered reply, or a raw-response record when recovery failed
    pub result: Value,
    /// The assessed text was a placeholder, not a customer review
    #[serde(default)]
    pub synthesized: bool,
}

impl Assessment {
    /// Sentiment reported by the model
    pub fn sentiment(&self) -> Option<&str> {
        self.result.get("тональность").and_then(Value::as_str)
    }

    /// Whether the reply could not be read as structured data
    pub fn is_raw(&self) -> bool {
        self.result.get("raw_response").is_some() || self.result.get("error").is_some()
    }

    /// Criterion scores in reply order; malformed entries are skipped
    pub fn criteria(&self) -> Vec<CriterionScore> {
        let Some(items) = self.result.get("критерии").and_then(Value::as_array) else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|item| {
                let name = item.get("критерий")?.as_str()?.to_string();
                let score = item
                    .get("оценка")
                    .and_then(Value::as_u64)
                    .and_then(|s| u8::try_from(s).ok())
                    .filter(|s| (1..=5).contains(s));
                let rationale = item
                    .get("обоснование")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                Some(CriterionScore { name, score, rationale })
            })
            .collect()
    }
}

/// Assess every review whose product is known
///
/// Reviews without a product id, or referencing a product missing from
/// `products`, are skipped with a warning. A failed call or unparseable reply
/// is recorded in place of the result instead of stopping the run.
pub async fn assess_reviews<P>(provider: &P, products: &[ProductInput], reviews: &[ReviewInput]) -> Vec<Assessment>
where
    P: LlmProvider + ?Sized,
{
    let by_id: HashMap<&str, &ProductInput> = products
        .iter()
        .filter_map(|p| p.id.as_deref().map(|id| (id, p)))
        .collect();

    let mut assessments = Vec::new();
    for (index, review) in reviews.iter().enumerate() {
        let review_id = review
            .id
            .clone()
            .unwrap_or_else(|| format!("review_{}", index + 1));

        let Some(product_id) = review.product_id.as_deref() else {
            warn!("Review {} has no product id, skipping", review_id);
            continue;
        };
        let Some(product) = by_id.get(product_id) else {
            warn!("Review {} references unknown product {}, skipping", review_id, product_id);
            continue;
        };

        info!("Assessing review {} of {}", review_id, product.name);
        let result = match provider.chat(SYSTEM_PROMPT, &build_prompt(product, &review.text)).await {
            Ok(reply) => recover_structured(&reply).into_value(),
            Err(e) => {
                warn!("Model call failed for review {}: {}", review_id, e);
                json!({"error": e.to_string()})
            }
        };

        assessments.push(Assessment {
            review_id,
            product_id: product_id.to_string(),
            model: provider.model_name().to_string(),
            result,
            synthesized: review.is_synthesized(),
        });
    }

    info!("Assessed {} of {} reviews", assessments.len(), reviews.len());
    assessments
}
