//! Integration tests for lens-insight
//!
//! These tests feed extractor output through the three analysis stages the
//! way the CLI chains them: records on disk, then assessments, audience
//! segments and marketing copy.

use lens_extractor::{ExtractionPipeline, ExtractorConfig, HtmlSource, Profile, Target};
use lens_insight::{
    analyze_audience, assess_reviews, generate_copy, load_products, load_reviews, load_segments, read_json,
};
use lens_llm::MockProvider;
use std::fs;

const URL: &str = "https://www.wildberries.ru/catalog/264196671/detail.aspx";

const PAGE: &str = r#"<html><body>
<h1 class="product-page__title">Люстра потолочная LED 60W</h1>
<ins class="price-block__final-price">1 298 ₽</ins>
</body></html>"#;

#[tokio::test]
async fn test_extracted_records_flow_through_all_stages() {
    let dir = tempfile::tempdir().unwrap();

    let profile = Profile::builtin("wildberries").unwrap();
    let pipeline = ExtractionPipeline::from_profile(&profile, &ExtractorConfig::default()).unwrap();
    let source = HtmlSource::new(URL, PAGE);
    let entity = pipeline
        .run(&source, &Target::new(profile.product_id(URL), URL))
        .await
        .unwrap();

    let products_path = dir.path().join("product.json");
    let reviews_path = dir.path().join("reviews.json");
    fs::write(&products_path, entity.product_json().unwrap()).unwrap();
    fs::write(&reviews_path, entity.reviews_json().unwrap()).unwrap();

    let products = load_products(&read_json(&products_path).unwrap()).unwrap();
    let reviews = load_reviews(&read_json(&reviews_path).unwrap());
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id.as_deref(), Some("wb_264196671"));
    assert_eq!(products[0].price, "1298");
    assert_eq!(reviews.len(), 6);
    assert!(reviews.iter().all(|r| r.product_id == products[0].id));
    assert!(reviews.iter().all(|r| r.is_synthesized()));

    // Stage 1: per-review assessment
    let assessor = MockProvider::new(r#"{"тональность": "положительный", "критерии": []}"#);
    let assessments = assess_reviews(&assessor, &products, &reviews).await;
    assert_eq!(assessments.len(), 6);
    assert!(assessments.iter().all(|a| a.sentiment() == Some("положительный")));
    assert!(assessments.iter().all(|a| a.synthesized));
    assert_eq!(assessor.call_count(), 6);

    // Stage 2: audience segments; placeholder reviews are never sampled
    let analyst = MockProvider::new(
        r#"<think>segments</think>
```json
{"summary": "Покупают для дома", "audience_segments": [
  {"name": "Молодые семьи", "share_pct_est": 45, "needs": "уют"},
  {"name": "Дачники", "share_pct_est": 20}
]}
```"#,
    );
    let reports = analyze_audience(&analyst, &products, &reviews).await;
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].sample_size, 0);
    assert!(analyst.prompts()[0].1.contains("(нет примеров)"));
    assert_eq!(reports[0].summary(), Some("Покупают для дома"));

    // Stage 3: copy per segment, read back from the saved audience document
    let audience_path = dir.path().join("audience.json");
    fs::write(&audience_path, serde_json::to_string_pretty(&reports).unwrap()).unwrap();
    let segments = load_segments(&read_json(&audience_path).unwrap(), products[0].id.as_deref());
    assert_eq!(segments.len(), 2);

    let mut writer = MockProvider::new("Светлая люстра для всей семьи");
    writer.add_response("Дачники", "<think>draft</think>Люстра для загородного дома");
    let copy = generate_copy(&writer, &products[0], &segments, &reviews).await;

    assert_eq!(copy.metadata.total_segments, 2);
    assert_eq!(copy.metadata.failed_segments, 0);
    assert_eq!(copy.metadata.insights_used, 0);
    assert_eq!(copy.descriptions[0].description, "Светлая люстра для всей семьи");
    assert_eq!(copy.descriptions[1].description, "Люстра для загородного дома");
    assert!(copy.to_markdown().contains("Молодые семьи"));
}

#[tokio::test]
async fn test_failed_model_calls_are_recorded_not_fatal() {
    let products = load_products(&serde_json::json!({"name": "Кофемолка", "id": "wb_5"})).unwrap();
    let reviews = load_reviews(&serde_json::json!(["Мелет быстро", "Шумная"]));

    let provider = MockProvider::new(r#"{"тональность": "нейтральный"}"#);

    // Reviews without a product id cannot be matched and are skipped
    let assessments = assess_reviews(&provider, &products, &reviews).await;
    assert!(assessments.is_empty());
    assert_eq!(provider.call_count(), 0);

    let segments = load_segments(
        &serde_json::json!({"audience_segments": [{"name": "Кофеманы", "share_pct_est": 60}]}),
        None,
    );
    let mut failing = MockProvider::default();
    failing.add_error("Кофеманы");
    let copy = generate_copy(&failing, &products[0], &segments, &reviews).await;
    assert_eq!(copy.metadata.failed_segments, 1);
    assert!(copy.descriptions[0].error.is_some());
    assert!(copy.descriptions[0].description.is_empty());
}
