//! Integration tests for the extraction pipeline

#[cfg(test)]
mod tests {
    use crate::{
        Acceptance, CollectorLimits, CompletionSource, ExtractionPipeline, ExtractorConfig, ExtractorError, Field,
        HtmlSource, JsonSource, LayeredSource, ProbeStrategy, Profile, ReviewPlan, Target, ValueKind,
    };
    use async_trait::async_trait;
    use lens_domain::{Probe, Provenance, Resolution, SourceAccessor, SourceError};
    use serde_json::json;
    use std::sync::Arc;

    const WB_URL: &str = "https://www.wildberries.ru/catalog/264196671/detail.aspx";

    const WB_PAGE: &str = r#"<html>
<head><title>Люстра потолочная LED / Освещение | Wildberries</title></head>
<body>
  <h1 class="product-page__title">Люстра потолочная LED 60W</h1>
  <ins class="price-block__final-price">1 298,00 ₽</ins>
  <div class="product-params__table">Мощность 60 Вт Цвет белый</div>
  <ul>
    <li class="comments__item">Закреплён Светит ярко, пульт работает, монтаж занял полчаса</li>
    <li class="comments__item">12 марта Светит ярко, пульт работает, монтаж занял полчаса</li>
    <li class="comments__item">Хорошо</li>
    <li class="comments__item">Смотреть все фото и видео Пришла с трещиной на плафоне, продавец заменил быстро. 4/5</li>
  </ul>
</body>
</html>"#;

    struct DeadSource;

    #[async_trait]
    impl SourceAccessor for DeadSource {
        fn describe(&self) -> String {
            "dead".to_string()
        }

        async fn probe(&self, _probe: &Probe) -> Result<Vec<String>, SourceError> {
            Err(SourceError::Unavailable("page never loaded".to_string()))
        }
    }

    fn wb_pipeline(config: &ExtractorConfig) -> ExtractionPipeline {
        let profile = Profile::builtin("wildberries").unwrap();
        ExtractionPipeline::from_profile(&profile, config).unwrap()
    }

    fn wb_target() -> Target {
        Target::new("wb_264196671", WB_URL)
    }

    #[tokio::test]
    async fn test_page_without_reviews_gets_placeholders() {
        let config = ExtractorConfig::default();
        let source = HtmlSource::new(WB_URL, "<html><body><h1>Кофемолка ручная</h1></body></html>");

        let entity = wb_pipeline(&config).run(&source, &wb_target()).await.unwrap();

        assert_eq!(entity.reviews().len(), config.fallback_review_count);
        assert!(entity
            .reviews()
            .iter()
            .all(|r| r.provenance == Provenance::Synthesized && r.product_id == "wb_264196671"));
        assert_eq!(entity.scraped_review_count(), 0);
        assert_eq!(entity.product().name, "Кофемолка ручная");
    }

    #[tokio::test]
    async fn test_price_with_decimal_part_resolves_to_integer() {
        let field = Field::new("price")
            .accept(Acceptance::between(100, 999_999))
            .strategy(Arc::new(ProbeStrategy::new(
                "css:.price-block__final-price".parse().unwrap(),
                ValueKind::Number,
            )));
        let pipeline = ExtractionPipeline::new(
            vec![field],
            ReviewPlan::new(Vec::new(), CollectorLimits::default()),
            &ExtractorConfig::default(),
        )
        .unwrap();

        let entity = pipeline
            .run(&HtmlSource::new(WB_URL, WB_PAGE), &wb_target())
            .await
            .unwrap();
        assert_eq!(entity.product().price, Some(1298));
    }

    #[tokio::test]
    async fn test_full_page_extraction() {
        let entity = wb_pipeline(&ExtractorConfig::default())
            .run(&HtmlSource::new(WB_URL, WB_PAGE), &wb_target())
            .await
            .unwrap();

        let product = entity.product();
        assert_eq!(product.id, "wb_264196671");
        assert_eq!(product.name, "Люстра потолочная LED 60W");
        assert_eq!(product.price, Some(1298));
        assert_eq!(product.currency, "RUB");
        assert_eq!(product.description, "Описание недоступно");
        assert_eq!(product.characteristics, "Мощность 60 Вт Цвет белый");
        assert_eq!(entity.resolution_of("description"), Some(&Resolution::Defaulted));
        assert_eq!(
            entity.resolution_of("name"),
            Some(&Resolution::Extracted {
                strategy: "css:h1".to_string()
            })
        );

        let reviews = entity.reviews();
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].id, "wb_264196671_review_1");
        assert_eq!(reviews[0].text, "Светит ярко, пульт работает, монтаж занял полчаса");
        assert_eq!(reviews[0].rating, None);
        assert_eq!(reviews[1].id, "wb_264196671_review_2");
        assert_eq!(
            reviews[1].text,
            "Пришла с трещиной на плафоне, продавец заменил быстро. 4/5"
        );
        assert_eq!(reviews[1].rating, Some(4));
        assert!(!entity.has_synthesized_reviews());
    }

    #[tokio::test]
    async fn test_review_cap_applies_across_strategies() {
        let config = ExtractorConfig {
            review_cap: 1,
            ..ExtractorConfig::default()
        };
        let entity = wb_pipeline(&config)
            .run(&HtmlSource::new(WB_URL, WB_PAGE), &wb_target())
            .await
            .unwrap();
        assert_eq!(entity.reviews().len(), 1);
    }

    #[tokio::test]
    async fn test_api_payload_layered_over_page() {
        let api = JsonSource::new(
            "card.wb.ru",
            json!({"data": {"products": [{"name": "Люстра из каталога", "salePriceU": 249900}]}}),
        );
        let page = HtmlSource::new(WB_URL, WB_PAGE);
        let layers: Vec<Arc<dyn SourceAccessor>> = vec![Arc::new(api), Arc::new(page)];
        let source = LayeredSource::new(WB_URL, layers);

        let entity = wb_pipeline(&ExtractorConfig::default())
            .run(&source, &wb_target())
            .await
            .unwrap();
        assert_eq!(entity.product().name, "Люстра из каталога");
        assert_eq!(entity.product().price, Some(2499));
        assert_eq!(entity.scraped_review_count(), 2);
    }

    #[tokio::test]
    async fn test_unavailable_source_aborts_run() {
        let result = wb_pipeline(&ExtractorConfig::default())
            .run(&DeadSource, &wb_target())
            .await;
        match result {
            Err(ExtractorError::SourceUnavailable { target, reason }) => {
                assert_eq!(target, WB_URL);
                assert!(reason.contains("page never loaded"));
            }
            other => panic!("expected SourceUnavailable, got {:?}", other.map(|e| e.product().id.clone())),
        }
    }

    #[tokio::test]
    async fn test_run_many_keeps_order_and_isolates_failures() {
        let pipeline = Arc::new(wb_pipeline(&ExtractorConfig::default()));
        let jobs: Vec<(Arc<dyn SourceAccessor>, Target)> = vec![
            (
                Arc::new(HtmlSource::new(WB_URL, WB_PAGE)) as Arc<dyn SourceAccessor>,
                Target::new("wb_1", "https://www.wildberries.ru/catalog/1/detail.aspx"),
            ),
            (
                Arc::new(DeadSource) as Arc<dyn SourceAccessor>,
                Target::new("wb_2", "https://www.wildberries.ru/catalog/2/detail.aspx"),
            ),
            (
                Arc::new(HtmlSource::new(WB_URL, "<html><h1>Настольная лампа</h1></html>")) as Arc<dyn SourceAccessor>,
                Target::new("wb_3", "https://www.wildberries.ru/catalog/3/detail.aspx"),
            ),
        ];

        let results = pipeline.run_many(jobs).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().product().id, "wb_1");
        assert!(matches!(results[1], Err(ExtractorError::SourceUnavailable { .. })));
        assert_eq!(results[2].as_ref().unwrap().product().name, "Настольная лампа");
    }

    #[tokio::test]
    async fn test_completion_as_source() {
        let field = Field::new("sentiment")
            .strategy(Arc::new(ProbeStrategy::new("key:sentiment".parse().unwrap(), ValueKind::Text)))
            .strategy(Arc::new(ProbeStrategy::new(
                "regex:(positive|negative|neutral)".parse().unwrap(),
                ValueKind::Text,
            )))
            .default_value("neutral");
        let pipeline = ExtractionPipeline::new(
            vec![field],
            ReviewPlan::new(Vec::new(), CollectorLimits::default()),
            &ExtractorConfig::default(),
        )
        .unwrap()
        .with_fallback(None);
        let target = Target::new("llm_1", "completion");

        let structured = CompletionSource::new("qwen", "<think>hmm</think>{'sentiment': 'negative'}");
        let entity = pipeline.run(&structured, &target).await.unwrap();
        assert_eq!(
            entity.resolution_of("sentiment"),
            Some(&Resolution::Extracted {
                strategy: "key:sentiment".to_string()
            })
        );

        let prose = CompletionSource::new("qwen", "Overall the review is positive.");
        let entity = pipeline.run(&prose, &target).await.unwrap();
        assert!(matches!(
            entity.resolution_of("sentiment"),
            Some(Resolution::Extracted { strategy }) if strategy.starts_with("regex:")
        ));
        assert!(entity.reviews().is_empty());
    }
}
