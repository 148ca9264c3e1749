//! Per-product extraction pipeline

use crate::chain::{attempt_candidates, ExtractionResult, Field, FieldDefault, Strategy, StrategyChain};
use crate::collector::{Boilerplate, CollectorLimits, ReviewCollector};
use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::fallback::FallbackSupplier;
use crate::numeric::extract_rating;
use crate::profile::Profile;
use lens_domain::{Entity, FieldResolution, FieldValue, Product, Resolution, Review, SourceAccessor, SourceError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Identity of the product being extracted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Product id (`wb_264196671`)
    pub product_id: String,
    /// Page URL
    pub url: String,
}

impl Target {
    /// Create a target
    pub fn new(product_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            url: url.into(),
        }
    }
}

/// Review phase settings
#[derive(Clone)]
pub struct ReviewPlan {
    strategies: Vec<Arc<dyn Strategy>>,
    detect_rating: bool,
    limits: CollectorLimits,
    scan_limit: usize,
}

impl ReviewPlan {
    /// Plan built from strategies in preference order
    pub fn new(strategies: Vec<Arc<dyn Strategy>>, limits: CollectorLimits) -> Self {
        Self {
            strategies,
            detect_rating: false,
            limits,
            scan_limit: limits.cap.saturating_mul(3),
        }
    }

    /// Attach a detected star rating to each accepted review
    pub fn detect_rating(mut self, detect: bool) -> Self {
        self.detect_rating = detect;
        self
    }

    /// Candidates examined per strategy
    pub fn scan_limit(mut self, scan_limit: usize) -> Self {
        self.scan_limit = scan_limit;
        self
    }
}

/// Assembles one product and its reviews from a source
///
/// A pipeline holds only immutable configuration; every run creates its own
/// collector, so one pipeline can serve many concurrent runs.
pub struct ExtractionPipeline {
    fields: Vec<Field>,
    reviews: ReviewPlan,
    boilerplate: Boilerplate,
    fallback: Option<FallbackSupplier>,
    fallback_count: usize,
    currency: String,
    max_concurrent_runs: usize,
    chain: StrategyChain,
}

impl ExtractionPipeline {
    /// Create a pipeline from explicit parts
    pub fn new(
        fields: Vec<Field>,
        reviews: ReviewPlan,
        config: &ExtractorConfig,
    ) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;

        Ok(Self {
            fields,
            reviews,
            boilerplate: Boilerplate::with_patterns(&config.extra_boilerplate)?,
            fallback: config
                .synthesize_fallback
                .then(FallbackSupplier::standard),
            fallback_count: config.fallback_review_count,
            currency: "RUB".to_string(),
            max_concurrent_runs: config.max_concurrent_runs,
            chain: StrategyChain::new(),
        })
    }

    /// Create a pipeline for a marketplace profile
    pub fn from_profile(profile: &Profile, config: &ExtractorConfig) -> Result<Self, ExtractorError> {
        let timeout = config.strategy_timeout();
        let limits = CollectorLimits {
            cap: config.review_cap,
            min_chars: profile.reviews.min_chars.unwrap_or(config.min_review_chars),
            max_chars: config.max_review_chars,
        };
        let reviews = ReviewPlan::new(profile.review_strategies(timeout), limits)
            .detect_rating(profile.reviews.detect_rating)
            .scan_limit(config.scan_limit());

        Ok(Self::new(profile.build_fields(timeout), reviews, config)?
            .with_currency(profile.currency.clone()))
    }

    /// Set the currency reported on products
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Replace the fallback catalogue
    pub fn with_fallback(mut self, fallback: Option<FallbackSupplier>) -> Self {
        self.fallback = fallback;
        self
    }

    /// Extract one product
    ///
    /// Missing fields fall back to their defaults and missing reviews to the
    /// fallback catalogue. Only an unavailable source is an error.
    pub async fn run(&self, source: &dyn SourceAccessor, target: &Target) -> Result<Entity, ExtractorError> {
        info!("Extracting {} from {}", target.product_id, source.describe());
        let unavailable = |e: SourceError| ExtractorError::SourceUnavailable {
            target: target.url.clone(),
            reason: e.to_string(),
        };

        let mut values: HashMap<String, FieldValue> = HashMap::new();
        let mut resolutions = Vec::with_capacity(self.fields.len());

        for field in &self.fields {
            let resolution = match self.chain.resolve(field, source).await.map_err(unavailable)? {
                ExtractionResult::Success { value, strategy_id } => {
                    info!("{}: {} via {}", target.product_id, field.name(), strategy_id);
                    values.insert(field.name().to_string(), value);
                    Resolution::Extracted { strategy: strategy_id }
                }
                ExtractionResult::Exhausted => match field.default() {
                    FieldDefault::Literal(value) => {
                        debug!("{}: {} defaulted", target.product_id, field.name());
                        values.insert(field.name().to_string(), value.clone());
                        Resolution::Defaulted
                    }
                    FieldDefault::Unknown => {
                        warn!("{}: no value for {}", target.product_id, field.name());
                        Resolution::Unknown
                    }
                },
            };
            resolutions.push(FieldResolution {
                field: field.name().to_string(),
                resolution,
            });
        }

        let reviews = self.collect_reviews(source, target).await.map_err(unavailable)?;
        let product = self.assemble(target, &values);

        info!(
            "Extracted {}: price {:?}, {} reviews",
            product.id,
            product.price,
            reviews.len()
        );
        Ok(Entity::new(product, reviews, resolutions))
    }

    /// Extract several products concurrently
    ///
    /// At most `max_concurrent_runs` runs are in flight. Results come back in
    /// input order; one target failing does not affect the others.
    pub async fn run_many(
        self: Arc<Self>,
        jobs: Vec<(Arc<dyn SourceAccessor>, Target)>,
    ) -> Vec<Result<Entity, ExtractorError>> {
        let permits = Arc::new(Semaphore::new(self.max_concurrent_runs));
        let mut set = JoinSet::new();
        let count = jobs.len();

        for (index, (source, target)) in jobs.into_iter().enumerate() {
            let pipeline = Arc::clone(&self);
            let permits = Arc::clone(&permits);
            set.spawn(async move {
                let result = match permits.acquire_owned().await {
                    Ok(_permit) => pipeline.run(source.as_ref(), &target).await,
                    Err(e) => Err(ExtractorError::Task(e.to_string())),
                };
                (index, result)
            });
        }

        let mut results: Vec<Option<Result<Entity, ExtractorError>>> = (0..count).map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => warn!("Extraction task failed: {}", e),
            }
        }

        results
            .into_iter()
            .map(|slot| slot.unwrap_or_else(|| Err(ExtractorError::Task("extraction task did not finish".to_string()))))
            .collect()
    }

    async fn collect_reviews(&self, source: &dyn SourceAccessor, target: &Target) -> Result<Vec<Review>, SourceError> {
        let mut collector = ReviewCollector::new(
            target.product_id.clone(),
            self.reviews.limits,
            self.boilerplate.clone(),
        );

        for strategy in &self.reviews.strategies {
            if collector.is_full() {
                break;
            }
            let candidates = attempt_candidates(strategy.as_ref(), source, "reviews").await?;
            for candidate in candidates.iter().take(self.reviews.scan_limit) {
                let Some(text) = candidate.as_text() else {
                    continue;
                };
                let rating = if self.reviews.detect_rating {
                    extract_rating(text)
                } else {
                    None
                };
                collector.offer_rated(text, rating);
                if collector.is_full() {
                    break;
                }
            }
            debug!("After {}: {} reviews", strategy.id(), collector.len());
        }

        if !collector.is_empty() {
            return Ok(collector.into_results());
        }

        match &self.fallback {
            Some(fallback) => {
                warn!(
                    "No reviews found for {}, substituting {} placeholder reviews",
                    target.product_id, self.fallback_count
                );
                Ok(fallback.synthesize(&target.product_id, self.fallback_count))
            }
            None => Ok(Vec::new()),
        }
    }

    fn assemble(&self, target: &Target, values: &HashMap<String, FieldValue>) -> Product {
        let text = |name: &str| {
            values
                .get(name)
                .map(|v| v.to_string())
                .unwrap_or_default()
        };

        Product {
            id: target.product_id.clone(),
            name: text("name"),
            url: target.url.clone(),
            price: values.get("price").and_then(FieldValue::as_number),
            currency: values
                .get("currency")
                .and_then(FieldValue::as_text)
                .map(str::to_string)
                .unwrap_or_else(|| self.currency.clone()),
            description: text("description"),
            characteristics: text("characteristics"),
        }
    }
}
