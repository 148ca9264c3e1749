//! Ordered-attempt field resolution
//!
//! A [`Field`] lists its [`Strategy`] implementations from most to least
//! preferred. [`StrategyChain::resolve`] tries them one at a time and stops at
//! the first candidate the field's [`Acceptance`] test passes. Later
//! strategies are never invoked once a value is accepted.

use crate::numeric::{extract_number, numeric_candidates};
use async_trait::async_trait;
use lens_domain::{FieldValue, Probe, SourceAccessor, SourceError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Outcome of resolving one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionResult {
    /// A strategy produced an accepted value
    Success {
        /// The accepted value
        value: FieldValue,
        /// Identifier of the strategy that produced it
        strategy_id: String,
    },

    /// Every strategy missed or was rejected
    Exhausted,
}

impl ExtractionResult {
    /// Whether a value was accepted
    pub fn is_success(&self) -> bool {
        matches!(self, ExtractionResult::Success { .. })
    }
}

/// One way of obtaining candidate values from a source
///
/// An `Err` that is not fatal (see [`SourceError::is_fatal`]) is a miss: the
/// chain logs it and moves on. Returning an empty list is also a miss.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Stable identifier, recorded when this strategy wins
    fn id(&self) -> &str;

    /// Produce zero or more raw candidates, in preference order
    async fn attempt(&self, source: &dyn SourceAccessor) -> Result<Vec<FieldValue>, SourceError>;
}

/// How raw probe output is turned into field values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Trimmed text
    #[default]
    Text,

    /// Integers recovered from each digit run
    Number,
}

/// Strategy backed by a single probe against the source
#[derive(Debug, Clone)]
pub struct ProbeStrategy {
    id: String,
    probe: Probe,
    kind: ValueKind,
    divide_by: Option<u64>,
    cut_at: Vec<String>,
    max_chars: Option<usize>,
}

impl ProbeStrategy {
    /// Create a strategy for a probe; its id is the probe's string form
    pub fn new(probe: Probe, kind: ValueKind) -> Self {
        Self {
            id: probe.to_string(),
            probe,
            kind,
            divide_by: None,
            cut_at: Vec::new(),
            max_chars: None,
        }
    }

    /// Divide numeric values (e.g. kopecks to roubles)
    pub fn divide_by(mut self, divisor: u64) -> Self {
        self.divide_by = (divisor > 1).then_some(divisor);
        self
    }

    /// Keep only the text before the first occurrence of each separator
    pub fn cut_at(mut self, separators: Vec<String>) -> Self {
        self.cut_at = separators;
        self
    }

    /// Truncate text values to this many characters
    pub fn max_chars(mut self, max_chars: Option<usize>) -> Self {
        self.max_chars = max_chars;
        self
    }

    fn to_values(&self, raw: &str) -> Vec<FieldValue> {
        match self.kind {
            ValueKind::Text => {
                let mut text = raw;
                for separator in &self.cut_at {
                    if let Some((head, _)) = text.split_once(separator.as_str()) {
                        text = head;
                    }
                }
                let text = match self.max_chars {
                    Some(limit) => truncate_chars(text.trim(), limit),
                    None => text.trim().to_string(),
                };
                vec![FieldValue::Text(text)]
            }
            ValueKind::Number => numeric_candidates(raw)
                .into_iter()
                .filter_map(extract_number)
                .map(|n| FieldValue::Number(self.divide_by.map_or(n, |d| n / d)))
                .collect(),
        }
    }
}

#[async_trait]
impl Strategy for ProbeStrategy {
    fn id(&self) -> &str {
        &self.id
    }

    async fn attempt(&self, source: &dyn SourceAccessor) -> Result<Vec<FieldValue>, SourceError> {
        let raw = source.probe(&self.probe).await?;
        Ok(raw.iter().flat_map(|r| self.to_values(r)).collect())
    }
}

/// Wraps a strategy with a time limit; running out of time is a miss
pub struct Timed {
    inner: Arc<dyn Strategy>,
    limit: Duration,
}

impl Timed {
    /// Limit `inner` to `limit` per attempt
    pub fn new(inner: Arc<dyn Strategy>, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

#[async_trait]
impl Strategy for Timed {
    fn id(&self) -> &str {
        self.inner.id()
    }

    async fn attempt(&self, source: &dyn SourceAccessor) -> Result<Vec<FieldValue>, SourceError> {
        match tokio::time::timeout(self.limit, self.inner.attempt(source)).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Miss(format!(
                "timed out after {}ms",
                self.limit.as_millis()
            ))),
        }
    }
}

/// Validity test applied to every candidate value
///
/// Numeric bounds are exclusive. Blank text is never accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Acceptance {
    /// Minimum text length in characters
    pub min_chars: Option<usize>,

    /// Numbers must be strictly greater than this
    pub above: Option<u64>,

    /// Numbers must be strictly less than this
    pub below: Option<u64>,

    /// Text containing any of these substrings is rejected
    pub forbid: Vec<String>,
}

impl Acceptance {
    /// Accept any non-blank value
    pub fn any() -> Self {
        Self::default()
    }

    /// Accept text of at least `min_chars` characters
    pub fn min_chars(min_chars: usize) -> Self {
        Self {
            min_chars: Some(min_chars),
            ..Self::default()
        }
    }

    /// Accept numbers strictly between `above` and `below`
    pub fn between(above: u64, below: u64) -> Self {
        Self {
            above: Some(above),
            below: Some(below),
            ..Self::default()
        }
    }

    /// Whether the value passes
    pub fn accepts(&self, value: &FieldValue) -> bool {
        match value {
            FieldValue::Text(text) => {
                !value.is_blank()
                    && self.min_chars.is_none_or(|min| value.char_len() >= min)
                    && !self.forbid.iter().any(|f| text.contains(f.as_str()))
            }
            FieldValue::Number(n) => {
                self.above.is_none_or(|above| *n > above) && self.below.is_none_or(|below| *n < below)
            }
        }
    }
}

/// Value used when every strategy for a field missed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldDefault {
    /// A declared literal
    Literal(FieldValue),

    /// No literal: the field is reported as unknown
    Unknown,
}

/// A named logical value with its acceptance test, strategies and default
#[derive(Clone)]
pub struct Field {
    name: String,
    acceptance: Acceptance,
    strategies: Vec<Arc<dyn Strategy>>,
    default: FieldDefault,
}

impl Field {
    /// Create a field with no strategies, accepting any non-blank value
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            acceptance: Acceptance::any(),
            strategies: Vec::new(),
            default: FieldDefault::Unknown,
        }
    }

    /// Set the acceptance test
    pub fn accept(mut self, acceptance: Acceptance) -> Self {
        self.acceptance = acceptance;
        self
    }

    /// Append a strategy (lower preference than those already added)
    pub fn strategy(mut self, strategy: Arc<dyn Strategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Set a literal default
    pub fn default_value(mut self, value: impl Into<FieldValue>) -> Self {
        self.default = FieldDefault::Literal(value.into());
        self
    }

    /// Field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Acceptance test
    pub fn acceptance(&self) -> &Acceptance {
        &self.acceptance
    }

    /// Strategies in preference order
    pub fn strategies(&self) -> &[Arc<dyn Strategy>] {
        &self.strategies
    }

    /// Default applied on exhaustion
    pub fn default(&self) -> &FieldDefault {
        &self.default
    }
}

impl std::fmt::Debug for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("acceptance", &self.acceptance)
            .field(
                "strategies",
                &self.strategies.iter().map(|s| s.id()).collect::<Vec<_>>(),
            )
            .field("default", &self.default)
            .finish()
    }
}

/// Executes a field's strategies in order
#[derive(Debug, Clone, Copy, Default)]
pub struct StrategyChain;

impl StrategyChain {
    /// Create a chain
    pub fn new() -> Self {
        Self
    }

    /// Resolve a field against a source
    ///
    /// Returns `Err` only when the source reports itself unavailable; every
    /// other failure is a miss and the next strategy is tried.
    pub async fn resolve(
        &self,
        field: &Field,
        source: &dyn SourceAccessor,
    ) -> Result<ExtractionResult, SourceError> {
        for strategy in field.strategies() {
            let candidates = attempt_candidates(strategy.as_ref(), source, field.name()).await?;

            if let Some(value) = candidates
                .into_iter()
                .find(|candidate| field.acceptance().accepts(candidate))
            {
                debug!("Field '{}' resolved by {}", field.name(), strategy.id());
                return Ok(ExtractionResult::Success {
                    value,
                    strategy_id: strategy.id().to_string(),
                });
            }
        }

        Ok(ExtractionResult::Exhausted)
    }
}

/// Run one strategy, turning non-fatal failures into an empty candidate list
pub(crate) async fn attempt_candidates(
    strategy: &dyn Strategy,
    source: &dyn SourceAccessor,
    label: &str,
) -> Result<Vec<FieldValue>, SourceError> {
    match strategy.attempt(source).await {
        Ok(candidates) => {
            if candidates.is_empty() {
                debug!("Strategy {} found nothing for '{}'", strategy.id(), label);
            }
            Ok(candidates)
        }
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            debug!("Strategy {} missed for '{}': {}", strategy.id(), label, e);
            Ok(Vec::new())
        }
    }
}

/// Truncate to at most `limit` characters
pub(crate) fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
