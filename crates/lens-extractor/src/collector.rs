//! Bounded, deduplicating accumulation of review records

use crate::chain::truncate_chars;
use crate::error::ExtractorError;
use lens_domain::{Provenance, Review};
use regex::Regex;
use std::collections::HashSet;

/// Fragments that marketplaces prepend to review blocks
const STANDARD_BOILERPLATE: &[&str] = &[
    r"^\d+,?\d*\s*оценк[аи]?\s*",
    r"Смотреть все фото и видео\s*",
    r"Закреплён\s*",
    r"Плюсы товара\s*",
    r"^\d+\s+(января|февраля|марта|апреля|мая|июня|июля|августа|сентября|октября|ноября|декабря)\s*",
];

/// Set of patterns removed from candidate text before it is judged
#[derive(Debug, Clone)]
pub struct Boilerplate {
    patterns: Vec<Regex>,
}

impl Boilerplate {
    /// Rating counters, media links, pinned markers and date prefixes
    pub fn standard() -> Self {
        Self {
            patterns: STANDARD_BOILERPLATE
                .iter()
                .filter_map(|p| Regex::new(p).ok())
                .collect(),
        }
    }

    /// No stripping at all
    pub fn none() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    /// Standard set plus additional patterns
    pub fn with_patterns(extra: &[String]) -> Result<Self, ExtractorError> {
        let mut boilerplate = Self::standard();
        for pattern in extra {
            boilerplate.patterns.push(Regex::new(pattern)?);
        }
        Ok(boilerplate)
    }

    /// Apply every pattern in order, then trim
    pub fn strip(&self, text: &str) -> String {
        let mut cleaned = text.trim().to_string();
        for pattern in &self.patterns {
            cleaned = pattern.replace_all(&cleaned, "").trim().to_string();
        }
        cleaned
    }
}

impl Default for Boilerplate {
    fn default() -> Self {
        Self::standard()
    }
}

/// Size limits for one collector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectorLimits {
    /// Maximum number of accepted records
    pub cap: usize,
    /// Minimum normalized length in characters
    pub min_chars: usize,
    /// Stored text is truncated to this many characters
    pub max_chars: usize,
}

impl Default for CollectorLimits {
    fn default() -> Self {
        Self {
            cap: 10,
            min_chars: 31,
            max_chars: 1000,
        }
    }
}

/// Accumulates reviews for one product up to a cap, rejecting noise and duplicates
///
/// Ids are assigned when a candidate is accepted, so rejected candidates never
/// consume one.
#[derive(Debug)]
pub struct ReviewCollector {
    product_id: String,
    limits: CollectorLimits,
    boilerplate: Boilerplate,
    seen: HashSet<String>,
    accepted: Vec<Review>,
}

impl ReviewCollector {
    /// Create an empty collector
    pub fn new(
        product_id: impl Into<String>,
        limits: CollectorLimits,
        boilerplate: Boilerplate,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            limits,
            boilerplate,
            seen: HashSet::new(),
            accepted: Vec::new(),
        }
    }

    /// Offer a candidate; returns whether it was accepted
    pub fn offer(&mut self, candidate: &str) -> bool {
        self.offer_rated(candidate, None)
    }

    /// Offer a candidate with an already detected rating
    pub fn offer_rated(&mut self, candidate: &str, rating: Option<u8>) -> bool {
        if self.is_full() {
            return false;
        }

        let normalized = self.boilerplate.strip(candidate);
        if normalized.chars().count() < self.limits.min_chars {
            return false;
        }
        if !self.seen.insert(normalized.clone()) {
            return false;
        }

        let id = format!("{}_review_{}", self.product_id, self.accepted.len() + 1);
        self.accepted.push(Review {
            id,
            product_id: self.product_id.clone(),
            text: truncate_chars(&normalized, self.limits.max_chars),
            rating,
            provenance: Provenance::Scraped,
        });
        true
    }

    /// Whether the cap has been reached
    pub fn is_full(&self) -> bool {
        self.accepted.len() >= self.limits.cap
    }

    /// Number of accepted records
    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    /// Whether nothing has been accepted
    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }

    /// Accepted records in acceptance order
    pub fn results(&self) -> &[Review] {
        &self.accepted
    }

    /// Take the accepted records
    pub fn into_results(self) -> Vec<Review> {
        self.accepted
    }
}
