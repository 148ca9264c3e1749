//! Placeholder reviews for products where nothing could be scraped

use lens_domain::{Provenance, Review};

/// A catalogue entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewTemplate {
    /// Review body
    pub text: String,
    /// Star rating
    pub rating: Option<u8>,
}

impl ReviewTemplate {
    /// Create a template
    pub fn new(text: impl Into<String>, rating: Option<u8>) -> Self {
        Self {
            text: text.into(),
            rating,
        }
    }
}

const STANDARD_CATALOGUE: &[(&str, u8)] = &[
    ("Отличный товар! Качество на высоте, доставка быстрая. Всем рекомендую!", 5),
    ("Очень довольна покупкой. Соответствует описанию, цена приемлемая.", 5),
    ("Хороший товар за свою цену. Есть небольшие недостатки, но в целом доволен.", 4),
    ("Превзошел ожидания! Буду заказывать еще.", 5),
    ("Неплохо, но ожидал большего. Качество среднее.", 3),
    ("Рекомендую к покупке. За такие деньги отличный вариант.", 4),
];

/// Deterministic source of placeholder reviews
///
/// Every record it produces is tagged [`Provenance::Synthesized`].
#[derive(Debug, Clone)]
pub struct FallbackSupplier {
    catalogue: Vec<ReviewTemplate>,
}

impl FallbackSupplier {
    /// The six-entry Russian catalogue
    pub fn standard() -> Self {
        let catalogue = STANDARD_CATALOGUE
            .iter()
            .map(|(text, rating)| ReviewTemplate::new(*text, Some(*rating)))
            .collect();
        Self::with_catalogue(catalogue)
    }

    /// Use a custom catalogue
    pub fn with_catalogue(catalogue: Vec<ReviewTemplate>) -> Self {
        Self { catalogue }
    }

    /// Number of distinct templates
    pub fn catalogue_len(&self) -> usize {
        self.catalogue.len()
    }

    /// Produce `count` records for a product, cycling through the catalogue
    ///
    /// Ids are `<product_id>_review_<n>`, so records of different products
    /// never collide in one batch.
    pub fn synthesize(&self, product_id: &str, count: usize) -> Vec<Review> {
        if self.catalogue.is_empty() {
            return Vec::new();
        }

        (0..count)
            .map(|i| {
                let template = &self.catalogue[i % self.catalogue.len()];
                Review {
                    id: format!("{}_review_{}", product_id, i + 1),
                    product_id: product_id.to_string(),
                    text: template.text.clone(),
                    rating: template.rating,
                    provenance: Provenance::Synthesized,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesize_is_deterministic() {
        let supplier = FallbackSupplier::standard();
        let first = supplier.synthesize("wb_264196671", 6);
        let second = supplier.synthesize("wb_264196671", 6);
        assert_eq!(first, second);
        assert_eq!(first.len(), 6);
        assert_eq!(first[0].id, "wb_264196671_review_1");
        assert_eq!(first[4].rating, Some(3));
    }

    #[test]
    fn test_synthesize_cycles_catalogue() {
        let supplier = FallbackSupplier::standard();
        let reviews = supplier.synthesize("wb_1", 10);
        assert_eq!(reviews.len(), 10);
        assert_eq!(reviews[6].text, reviews[0].text);
        assert_eq!(reviews[9].text, reviews[3].text);
        assert_eq!(reviews[9].id, "wb_1_review_10");
    }

    #[test]
    fn test_all_records_tagged() {
        let reviews = FallbackSupplier::standard().synthesize("ozon_5", 3);
        assert!(reviews.iter().all(Review::is_synthesized));
        assert!(reviews.iter().all(|r| r.product_id == "ozon_5"));
    }

    #[test]
    fn test_ids_distinct_across_products() {
        let supplier = FallbackSupplier::standard();
        let mut ids: Vec<String> = supplier.synthesize("wb_111", 6).into_iter().map(|r| r.id).collect();
        ids.extend(supplier.synthesize("wb_222", 6).into_iter().map(|r| r.id));
        let unique: std::collections::HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), 12);
    }

    #[test]
    fn test_empty_catalogue() {
        let supplier = FallbackSupplier::with_catalogue(Vec::new());
        assert!(supplier.synthesize("x_1", 4).is_empty());
        assert_eq!(supplier.catalogue_len(), 0);
    }
}
