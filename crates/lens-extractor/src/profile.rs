//! Marketplace profiles
//!
//! A profile declares, per marketplace, which probes to try for each product
//! field and for reviews, how to accept their output, and how product ids are
//! derived from URLs. Profiles are TOML documents; the built-in ones are
//! compiled into the binary.

use crate::chain::{Acceptance, Field, ProbeStrategy, Strategy, Timed, ValueKind};
use crate::error::ExtractorError;
use lens_domain::{FieldValue, Probe};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const GENERIC: &str = include_str!("../profiles/generic.toml");
const WILDBERRIES: &str = include_str!("../profiles/wildberries.toml");
const OZON: &str = include_str!("../profiles/ozon.toml");

/// Names of the built-in profiles
pub const BUILTIN_PROFILES: &[&str] = &["generic", "wildberries", "ozon"];

/// One product field in a profile
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    /// Field name (`name`, `price`, `description`, `characteristics`, ...)
    pub name: String,

    /// How probe output is converted
    #[serde(default)]
    pub kind: ValueKind,

    /// Acceptance test
    #[serde(default)]
    pub accept: Acceptance,

    /// Literal used when every probe misses
    #[serde(default)]
    pub default: Option<FieldValue>,

    /// Text values are truncated to this many characters
    #[serde(default)]
    pub max_chars: Option<usize>,

    /// Probes in preference order
    pub probes: Vec<ProbeEntry>,
}

/// A probe, optionally with post-processing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProbeEntry {
    /// Probe used as is
    Plain(Probe),

    /// Probe with value adjustments
    Tuned {
        /// The probe
        probe: Probe,
        /// Divide numeric values by this
        #[serde(default)]
        divide_by: Option<u64>,
        /// Keep only text before any of these separators
        #[serde(default)]
        cut_at: Vec<String>,
    },
}

impl ProbeEntry {
    /// The underlying probe
    pub fn probe(&self) -> &Probe {
        match self {
            ProbeEntry::Plain(probe) | ProbeEntry::Tuned { probe, .. } => probe,
        }
    }
}

/// Where reviews are found
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReviewSpec {
    /// Probes in preference order
    #[serde(default)]
    pub probes: Vec<Probe>,

    /// Look for a star rating inside each review text
    #[serde(default)]
    pub detect_rating: bool,

    /// Overrides the configured minimum review length
    #[serde(default)]
    pub min_chars: Option<usize>,
}

/// Extraction profile for one marketplace
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    /// Profile name
    pub name: String,

    /// Prefix for product ids (`wb` gives `wb_123`; its reviews are `wb_123_review_1`, ...)
    pub id_prefix: String,

    /// Hosts this profile is selected for (subdomains match too)
    #[serde(default)]
    pub hosts: Vec<String>,

    /// Pattern whose first capture group is the marketplace product id
    #[serde(default)]
    pub id_pattern: Option<String>,

    /// Product API endpoint with an `{id}` placeholder
    #[serde(default)]
    pub api_url: Option<String>,

    /// ISO currency code for prices
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Product fields
    #[serde(default)]
    pub fields: Vec<FieldSpec>,

    /// Review probes
    #[serde(default)]
    pub reviews: ReviewSpec,
}

fn default_currency() -> String {
    "RUB".to_string()
}

impl Profile {
    /// Load a built-in profile by name
    pub fn builtin(name: &str) -> Result<Self, ExtractorError> {
        let source = match name {
            "generic" => GENERIC,
            "wildberries" => WILDBERRIES,
            "ozon" => OZON,
            other => {
                return Err(ExtractorError::Profile(format!(
                    "Unknown built-in profile '{}' (available: {})",
                    other,
                    BUILTIN_PROFILES.join(", ")
                )))
            }
        };
        Self::from_toml(source)
    }

    /// All built-in profiles
    pub fn builtins() -> Result<Vec<Self>, ExtractorError> {
        BUILTIN_PROFILES.iter().map(|name| Self::builtin(name)).collect()
    }

    /// Pick the built-in profile whose hosts match the URL, `generic` otherwise
    pub fn for_url(url: &str) -> Result<Self, ExtractorError> {
        let host = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_lowercase()));

        if let Some(host) = host {
            for profile in Self::builtins()? {
                if profile.matches_host(&host) {
                    return Ok(profile);
                }
            }
        }
        Self::builtin("generic")
    }

    /// Parse and validate a profile
    pub fn from_toml(toml_str: &str) -> Result<Self, ExtractorError> {
        let profile: Profile = toml::from_str(toml_str)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Serialize to TOML
    pub fn to_toml(&self) -> Result<String, ExtractorError> {
        toml::to_string_pretty(self).map_err(|e| ExtractorError::Profile(e.to_string()))
    }

    /// Check the profile for mistakes that would otherwise only show up as misses
    pub fn validate(&self) -> Result<(), ExtractorError> {
        if self.id_prefix.trim().is_empty() {
            return Err(ExtractorError::Profile(format!(
                "Profile '{}' has an empty id_prefix",
                self.name
            )));
        }

        let mut names = HashSet::new();
        for field in &self.fields {
            if !names.insert(field.name.as_str()) {
                return Err(ExtractorError::Profile(format!(
                    "Field '{}' is declared twice in profile '{}'",
                    field.name, self.name
                )));
            }
            if field.probes.is_empty() {
                return Err(ExtractorError::Profile(format!(
                    "Field '{}' in profile '{}' has no probes",
                    field.name, self.name
                )));
            }
            if field.kind == ValueKind::Number {
                if let Some(FieldValue::Text(text)) = &field.default {
                    return Err(ExtractorError::Profile(format!(
                        "Field '{}' in profile '{}' is numeric but its default \"{}\" is text",
                        field.name, self.name, text
                    )));
                }
            }
        }

        let probes = self
            .fields
            .iter()
            .flat_map(|f| f.probes.iter().map(ProbeEntry::probe))
            .chain(self.reviews.probes.iter());
        for probe in probes {
            if let Probe::Regex(pattern) = probe {
                Regex::new(pattern)?;
            }
        }

        if let Some(pattern) = &self.id_pattern {
            if Regex::new(pattern)?.captures_len() < 2 {
                return Err(ExtractorError::Profile(format!(
                    "id_pattern of profile '{}' needs a capture group",
                    self.name
                )));
            }
        }

        if let Some(api) = &self.api_url {
            if !api.contains("{id}") {
                return Err(ExtractorError::Profile(format!(
                    "api_url of profile '{}' must contain {{id}}",
                    self.name
                )));
            }
        }

        Ok(())
    }

    /// Whether `host` is one of this profile's hosts or a subdomain of one
    pub fn matches_host(&self, host: &str) -> bool {
        self.hosts
            .iter()
            .any(|h| host == h || host.ends_with(&format!(".{}", h)))
    }

    /// Marketplace product id captured from the URL
    pub fn native_id(&self, url: &str) -> Option<String> {
        let pattern = Regex::new(self.id_pattern.as_deref()?).ok()?;
        pattern
            .captures(url)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Product id for a URL
    ///
    /// `<prefix>_<native id>` when the id pattern matches, otherwise
    /// `<prefix>_<hash of host and path>`, or `<prefix>_unknown` when the URL
    /// has no host.
    pub fn product_id(&self, url: &str) -> String {
        if let Some(id) = self.native_id(url) {
            return format!("{}_{}", self.id_prefix, id);
        }

        match Url::parse(url).ok().filter(|u| u.host_str().is_some()) {
            Some(parsed) => {
                let key = format!(
                    "{}{}",
                    parsed.host_str().unwrap_or_default().to_lowercase(),
                    parsed.path().trim_end_matches('/')
                );
                format!("{}_{:016x}", self.id_prefix, fnv1a(key.as_bytes()))
            }
            None => format!("{}_unknown", self.id_prefix),
        }
    }

    /// Product API URL for a page URL, when the profile has one and the id is known
    pub fn api_url_for(&self, url: &str) -> Option<String> {
        let template = self.api_url.as_deref()?;
        let id = self.native_id(url)?;
        Some(template.replace("{id}", &id))
    }

    /// Build the chain fields, optionally limiting each strategy attempt
    pub fn build_fields(&self, timeout: Option<Duration>) -> Vec<Field> {
        self.fields
            .iter()
            .map(|spec| {
                let mut field = Field::new(spec.name.clone()).accept(spec.accept.clone());
                for entry in &spec.probes {
                    let strategy = match entry {
                        ProbeEntry::Plain(probe) => ProbeStrategy::new(probe.clone(), spec.kind),
                        ProbeEntry::Tuned {
                            probe,
                            divide_by,
                            cut_at,
                        } => ProbeStrategy::new(probe.clone(), spec.kind)
                            .divide_by(divide_by.unwrap_or(1))
                            .cut_at(cut_at.clone()),
                    }
                    .max_chars(spec.max_chars);
                    field = field.strategy(limit(Arc::new(strategy), timeout));
                }
                if let Some(default) = &spec.default {
                    field = field.default_value(default.clone());
                }
                field
            })
            .collect()
    }

    /// Build the review strategies in preference order
    pub fn review_strategies(&self, timeout: Option<Duration>) -> Vec<Arc<dyn Strategy>> {
        self.reviews
            .probes
            .iter()
            .map(|probe| limit(Arc::new(ProbeStrategy::new(probe.clone(), ValueKind::Text)), timeout))
            .collect()
    }
}

fn limit(strategy: Arc<dyn Strategy>, timeout: Option<Duration>) -> Arc<dyn Strategy> {
    match timeout {
        Some(limit) => Arc::new(Timed::new(strategy, limit)),
        None => strategy,
    }
}

/// 64-bit FNV-1a, stable across builds and platforms
fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_parse() {
        let profiles = Profile::builtins().unwrap();
        assert_eq!(profiles.len(), 3);
        for profile in &profiles {
            assert!(!profile.fields.is_empty(), "{} has no fields", profile.name);
            assert!(!profile.reviews.probes.is_empty(), "{} has no review probes", profile.name);
        }
    }

    #[test]
    fn test_unknown_builtin() {
        assert!(matches!(Profile::builtin("amazon"), Err(ExtractorError::Profile(_))));
    }

    #[test]
    fn test_selection_by_host() {
        let wb = Profile::for_url("https://www.wildberries.ru/catalog/264196671/detail.aspx").unwrap();
        assert_eq!(wb.name, "wildberries");

        let ozon = Profile::for_url("https://ozon.ru/product/kofemashina-philips-1234567/").unwrap();
        assert_eq!(ozon.name, "ozon");

        let other = Profile::for_url("https://shop.example.com/item/5").unwrap();
        assert_eq!(other.name, "generic");

        let lookalike = Profile::for_url("https://notwildberries.ru/catalog/1/").unwrap();
        assert_eq!(lookalike.name, "generic");
    }

    #[test]
    fn test_product_ids() {
        let wb = Profile::builtin("wildberries").unwrap();
        assert_eq!(
            wb.product_id("https://www.wildberries.ru/catalog/264196671/detail.aspx"),
            "wb_264196671"
        );

        let ozon = Profile::builtin("ozon").unwrap();
        assert_eq!(
            ozon.product_id("https://www.ozon.ru/product/kofemashina-philips-1234567/?from=sku"),
            "ozon_1234567"
        );

        let generic = Profile::builtin("generic").unwrap();
        let a = generic.product_id("https://shop.example.com/item/5?utm=1");
        let b = generic.product_id("https://shop.example.com/item/5/");
        let c = generic.product_id("https://shop.example.com/item/6");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("generic_"));
        assert_eq!(generic.product_id("not a url"), "generic_unknown");
    }

    #[test]
    fn test_api_url() {
        let wb = Profile::builtin("wildberries").unwrap();
        let api = wb
            .api_url_for("https://www.wildberries.ru/catalog/42/detail.aspx")
            .unwrap();
        assert!(api.ends_with("&nm=42"));
        assert!(wb.api_url_for("https://www.wildberries.ru/brands/x").is_none());
    }

    #[test]
    fn test_tuned_probe_entries() {
        let wb = Profile::builtin("wildberries").unwrap();
        let price = wb.fields.iter().find(|f| f.name == "price").unwrap();
        assert_eq!(price.kind, ValueKind::Number);
        assert!(matches!(
            &price.probes[0],
            ProbeEntry::Tuned { divide_by: Some(100), .. }
        ));
    }

    #[test]
    fn test_build_fields_keeps_order_and_defaults() {
        let wb = Profile::builtin("wildberries").unwrap();
        let fields = wb.build_fields(None);
        let name = fields.iter().find(|f| f.name() == "name").unwrap();
        assert_eq!(name.strategies()[0].id(), "json:/data/products/0/name");
        assert_eq!(name.strategies()[1].id(), "css:h1");
        assert_eq!(
            name.default(),
            &crate::chain::FieldDefault::Literal(FieldValue::from("Товар без названия"))
        );

        let timed = wb.build_fields(Some(Duration::from_secs(1)));
        assert_eq!(timed[0].strategies()[0].id(), "json:/data/products/0/name");
    }

    #[test]
    fn test_validation_errors() {
        let duplicate = r#"
            name = "dup"
            id_prefix = "d"
            [[fields]]
            name = "name"
            probes = ["css:h1"]
            [[fields]]
            name = "name"
            probes = ["title"]
        "#;
        assert!(matches!(Profile::from_toml(duplicate), Err(ExtractorError::Profile(_))));

        let bad_regex = r#"
            name = "bad"
            id_prefix = "b"
            [[fields]]
            name = "price"
            probes = ["regex:(\\d+"]
        "#;
        assert!(matches!(Profile::from_toml(bad_regex), Err(ExtractorError::Pattern(_))));

        let bad_probe = r#"
            name = "bad"
            id_prefix = "b"
            [[fields]]
            name = "price"
            probes = ["xpath://span"]
        "#;
        assert!(matches!(Profile::from_toml(bad_probe), Err(ExtractorError::TomlParse(_))));

        let no_group = r#"
            name = "bad"
            id_prefix = "b"
            id_pattern = '/p/\d+'
        "#;
        assert!(matches!(Profile::from_toml(no_group), Err(ExtractorError::Profile(_))));
    }

    #[test]
    fn test_numeric_field_needs_numeric_default() {
        let text_default = r#"
            name = "shop"
            id_prefix = "s"
            [[fields]]
            name = "price"
            kind = "number"
            default = "unknown"
            probes = ["css:.price"]
        "#;
        match Profile::from_toml(text_default) {
            Err(ExtractorError::Profile(message)) => assert!(message.contains("price")),
            other => panic!("expected a profile error, got {:?}", other),
        }

        let number_default = text_default.replace(r#"default = "unknown""#, "default = 0");
        let profile = Profile::from_toml(&number_default).unwrap();
        assert_eq!(profile.fields[0].default, Some(FieldValue::Number(0)));

        let text_field = text_default.replace(r#"kind = "number""#, r#"kind = "text""#);
        assert!(Profile::from_toml(&text_field).is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let ozon = Profile::builtin("ozon").unwrap();
        let text = ozon.to_toml().unwrap();
        let parsed = Profile::from_toml(&text).unwrap();
        assert_eq!(parsed.fields.len(), ozon.fields.len());
        assert_eq!(parsed.reviews.probes, ozon.reviews.probes);
    }
}
