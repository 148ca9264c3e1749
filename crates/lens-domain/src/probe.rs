//! Probes: named queries a source accessor knows how to answer
//!
//! Probes are written as short strings so that marketplace profiles can list
//! them in configuration files:
//!
//! | Form | Meaning |
//! |------|---------|
//! | `css:<selector>` | Text of every element matching the selector |
//! | `attr:<selector>@<attr>` | Attribute value of every matching element |
//! | `meta:<property>` | `content` of `<meta property=..>` / `<meta name=..>` |
//! | `title` | Document title |
//! | `regex:<pattern>` | Every match (first capture group if present) over the raw text |
//! | `json:<pointer>` | RFC 6901 pointer into a JSON payload |
//! | `key:<name>` | Every value stored under `name`, searched at any depth |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a probe string cannot be parsed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeParseError {
    /// Missing `kind:` prefix or unknown kind
    #[error("Unknown probe kind in '{0}'")]
    UnknownKind(String),

    /// The probe body is empty
    #[error("Empty probe body in '{0}'")]
    EmptyBody(String),

    /// `attr:` probe without `@attribute`
    #[error("Attribute probe '{0}' must be written as attr:<selector>@<attribute>")]
    MissingAttribute(String),

    /// JSON pointer that does not start with '/'
    #[error("JSON pointer '{0}' must start with '/'")]
    InvalidPointer(String),
}

/// A query against a source snapshot
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Probe {
    /// CSS selector; yields element text
    Css(String),

    /// CSS selector plus attribute name; yields attribute values
    Attr {
        /// Element selector
        selector: String,
        /// Attribute to read
        attr: String,
    },

    /// Meta tag property or name; yields its content
    Meta(String),

    /// Document title
    Title,

    /// Regular expression over the raw source text
    Regex(String),

    /// JSON pointer
    JsonPointer(String),

    /// Deep key search in JSON
    JsonKey(String),
}

impl Probe {
    /// Short kind label, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Probe::Css(_) => "css",
            Probe::Attr { .. } => "attr",
            Probe::Meta(_) => "meta",
            Probe::Title => "title",
            Probe::Regex(_) => "regex",
            Probe::JsonPointer(_) => "json",
            Probe::JsonKey(_) => "key",
        }
    }
}

impl FromStr for Probe {
    type Err = ProbeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "title" {
            return Ok(Probe::Title);
        }

        let (kind, body) = s
            .split_once(':')
            .ok_or_else(|| ProbeParseError::UnknownKind(s.to_string()))?;
        let body = body.trim();
        if body.is_empty() {
            return Err(ProbeParseError::EmptyBody(s.to_string()));
        }

        match kind {
            "css" => Ok(Probe::Css(body.to_string())),
            "attr" => {
                let (selector, attr) = body
                    .rsplit_once('@')
                    .filter(|(sel, attr)| !sel.trim().is_empty() && !attr.trim().is_empty())
                    .ok_or_else(|| ProbeParseError::MissingAttribute(s.to_string()))?;
                Ok(Probe::Attr {
                    selector: selector.trim().to_string(),
                    attr: attr.trim().to_string(),
                })
            }
            "meta" => Ok(Probe::Meta(body.to_string())),
            "regex" => Ok(Probe::Regex(body.to_string())),
            "json" => {
                if !body.starts_with('/') {
                    return Err(ProbeParseError::InvalidPointer(body.to_string()));
                }
                Ok(Probe::JsonPointer(body.to_string()))
            }
            "key" => Ok(Probe::JsonKey(body.to_string())),
            _ => Err(ProbeParseError::UnknownKind(s.to_string())),
        }
    }
}

impl TryFrom<String> for Probe {
    type Error = ProbeParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Probe> for String {
    fn from(probe: Probe) -> Self {
        probe.to_string()
    }
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Probe::Css(sel) => write!(f, "css:{}", sel),
            Probe::Attr { selector, attr } => write!(f, "attr:{}@{}", selector, attr),
            Probe::Meta(name) => write!(f, "meta:{}", name),
            Probe::Title => write!(f, "title"),
            Probe::Regex(pattern) => write!(f, "regex:{}", pattern),
            Probe::JsonPointer(ptr) => write!(f, "json:{}", ptr),
            Probe::JsonKey(key) => write!(f, "key:{}", key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_each_kind() {
        assert_eq!("css:h1".parse::<Probe>().unwrap(), Probe::Css("h1".to_string()));
        assert_eq!("title".parse::<Probe>().unwrap(), Probe::Title);
        assert_eq!(
            "meta:og:title".parse::<Probe>().unwrap(),
            Probe::Meta("og:title".to_string())
        );
        assert_eq!(
            "attr:meta[itemprop=price]@content".parse::<Probe>().unwrap(),
            Probe::Attr {
                selector: "meta[itemprop=price]".to_string(),
                attr: "content".to_string(),
            }
        );
        assert_eq!(
            "json:/data/products/0/name".parse::<Probe>().unwrap(),
            Probe::JsonPointer("/data/products/0/name".to_string())
        );
        assert_eq!(
            "key:salePriceU".parse::<Probe>().unwrap(),
            Probe::JsonKey("salePriceU".to_string())
        );
    }

    #[test]
    fn test_regex_body_may_contain_colons() {
        let probe: Probe = r"regex:(\d{3,6}\s?₽)|(\d+:\d+)".parse().unwrap();
        assert_eq!(probe, Probe::Regex(r"(\d{3,6}\s?₽)|(\d+:\d+)".to_string()));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!("h1".parse::<Probe>(), Err(ProbeParseError::UnknownKind(_))));
        assert!(matches!("xpath://h1".parse::<Probe>(), Err(ProbeParseError::UnknownKind(_))));
        assert!(matches!("css:".parse::<Probe>(), Err(ProbeParseError::EmptyBody(_))));
        assert!(matches!("attr:div".parse::<Probe>(), Err(ProbeParseError::MissingAttribute(_))));
        assert!(matches!("json:data".parse::<Probe>(), Err(ProbeParseError::InvalidPointer(_))));
    }

    #[test]
    fn test_display_matches_source_form() {
        for text in ["css:.price-block__final-price", "attr:a@href", "title", "key:name"] {
            let probe: Probe = text.parse().unwrap();
            assert_eq!(probe.to_string(), text);
        }
    }

    #[test]
    fn test_serde_as_string() {
        let probes: Vec<Probe> = serde_json::from_str(r#"["css:h1", "title"]"#).unwrap();
        assert_eq!(probes, vec![Probe::Css("h1".to_string()), Probe::Title]);

        let bad: Result<Vec<Probe>, _> = serde_json::from_str(r#"["nope"]"#);
        assert!(bad.is_err());
    }
}
