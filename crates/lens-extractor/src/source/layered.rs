//! Several snapshots of the same product queried as one source

use async_trait::async_trait;
use lens_domain::{Probe, SourceAccessor, SourceError};
use std::sync::Arc;
use tracing::{debug, warn};

/// Layers are asked in order; the first one that answers a probe with at
/// least one candidate wins
///
/// An unavailable layer is skipped. A lookup fails as unavailable only when
/// every layer is.
///
/// Typical use is an API payload in front of the rendered page, so `json:`
/// probes hit the payload and `css:` probes fall through to the page.
#[derive(Clone)]
pub struct LayeredSource {
    label: String,
    layers: Vec<Arc<dyn SourceAccessor>>,
}

impl LayeredSource {
    /// Combine layers under one label
    pub fn new(label: impl Into<String>, layers: Vec<Arc<dyn SourceAccessor>>) -> Self {
        Self {
            label: label.into(),
            layers,
        }
    }

    /// Number of layers
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether there are no layers
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl std::fmt::Debug for LayeredSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayeredSource")
            .field("label", &self.label)
            .field(
                "layers",
                &self.layers.iter().map(|l| l.describe()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[async_trait]
impl SourceAccessor for LayeredSource {
    fn describe(&self) -> String {
        self.label.clone()
    }

    async fn probe(&self, probe: &Probe) -> Result<Vec<String>, SourceError> {
        let mut last_miss = None;
        let mut last_fatal = None;
        let mut reachable = false;
        for layer in &self.layers {
            match layer.probe(probe).await {
                Ok(found) if !found.is_empty() => return Ok(found),
                Ok(_) => reachable = true,
                Err(e) if e.is_fatal() => {
                    warn!("Layer {} unavailable: {}", layer.describe(), e);
                    last_fatal = Some(e);
                }
                Err(e) => {
                    debug!("Layer {} cannot answer {}: {}", layer.describe(), probe, e);
                    reachable = true;
                    last_miss = Some(e);
                }
            }
        }

        match (reachable, last_fatal, last_miss) {
            (false, Some(fatal), _) => Err(fatal),
            (_, _, Some(SourceError::Miss(reason))) => Err(SourceError::Miss(reason)),
            _ => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{HtmlSource, JsonSource};
    use serde_json::json;

    fn layered() -> LayeredSource {
        let api = JsonSource::new("api", json!({"data": {"products": [{"name": "Из API"}]}}));
        let page = HtmlSource::new("page", "<html><body><h1>Со страницы</h1></body></html>");
        let layers: Vec<Arc<dyn SourceAccessor>> = vec![Arc::new(api), Arc::new(page)];
        LayeredSource::new("https://example.com/p/1", layers)
    }

    struct Dead;

    #[async_trait]
    impl SourceAccessor for Dead {
        fn describe(&self) -> String {
            "dead".to_string()
        }

        async fn probe(&self, _probe: &Probe) -> Result<Vec<String>, SourceError> {
            Err(SourceError::Unavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_unavailable_layer_is_skipped() {
        let page = HtmlSource::new("page", "<html><body><h1>Со страницы</h1></body></html>");
        let layers: Vec<Arc<dyn SourceAccessor>> = vec![Arc::new(Dead), Arc::new(page)];
        let source = LayeredSource::new("https://example.com/p/1", layers);

        let probe: Probe = "css:h1".parse().unwrap();
        assert_eq!(source.probe(&probe).await.unwrap(), vec!["Со страницы"]);

        let nothing: Probe = "css:.price".parse().unwrap();
        assert!(source.probe(&nothing).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fatal_only_when_every_layer_is_unavailable() {
        let layers: Vec<Arc<dyn SourceAccessor>> = vec![Arc::new(Dead), Arc::new(Dead)];
        let source = LayeredSource::new("https://example.com/p/1", layers);

        let probe: Probe = "css:h1".parse().unwrap();
        let err = source.probe(&probe).await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_probes_fall_through_layers() {
        let source = layered();
        assert_eq!(source.len(), 2);

        let api_probe: Probe = "json:/data/products/0/name".parse().unwrap();
        assert_eq!(source.probe(&api_probe).await.unwrap(), vec!["Из API"]);

        let page_probe: Probe = "css:h1".parse().unwrap();
        assert_eq!(source.probe(&page_probe).await.unwrap(), vec!["Со страницы"]);

        let nothing: Probe = "css:.price".parse().unwrap();
        assert!(source.probe(&nothing).await.unwrap().is_empty());
    }
}
