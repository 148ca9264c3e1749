//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use lens_domain::{Entity, Product, Review, SourceAccessor};
use lens_extractor::{
    ExtractionPipeline, ExtractorError, HtmlSource, JsonSource, LayeredSource, PageFetcher, Profile, Target,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Execute the extract command.
pub async fn execute_extract(args: ExtractArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    if (args.html.is_some() || args.json.is_some()) && args.urls.len() != 1 {
        return Err(CliError::InvalidInput(
            "--html and --json can only be used with a single URL".to_string(),
        ));
    }

    let mut extractor_config = config.extractor.clone();
    if args.no_fallback {
        extractor_config.synthesize_fallback = false;
    }

    let explicit = args.profile.as_deref().map(load_profile).transpose()?;
    let mut groups: Vec<(Profile, Vec<String>)> = Vec::new();
    for url in &args.urls {
        let profile = match &explicit {
            Some(profile) => profile.clone(),
            None => Profile::for_url(url)?,
        };
        match groups.iter_mut().find(|(p, _)| p.name == profile.name) {
            Some((_, urls)) => urls.push(url.clone()),
            None => groups.push((profile, vec![url.clone()])),
        }
    }

    let fetcher = PageFetcher::with_timeout(config.fetch.timeout())?.with_max_retries(config.fetch.max_retries);
    let mut entities = Vec::new();
    let mut last_failure = None;

    for (profile, urls) in groups {
        info!("Using profile {} for {} URL(s)", profile.name, urls.len());
        let pipeline = Arc::new(ExtractionPipeline::from_profile(&profile, &extractor_config)?);

        let mut jobs = Vec::with_capacity(urls.len());
        for url in urls {
            match load_source(&args, &fetcher, &profile, &url).await {
                Ok(source) => jobs.push((source, Target::new(profile.product_id(&url), url))),
                Err(e) => {
                    let failure = CliError::extraction(url, e);
                    eprintln!("{}", formatter.error(&failure.to_string()));
                    last_failure = Some(failure);
                }
            }
        }

        let urls: Vec<String> = jobs.iter().map(|(_, target)| target.url.clone()).collect();
        for (url, result) in urls.into_iter().zip(pipeline.run_many(jobs).await) {
            match result {
                Ok(entity) => entities.push(entity),
                Err(e) => {
                    let failure = CliError::extraction(url, e);
                    eprintln!("{}", formatter.error(&failure.to_string()));
                    last_failure = Some(failure);
                }
            }
        }
    }

    if entities.is_empty() {
        return Err(last_failure.unwrap_or_else(|| CliError::InvalidInput("No URLs given".to_string())));
    }

    let (products_path, reviews_path) = write_outputs(&args.out, &entities)?;
    println!("{}", formatter.extraction_summary(&entities)?);
    if entities.iter().any(Entity::has_synthesized_reviews) {
        println!(
            "{}",
            formatter.warning("Some products had no reviews; placeholder reviews were substituted")
        );
    }
    println!(
        "{}",
        formatter.success(&format!(
            "Wrote {} and {}",
            products_path.display(),
            reviews_path.display()
        ))
    );

    Ok(())
}

/// Resolve `--profile`: a path to a TOML file, or a built-in name
pub fn load_profile(name_or_path: &str) -> Result<Profile> {
    let path = Path::new(name_or_path);
    if path.extension().is_some_and(|ext| ext == "toml") || path.exists() {
        let contents = fs::read_to_string(path)?;
        return Ok(Profile::from_toml(&contents)?);
    }
    Ok(Profile::builtin(name_or_path)?)
}

fn read_saved(path: &Path) -> std::result::Result<String, ExtractorError> {
    fs::read_to_string(path).map_err(|e| ExtractorError::SourceUnavailable {
        target: path.display().to_string(),
        reason: e.to_string(),
    })
}

async fn load_source(
    args: &ExtractArgs,
    fetcher: &PageFetcher,
    profile: &Profile,
    url: &str,
) -> std::result::Result<Arc<dyn SourceAccessor>, ExtractorError> {
    let page = match &args.html {
        Some(path) => Some(HtmlSource::new(url, read_saved(path)?)),
        None => None,
    };
    let api = match &args.json {
        Some(path) => Some(JsonSource::parse(url, &read_saved(path)?)?),
        None => None,
    };

    let source: Arc<dyn SourceAccessor> = match (api, page) {
        (Some(api), Some(page)) => {
            let layers: Vec<Arc<dyn SourceAccessor>> = vec![Arc::new(api), Arc::new(page)];
            Arc::new(LayeredSource::new(url, layers))
        }
        (Some(api), None) => Arc::new(api),
        (None, Some(page)) => Arc::new(page),
        (None, None) => Arc::new(fetcher.fetch_for(profile, url).await?),
    };
    Ok(source)
}

/// Write `product.json` and `reviews.json` into `dir`
pub fn write_outputs(dir: &Path, entities: &[Entity]) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(dir)?;

    let products: Vec<&Product> = entities.iter().map(Entity::product).collect();
    let reviews: Vec<&Review> = entities.iter().flat_map(|e| e.reviews()).collect();

    let products_path = dir.join("product.json");
    let reviews_path = dir.join("reviews.json");
    fs::write(&products_path, serde_json::to_string_pretty(&products)?)?;
    fs::write(&reviews_path, serde_json::to_string_pretty(&reviews)?)?;
    Ok((products_path, reviews_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;

    const URL: &str = "https://www.wildberries.ru/catalog/264196671/detail.aspx";

    const PAGE: &str = r#"<html><body>
<h1 class="product-page__title">Люстра потолочная LED 60W</h1>
<ins class="price-block__final-price">1 298 ₽</ins>
</body></html>"#;

    fn args(out: &Path, html: Option<PathBuf>, json: Option<PathBuf>) -> ExtractArgs {
        ExtractArgs {
            urls: vec![URL.to_string()],
            html,
            json,
            profile: None,
            out: out.to_path_buf(),
            no_fallback: false,
        }
    }

    #[tokio::test]
    async fn test_extract_from_saved_page() {
        let dir = tempfile::tempdir().unwrap();
        let html = dir.path().join("page.html");
        fs::write(&html, PAGE).unwrap();
        let out = dir.path().join("out");

        let formatter = Formatter::new(OutputFormat::Table, false);
        execute_extract(args(&out, Some(html), None), &Config::default(), &formatter)
            .await
            .unwrap();

        let products: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join("product.json")).unwrap()).unwrap();
        assert_eq!(products.as_array().unwrap().len(), 1);
        assert_eq!(products[0]["id"], "wb_264196671");
        assert_eq!(products[0]["name"], "Люстра потолочная LED 60W");
        assert_eq!(products[0]["price"], 1298);

        let reviews: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join("reviews.json")).unwrap()).unwrap();
        assert_eq!(reviews.as_array().unwrap().len(), 6);
        assert_eq!(reviews[0]["provenance"], "synthesized");
        assert_eq!(reviews[0]["product_id"], "wb_264196671");
    }

    #[tokio::test]
    async fn test_saved_api_payload_layers_over_page() {
        let dir = tempfile::tempdir().unwrap();
        let html = dir.path().join("page.html");
        let json = dir.path().join("card.json");
        fs::write(&html, PAGE).unwrap();
        fs::write(&json, r#"{"data": {"products": [{"salePriceU": 109900}]}}"#).unwrap();

        let mut args = args(dir.path(), Some(html), Some(json));
        args.no_fallback = true;
        let formatter = Formatter::new(OutputFormat::Json, false);
        execute_extract(args, &Config::default(), &formatter).await.unwrap();

        let products: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("product.json")).unwrap()).unwrap();
        assert_eq!(products[0]["price"], 1099);
        assert_eq!(products[0]["name"], "Люстра потолочная LED 60W");

        let reviews = fs::read_to_string(dir.path().join("reviews.json")).unwrap();
        assert_eq!(reviews.trim(), "[]");
    }

    #[tokio::test]
    async fn test_missing_saved_page_reports_url_and_class() {
        let dir = tempfile::tempdir().unwrap();
        let formatter = Formatter::new(OutputFormat::Table, false);
        let result = execute_extract(
            args(dir.path(), Some(dir.path().join("absent.html")), None),
            &Config::default(),
            &formatter,
        )
        .await;

        match result {
            Err(CliError::Extraction { url, class, .. }) => {
                assert_eq!(url, URL);
                assert_eq!(class, "source-unavailable");
            }
            other => panic!("expected an extraction error, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_saved_files_need_single_url() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(dir.path(), Some(dir.path().join("page.html")), None);
        args.urls.push("https://www.ozon.ru/product/1/".to_string());
        let formatter = Formatter::new(OutputFormat::Table, false);
        let result = execute_extract(args, &Config::default(), &formatter).await;
        assert!(matches!(result, Err(CliError::InvalidInput(_))));
    }

    #[test]
    fn test_load_profile_by_name_and_path() {
        assert_eq!(load_profile("ozon").unwrap().name, "ozon");
        assert!(matches!(load_profile("no-such-profile"), Err(CliError::Extractor(_))));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shop.toml");
        let toml = Profile::builtin("generic").unwrap().to_toml().unwrap();
        fs::write(&path, toml).unwrap();
        assert_eq!(load_profile(path.to_str().unwrap()).unwrap().name, "generic");
    }
}
