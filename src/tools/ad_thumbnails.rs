//! Handler for the `facebook_get_ad_thumbnails` tool.

use std::fmt::Write as _;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ToolError;
use crate::facebook::GraphClient;
use crate::model::{ContentItem, JsonObject, ToolResult};
use crate::schema::{ParametersSchema, PropertySchema, validate_args};
use crate::tools::args::{non_empty_list, optional_bool, optional_str};
use crate::tools::{ToolFuture, ToolHandler};

const AD_FIELDS: &str = "name,creative{id,thumbnail_url,image_url,\
asset_feed_spec{images{hash},bodies{text},titles{text}},\
object_story_spec{link_data{image_hash}}}";

const MIN_IMAGE_MB: f64 = 0.1;
const MAX_IMAGE_MB: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Thumbnail,
    Full,
    All,
}

impl Resolution {
    fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("thumbnail") => Self::Thumbnail,
            Some("full") => Self::Full,
            _ => Self::All,
        }
    }

    fn accepts(self, kind: ImageKind) -> bool {
        match self {
            Self::All => true,
            Self::Thumbnail => kind == ImageKind::Thumbnail,
            Self::Full => kind != ImageKind::Thumbnail,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Thumbnail,
    FullImage,
    HashConverted,
}

impl ImageKind {
    fn label(self) -> &'static str {
        match self {
            Self::Thumbnail => "thumbnail",
            Self::FullImage => "full_image",
            Self::HashConverted => "hash_converted",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageSource {
    pub kind: ImageKind,
    pub url: String,
}

#[derive(Debug, Default)]
struct ImageReport {
    kind: Option<ImageKind>,
    size_bytes: usize,
    error: Option<String>,
}

#[derive(Debug, Default)]
struct AdThumbnails {
    ad_id: String,
    ad_name: String,
    creative_id: Option<String>,
    creative_type: &'static str,
    images: Vec<ImageReport>,
    dynamic_counts: Option<(usize, usize)>,
    error: Option<String>,
}

pub struct AdThumbnailsHandler {
    client: Arc<GraphClient>,
}

impl AdThumbnailsHandler {
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }

    /// Resolve an image hash to a URL through the configured ad account.
    async fn url_for_hash(&self, hash: &str) -> Option<String> {
        let account = self.client.ad_account_id()?;
        let response = self
            .client
            .get(
                &format!("act_{}/adimages", account),
                &[
                    ("hashes", serde_json::json!([hash]).to_string()),
                    ("fields", "hash,url,permalink_url".to_string()),
                ],
            )
            .await;
        match response {
            Ok(data) => data
                .pointer("/data/0/url")
                .and_then(Value::as_str)
                .map(str::to_string),
            Err(e) => {
                warn!(hash, "failed to resolve image hash: {}", e);
                None
            }
        }
    }

    async fn image_sources(&self, creative: &Value) -> Vec<ImageSource> {
        let mut sources = Vec::new();
        for (pointer, kind) in [
            ("/thumbnail_url", ImageKind::Thumbnail),
            ("/image_url", ImageKind::FullImage),
        ] {
            if let Some(url) = creative.pointer(pointer).and_then(Value::as_str) {
                sources.push(ImageSource {
                    kind,
                    url: url.to_string(),
                });
            }
        }

        for hash in image_hashes(creative) {
            if let Some(url) = self.url_for_hash(&hash).await {
                sources.push(ImageSource {
                    kind: ImageKind::HashConverted,
                    url,
                });
            }
        }
        sources
    }
}

/// Unique image hashes from the asset feed and the link data, in order.
pub fn image_hashes(creative: &Value) -> Vec<String> {
    let feed = creative
        .pointer("/asset_feed_spec/images")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|image| image.get("hash").and_then(Value::as_str));
    let link = creative
        .pointer("/object_story_spec/link_data/image_hash")
        .and_then(Value::as_str);

    let mut hashes: Vec<String> = Vec::new();
    for hash in feed.chain(link) {
        if !hashes.iter().any(|h| h == hash) {
            hashes.push(hash.to_string());
        }
    }
    hashes
}

fn max_image_bytes(args: &JsonObject) -> Result<Option<usize>, ToolError> {
    let Some(mb) = args.get("max_image_size_mb").and_then(Value::as_f64) else {
        return Ok(None);
    };
    if !(MIN_IMAGE_MB..=MAX_IMAGE_MB).contains(&mb) {
        return Err(ToolError::invalid_field(
            "max_image_size_mb",
            format!("must be between {} and {}", MIN_IMAGE_MB, MAX_IMAGE_MB),
        ));
    }
    Ok(Some((mb * 1024.0 * 1024.0) as usize))
}

fn render(ads: &[AdThumbnails]) -> String {
    if ads.is_empty() {
        return "No thumbnail data found for the provided ad IDs.".to_string();
    }

    let mut out = format!(
        "**Ad Thumbnails Retrieved**\n\nFound thumbnail data for {} ads:\n\n",
        ads.len()
    );
    let mut total_images = 0;
    let mut total_bytes = 0;

    for (index, ad) in ads.iter().enumerate() {
        let _ = writeln!(out, "**{}. {}**", index + 1, ad.ad_name);
        let _ = writeln!(out, "• Ad ID: {}", ad.ad_id);
        if let Some(creative_id) = &ad.creative_id {
            let _ = writeln!(out, "• Creative ID: {}", creative_id);
        }
        if let Some(error) = &ad.error {
            let _ = writeln!(out, "• Error: {}", error);
            out.push('\n');
            continue;
        }

        let _ = writeln!(out, "• Type: {}", ad.creative_type);
        if ad.images.is_empty() {
            out.push_str("• No images found\n");
        } else {
            let _ = writeln!(out, "• Images ({}):", ad.images.len());
        }
        for (n, image) in ad.images.iter().enumerate() {
            let label = image.kind.map_or("image", ImageKind::label);
            match &image.error {
                Some(error) => {
                    let _ = writeln!(out, "  {}. {}: embedding failed: {}", n + 1, label, error);
                }
                None => {
                    total_images += 1;
                    total_bytes += image.size_bytes;
                    let _ = writeln!(
                        out,
                        "  {}. {} ({:.1} KB)",
                        n + 1,
                        label,
                        image.size_bytes as f64 / 1024.0
                    );
                }
            }
        }
        if let Some((bodies, titles)) = ad.dynamic_counts {
            let _ = writeln!(
                out,
                "• Dynamic creative: {} bodies, {} titles",
                bodies, titles
            );
        }
        out.push('\n');
    }

    let _ = write!(
        out,
        "**Summary:** {} images embedded ({:.1} KB total)",
        total_images,
        total_bytes as f64 / 1024.0
    );
    out
}

impl ToolHandler for AdThumbnailsHandler {
    fn name(&self) -> &str {
        "facebook_get_ad_thumbnails"
    }

    fn description(&self) -> &str {
        "Get thumbnail and full-size images for specific Facebook ads, embedded as image content"
    }

    fn parameters(&self) -> ParametersSchema {
        ParametersSchema::default()
            .property(
                "ad_ids",
                PropertySchema::array_of(PropertySchema::string())
                    .describe("Ad IDs to fetch images for"),
            )
            .property(
                "resolution",
                PropertySchema::string()
                    .one_of(["thumbnail", "full", "all"])
                    .describe("Which images to include (default all)"),
            )
            .property(
                "include_ad_details",
                PropertySchema::boolean()
                    .describe("Include dynamic creative details (default true)"),
            )
            .property(
                "max_image_size_mb",
                PropertySchema::number()
                    .describe("Largest image to download, in megabytes (0.1 to 10)"),
            )
            .require(["ad_ids"])
            .closed()
    }

    fn execute(&self, args: JsonObject) -> ToolFuture<'_> {
        Box::pin(async move {
            validate_args(&self.parameters(), &args)?;
            let ad_ids = non_empty_list(&args, "ad_ids", "ad ID")?;
            let resolution = Resolution::parse(optional_str(&args, "resolution"));
            let include_details = optional_bool(&args, "include_ad_details", true);
            let max_bytes = max_image_bytes(&args)?;

            debug!(count = ad_ids.len(), "fetching ad thumbnails");

            let mut ads = Vec::with_capacity(ad_ids.len());
            let mut images = Vec::new();

            for ad_id in ad_ids {
                let ad = match self
                    .client
                    .get(&ad_id, &[("fields", AD_FIELDS.to_string())])
                    .await
                {
                    Ok(ad) => ad,
                    Err(e) => {
                        warn!(ad_id = %ad_id, "failed to fetch ad: {}", e);
                        ads.push(AdThumbnails {
                            ad_name: "Unknown Ad".to_string(),
                            error: Some(e.message()),
                            ad_id,
                            ..Default::default()
                        });
                        continue;
                    }
                };

                let mut report = AdThumbnails {
                    ad_id: ad
                        .get("id")
                        .and_then(Value::as_str)
                        .map_or(ad_id, str::to_string),
                    ad_name: ad
                        .get("name")
                        .and_then(Value::as_str)
                        .unwrap_or("Unknown Ad")
                        .to_string(),
                    creative_type: "unknown",
                    ..Default::default()
                };

                let Some(creative) = ad.get("creative") else {
                    report.error = Some("No creative data found".to_string());
                    ads.push(report);
                    continue;
                };
                report.creative_id = creative
                    .get("id")
                    .and_then(Value::as_str)
                    .map(str::to_string);

                let sources = self.image_sources(creative).await;
                if sources.iter().any(|s| s.kind != ImageKind::Thumbnail) {
                    report.creative_type = "image";
                }

                for source in sources.into_iter().filter(|s| resolution.accepts(s.kind)) {
                    match self.client.download_image(&source.url, max_bytes).await {
                        Ok(image) => {
                            report.images.push(ImageReport {
                                kind: Some(source.kind),
                                size_bytes: image.bytes.len(),
                                error: None,
                            });
                            images.push(ContentItem::image(
                                STANDARD.encode(&image.bytes),
                                image.mime_type,
                            ));
                        }
                        Err(e) => {
                            warn!(url = %source.url, "failed to download image: {}", e);
                            report.images.push(ImageReport {
                                kind: Some(source.kind),
                                size_bytes: 0,
                                error: Some(e.message()),
                            });
                        }
                    }
                }

                if include_details && let Some(feed) = creative.get("asset_feed_spec") {
                    let count = |key: &str| feed.get(key).and_then(Value::as_array).map_or(0, Vec::len);
                    report.dynamic_counts = Some((count("bodies"), count("titles")));
                }
                ads.push(report);
            }

            let mut content = vec![ContentItem::text(render(&ads))];
            content.extend(images);
            Ok(ToolResult::content(content))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FacebookConfig;
    use crate::facebook::TokenStore;
    use axum::{Json, Router, extract::State, routing::get};
    use serde_json::json;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_hashes_are_unique_and_ordered() {
        let creative = json!({
            "asset_feed_spec": {"images": [{"hash": "a"}, {"hash": "b"}, {"hash": "a"}]},
            "object_story_spec": {"link_data": {"image_hash": "c"}}
        });
        assert_eq!(image_hashes(&creative), vec!["a", "b", "c"]);
        assert!(image_hashes(&json!({})).is_empty());
    }

    #[test]
    fn test_resolution_filter() {
        assert!(Resolution::parse(None).accepts(ImageKind::Thumbnail));
        assert!(!Resolution::parse(Some("full")).accepts(ImageKind::Thumbnail));
        assert!(Resolution::parse(Some("full")).accepts(ImageKind::HashConverted));
        assert!(!Resolution::parse(Some("thumbnail")).accepts(ImageKind::FullImage));
    }

    #[test]
    fn test_image_size_bounds() {
        let args = json!({"max_image_size_mb": 20}).as_object().cloned().unwrap();
        assert_eq!(
            max_image_bytes(&args).unwrap_err(),
            ToolError::Validation(vec!["max_image_size_mb: must be between 0.1 and 10".into()])
        );
        let args = json!({"max_image_size_mb": 1}).as_object().cloned().unwrap();
        assert_eq!(max_image_bytes(&args).unwrap(), Some(1024 * 1024));
    }

    #[tokio::test]
    async fn test_downloads_filtered_images() {
        let router = Router::new()
            .route(
                "/v18.0/77",
                get(|State(base): State<String>| async move {
                    Json(json!({
                        "id": "77",
                        "name": "Autumn",
                        "creative": {
                            "id": "c77",
                            "thumbnail_url": format!("{}/thumb.png", base),
                            "asset_feed_spec": {
                                "images": [{"hash": "h1"}],
                                "bodies": [{"text": "a"}, {"text": "b"}]
                            }
                        }
                    }))
                }),
            )
            .route(
                "/v18.0/act_9/adimages",
                get(|State(base): State<String>| async move {
                    Json(json!({"data": [{"hash": "h1", "url": format!("{}/full.jpg", base)}]}))
                }),
            )
            .route(
                "/thumb.png",
                get(|| async { ([("content-type", "image/png")], vec![1u8, 2]) }),
            )
            .route(
                "/full.jpg",
                get(|| async { ([("content-type", "image/jpeg")], vec![3u8, 4, 5]) }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let app = router.with_state(base.clone());
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let dir = TempDir::new().unwrap();
        let config = FacebookConfig {
            base_url: base.clone(),
            access_token: Some("t".into()),
            ad_account_id: Some("act_9".into()),
            token_path: dir.path().join("token.json"),
            request_timeout: Duration::from_secs(2),
            ..FacebookConfig::default()
        };
        let store = Arc::new(TokenStore::new(config.token_path.clone()));
        let handler = AdThumbnailsHandler::new(Arc::new(GraphClient::new(&config, store).unwrap()));

        let args = json!({"ad_ids": ["77"], "resolution": "full"});
        let result = handler
            .execute(args.as_object().cloned().unwrap())
            .await
            .unwrap();

        assert_eq!(result.images(), vec![("AwQF", "image/jpeg")]);
        let text = result.joined_text();
        assert!(text.starts_with("**Ad Thumbnails Retrieved**"));
        assert!(text.contains("**1. Autumn**\n• Ad ID: 77\n• Creative ID: c77\n• Type: image\n"));
        assert!(text.contains("  1. hash_converted (0.0 KB)"));
        assert!(text.contains("• Dynamic creative: 2 bodies, 0 titles"));
        assert!(text.ends_with("**Summary:** 1 images embedded (0.0 KB total)"));
    }

    #[test]
    fn test_render_errors_and_empty() {
        assert_eq!(render(&[]), "No thumbnail data found for the provided ad IDs.");
        let ads = vec![AdThumbnails {
            ad_id: "1".into(),
            ad_name: "Unknown Ad".into(),
            error: Some("Unknown ad".into()),
            ..Default::default()
        }];
        let text = render(&ads);
        assert!(text.contains("• Error: Unknown ad\n"));
        assert!(text.ends_with("**Summary:** 0 images embedded (0.0 KB total)"));
    }
}
