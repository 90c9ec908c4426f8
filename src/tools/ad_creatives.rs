//! Handler for the `facebook_get_ad_creatives` tool.
//!
//! Fetches the creative of each ad, derives a summary (type, best image,
//! headline, body, call to action) and optionally attaches the image itself.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::facebook::GraphClient;
use crate::model::{ContentItem, JsonObject, ToolResult, render_json};
use crate::schema::{ParametersSchema, PropertySchema, validate_args};
use crate::tools::args::{non_empty_list, optional_bool};
use crate::tools::{ToolFuture, ToolHandler};

const CREATIVE_FIELDS: &str = "id,name,creative{id,image_url,thumbnail_url,\
object_story_spec{video_data{image_url},link_data{name,message,caption,call_to_action}},\
asset_feed_spec{images{url},videos{video_id},titles{text},bodies{text},call_to_action_types}}";

pub struct AdCreativesHandler {
    client: Arc<GraphClient>,
}

impl AdCreativesHandler {
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreativeSummary {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub image_url: Option<String>,
    pub headline: Option<String>,
    pub body: Option<String>,
    pub call_to_action: Option<String>,
}

#[derive(Debug, Serialize)]
struct AdCreative {
    ad_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    ad_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    creative: Option<CreativeSummary>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    image_embedded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn text_at(value: &Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn array_len(value: &Value, pointer: &str) -> usize {
    value
        .pointer(pointer)
        .and_then(Value::as_array)
        .map_or(0, Vec::len)
}

pub fn summarize_creative(creative: &Value) -> CreativeSummary {
    let kind = if creative.pointer("/object_story_spec/video_data").is_some()
        || array_len(creative, "/asset_feed_spec/videos") > 0
    {
        "video"
    } else if array_len(creative, "/asset_feed_spec/images") > 1 {
        "carousel"
    } else {
        "image"
    };

    // Full-size sources first, thumbnail last.
    let image_url = text_at(creative, "/asset_feed_spec/images/0/url")
        .or_else(|| text_at(creative, "/object_story_spec/video_data/image_url"))
        .or_else(|| text_at(creative, "/image_url"))
        .or_else(|| text_at(creative, "/thumbnail_url"));

    CreativeSummary {
        id: text_at(creative, "/id"),
        kind,
        image_url,
        headline: text_at(creative, "/object_story_spec/link_data/name")
            .or_else(|| text_at(creative, "/asset_feed_spec/titles/0/text")),
        body: text_at(creative, "/object_story_spec/link_data/message")
            .or_else(|| text_at(creative, "/asset_feed_spec/bodies/0/text")),
        call_to_action: text_at(creative, "/object_story_spec/link_data/call_to_action/type")
            .or_else(|| text_at(creative, "/asset_feed_spec/call_to_action_types/0")),
    }
}

impl ToolHandler for AdCreativesHandler {
    fn name(&self) -> &str {
        "facebook_get_ad_creatives"
    }

    fn description(&self) -> &str {
        "Get ad creatives (type, image, headline, body, call to action) for specific Facebook ad IDs"
    }

    fn parameters(&self) -> ParametersSchema {
        ParametersSchema::default()
            .property(
                "ad_ids",
                PropertySchema::array_of(PropertySchema::string())
                    .describe("Ad IDs whose creatives should be fetched"),
            )
            .property(
                "include_images",
                PropertySchema::boolean()
                    .describe("Download each creative's image and attach it (default true)"),
            )
            .require(["ad_ids"])
            .closed()
    }

    fn execute(&self, args: JsonObject) -> ToolFuture<'_> {
        Box::pin(async move {
            validate_args(&self.parameters(), &args)?;
            let ad_ids = non_empty_list(&args, "ad_ids", "ad ID")?;
            let include_images = optional_bool(&args, "include_images", true);

            let mut ads = Vec::with_capacity(ad_ids.len());
            let mut images = Vec::new();

            for ad_id in ad_ids {
                let ad = match self
                    .client
                    .get(&ad_id, &[("fields", CREATIVE_FIELDS.to_string())])
                    .await
                {
                    Ok(ad) => ad,
                    Err(e) => {
                        warn!(ad_id = %ad_id, "failed to fetch creative: {}", e);
                        ads.push(AdCreative {
                            ad_id,
                            ad_name: None,
                            creative: None,
                            image_embedded: false,
                            error: Some(e.message()),
                        });
                        continue;
                    }
                };

                let creative = summarize_creative(ad.get("creative").unwrap_or(&Value::Null));
                let mut image_embedded = false;
                if include_images && let Some(url) = creative.image_url.as_deref() {
                    match self.client.download_image(url, None).await {
                        Ok(image) => {
                            images.push(ContentItem::image(
                                STANDARD.encode(&image.bytes),
                                image.mime_type,
                            ));
                            image_embedded = true;
                        }
                        Err(e) => warn!(ad_id = %ad_id, "failed to download creative image: {}", e),
                    }
                }

                ads.push(AdCreative {
                    ad_id: text_at(&ad, "/id").unwrap_or(ad_id),
                    ad_name: text_at(&ad, "/name"),
                    creative: Some(creative),
                    image_embedded,
                    error: None,
                });
            }

            let fetched = ads.iter().filter(|ad| ad.error.is_none()).count();
            let report = serde_json::json!({
                "summary": format!("Retrieved {} ad creatives", fetched),
                "ads": ads,
            });

            let mut content = vec![ContentItem::text(render_json(&report))];
            content.extend(images);
            Ok(ToolResult::content(content))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facebook::{client_for, spawn_stub};
    use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_summary_prefers_full_size_images() {
        let creative = json!({
            "id": "c1",
            "thumbnail_url": "https://cdn/thumb.jpg",
            "image_url": "https://cdn/full.jpg",
            "asset_feed_spec": {
                "images": [{"url": "https://cdn/a.jpg"}, {"url": "https://cdn/b.jpg"}],
                "titles": [{"text": "Big sale"}],
                "call_to_action_types": ["SHOP_NOW"]
            },
            "object_story_spec": {"link_data": {"message": "Buy now"}}
        });
        let summary = summarize_creative(&creative);
        assert_eq!(summary.kind, "carousel");
        assert_eq!(summary.image_url.as_deref(), Some("https://cdn/a.jpg"));
        assert_eq!(summary.headline.as_deref(), Some("Big sale"));
        assert_eq!(summary.body.as_deref(), Some("Buy now"));
        assert_eq!(summary.call_to_action.as_deref(), Some("SHOP_NOW"));
    }

    #[test]
    fn test_video_detection_and_thumbnail_fallback() {
        let creative = json!({
            "thumbnail_url": "https://cdn/thumb.jpg",
            "object_story_spec": {"video_data": {}}
        });
        let summary = summarize_creative(&creative);
        assert_eq!(summary.kind, "video");
        assert_eq!(summary.image_url.as_deref(), Some("https://cdn/thumb.jpg"));
    }

    #[tokio::test]
    async fn test_embeds_images_and_reports_failures() {
        let router = Router::new()
            .route(
                "/v18.0/{ad_id}",
                get(
                    |axum::extract::Path(ad_id): axum::extract::Path<String>,
                     State(base): State<String>| async move {
                        if ad_id == "missing" {
                            return (
                                StatusCode::BAD_REQUEST,
                                Json(json!({"error": {"message": "Unknown ad", "code": 100}})),
                            );
                        }
                        (
                            StatusCode::OK,
                            Json(json!({
                                "id": ad_id,
                                "name": "Spring",
                                "creative": {"id": "c9", "image_url": format!("{}/img.png", base)}
                            })),
                        )
                    },
                ),
            )
            .route(
                "/img.png",
                get(|| async { ([("content-type", "image/png")], vec![7u8, 7, 7]) }),
            );

        // Bind first so the router can learn its own address.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let app = router.with_state(base.clone());
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let dir = TempDir::new().unwrap();
        let handler = AdCreativesHandler::new(Arc::new(client_for(&base, &dir, Some("t"))));
        let args = json!({"ad_ids": ["123", "missing"]});
        let result = handler
            .execute(args.as_object().cloned().unwrap())
            .await
            .unwrap();

        assert_eq!(result.images(), vec![("BwcH", "image/png")]);
        let report: Value = serde_json::from_str(&result.joined_text()).unwrap();
        assert_eq!(report["summary"], "Retrieved 1 ad creatives");
        assert_eq!(report["ads"][0]["creative"]["type"], "image");
        assert_eq!(report["ads"][0]["image_embedded"], true);
        assert_eq!(report["ads"][1]["ad_id"], "missing");
        assert!(report["ads"][1]["error"].as_str().unwrap().contains("Unknown ad"));
    }

    #[tokio::test]
    async fn test_spawn_stub_is_usable_without_state() {
        let router = Router::new().route("/v18.0/1", get(|| async { Json(json!({"id": "1"})) }));
        let base = spawn_stub(router).await;
        let dir = TempDir::new().unwrap();
        let handler = AdCreativesHandler::new(Arc::new(client_for(&base, &dir, Some("t"))));
        let args = json!({"ad_ids": ["1"], "include_images": false});
        let result = handler
            .execute(args.as_object().cloned().unwrap())
            .await
            .unwrap();
        assert!(result.images().is_empty());
    }
}
