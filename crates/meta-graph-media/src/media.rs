//! Container-based media publishing: photos, carousels, stories.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use meta_graph_core::{GraphError, ValidationError};

use crate::client::MediaClient;

const CAROUSEL_MIN_ITEMS: usize = 2;
const CAROUSEL_MAX_ITEMS: usize = 10;

/// Processing-status polling bounds, matching the platform's guidance for
/// image containers.
const MAX_STATUS_POLLS: u32 = 30;
const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// One item of a carousel post.
#[derive(Debug, Clone)]
pub enum CarouselItem {
    /// A photo, fetched by the platform from a public URL.
    Image { url: String },
    /// A video, fetched by the platform from a public URL.
    Video { url: String },
}

impl CarouselItem {
    fn container_payload(&self) -> Value {
        match self {
            Self::Image { url } => json!({
                "is_carousel_item": true,
                "image_url": url
            }),
            Self::Video { url } => json!({
                "is_carousel_item": true,
                "media_type": "VIDEO",
                "video_url": url
            }),
        }
    }
}

/// A created (not yet published) media container.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaContainer {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub status_code: Option<String>,
}

/// Acknowledgement of a published media object.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaPublishResponse {
    pub id: String,
}

impl MediaClient {
    /// Publish a single photo.
    pub async fn publish_photo(
        &self,
        image_url: &str,
        caption: Option<&str>,
    ) -> Result<MediaPublishResponse, GraphError> {
        let mut payload = Map::new();
        payload.insert("image_url".to_string(), Value::String(image_url.to_string()));
        if let Some(caption) = caption {
            payload.insert("caption".to_string(), Value::String(caption.to_string()));
        }

        let container = self.create_container(Value::Object(payload)).await?;
        self.publish_container(&container.id).await
    }

    /// Publish a story from an image URL.
    pub async fn publish_story(&self, image_url: &str) -> Result<MediaPublishResponse, GraphError> {
        let container = self
            .create_container(json!({
                "media_type": "STORIES",
                "image_url": image_url
            }))
            .await?;
        self.publish_container(&container.id).await
    }

    /// Publish a carousel of 2 to 10 items.
    ///
    /// Child containers are created one per item and polled until the
    /// platform finishes processing them, then the carousel container is
    /// created and published.
    ///
    /// # Errors
    ///
    /// Fails with [`GraphError::Validation`] before any network call when
    /// the item count is outside `[2, 10]`.
    pub async fn publish_carousel(
        &self,
        items: &[CarouselItem],
        caption: Option<&str>,
    ) -> Result<MediaPublishResponse, GraphError> {
        if items.len() < CAROUSEL_MIN_ITEMS || items.len() > CAROUSEL_MAX_ITEMS {
            return Err(ValidationError::OutOfRange {
                field: "items".to_string(),
                message: format!(
                    "carousel must have between {CAROUSEL_MIN_ITEMS} and {CAROUSEL_MAX_ITEMS} items"
                ),
            }
            .into());
        }

        let mut children = Vec::with_capacity(items.len());
        for item in items {
            let container = self.create_container(item.container_payload()).await?;
            children.push(container.id);
        }

        for child in &children {
            self.wait_for_container(child).await?;
        }

        let mut payload = Map::new();
        payload.insert("media_type".to_string(), Value::String("CAROUSEL".to_string()));
        payload.insert("children".to_string(), Value::String(children.join(",")));
        if let Some(caption) = caption {
            payload.insert("caption".to_string(), Value::String(caption.to_string()));
        }

        let carousel = self.create_container(Value::Object(payload)).await?;
        self.publish_container(&carousel.id).await
    }

    async fn create_container(&self, payload: Value) -> Result<MediaContainer, GraphError> {
        self.http
            .post(&format!("/{}/media", self.ig_user_id), &payload, &[])
            .await
    }

    async fn publish_container(
        &self,
        creation_id: &str,
    ) -> Result<MediaPublishResponse, GraphError> {
        self.http
            .post(
                &format!("/{}/media_publish", self.ig_user_id),
                &json!({"creation_id": creation_id}),
                &[],
            )
            .await
    }

    /// Poll a container until the platform reports `FINISHED`.
    async fn wait_for_container(&self, container_id: &str) -> Result<(), GraphError> {
        for poll in 0..MAX_STATUS_POLLS {
            let container: MediaContainer = self
                .http
                .get(&format!("/{container_id}"), &[("fields", "status,status_code")])
                .await?;

            match container.status.as_deref() {
                Some("FINISHED") => {
                    debug!(container_id, polls = poll + 1, "container finished processing");
                    return Ok(());
                }
                Some("ERROR") => {
                    return Err(GraphError::Http {
                        status: 422,
                        message: format!(
                            "media container processing failed: {}",
                            container.status_code.as_deref().unwrap_or("unknown")
                        ),
                    });
                }
                _ => tokio::time::sleep(STATUS_POLL_INTERVAL).await,
            }
        }

        Err(GraphError::Http {
            status: 408,
            message: format!("media container {container_id} did not finish processing in time"),
        })
    }
}

#[cfg(test)]
#[path = "media_tests.rs"]
mod tests;
