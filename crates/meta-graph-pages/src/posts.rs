//! Page post publishing and listing.

use serde::Deserialize;
use serde_json::{json, Value};

use meta_graph_core::{drain, GraphError, Paged, SuccessResponse};

use crate::client::PagesClient;

/// Items requested per page when walking the post listing.
const LIST_PAGE_SIZE: &str = "25";

/// A post on the page's feed.
///
/// Only the envelope fields the SDK needs are typed; everything else is
/// available through [`PagesClient::get_post`] as raw JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct PagePost {
    pub id: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub permalink_url: Option<String>,
}

/// Reference to a created post.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedPost {
    pub id: String,
}

impl PagesClient {
    /// Publish a post to the page feed.
    ///
    /// `published: false` creates an unpublished (draft/dark) post.
    pub async fn create_post(
        &self,
        message: &str,
        link: Option<&str>,
        published: bool,
    ) -> Result<CreatedPost, GraphError> {
        let mut payload = json!({
            "message": message,
            "published": published
        });
        if let Some(link) = link {
            payload["link"] = Value::String(link.to_string());
        }

        self.http
            .post(&format!("/{}/feed", self.page_id), &payload, &[])
            .await
    }

    /// List the page's posts, draining the cursor chain up to `limit` items.
    pub async fn list_posts(&self, limit: Option<usize>) -> Result<Vec<PagePost>, GraphError> {
        let posts = drain(|cursor| self.posts_page(cursor), limit).await?;
        tracing::debug!(page_id = %self.page_id, count = posts.len(), "listed page posts");
        Ok(posts)
    }

    /// Fetch a single post with the given fields as raw JSON.
    pub async fn get_post(&self, post_id: &str, fields: &[&str]) -> Result<Value, GraphError> {
        let fields = fields.join(",");
        let mut params: Vec<(&str, &str)> = Vec::new();
        if !fields.is_empty() {
            params.push(("fields", fields.as_str()));
        }
        self.http.get(&format!("/{post_id}"), &params).await
    }

    /// Delete a post.
    pub async fn delete_post(&self, post_id: &str) -> Result<SuccessResponse, GraphError> {
        self.http.delete(&format!("/{post_id}"), &[]).await
    }

    async fn posts_page(&self, cursor: Option<String>) -> Result<Paged<PagePost>, GraphError> {
        let mut params: Vec<(&str, &str)> = vec![("limit", LIST_PAGE_SIZE)];
        if let Some(after) = cursor.as_deref() {
            params.push(("after", after));
        }
        self.http
            .get(&format!("/{}/posts", self.page_id), &params)
            .await
    }
}

#[cfg(test)]
#[path = "posts_tests.rs"]
mod tests;
