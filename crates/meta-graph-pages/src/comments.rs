//! Comment moderation for page objects.

use serde::Deserialize;
use serde_json::{json, Value};

use meta_graph_core::{drain, GraphError, Paged, SuccessResponse};

use crate::client::PagesClient;

const LIST_PAGE_SIZE: &str = "25";

/// A comment on a post or another comment.
#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    pub id: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub from: Option<Value>,
    #[serde(default)]
    pub is_hidden: Option<bool>,
}

/// Reference to a created comment.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedComment {
    pub id: String,
}

impl PagesClient {
    /// List comments on a post or comment, up to `limit` items.
    pub async fn list_comments(
        &self,
        object_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Comment>, GraphError> {
        drain(|cursor| self.comments_page(object_id, cursor), limit).await
    }

    /// Reply to a comment.
    pub async fn reply_to_comment(
        &self,
        comment_id: &str,
        message: &str,
    ) -> Result<CreatedComment, GraphError> {
        self.http
            .post(
                &format!("/{comment_id}/comments"),
                &json!({"message": message}),
                &[],
            )
            .await
    }

    /// Hide or unhide a comment from the page audience.
    pub async fn set_comment_hidden(
        &self,
        comment_id: &str,
        hidden: bool,
    ) -> Result<SuccessResponse, GraphError> {
        self.http
            .post(&format!("/{comment_id}"), &json!({"is_hidden": hidden}), &[])
            .await
    }

    /// Delete a comment.
    pub async fn delete_comment(&self, comment_id: &str) -> Result<SuccessResponse, GraphError> {
        self.http.delete(&format!("/{comment_id}"), &[]).await
    }

    async fn comments_page(
        &self,
        object_id: &str,
        cursor: Option<String>,
    ) -> Result<Paged<Comment>, GraphError> {
        let mut params: Vec<(&str, &str)> = vec![("limit", LIST_PAGE_SIZE)];
        if let Some(after) = cursor.as_deref() {
            params.push(("after", after));
        }
        self.http
            .get(&format!("/{object_id}/comments"), &params)
            .await
    }
}

#[cfg(test)]
#[path = "comments_tests.rs"]
mod tests;
