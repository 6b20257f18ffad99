//! Post endpoints: list, upload, delete.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use post_store::{NewPost, Post};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppState, ServerError, ServerResult};

const MISSING_FIELDS: &str = "Tag and description/message are required";

/// Body of `POST /api/upload`. Every field is optional on the wire;
/// `tag` and one of `description`/`message` are required by validation.
#[derive(Debug, Default, Deserialize)]
pub struct UploadRequest {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Legacy name for `description`.
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: &'static str,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl UploadRequest {
    /// Validate and normalise into a [`NewPost`].
    pub fn into_new_post(self) -> ServerResult<NewPost> {
        let tag = non_blank(self.tag);
        let description = non_blank(self.description).or_else(|| non_blank(self.message));

        let (Some(tag), Some(description)) = (tag, description) else {
            return Err(ServerError::Validation(MISSING_FIELDS.to_string()));
        };

        let mut post = NewPost::new(tag, description)
            .with_topic(self.topic.unwrap_or_default())
            .with_link(self.link.unwrap_or_default());
        if let Some(source) = non_blank(self.source) {
            post = post.with_source(source);
        }
        Ok(post)
    }
}

/// `GET /api/messages`: every stored post, newest first.
pub async fn list_messages(State(state): State<AppState>) -> ServerResult<Json<Vec<Post>>> {
    let posts = state.store().list().await?;
    Ok(Json(posts))
}

/// `POST /api/upload`
///
/// Stores the post and, for website submissions only, hands it to the
/// delivery worker. Responds once the store write succeeds; relay happens
/// in the background.
pub async fn upload_post(
    State(state): State<AppState>,
    payload: Result<Json<UploadRequest>, JsonRejection>,
) -> ServerResult<Json<SuccessResponse>> {
    let Json(request) = payload.map_err(|_| ServerError::Validation(MISSING_FIELDS.to_string()))?;
    let new_post = request.into_new_post()?;

    let post = state.store().insert(new_post).await?;
    info!(
        post_id = %post.id,
        tag = %post.tag,
        source = %post.source,
        summary = %post.summary(),
        "New post added"
    );

    if post.is_from_website() {
        state.worker().enqueue(post).await;
    }

    Ok(Json(SuccessResponse {
        success: true,
        message: "Post uploaded successfully",
    }))
}

/// `DELETE /api/delete/{id}`
///
/// Removes the stored record only; a copy already queued for relay is
/// still delivered.
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<SuccessResponse>> {
    if !state.store().delete(&id).await? {
        return Err(ServerError::NotFound);
    }

    info!(post_id = %id, "Post deleted");
    Ok(Json(SuccessResponse {
        success: true,
        message: "Post deleted successfully",
    }))
}
