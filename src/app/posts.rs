use std::sync::Arc;

use url::Url;

use crate::app::authz::can_modify;
use crate::app::error::{TimelineError, TimelineResult};
use crate::app::media::MediaService;
use crate::domain::post::{Attachment, NewPost, Post};
use crate::domain::user::Identity;
use crate::store::{Catalog, PostStore};

/// Attachment as named by the client: catalog `type` plus catalog id.
#[derive(Debug, Clone)]
pub struct AttachmentRef {
    pub kind: String,
    pub id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct CreatePost {
    pub text: String,
    pub image: Option<String>,
    pub video_url: Option<String>,
    pub attachment: Option<AttachmentRef>,
}

#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn PostStore>,
    catalog: Arc<dyn Catalog>,
    media: MediaService,
}

impl PostService {
    pub fn new(store: Arc<dyn PostStore>, catalog: Arc<dyn Catalog>, media: MediaService) -> Self {
        Self {
            store,
            catalog,
            media,
        }
    }

    /// Empty posts are accepted. An attachment that does not resolve in its
    /// catalog is dropped rather than failing the post.
    pub async fn create_post(&self, author: &Identity, input: CreatePost) -> TimelineResult<Post> {
        let video_url = normalize_video_url(input.video_url)?;
        let attachment = match input.attachment {
            Some(reference) => Some(
                Attachment::from_wire(&reference.kind, reference.id).ok_or_else(|| {
                    TimelineError::validation(format!(
                        "unknown attachment type: {}",
                        reference.kind
                    ))
                })?,
            ),
            None => None,
        };

        let image_url = match input.image.as_deref().map(str::trim) {
            Some(data_url) if !data_url.is_empty() => {
                Some(self.media.store_data_url(data_url).await?)
            }
            _ => None,
        };

        let attachment = match attachment {
            Some(attachment) => self.resolve_attachment(attachment).await,
            None => None,
        };

        let post = self
            .store
            .create_post(NewPost {
                author_id: author.id,
                text: input.text.trim().to_string(),
                image_url,
                video_url,
                attachment,
            })
            .await?;

        tracing::info!(post_id = post.id, author_id = author.id, "post created");
        Ok(post)
    }

    pub async fn edit_post(
        &self,
        requester: &Identity,
        post_id: i64,
        text: &str,
    ) -> TimelineResult<Post> {
        let post = self.load(post_id).await?;
        if !can_modify(requester, &post) {
            return Err(TimelineError::permission(
                "you do not have permission to edit this post",
            ));
        }

        let text = text.trim();
        if text.is_empty() {
            return Err(TimelineError::validation("text cannot be empty"));
        }

        self.store
            .update_post_text(post_id, text.to_string())
            .await?
            .ok_or_else(|| TimelineError::not_found("post not found"))
    }

    pub async fn delete_post(&self, requester: &Identity, post_id: i64) -> TimelineResult<()> {
        let post = self.load(post_id).await?;
        if !can_modify(requester, &post) {
            return Err(TimelineError::permission(
                "you do not have permission to delete this post",
            ));
        }

        if !self.store.delete_post(post_id).await? {
            return Err(TimelineError::not_found("post not found"));
        }
        tracing::info!(post_id, requester_id = requester.id, "post deleted");
        Ok(())
    }

    async fn load(&self, post_id: i64) -> TimelineResult<Post> {
        self.store
            .get_post(post_id)
            .await?
            .ok_or_else(|| TimelineError::not_found("post not found"))
    }

    async fn resolve_attachment(&self, attachment: Attachment) -> Option<Attachment> {
        let found = match attachment {
            Attachment::Resource(id) => self.catalog.find_resource(id).await.map(|r| r.is_some()),
            Attachment::Sportswear(id) => {
                self.catalog.find_sportswear(id).await.map(|b| b.is_some())
            }
        };

        match found {
            Ok(true) => Some(attachment),
            Ok(false) => {
                tracing::info!(
                    kind = attachment.wire_type(),
                    id = attachment.id(),
                    "attachment not found, dropping"
                );
                None
            }
            Err(err) => {
                tracing::warn!(error = ?err, id = attachment.id(), "attachment lookup failed, dropping");
                None
            }
        }
    }
}

fn normalize_video_url(video_url: Option<String>) -> TimelineResult<Option<String>> {
    let Some(raw) = video_url else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let parsed = Url::parse(raw)
        .map_err(|_| TimelineError::validation("video_url must be a valid URL"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(TimelineError::validation("video_url must use http or https"));
    }
    Ok(Some(parsed.to_string()))
}
