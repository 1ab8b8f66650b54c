use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::warn;

use crate::app::authz::can_modify;
use crate::app::error::{TimelineError, TimelineResult};
use crate::domain::engagement::Comment;
use crate::domain::post::{Attachment, Post};
use crate::domain::user::Identity;
use crate::store::{Catalog, PostStore};

pub const PAGE_SIZE: i64 = 10;

#[derive(Debug, Serialize)]
pub struct FeedPage {
    pub count: i64,
    pub results: Vec<PostView>,
    pub next: Option<String>,
    pub previous: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PostView {
    pub id: i64,
    pub author_username: String,
    pub text: String,
    pub image: String,
    pub video_url: String,
    pub like_count: i64,
    pub is_liked: bool,
    pub comment_count: usize,
    pub comments: Vec<CommentView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<AttachmentView>,
    pub is_owner: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct CommentView {
    pub id: i64,
    pub author_username: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Comment> for CommentView {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            author_username: comment.author_username,
            content: comment.text,
            created_at: comment.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AttachmentView {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: i64,
    pub name: String,
    pub thumbnail: String,
    pub link: String,
}

impl AttachmentView {
    fn unresolved(attachment: Attachment) -> Self {
        Self {
            kind: attachment.wire_type(),
            id: attachment.id(),
            name: String::new(),
            thumbnail: String::new(),
            link: String::new(),
        }
    }
}

/// Read-side projection of the timeline.
#[derive(Clone)]
pub struct FeedService {
    store: Arc<dyn PostStore>,
    catalog: Arc<dyn Catalog>,
}

impl FeedService {
    pub fn new(store: Arc<dyn PostStore>, catalog: Arc<dyn Catalog>) -> Self {
        Self { store, catalog }
    }

    /// `page` is the raw query value; see [`resolve_page`].
    pub async fn page(
        &self,
        page: Option<&str>,
        viewer: Option<&Identity>,
    ) -> TimelineResult<FeedPage> {
        let count = self.store.count_posts().await?;
        let (page, last_page) = resolve_page(page, count);

        let posts = self
            .store
            .list_posts((page - 1) * PAGE_SIZE, PAGE_SIZE)
            .await?;
        let results = self.project(posts, viewer).await?;

        Ok(FeedPage {
            count,
            results,
            next: (page < last_page).then(|| format!("?page={}", page + 1)),
            previous: None,
        })
    }

    pub async fn post(&self, post_id: i64, viewer: Option<&Identity>) -> TimelineResult<PostView> {
        let post = self
            .store
            .get_post(post_id)
            .await?
            .ok_or_else(|| TimelineError::not_found("post not found"))?;

        self.project(vec![post], viewer)
            .await?
            .pop()
            .ok_or_else(|| TimelineError::not_found("post not found"))
    }

    async fn project(
        &self,
        posts: Vec<Post>,
        viewer: Option<&Identity>,
    ) -> TimelineResult<Vec<PostView>> {
        let ids: Vec<i64> = posts.iter().map(|post| post.id).collect();
        let like_states = self
            .store
            .like_states(&ids, viewer.map(|viewer| viewer.id))
            .await?;

        let mut comments_by_post: HashMap<i64, Vec<CommentView>> = HashMap::new();
        for comment in self.store.comments_for_posts(&ids).await? {
            comments_by_post
                .entry(comment.post_id)
                .or_default()
                .push(comment.into());
        }

        let attachments = join_all(
            posts
                .iter()
                .map(|post| self.project_attachment(post.attachment)),
        )
        .await;

        let views = posts
            .into_iter()
            .zip(attachments)
            .map(|(post, attachment)| {
                let likes = like_states.get(&post.id).copied().unwrap_or_default();
                let comments = comments_by_post.remove(&post.id).unwrap_or_default();
                let is_owner = viewer.map_or(false, |viewer| can_modify(viewer, &post));
                PostView {
                    id: post.id,
                    author_username: post.author_username,
                    text: post.text,
                    image: post.image_url.unwrap_or_default(),
                    video_url: post.video_url.unwrap_or_default(),
                    like_count: likes.count,
                    is_liked: likes.liked,
                    comment_count: comments.len(),
                    comments,
                    attachment,
                    is_owner,
                    created_at: post.created_at,
                }
            })
            .collect();

        Ok(views)
    }

    // Lookup failures degrade to empty fields; they never fail the page.
    async fn project_attachment(&self, attachment: Option<Attachment>) -> Option<AttachmentView> {
        let attachment = attachment?;
        let mut view = AttachmentView::unresolved(attachment);

        match attachment {
            Attachment::Resource(id) => match self.catalog.find_resource(id).await {
                Ok(Some(resource)) => {
                    view.thumbnail = resource.thumbnail().unwrap_or_default();
                    view.name = resource.title;
                    view.link = resource.youtube_url;
                }
                Ok(None) => warn!(resource_id = id, "attached resource no longer exists"),
                Err(err) => warn!(error = ?err, resource_id = id, "failed to resolve resource"),
            },
            Attachment::Sportswear(id) => match self.catalog.find_sportswear(id).await {
                Ok(Some(brand)) => {
                    view.name = brand.brand_name;
                    view.thumbnail = brand.thumbnail_url.unwrap_or_default();
                    view.link = brand.link;
                }
                Ok(None) => warn!(brand_id = id, "attached sportswear brand no longer exists"),
                Err(err) => warn!(error = ?err, brand_id = id, "failed to resolve sportswear brand"),
            },
        }

        Some(view)
    }
}

/// Returns `(page, last_page)`. Missing, unparsable or non-positive values
/// select page 1; values past the end select the last page. An empty
/// timeline still has one (empty) page.
pub fn resolve_page(raw: Option<&str>, total: i64) -> (i64, i64) {
    let last_page = ((total + PAGE_SIZE - 1) / PAGE_SIZE).max(1);
    let requested = raw
        .and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|page| *page >= 1)
        .unwrap_or(1);
    (requested.min(last_page), last_page)
}
