use std::sync::Arc;

use crate::app::authz::can_modify;
use crate::app::error::{TimelineError, TimelineResult};
use crate::domain::engagement::Comment;
use crate::domain::post::LikeState;
use crate::domain::user::Identity;
use crate::store::PostStore;

#[derive(Clone)]
pub struct EngagementService {
    store: Arc<dyn PostStore>,
}

impl EngagementService {
    pub fn new(store: Arc<dyn PostStore>) -> Self {
        Self { store }
    }

    pub async fn toggle_like(&self, user: &Identity, post_id: i64) -> TimelineResult<LikeState> {
        self.store
            .toggle_like(post_id, user.id)
            .await?
            .ok_or_else(|| TimelineError::not_found("post not found"))
    }

    pub async fn add_comment(
        &self,
        author: &Identity,
        post_id: i64,
        text: &str,
    ) -> TimelineResult<Comment> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TimelineError::validation("comment cannot be empty"));
        }

        let comment = self
            .store
            .create_comment(post_id, author.id, text.to_string())
            .await?
            .ok_or_else(|| TimelineError::not_found("post not found"))?;

        tracing::info!(comment_id = comment.id, post_id, author_id = author.id, "comment added");
        Ok(comment)
    }

    pub async fn edit_comment(
        &self,
        requester: &Identity,
        comment_id: i64,
        text: &str,
    ) -> TimelineResult<Comment> {
        let comment = self.load(comment_id).await?;
        if !can_modify(requester, &comment) {
            return Err(TimelineError::permission(
                "you do not have permission to edit this comment",
            ));
        }

        let text = text.trim();
        if text.is_empty() {
            return Err(TimelineError::validation("comment cannot be empty"));
        }

        self.store
            .update_comment_text(comment_id, text.to_string())
            .await?
            .ok_or_else(|| TimelineError::not_found("comment not found"))
    }

    pub async fn delete_comment(&self, requester: &Identity, comment_id: i64) -> TimelineResult<()> {
        let comment = self.load(comment_id).await?;
        if !can_modify(requester, &comment) {
            return Err(TimelineError::permission(
                "you do not have permission to delete this comment",
            ));
        }

        if !self.store.delete_comment(comment_id).await? {
            return Err(TimelineError::not_found("comment not found"));
        }
        Ok(())
    }

    async fn load(&self, comment_id: i64) -> TimelineResult<Comment> {
        self.store
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| TimelineError::not_found("comment not found"))
    }
}
