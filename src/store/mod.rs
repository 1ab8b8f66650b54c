//! Persistence seams for the timeline.
//!
//! Available backends:
//! - `PgStore` - PostgreSQL via sqlx (production)
//! - `MemoryStore` - in-process maps (tests and local development)

pub mod memory;
pub mod postgres;

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::catalog::{Resource, SportswearBrand};
use crate::domain::engagement::Comment;
use crate::domain::post::{LikeState, NewPost, Post};
use crate::domain::user::Identity;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Posts, comments and the like relation.
///
/// Every method is atomic at single-record granularity. `delete_post` also
/// removes the post's comments and likes in the same unit of work.
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn create_post(&self, new_post: NewPost) -> Result<Post>;

    async fn get_post(&self, post_id: i64) -> Result<Option<Post>>;

    async fn update_post_text(&self, post_id: i64, text: String) -> Result<Option<Post>>;

    async fn delete_post(&self, post_id: i64) -> Result<bool>;

    async fn count_posts(&self) -> Result<i64>;

    /// Newest first; equal timestamps fall back to insertion order.
    async fn list_posts(&self, offset: i64, limit: i64) -> Result<Vec<Post>>;

    async fn like_states(
        &self,
        post_ids: &[i64],
        viewer_id: Option<i64>,
    ) -> Result<HashMap<i64, LikeState>>;

    /// Flips `user_id`'s membership in the post's like set. Returns `None`
    /// when the post does not exist.
    async fn toggle_like(&self, post_id: i64, user_id: i64) -> Result<Option<LikeState>>;

    /// Returns `None` when the post does not exist.
    async fn create_comment(
        &self,
        post_id: i64,
        author_id: i64,
        text: String,
    ) -> Result<Option<Comment>>;

    async fn get_comment(&self, comment_id: i64) -> Result<Option<Comment>>;

    async fn update_comment_text(&self, comment_id: i64, text: String)
        -> Result<Option<Comment>>;

    async fn delete_comment(&self, comment_id: i64) -> Result<bool>;

    /// Oldest first within each post.
    async fn comments_for_posts(&self, post_ids: &[i64]) -> Result<Vec<Comment>>;

    async fn ping(&self) -> Result<()>;
}

/// Read access to the account system's users.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, user_id: i64) -> Result<Option<Identity>>;
}

/// Read access to the video resource and sportswear registries.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn find_resource(&self, resource_id: i64) -> Result<Option<Resource>>;

    async fn find_sportswear(&self, brand_id: i64) -> Result<Option<SportswearBrand>>;
}
