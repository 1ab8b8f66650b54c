//! In-memory storage for tests and local development.
//!
//! Data is lost on restart.

use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;

use crate::domain::catalog::{Resource, SportswearBrand};
use crate::domain::engagement::Comment;
use crate::domain::post::{LikeState, NewPost, Post};
use crate::domain::user::Identity;
use crate::store::{Catalog, PostStore, UserDirectory};

#[derive(Default)]
struct Inner {
    last_post_id: i64,
    last_comment_id: i64,
    last_created_at: Option<OffsetDateTime>,
    posts: BTreeMap<i64, Post>,
    comments: BTreeMap<i64, Comment>,
    likes: HashMap<i64, HashSet<i64>>,
    users: HashMap<i64, Identity>,
    resources: HashMap<i64, Resource>,
    sportswear: HashMap<i64, SportswearBrand>,
}

impl Inner {
    // Creation timestamps strictly increase so ordering never depends on clock resolution.
    fn next_timestamp(&mut self) -> OffsetDateTime {
        let now = OffsetDateTime::now_utc();
        let ts = match self.last_created_at {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_created_at = Some(ts);
        ts
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, identity: Identity) {
        self.inner.write().await.users.insert(identity.id, identity);
    }

    pub async fn insert_resource(&self, resource: Resource) {
        self.inner
            .write()
            .await
            .resources
            .insert(resource.id, resource);
    }

    pub async fn insert_sportswear(&self, brand: SportswearBrand) {
        self.inner.write().await.sportswear.insert(brand.id, brand);
    }

    /// Removes a catalog entry without touching posts that reference it.
    pub async fn remove_resource(&self, resource_id: i64) -> Option<Resource> {
        self.inner.write().await.resources.remove(&resource_id)
    }

    pub async fn remove_sportswear(&self, brand_id: i64) -> Option<SportswearBrand> {
        self.inner.write().await.sportswear.remove(&brand_id)
    }

    pub async fn comment_count(&self) -> usize {
        self.inner.read().await.comments.len()
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn create_post(&self, new_post: NewPost) -> Result<Post> {
        let mut inner = self.inner.write().await;
        let author_username = inner
            .users
            .get(&new_post.author_id)
            .map(|user| user.username.clone())
            .ok_or_else(|| anyhow!("unknown author: {}", new_post.author_id))?;

        inner.last_post_id += 1;
        let post = Post {
            id: inner.last_post_id,
            author_id: new_post.author_id,
            author_username,
            text: new_post.text,
            image_url: new_post.image_url,
            video_url: new_post.video_url,
            attachment: new_post.attachment,
            created_at: inner.next_timestamp(),
        };
        inner.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn get_post(&self, post_id: i64) -> Result<Option<Post>> {
        Ok(self.inner.read().await.posts.get(&post_id).cloned())
    }

    async fn update_post_text(&self, post_id: i64, text: String) -> Result<Option<Post>> {
        let mut inner = self.inner.write().await;
        Ok(inner.posts.get_mut(&post_id).map(|post| {
            post.text = text;
            post.clone()
        }))
    }

    async fn delete_post(&self, post_id: i64) -> Result<bool> {
        let mut inner = self.inner.write().await;
        if inner.posts.remove(&post_id).is_none() {
            return Ok(false);
        }
        inner.comments.retain(|_, comment| comment.post_id != post_id);
        inner.likes.remove(&post_id);
        Ok(true)
    }

    async fn count_posts(&self) -> Result<i64> {
        Ok(self.inner.read().await.posts.len() as i64)
    }

    async fn list_posts(&self, offset: i64, limit: i64) -> Result<Vec<Post>> {
        let inner = self.inner.read().await;
        let mut posts: Vec<Post> = inner.posts.values().cloned().collect();
        posts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(posts
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn like_states(
        &self,
        post_ids: &[i64],
        viewer_id: Option<i64>,
    ) -> Result<HashMap<i64, LikeState>> {
        let inner = self.inner.read().await;
        let mut states = HashMap::new();
        for post_id in post_ids {
            if let Some(likers) = inner.likes.get(post_id) {
                states.insert(
                    *post_id,
                    LikeState {
                        count: likers.len() as i64,
                        liked: viewer_id.map_or(false, |viewer| likers.contains(&viewer)),
                    },
                );
            }
        }
        Ok(states)
    }

    async fn toggle_like(&self, post_id: i64, user_id: i64) -> Result<Option<LikeState>> {
        let mut inner = self.inner.write().await;
        if !inner.posts.contains_key(&post_id) {
            return Ok(None);
        }
        let likers = inner.likes.entry(post_id).or_default();
        let liked = if likers.remove(&user_id) {
            false
        } else {
            likers.insert(user_id);
            true
        };
        Ok(Some(LikeState {
            count: likers.len() as i64,
            liked,
        }))
    }

    async fn create_comment(
        &self,
        post_id: i64,
        author_id: i64,
        text: String,
    ) -> Result<Option<Comment>> {
        let mut inner = self.inner.write().await;
        if !inner.posts.contains_key(&post_id) {
            return Ok(None);
        }
        let author_username = inner
            .users
            .get(&author_id)
            .map(|user| user.username.clone())
            .ok_or_else(|| anyhow!("unknown author: {}", author_id))?;

        inner.last_comment_id += 1;
        let comment = Comment {
            id: inner.last_comment_id,
            post_id,
            author_id,
            author_username,
            text,
            created_at: inner.next_timestamp(),
        };
        inner.comments.insert(comment.id, comment.clone());
        Ok(Some(comment))
    }

    async fn get_comment(&self, comment_id: i64) -> Result<Option<Comment>> {
        Ok(self.inner.read().await.comments.get(&comment_id).cloned())
    }

    async fn update_comment_text(
        &self,
        comment_id: i64,
        text: String,
    ) -> Result<Option<Comment>> {
        let mut inner = self.inner.write().await;
        Ok(inner.comments.get_mut(&comment_id).map(|comment| {
            comment.text = text;
            comment.clone()
        }))
    }

    async fn delete_comment(&self, comment_id: i64) -> Result<bool> {
        Ok(self
            .inner
            .write()
            .await
            .comments
            .remove(&comment_id)
            .is_some())
    }

    async fn comments_for_posts(&self, post_ids: &[i64]) -> Result<Vec<Comment>> {
        let inner = self.inner.read().await;
        let wanted: HashSet<i64> = post_ids.iter().copied().collect();
        let mut comments: Vec<Comment> = inner
            .comments
            .values()
            .filter(|comment| wanted.contains(&comment.post_id))
            .cloned()
            .collect();
        comments.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(comments)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn find_user(&self, user_id: i64) -> Result<Option<Identity>> {
        Ok(self.inner.read().await.users.get(&user_id).cloned())
    }
}

#[async_trait]
impl Catalog for MemoryStore {
    async fn find_resource(&self, resource_id: i64) -> Result<Option<Resource>> {
        Ok(self.inner.read().await.resources.get(&resource_id).cloned())
    }

    async fn find_sportswear(&self, brand_id: i64) -> Result<Option<SportswearBrand>> {
        Ok(self.inner.read().await.sportswear.get(&brand_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, username: &str) -> Identity {
        Identity {
            id,
            username: username.to_string(),
            is_staff: false,
            is_superuser: false,
        }
    }

    fn new_post(author_id: i64, text: &str) -> NewPost {
        NewPost {
            author_id,
            text: text.to_string(),
            image_url: None,
            video_url: None,
            attachment: None,
        }
    }

    #[tokio::test]
    async fn list_posts_newest_first() {
        let store = MemoryStore::new();
        store.insert_user(user(1, "alice")).await;
        for i in 0..3 {
            store
                .create_post(new_post(1, &format!("post {}", i)))
                .await
                .unwrap();
        }

        let posts = store.list_posts(0, 10).await.unwrap();
        let texts: Vec<&str> = posts.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["post 2", "post 1", "post 0"]);

        let tail = store.list_posts(2, 10).await.unwrap();
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].text, "post 0");
    }

    #[tokio::test]
    async fn delete_post_cascades_comments_and_likes() {
        let store = MemoryStore::new();
        store.insert_user(user(1, "alice")).await;
        store.insert_user(user(2, "bob")).await;
        let kept = store.create_post(new_post(1, "kept")).await.unwrap();
        let doomed = store.create_post(new_post(1, "doomed")).await.unwrap();

        store
            .create_comment(doomed.id, 2, "bye".into())
            .await
            .unwrap();
        store
            .create_comment(kept.id, 2, "stay".into())
            .await
            .unwrap();
        store.toggle_like(doomed.id, 2).await.unwrap();

        assert!(store.delete_post(doomed.id).await.unwrap());
        assert!(!store.delete_post(doomed.id).await.unwrap());

        let remaining = store
            .comments_for_posts(&[kept.id, doomed.id])
            .await
            .unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].text, "stay");
        assert_eq!(store.comment_count().await, 1);
        assert!(store
            .like_states(&[doomed.id], Some(2))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn toggle_like_flips_membership() {
        let store = MemoryStore::new();
        store.insert_user(user(1, "alice")).await;
        let post = store.create_post(new_post(1, "hi")).await.unwrap();

        let first = store.toggle_like(post.id, 1).await.unwrap().unwrap();
        assert_eq!(first, LikeState { count: 1, liked: true });
        let second = store.toggle_like(post.id, 1).await.unwrap().unwrap();
        assert_eq!(second, LikeState { count: 0, liked: false });

        assert!(store.toggle_like(999, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn comment_on_missing_post_is_none() {
        let store = MemoryStore::new();
        store.insert_user(user(1, "alice")).await;
        assert!(store
            .create_comment(42, 1, "hello".into())
            .await
            .unwrap()
            .is_none());
    }
}
