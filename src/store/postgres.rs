use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::domain::catalog::{Resource, SportswearBrand};
use crate::domain::engagement::Comment;
use crate::domain::post::{Attachment, LikeState, NewPost, Post};
use crate::domain::user::Identity;
use crate::infra::db::Db;
use crate::store::{Catalog, PostStore, UserDirectory};

#[derive(Clone)]
pub struct PgStore {
    db: Db,
}

impl PgStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

const POST_COLUMNS: &str = "p.id, p.author_id, u.username AS author_username, p.text, \
     p.image_url, p.video_url, p.attachment_kind, p.attachment_id, p.created_at";

const COMMENT_COLUMNS: &str =
    "c.id, c.post_id, c.author_id, u.username AS author_username, c.text, c.created_at";

fn post_from_row(row: &PgRow) -> Post {
    let kind: Option<String> = row.get("attachment_kind");
    let attachment_id: Option<i64> = row.get("attachment_id");
    Post {
        id: row.get("id"),
        author_id: row.get("author_id"),
        author_username: row.get("author_username"),
        text: row.get("text"),
        image_url: row.get("image_url"),
        video_url: row.get("video_url"),
        attachment: Attachment::from_db(kind.as_deref(), attachment_id),
        created_at: row.get("created_at"),
    }
}

fn comment_from_row(row: &PgRow) -> Comment {
    Comment {
        id: row.get("id"),
        post_id: row.get("post_id"),
        author_id: row.get("author_id"),
        author_username: row.get("author_username"),
        text: row.get("text"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl PostStore for PgStore {
    async fn create_post(&self, new_post: NewPost) -> Result<Post> {
        let (kind, attachment_id) = match new_post.attachment.as_ref().map(Attachment::as_db) {
            Some((kind, id)) => (Some(kind), Some(id)),
            None => (None, None),
        };

        let row = sqlx::query(&format!(
            "WITH p AS ( \
                INSERT INTO posts (author_id, text, image_url, video_url, attachment_kind, attachment_id) \
                VALUES ($1, $2, $3, $4, $5, $6) \
                RETURNING id, author_id, text, image_url, video_url, attachment_kind, attachment_id, created_at \
             ) \
             SELECT {} FROM p JOIN users u ON u.id = p.author_id",
            POST_COLUMNS
        ))
        .bind(new_post.author_id)
        .bind(new_post.text)
        .bind(new_post.image_url)
        .bind(new_post.video_url)
        .bind(kind)
        .bind(attachment_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(post_from_row(&row))
    }

    async fn get_post(&self, post_id: i64) -> Result<Option<Post>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM posts p JOIN users u ON u.id = p.author_id WHERE p.id = $1",
            POST_COLUMNS
        ))
        .bind(post_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(post_from_row))
    }

    async fn update_post_text(&self, post_id: i64, text: String) -> Result<Option<Post>> {
        let row = sqlx::query(&format!(
            "WITH p AS ( \
                UPDATE posts SET text = $2 WHERE id = $1 \
                RETURNING id, author_id, text, image_url, video_url, attachment_kind, attachment_id, created_at \
             ) \
             SELECT {} FROM p JOIN users u ON u.id = p.author_id",
            POST_COLUMNS
        ))
        .bind(post_id)
        .bind(text)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(post_from_row))
    }

    async fn delete_post(&self, post_id: i64) -> Result<bool> {
        let mut tx = self.db.pool().begin().await?;

        sqlx::query("DELETE FROM comments WHERE post_id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM post_likes WHERE post_id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn count_posts(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }

    async fn list_posts(&self, offset: i64, limit: i64) -> Result<Vec<Post>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM posts p JOIN users u ON u.id = p.author_id \
             ORDER BY p.created_at DESC, p.id ASC \
             LIMIT $1 OFFSET $2",
            POST_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(post_from_row).collect())
    }

    async fn like_states(
        &self,
        post_ids: &[i64],
        viewer_id: Option<i64>,
    ) -> Result<HashMap<i64, LikeState>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query(
            "SELECT post_id, COUNT(*) AS like_count, \
                    COALESCE(BOOL_OR(user_id = $2), false) AS liked \
             FROM post_likes \
             WHERE post_id = ANY($1) \
             GROUP BY post_id",
        )
        .bind(post_ids)
        .bind(viewer_id)
        .fetch_all(self.db.pool())
        .await?;

        let mut states = HashMap::with_capacity(rows.len());
        for row in rows {
            states.insert(
                row.get::<i64, _>("post_id"),
                LikeState {
                    count: row.get("like_count"),
                    liked: row.get("liked"),
                },
            );
        }
        Ok(states)
    }

    async fn toggle_like(&self, post_id: i64, user_id: i64) -> Result<Option<LikeState>> {
        let mut tx = self.db.pool().begin().await?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM posts WHERE id = $1")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        let removed = sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        if !removed {
            sqlx::query(
                "INSERT INTO post_likes (post_id, user_id) VALUES ($1, $2) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(post_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM post_likes WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(LikeState {
            count,
            liked: !removed,
        }))
    }

    async fn create_comment(
        &self,
        post_id: i64,
        author_id: i64,
        text: String,
    ) -> Result<Option<Comment>> {
        let row = sqlx::query(&format!(
            "WITH c AS ( \
                INSERT INTO comments (post_id, author_id, text) \
                SELECT $1, $2, $3 WHERE EXISTS (SELECT 1 FROM posts WHERE id = $1) \
                RETURNING id, post_id, author_id, text, created_at \
             ) \
             SELECT {} FROM c JOIN users u ON u.id = c.author_id",
            COMMENT_COLUMNS
        ))
        .bind(post_id)
        .bind(author_id)
        .bind(text)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(comment_from_row))
    }

    async fn get_comment(&self, comment_id: i64) -> Result<Option<Comment>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM comments c JOIN users u ON u.id = c.author_id WHERE c.id = $1",
            COMMENT_COLUMNS
        ))
        .bind(comment_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(comment_from_row))
    }

    async fn update_comment_text(
        &self,
        comment_id: i64,
        text: String,
    ) -> Result<Option<Comment>> {
        let row = sqlx::query(&format!(
            "WITH c AS ( \
                UPDATE comments SET text = $2 WHERE id = $1 \
                RETURNING id, post_id, author_id, text, created_at \
             ) \
             SELECT {} FROM c JOIN users u ON u.id = c.author_id",
            COMMENT_COLUMNS
        ))
        .bind(comment_id)
        .bind(text)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(comment_from_row))
    }

    async fn delete_comment(&self, comment_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn comments_for_posts(&self, post_ids: &[i64]) -> Result<Vec<Comment>> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(&format!(
            "SELECT {} FROM comments c JOIN users u ON u.id = c.author_id \
             WHERE c.post_id = ANY($1) \
             ORDER BY c.created_at ASC, c.id ASC",
            COMMENT_COLUMNS
        ))
        .bind(post_ids)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(comment_from_row).collect())
    }

    async fn ping(&self) -> Result<()> {
        self.db.ping().await
    }
}

#[async_trait]
impl UserDirectory for PgStore {
    async fn find_user(&self, user_id: i64) -> Result<Option<Identity>> {
        let row = sqlx::query(
            "SELECT id, username, is_staff, is_superuser FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|row| Identity {
            id: row.get("id"),
            username: row.get("username"),
            is_staff: row.get("is_staff"),
            is_superuser: row.get("is_superuser"),
        }))
    }
}

#[async_trait]
impl Catalog for PgStore {
    async fn find_resource(&self, resource_id: i64) -> Result<Option<Resource>> {
        let row = sqlx::query(
            "SELECT id, title, youtube_url, thumbnail_url FROM resources WHERE id = $1",
        )
        .bind(resource_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|row| Resource {
            id: row.get("id"),
            title: row.get("title"),
            youtube_url: row.get("youtube_url"),
            thumbnail_url: row.get("thumbnail_url"),
        }))
    }

    async fn find_sportswear(&self, brand_id: i64) -> Result<Option<SportswearBrand>> {
        let row = sqlx::query(
            "SELECT id, brand_name, link, thumbnail_url FROM sportswear_brands WHERE id = $1",
        )
        .bind(brand_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|row| SportswearBrand {
            id: row.get("id"),
            brand_name: row.get("brand_name"),
            link: row.get("link"),
            thumbnail_url: row.get("thumbnail_url"),
        }))
    }
}
