use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::app::feed::{CommentView, FeedPage, PostView};
use crate::app::posts::{AttachmentRef, CreatePost};
use crate::http::extract::{ApiPath, JsonBody};
use crate::http::{AppError, AuthUser, MaybeAuthUser};
use crate::AppState;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = match state.store.ping().await {
        Ok(()) => "ok",
        Err(err) => {
            tracing::warn!(error = ?err, "store ping failed");
            "degraded"
        }
    };

    Json(HealthResponse { status })
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub status: &'static str,
    pub message: String,
}

impl MessageResponse {
    fn success(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            status: "success",
            message: message.into(),
        })
    }
}

#[derive(Deserialize)]
pub struct FeedQuery {
    pub page: Option<String>,
}

pub async fn timeline(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<FeedPage>, AppError> {
    let page = state
        .feed_service()
        .page(query.page.as_deref(), viewer.as_ref())
        .await?;
    Ok(Json(page))
}

pub async fn get_post(
    ApiPath(id): ApiPath<i64>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
) -> Result<Json<PostView>, AppError> {
    let post = state.feed_service().post(id, viewer.as_ref()).await?;
    Ok(Json(post))
}

#[derive(Deserialize)]
pub struct AttachmentRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: i64,
}

#[derive(Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub attachment: Option<AttachmentRequest>,
}

#[derive(Serialize)]
pub struct CreatePostResponse {
    pub status: &'static str,
    pub message: String,
    pub data: PostView,
}

pub async fn create_post(
    AuthUser(author): AuthUser,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreatePostRequest>,
) -> Result<Json<CreatePostResponse>, AppError> {
    let input = CreatePost {
        text: payload.text.unwrap_or_default(),
        image: payload.image,
        video_url: payload.video_url,
        attachment: payload.attachment.map(|attachment| AttachmentRef {
            kind: attachment.kind,
            id: attachment.id,
        }),
    };

    let post = state.post_service().create_post(&author, input).await?;
    let data = state.feed_service().post(post.id, Some(&author)).await?;

    Ok(Json(CreatePostResponse {
        status: "success",
        message: "Post created successfully".to_string(),
        data,
    }))
}

#[derive(Deserialize)]
pub struct EditTextRequest {
    #[serde(default, alias = "content")]
    pub text: String,
}

pub async fn edit_post(
    ApiPath(id): ApiPath<i64>,
    AuthUser(requester): AuthUser,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<EditTextRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .post_service()
        .edit_post(&requester, id, &payload.text)
        .await?;
    Ok(MessageResponse::success("Post updated"))
}

pub async fn delete_post(
    ApiPath(id): ApiPath<i64>,
    AuthUser(requester): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, AppError> {
    state.post_service().delete_post(&requester, id).await?;
    Ok(MessageResponse::success("Post deleted"))
}

#[derive(Serialize)]
pub struct LikeResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub liked: bool,
    pub like_count: i64,
}

pub async fn toggle_like(
    ApiPath(id): ApiPath<i64>,
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<LikeResponse>, AppError> {
    let likes = state.engagement_service().toggle_like(&user, id).await?;
    Ok(Json(LikeResponse {
        status: "success",
        message: if likes.liked { "Liked" } else { "Unliked" },
        liked: likes.liked,
        like_count: likes.count,
    }))
}

#[derive(Deserialize)]
pub struct CommentRequest {
    #[serde(default, alias = "text")]
    pub content: String,
}

#[derive(Serialize)]
pub struct CommentResponse {
    pub status: &'static str,
    pub message: String,
    pub data: CommentView,
}

pub async fn add_comment(
    ApiPath(id): ApiPath<i64>,
    AuthUser(author): AuthUser,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CommentRequest>,
) -> Result<Json<CommentResponse>, AppError> {
    let comment = state
        .engagement_service()
        .add_comment(&author, id, &payload.content)
        .await?;

    Ok(Json(CommentResponse {
        status: "success",
        message: "Comment added".to_string(),
        data: comment.into(),
    }))
}

pub async fn edit_comment(
    ApiPath(id): ApiPath<i64>,
    AuthUser(requester): AuthUser,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<EditTextRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .engagement_service()
        .edit_comment(&requester, id, &payload.text)
        .await?;
    Ok(MessageResponse::success("Comment updated"))
}

pub async fn delete_comment(
    ApiPath(id): ApiPath<i64>,
    AuthUser(requester): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .engagement_service()
        .delete_comment(&requester, id)
        .await?;
    Ok(MessageResponse::success("Comment deleted"))
}
