use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::{AnonymousPost, Outcome, QueryContext, QueryType};
use crate::repository_traits::PostRepository;
use crate::service::NavigatorService;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub text: String,
    pub query_type: QueryType,
    #[serde(default)]
    pub context: Option<QueryContext>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    pub message: String,
}

impl ChatResponse {
    /// All user-facing phrasing for generation outcomes lives here; the
    /// core only reports tagged variants.
    fn from_outcome(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Reply(text) => Self {
                status: "reply",
                message: text.clone(),
                reply: Some(text),
            },
            Outcome::Waiting => Self {
                status: "waiting",
                reply: None,
                message: "Please wait a moment - your previous question is still being processed."
                    .to_string(),
            },
            Outcome::Failed => Self {
                status: "failed",
                reply: None,
                message: "Reply generation failed, please try again.".to_string(),
            },
            Outcome::TimedOut => Self {
                status: "timed_out",
                reply: None,
                message: "The assistant is taking too long to reply, please try again.".to_string(),
            },
            Outcome::NoReply => Self {
                status: "no_reply",
                reply: None,
                message: "The assistant did not provide a reply.".to_string(),
            },
            Outcome::Error(detail) => Self {
                status: "error",
                reply: None,
                message: format!("An error occurred: {detail}"),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub content: String,
    pub category: String,
}

#[derive(Debug, Deserialize)]
pub struct SupportRequest {
    pub session_id: String,
}

pub fn router<R: PostRepository>(service: Arc<NavigatorService<R>>) -> Router {
    Router::new()
        .route("/api/chat", post(chat::<R>))
        .route("/api/posts", post(create_post::<R>).get(list_posts::<R>))
        .route("/api/posts/:id/support", post(support_post::<R>))
        .route("/api/sessions/:id/clear", post(clear_session::<R>))
        .route("/health", get(|| async { "ok" }))
        .with_state(service)
}

async fn chat<R: PostRepository>(
    State(service): State<Arc<NavigatorService<R>>>,
    Json(req): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let outcome = service
        .chat(&req.session_id, &req.text, req.query_type, req.context.as_ref())
        .await;
    Json(ChatResponse::from_outcome(outcome))
}

async fn create_post<R: PostRepository>(
    State(service): State<Arc<NavigatorService<R>>>,
    Json(req): Json<CreatePostRequest>,
) -> Result<Json<AnonymousPost>, (StatusCode, String)> {
    match service.share_post(&req.content, &req.category).await {
        Ok(post) => Ok(Json(post)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to save anonymous post");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

async fn list_posts<R: PostRepository>(
    State(service): State<Arc<NavigatorService<R>>>,
) -> Result<Json<Vec<AnonymousPost>>, (StatusCode, String)> {
    match service.list_posts().await {
        Ok(posts) => Ok(Json(posts)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to list anonymous posts");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

/// Generate a supportive assistant response to an existing anonymous post
async fn support_post<R: PostRepository>(
    State(service): State<Arc<NavigatorService<R>>>,
    Path(post_id): Path<String>,
    Json(req): Json<SupportRequest>,
) -> axum::response::Response {
    let posts = match service.list_posts().await {
        Ok(posts) => posts,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load posts for support reply");
            return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
        }
    };
    let Some(post) = posts.into_iter().find(|p| p.id == post_id) else {
        return (StatusCode::NOT_FOUND, "post not found".to_string()).into_response();
    };

    let outcome = service
        .chat(
            &req.session_id,
            &post.content,
            QueryType::AnonymousSharing,
            None,
        )
        .await;
    Json(ChatResponse::from_outcome(outcome)).into_response()
}

async fn clear_session<R: PostRepository>(
    State(service): State<Arc<NavigatorService<R>>>,
    Path(session_id): Path<String>,
) -> StatusCode {
    service.clear_history(&session_id);
    StatusCode::NO_CONTENT
}
