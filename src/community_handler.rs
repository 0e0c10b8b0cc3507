//! Community endpoints: feedback, posts, farmer profiles and translation.

use crate::errors::{AppError, ResultExt};
use crate::handlers::AppState;
use crate::models::*;
use crate::translation::SUPPORTED_LANGUAGES;
use crate::validation::{validate_feedback, validate_post, validate_profile, validate_translation};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use std::sync::Arc;

pub const DEFAULT_RECENT_LIMIT: usize = 10;
pub const MAX_RECENT_LIMIT: usize = 100;

/// POST /api/feedback
pub async fn submit_feedback(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FeedbackRequest>,
) -> Result<(StatusCode, Json<FeedbackResponse>), AppError> {
    let feedback = validate_feedback(request)?;
    let stored = state
        .store
        .insert_feedback(feedback)
        .await
        .context("Failed to submit feedback")?;

    tracing::info!("Feedback submitted successfully by {}", stored.name);

    Ok((
        StatusCode::CREATED,
        Json(FeedbackResponse {
            success: true,
            message: "Feedback submitted successfully. Thank you for your input!".to_string(),
            feedback_id: Some(stored.id.to_string()),
        }),
    ))
}

/// GET /api/feedback/stats
pub async fn feedback_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FeedbackStats>, AppError> {
    let stats = state
        .store
        .feedback_stats()
        .await
        .context("Failed to fetch feedback statistics")?;
    Ok(Json(stats))
}

/// POST /api/community-post
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CommunityPostRequest>,
) -> Result<(StatusCode, Json<CommunityPostResponse>), AppError> {
    let post = validate_post(request)?;
    let stored = state
        .store
        .insert_post(post)
        .await
        .context("Failed to create community post")?;

    tracing::info!("Community post '{}' created by {}", stored.title, stored.author);

    Ok((
        StatusCode::CREATED,
        Json(CommunityPostResponse {
            success: true,
            message: "Post created successfully!".to_string(),
            post_id: Some(stored.id.to_string()),
        }),
    ))
}

/// GET /api/community-posts
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CommunityPostsResponse>, AppError> {
    let posts = state
        .store
        .list_posts(None)
        .await
        .context("Failed to fetch community posts")?;

    Ok(Json(CommunityPostsResponse {
        success: true,
        count: posts.len(),
        posts,
    }))
}

/// GET /api/community-posts/recent?limit=10
pub async fn recent_posts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecentPostsQuery>,
) -> Result<Json<CommunityPostsResponse>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    if limit == 0 || limit > MAX_RECENT_LIMIT {
        return Err(AppError::BadRequest(format!(
            "limit must be between 1 and {}",
            MAX_RECENT_LIMIT
        )));
    }

    let posts = state
        .store
        .list_posts(Some(limit))
        .await
        .context("Failed to fetch recent posts")?;

    Ok(Json(CommunityPostsResponse {
        success: true,
        count: posts.len(),
        posts,
    }))
}

/// POST /api/profile/save
pub async fn save_profile(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ProfileRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = validate_profile(request)?;
    let stored = state
        .store
        .save_profile(profile)
        .await
        .context("Failed to save profile")?;

    Ok(Json(ProfileResponse {
        success: true,
        message: Some("Profile saved successfully".to_string()),
        profile: Some(stored),
    }))
}

/// GET /api/profile/:user_id
///
/// A missing profile is a normal answer (`success: false`), not a 404.
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = state
        .store
        .get_profile(user_id.trim())
        .await
        .with_context(|| format!("Failed to load profile {}", user_id))?;

    Ok(Json(match profile {
        Some(profile) => ProfileResponse {
            success: true,
            message: None,
            profile: Some(profile),
        },
        None => ProfileResponse {
            success: false,
            message: Some("Profile not found".to_string()),
            profile: None,
        },
    }))
}

/// POST /api/translate
///
/// Translation failures are reported in the body with a 200 status.
pub async fn translate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TranslationRequest>,
) -> Result<Json<TranslationResponse>, AppError> {
    let request = validate_translation(request)?;
    tracing::info!(
        "POST /translate - {} -> {} ({} chars)",
        request.source_language,
        request.target_language,
        request.text.chars().count()
    );

    Ok(Json(state.translator.translate(&request).await))
}

/// GET /api/translate/languages
pub async fn supported_languages() -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "languages": SUPPORTED_LANGUAGES,
        "count": SUPPORTED_LANGUAGES.len(),
    }))
}
