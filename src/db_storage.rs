use crate::errors::{AppError, ResultExt};
use crate::models::{
    CommunityPost, CommunityPostRequest, Feedback, FeedbackRequest, FeedbackStats, ProfileRequest,
    UserProfile,
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

pub const FEEDBACK_PENDING: &str = "pending";
pub const POST_PUBLISHED: &str = "published";

/// Storage for farmer feedback, community posts and profiles.
///
/// Inputs are expected to be validated already (see `crate::validation`).
#[async_trait]
pub trait CommunityStore: Send + Sync {
    async fn insert_feedback(&self, feedback: FeedbackRequest) -> Result<Feedback, AppError>;

    async fn feedback_stats(&self) -> Result<FeedbackStats, AppError>;

    async fn insert_post(&self, post: CommunityPostRequest) -> Result<CommunityPost, AppError>;

    /// Posts newest first, optionally limited.
    async fn list_posts(&self, limit: Option<usize>) -> Result<Vec<CommunityPost>, AppError>;

    /// Creates or replaces the profile for `profile.user_id`.
    async fn save_profile(&self, profile: ProfileRequest) -> Result<UserProfile, AppError>;

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError>;
}

/// PostgreSQL-backed store (tables created by `crate::db::Database::new`).
pub struct PgCommunityStore {
    pool: PgPool,
}

impl PgCommunityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommunityStore for PgCommunityStore {
    async fn insert_feedback(&self, feedback: FeedbackRequest) -> Result<Feedback, AppError> {
        let stored = sqlx::query_as::<_, Feedback>(
            r#"
            INSERT INTO feedbacks (id, name, email, message, language, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, name, email, message, language, status, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&feedback.name)
        .bind(&feedback.email)
        .bind(&feedback.message)
        .bind(&feedback.language)
        .bind(FEEDBACK_PENDING)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert feedback")?;

        tracing::info!("Stored feedback {} from {}", stored.id, stored.name);
        Ok(stored)
    }

    async fn feedback_stats(&self) -> Result<FeedbackStats, AppError> {
        let (total_feedbacks, pending_feedbacks, total_posts) =
            sqlx::query_as::<_, (i64, i64, i64)>(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM feedbacks),
                    (SELECT COUNT(*) FROM feedbacks WHERE status = $1),
                    (SELECT COUNT(*) FROM community_posts)
                "#,
            )
            .bind(FEEDBACK_PENDING)
            .fetch_one(&self.pool)
            .await
            .context("Failed to compute feedback stats")?;

        Ok(FeedbackStats {
            total_feedbacks,
            pending_feedbacks,
            reviewed_feedbacks: total_feedbacks - pending_feedbacks,
            total_posts,
        })
    }

    async fn insert_post(&self, post: CommunityPostRequest) -> Result<CommunityPost, AppError> {
        let now = Utc::now();
        let stored = sqlx::query_as::<_, CommunityPost>(
            r#"
            INSERT INTO community_posts
                (id, author, title, content, language, likes, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, 0, $6, $7, $7)
            RETURNING id, author, title, content, language, likes, status, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&post.author)
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.language)
        .bind(POST_PUBLISHED)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert community post")?;

        tracing::info!("Stored community post {} by {}", stored.id, stored.author);
        Ok(stored)
    }

    async fn list_posts(&self, limit: Option<usize>) -> Result<Vec<CommunityPost>, AppError> {
        // LIMIT NULL means no limit
        let limit = limit.map(|l| l as i64);

        let posts = sqlx::query_as::<_, CommunityPost>(
            r#"
            SELECT id, author, title, content, language, likes, status, created_at, updated_at
            FROM community_posts
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list community posts")?;

        Ok(posts)
    }

    async fn save_profile(&self, profile: ProfileRequest) -> Result<UserProfile, AppError> {
        let stored = sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO user_profiles
                (user_id, name, email, phone, location, farm_size, farm_type, preferred_language, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (user_id) DO UPDATE SET
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                phone = EXCLUDED.phone,
                location = EXCLUDED.location,
                farm_size = EXCLUDED.farm_size,
                farm_type = EXCLUDED.farm_type,
                preferred_language = EXCLUDED.preferred_language,
                updated_at = EXCLUDED.updated_at
            RETURNING user_id, name, email, phone, location, farm_size, farm_type, preferred_language, updated_at
            "#,
        )
        .bind(&profile.user_id)
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&profile.phone)
        .bind(&profile.location)
        .bind(&profile.farm_size)
        .bind(&profile.farm_type)
        .bind(&profile.preferred_language)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("Failed to save profile {}", profile.user_id))?;

        tracing::info!("Saved profile for user {}", stored.user_id);
        Ok(stored)
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT user_id, name, email, phone, location, farm_size, farm_type, preferred_language, updated_at
            FROM user_profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Database error in get_profile for '{}': {:?}", user_id, e);
            AppError::DatabaseError(e)
        })?;

        Ok(profile)
    }
}

#[derive(Default)]
struct MemoryState {
    feedbacks: Vec<Feedback>,
    /// Insertion (oldest first) order.
    posts: Vec<CommunityPost>,
    profiles: HashMap<String, UserProfile>,
}

/// Process-local store used when no database is configured. Contents are
/// lost on restart.
#[derive(Default)]
pub struct MemoryCommunityStore {
    state: RwLock<MemoryState>,
}

impl MemoryCommunityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommunityStore for MemoryCommunityStore {
    async fn insert_feedback(&self, feedback: FeedbackRequest) -> Result<Feedback, AppError> {
        let stored = Feedback {
            id: Uuid::new_v4(),
            name: feedback.name,
            email: feedback.email,
            message: feedback.message,
            language: feedback.language,
            status: FEEDBACK_PENDING.to_string(),
            created_at: Utc::now(),
        };

        self.state.write().await.feedbacks.push(stored.clone());
        tracing::info!("Stored feedback {} in memory", stored.id);
        Ok(stored)
    }

    async fn feedback_stats(&self) -> Result<FeedbackStats, AppError> {
        let state = self.state.read().await;
        let total_feedbacks = state.feedbacks.len() as i64;
        let pending_feedbacks = state
            .feedbacks
            .iter()
            .filter(|f| f.status == FEEDBACK_PENDING)
            .count() as i64;

        Ok(FeedbackStats {
            total_feedbacks,
            pending_feedbacks,
            reviewed_feedbacks: total_feedbacks - pending_feedbacks,
            total_posts: state.posts.len() as i64,
        })
    }

    async fn insert_post(&self, post: CommunityPostRequest) -> Result<CommunityPost, AppError> {
        let now = Utc::now();
        let stored = CommunityPost {
            id: Uuid::new_v4(),
            author: post.author,
            title: post.title,
            content: post.content,
            language: post.language,
            likes: 0,
            status: POST_PUBLISHED.to_string(),
            created_at: now,
            updated_at: now,
        };

        self.state.write().await.posts.push(stored.clone());
        tracing::info!("Stored community post {} in memory", stored.id);
        Ok(stored)
    }

    async fn list_posts(&self, limit: Option<usize>) -> Result<Vec<CommunityPost>, AppError> {
        let state = self.state.read().await;
        let newest_first = state.posts.iter().rev().cloned();

        Ok(match limit {
            Some(limit) => newest_first.take(limit).collect(),
            None => newest_first.collect(),
        })
    }

    async fn save_profile(&self, profile: ProfileRequest) -> Result<UserProfile, AppError> {
        let stored = UserProfile {
            user_id: profile.user_id,
            name: profile.name,
            email: profile.email,
            phone: profile.phone,
            location: profile.location,
            farm_size: profile.farm_size,
            farm_type: profile.farm_type,
            preferred_language: profile.preferred_language,
            updated_at: Utc::now(),
        };

        self.state
            .write()
            .await
            .profiles
            .insert(stored.user_id.clone(), stored.clone());
        Ok(stored)
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        Ok(self.state.read().await.profiles.get(user_id).cloned())
    }
}
