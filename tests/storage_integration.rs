use std::env;
use uuid::Uuid;

use crop_advisor_api::db::Database;
use crop_advisor_api::db_storage::{CommunityStore, PgCommunityStore};
use crop_advisor_api::models::{CommunityPostRequest, FeedbackRequest, ProfileRequest};

async fn pg_store() -> anyhow::Result<PgCommunityStore> {
    let db_url = env::var("TEST_DATABASE_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .map_err(|_| anyhow::anyhow!("Set TEST_DATABASE_URL or DATABASE_URL to run this test"))?;

    let db = Database::new(&db_url).await?;
    Ok(PgCommunityStore::new(db.pool))
}

/// Integration smoke test for the PostgreSQL community store.
/// Marked ignored so it only runs against a disposable database; set TEST_DATABASE_URL to run.
#[tokio::test]
#[ignore]
async fn community_store_smoke_test() -> anyhow::Result<()> {
    let store = pg_store().await?;
    let before = store
        .feedback_stats()
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let feedback = store
        .insert_feedback(FeedbackRequest {
            name: "Smoke Test".into(),
            email: "smoke@example.com".into(),
            message: "Storage smoke test feedback.".into(),
            language: "en".into(),
        })
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_ne!(feedback.id, Uuid::nil());
    assert_eq!(feedback.status, "pending");

    let post = store
        .insert_post(CommunityPostRequest {
            author: "Smoke Test".into(),
            title: "Smoke test post".into(),
            content: "Checking that posts round-trip through PostgreSQL.".into(),
            language: "en".into(),
        })
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let recent = store
        .list_posts(Some(1))
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].id, post.id);

    let after = store
        .feedback_stats()
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(after.total_feedbacks, before.total_feedbacks + 1);
    assert_eq!(after.total_posts, before.total_posts + 1);

    Ok(())
}

/// Saving the same user twice updates the row in place.
#[tokio::test]
#[ignore]
async fn profile_upsert_smoke_test() -> anyhow::Result<()> {
    let store = pg_store().await?;
    let user_id = format!("smoke-{}", Uuid::new_v4());

    let mut profile = ProfileRequest {
        user_id: user_id.clone(),
        name: "Smoke Farmer".into(),
        email: "farmer@example.com".into(),
        phone: "".into(),
        location: "Pune".into(),
        farm_size: "2 acres".into(),
        farm_type: "Rainfed".into(),
        preferred_language: "mr".into(),
    };
    store
        .save_profile(profile.clone())
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    profile.farm_size = "3 acres".into();
    store
        .save_profile(profile)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let stored = store
        .get_profile(&user_id)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .ok_or_else(|| anyhow::anyhow!("profile missing"))?;
    assert_eq!(stored.farm_size, "3 acres");

    Ok(())
}
