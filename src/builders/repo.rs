use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{BuilderProfile, NewBuilder};
use crate::store::StoreError;

impl BuilderProfile {
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<BuilderProfile>, StoreError> {
        let row = sqlx::query_as::<_, BuilderProfile>(
            r#"
            SELECT id, email, name, github_handle, github_url, avatar_url,
                   linkedin_url, website_url, created_at, updated_at
              FROM builders
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn create(db: &PgPool, new: &NewBuilder) -> Result<BuilderProfile, StoreError> {
        let row = sqlx::query_as::<_, BuilderProfile>(
            r#"
            INSERT INTO builders (id, email, name, github_handle, github_url, avatar_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, email, name, github_handle, github_url, avatar_url,
                      linkedin_url, website_url, created_at, updated_at
            "#,
        )
        .bind(new.id)
        .bind(&new.email)
        .bind(&new.name)
        .bind(&new.github_handle)
        .bind(&new.github_url)
        .bind(&new.avatar_url)
        .fetch_one(db)
        .await?;
        Ok(row)
    }
}
