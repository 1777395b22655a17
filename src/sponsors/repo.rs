use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{NewSponsor, SponsorProfile};
use crate::store::StoreError;

impl SponsorProfile {
    pub async fn find_by_user_id(
        db: &PgPool,
        user_id: Uuid,
    ) -> Result<Option<SponsorProfile>, StoreError> {
        let row = sqlx::query_as::<_, SponsorProfile>(
            r#"
            SELECT id, user_id, email, name, company, website,
                   notify_new_submissions, notify_deadlines, notify_candidate_updates,
                   created_at, updated_at
              FROM sponsors
             WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    /// Insert a sponsor; duplicate email or user link surfaces as `StoreError::UniqueViolation`.
    pub async fn create(db: &PgPool, new: &NewSponsor) -> Result<SponsorProfile, StoreError> {
        let row = sqlx::query_as::<_, SponsorProfile>(
            r#"
            INSERT INTO sponsors (user_id, email, name, company, website)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, email, name, company, website,
                      notify_new_submissions, notify_deadlines, notify_candidate_updates,
                      created_at, updated_at
            "#,
        )
        .bind(new.user_id)
        .bind(&new.email)
        .bind(&new.name)
        .bind(&new.company)
        .bind(&new.website)
        .fetch_one(db)
        .await?;
        Ok(row)
    }
}
