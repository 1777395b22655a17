use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{
    Challenge, ChallengeFilters, ChallengePatch, ChallengeWithSponsor, ChallengeWithSponsorRow,
    NewChallenge,
};
use crate::store::StoreError;

const CHALLENGE_COLUMNS: &str = r#"
    c.id, c.sponsor_id, c.title, c.description, c.deadline, c.reward_structure,
    c.industry, c.skill_level, c.rubric, c.data_pack_url, c.logo_url,
    c.closed_at, c.created_at, c.updated_at
"#;

impl Challenge {
    /// All challenges matching the filters, newest first, with their sponsor.
    pub async fn list(
        db: &PgPool,
        filters: &ChallengeFilters,
    ) -> Result<Vec<ChallengeWithSponsor>, StoreError> {
        let sql = format!(
            r#"
            SELECT {CHALLENGE_COLUMNS},
                   s.name AS sponsor_name, s.company AS sponsor_company, s.website AS sponsor_website
              FROM challenges c
              LEFT JOIN sponsors s ON s.id = c.sponsor_id
             WHERE ($1::text IS NULL OR c.industry = $1)
               AND ($2::skill_level_enum IS NULL OR c.skill_level = $2)
             ORDER BY c.created_at DESC
            "#
        );
        let rows = sqlx::query_as::<_, ChallengeWithSponsorRow>(&sql)
            .bind(&filters.industry)
            .bind(filters.skill_level)
            .fetch_all(db)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn find_by_id(
        db: &PgPool,
        id: Uuid,
    ) -> Result<Option<ChallengeWithSponsor>, StoreError> {
        let sql = format!(
            r#"
            SELECT {CHALLENGE_COLUMNS},
                   s.name AS sponsor_name, s.company AS sponsor_company, s.website AS sponsor_website
              FROM challenges c
              LEFT JOIN sponsors s ON s.id = c.sponsor_id
             WHERE c.id = $1
            "#
        );
        let row = sqlx::query_as::<_, ChallengeWithSponsorRow>(&sql)
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(row.map(Into::into))
    }

    pub async fn create(db: &PgPool, new: &NewChallenge) -> Result<Challenge, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO challenges AS c
                   (sponsor_id, title, description, deadline, reward_structure,
                    industry, skill_level, rubric, data_pack_url, logo_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {CHALLENGE_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, Challenge>(&sql)
            .bind(new.sponsor_id)
            .bind(&new.title)
            .bind(&new.description)
            .bind(new.deadline)
            .bind(&new.reward_structure)
            .bind(&new.industry)
            .bind(new.skill_level)
            .bind(&new.rubric)
            .bind(&new.data_pack_url)
            .bind(&new.logo_url)
            .fetch_one(db)
            .await?;
        Ok(row)
    }

    /// Applies the patch when the challenge belongs to `sponsor_id`.
    /// Returns `None` when no such challenge is owned by that sponsor.
    ///
    /// Nullable columns are bound as a (present, value) pair so that a present
    /// `None` writes NULL.
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        sponsor_id: Uuid,
        patch: &ChallengePatch,
    ) -> Result<Option<Challenge>, StoreError> {
        let sql = format!(
            r#"
            UPDATE challenges AS c
               SET title            = COALESCE($3, c.title),
                   description      = COALESCE($4, c.description),
                   deadline         = COALESCE($5, c.deadline),
                   reward_structure = COALESCE($6, c.reward_structure),
                   industry         = COALESCE($7, c.industry),
                   skill_level      = COALESCE($8, c.skill_level),
                   rubric           = COALESCE($9, c.rubric),
                   data_pack_url    = CASE WHEN $10 THEN $11 ELSE c.data_pack_url END,
                   logo_url         = CASE WHEN $12 THEN $13 ELSE c.logo_url END,
                   closed_at        = CASE WHEN $14 THEN $15 ELSE c.closed_at END,
                   updated_at       = now()
             WHERE c.id = $1 AND c.sponsor_id = $2
            RETURNING {CHALLENGE_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, Challenge>(&sql)
            .bind(id)
            .bind(sponsor_id)
            .bind(&patch.title)
            .bind(&patch.description)
            .bind(patch.deadline)
            .bind(&patch.reward_structure)
            .bind(&patch.industry)
            .bind(patch.skill_level)
            .bind(&patch.rubric)
            .bind(patch.data_pack_url.is_some())
            .bind(patch.data_pack_url.clone().flatten())
            .bind(patch.logo_url.is_some())
            .bind(patch.logo_url.clone().flatten())
            .bind(patch.closed_at.is_some())
            .bind(patch.closed_at.flatten())
            .fetch_optional(db)
            .await?;
        Ok(row)
    }
}
