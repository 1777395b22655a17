use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{BuilderSubmission, NewSubmission, Submission, SubmissionForReview};
use crate::store::StoreError;

const SUBMISSION_COLUMNS: &str = r#"
    s.id, s.builder_id, s.challenge_id, s.github_repo_link, s.demo_video_link,
    s.pitch_deck_link, s.provisional_score, s.test_passed, s.ai_feedback,
    s.submission_time, s.created_at
"#;

impl Submission {
    /// Submissions for one challenge, or all of them when `challenge_id` is `None`.
    pub async fn list_for_review(
        db: &PgPool,
        challenge_id: Option<Uuid>,
    ) -> Result<Vec<SubmissionForReview>, StoreError> {
        let sql = format!(
            r#"
            SELECT {SUBMISSION_COLUMNS},
                   b.name AS builder_name, b.email AS builder_email,
                   c.title AS challenge_title
              FROM submissions s
              LEFT JOIN builders b ON b.id = s.builder_id
              LEFT JOIN challenges c ON c.id = s.challenge_id
             WHERE ($1::uuid IS NULL OR s.challenge_id = $1)
             ORDER BY s.submission_time DESC
            "#
        );
        let rows = sqlx::query_as::<_, SubmissionForReview>(&sql)
            .bind(challenge_id)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    pub async fn list_for_builder(
        db: &PgPool,
        builder_id: Uuid,
    ) -> Result<Vec<BuilderSubmission>, StoreError> {
        let sql = format!(
            r#"
            SELECT {SUBMISSION_COLUMNS},
                   c.title AS challenge_title, c.deadline AS challenge_deadline
              FROM submissions s
              LEFT JOIN challenges c ON c.id = s.challenge_id
             WHERE s.builder_id = $1
             ORDER BY s.submission_time DESC
            "#
        );
        let rows = sqlx::query_as::<_, BuilderSubmission>(&sql)
            .bind(builder_id)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    pub async fn create(db: &PgPool, new: &NewSubmission) -> Result<Submission, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO submissions AS s
                   (builder_id, challenge_id, github_repo_link, demo_video_link, pitch_deck_link)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SUBMISSION_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, Submission>(&sql)
            .bind(new.builder_id)
            .bind(new.challenge_id)
            .bind(&new.github_repo_link)
            .bind(&new.demo_video_link)
            .bind(&new.pitch_deck_link)
            .fetch_one(db)
            .await?;
        Ok(row)
    }
}
