//! Profile persistence seam used by the session resolver, with the Postgres
//! implementation behind it.

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::builders::repo_types::{BuilderProfile, NewBuilder};
use crate::sponsors::repo_types::{NewSponsor, SponsorProfile};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no row found")]
    NotFound,
    #[error("unique constraint violated: {message}")]
    UniqueViolation {
        constraint: Option<String>,
        message: String,
    },
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl StoreError {
    /// Machine-readable code, stable across backends.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::NotFound => "not_found",
            StoreError::UniqueViolation { .. } => "unique_violation",
            StoreError::Unavailable(_) => "unavailable",
            StoreError::Database(_) => "database",
        }
    }

    /// True for a unique violation whose constraint name or message carries `marker`.
    pub fn violates(&self, marker: &str) -> bool {
        match self {
            StoreError::UniqueViolation {
                constraint,
                message,
            } => constraint.as_deref().is_some_and(|c| c.contains(marker)) || message.contains(marker),
            _ => false,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::UniqueViolation {
                constraint: db.constraint().map(str::to_owned),
                message: db.message().to_owned(),
            },
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(e.to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

/// Collapses "no row" into `Ok(None)` for single-row lookups.
pub fn found<T>(r: Result<Option<T>, StoreError>) -> Result<Option<T>, StoreError> {
    match r {
        Err(StoreError::NotFound) => Ok(None),
        other => other,
    }
}

#[async_trait]
pub trait ProfileStore: Send + Sync + 'static {
    async fn find_builder(&self, id: Uuid) -> Result<Option<BuilderProfile>, StoreError>;

    async fn insert_builder(&self, new: &NewBuilder) -> Result<BuilderProfile, StoreError>;

    async fn find_sponsor_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<SponsorProfile>, StoreError>;

    async fn insert_sponsor(&self, new: &NewSponsor) -> Result<SponsorProfile, StoreError>;
}

#[derive(Clone)]
pub struct PgProfileStore {
    db: PgPool,
}

impl PgProfileStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn find_builder(&self, id: Uuid) -> Result<Option<BuilderProfile>, StoreError> {
        BuilderProfile::find_by_id(&self.db, id).await
    }

    async fn insert_builder(&self, new: &NewBuilder) -> Result<BuilderProfile, StoreError> {
        BuilderProfile::create(&self.db, new).await
    }

    async fn find_sponsor_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<SponsorProfile>, StoreError> {
        SponsorProfile::find_by_user_id(&self.db, user_id).await
    }

    async fn insert_sponsor(&self, new: &NewSponsor) -> Result<SponsorProfile, StoreError> {
        SponsorProfile::create(&self.db, new).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(StoreError::NotFound.code(), "not_found");
        assert_eq!(StoreError::Unavailable("down".into()).code(), "unavailable");
        let dup = StoreError::UniqueViolation {
            constraint: None,
            message: "duplicate key value violates unique constraint \"sponsors_email_key\"".into(),
        };
        assert_eq!(dup.code(), "unique_violation");
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let e: StoreError = sqlx::Error::RowNotFound.into();
        assert!(matches!(e, StoreError::NotFound));
        assert!(found::<u8>(Err(e)).unwrap().is_none());
    }

    #[test]
    fn violates_checks_constraint_and_message() {
        let by_constraint = StoreError::UniqueViolation {
            constraint: Some("sponsors_user_id_key".into()),
            message: "duplicate key".into(),
        };
        assert!(by_constraint.violates("sponsors_user_id_key"));
        assert!(!by_constraint.violates("sponsors_email_key"));

        let by_message = StoreError::UniqueViolation {
            constraint: None,
            message: "violates unique constraint \"sponsors_email_key\"".into(),
        };
        assert!(by_message.violates("sponsors_email_key"));
        assert!(!StoreError::NotFound.violates("sponsors_email_key"));
    }
}
