//! PostgreSQL implementation of ExpertiseRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::features::DomainExpertise;
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::ports::ExpertiseRepository;

pub struct PostgresExpertiseRepository {
    pool: PgPool,
}

impl PostgresExpertiseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ExpertiseRow {
    user_id: String,
    interest: String,
    confidence: f64,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ExpertiseRow> for DomainExpertise {
    type Error = DomainError;

    fn try_from(row: ExpertiseRow) -> Result<Self, Self::Error> {
        let user_id = UserId::new(row.user_id).map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid user_id: {}", e))
        })?;
        Ok(DomainExpertise::reconstitute(
            user_id,
            row.interest,
            row.confidence,
            Timestamp::from_datetime(row.updated_at),
        ))
    }
}

fn db_error(action: &str, err: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("Failed to {}: {}", action, err))
}

#[async_trait]
impl ExpertiseRepository for PostgresExpertiseRepository {
    async fn find(
        &self,
        user_id: &UserId,
        interest: &str,
    ) -> Result<Option<DomainExpertise>, DomainError> {
        let row: Option<ExpertiseRow> = sqlx::query_as(
            r#"
            SELECT user_id, interest, confidence, updated_at
            FROM user_domain_expertise
            WHERE user_id = $1 AND interest = $2
            "#,
        )
        .bind(user_id.as_str())
        .bind(interest)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find expertise", e))?;

        row.map(DomainExpertise::try_from).transpose()
    }

    async fn upsert(&self, expertise: &DomainExpertise) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO user_domain_expertise (user_id, interest, confidence, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, interest) DO UPDATE SET
                confidence = EXCLUDED.confidence,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(expertise.user_id().as_str())
        .bind(expertise.interest())
        .bind(expertise.confidence())
        .bind(expertise.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("upsert expertise", e))?;

        Ok(())
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<DomainExpertise>, DomainError> {
        let rows: Vec<ExpertiseRow> = sqlx::query_as(
            r#"
            SELECT user_id, interest, confidence, updated_at
            FROM user_domain_expertise
            WHERE user_id = $1
            ORDER BY interest
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("list expertise", e))?;

        rows.into_iter().map(DomainExpertise::try_from).collect()
    }

    async fn find_all(&self) -> Result<Vec<DomainExpertise>, DomainError> {
        let rows: Vec<ExpertiseRow> = sqlx::query_as(
            "SELECT user_id, interest, confidence, updated_at FROM user_domain_expertise",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("list expertise", e))?;

        rows.into_iter().map(DomainExpertise::try_from).collect()
    }
}
