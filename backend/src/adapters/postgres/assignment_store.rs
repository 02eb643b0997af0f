//! PostgreSQL implementation of AssignmentStore.
//!
//! Two tables: `user_assignment_state` (one row per user, carrying the
//! optimistic-lock `version`) and `user_profile_ranking_state` (one row
//! per user and profile). A commit updates both inside one transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::assignment::{ProfileMode, UserAssignmentState};
use crate::domain::foundation::{DomainError, ErrorCode, ProfileId, Timestamp, UserId};
use crate::domain::ranking::{RankingState, UserRankings};
use crate::ports::{AssignmentSnapshot, AssignmentStore};

pub struct PostgresAssignmentStore {
    pool: PgPool,
}

impl PostgresAssignmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AssignmentRow {
    user_id: String,
    mode: String,
    assigned_profile_id: Option<String>,
    fallback_profile_id: Option<String>,
    prompt_count: i64,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct RankingRow {
    profile_id: String,
    cumulative_score: f64,
    observation_count: i64,
    max_score: f64,
    last_rank: Option<i32>,
    consecutive_top_count: i32,
    consecutive_drop_count: i32,
    updated_at: Option<DateTime<Utc>>,
}

fn corrupt(what: &str, err: impl std::fmt::Display) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("Invalid stored {}: {}", what, err))
}

fn db_error(action: &str, err: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("Failed to {}: {}", action, err))
}

fn parse_profile_id(raw: Option<String>) -> Result<Option<ProfileId>, DomainError> {
    raw.map(|id| ProfileId::new(id).map_err(|e| corrupt("profile_id", e)))
        .transpose()
}

fn non_negative(what: &str, value: i64) -> Result<u64, DomainError> {
    u64::try_from(value).map_err(|e| corrupt(what, e))
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

impl TryFrom<AssignmentRow> for UserAssignmentState {
    type Error = DomainError;

    fn try_from(row: AssignmentRow) -> Result<Self, Self::Error> {
        Ok(UserAssignmentState::reconstitute(
            UserId::new(row.user_id).map_err(|e| corrupt("user_id", e))?,
            row.mode.parse::<ProfileMode>().map_err(|e| corrupt("mode", e))?,
            parse_profile_id(row.assigned_profile_id)?,
            parse_profile_id(row.fallback_profile_id)?,
            non_negative("prompt_count", row.prompt_count)?,
            non_negative("version", row.version)?,
            Timestamp::from_datetime(row.created_at),
            Timestamp::from_datetime(row.updated_at),
        ))
    }
}

impl TryFrom<RankingRow> for RankingState {
    type Error = DomainError;

    fn try_from(row: RankingRow) -> Result<Self, Self::Error> {
        let streak = |what: &str, v: i32| u32::try_from(v).map_err(|e| corrupt(what, e));
        Ok(RankingState::reconstitute(
            ProfileId::new(row.profile_id).map_err(|e| corrupt("profile_id", e))?,
            row.cumulative_score,
            non_negative("observation_count", row.observation_count)?,
            row.max_score,
            row.last_rank
                .map(|r| streak("last_rank", r))
                .transpose()?,
            streak("consecutive_top_count", row.consecutive_top_count)?,
            streak("consecutive_drop_count", row.consecutive_drop_count)?,
            row.updated_at.map(Timestamp::from_datetime),
        ))
    }
}

async fn upsert_ranking(
    tx: &mut Transaction<'_, Postgres>,
    user_id: &UserId,
    state: &RankingState,
) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        INSERT INTO user_profile_ranking_state (
            user_id, profile_id, cumulative_score, observation_count, max_score,
            last_rank, consecutive_top_count, consecutive_drop_count, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (user_id, profile_id) DO UPDATE SET
            cumulative_score = EXCLUDED.cumulative_score,
            observation_count = EXCLUDED.observation_count,
            max_score = EXCLUDED.max_score,
            last_rank = EXCLUDED.last_rank,
            consecutive_top_count = EXCLUDED.consecutive_top_count,
            consecutive_drop_count = EXCLUDED.consecutive_drop_count,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(user_id.as_str())
    .bind(state.profile_id().as_str())
    .bind(state.cumulative_score())
    .bind(to_i64(state.observation_count()))
    .bind(state.max_score())
    .bind(state.last_rank().map(to_i32))
    .bind(to_i32(state.consecutive_top_count()))
    .bind(to_i32(state.consecutive_drop_count()))
    .bind(state.updated_at().map(|t| *t.as_datetime()))
    .execute(&mut **tx)
    .await
    .map_err(|e| db_error("upsert ranking state", e))?;

    Ok(())
}

#[async_trait]
impl AssignmentStore for PostgresAssignmentStore {
    async fn create_user(&self, state: &UserAssignmentState) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO user_assignment_state (
                user_id, mode, assigned_profile_id, fallback_profile_id,
                prompt_count, version, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, 0, $6, $7)
            "#,
        )
        .bind(state.user_id().as_str())
        .bind(state.mode().as_str())
        .bind(state.assigned_profile_id().map(|p| p.as_str()))
        .bind(state.fallback_profile_id().map(|p| p.as_str()))
        .bind(to_i64(state.prompt_count()))
        .bind(state.created_at().as_datetime())
        .bind(state.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("user_assignment_state_pkey") {
                    return DomainError::new(
                        ErrorCode::UserAlreadyExists,
                        format!("User already registered: {}", state.user_id()),
                    )
                    .with_detail("user_id", state.user_id().to_string());
                }
            }
            db_error("create assignment state", e)
        })?;

        Ok(())
    }

    async fn load(&self, user_id: &UserId) -> Result<Option<AssignmentSnapshot>, DomainError> {
        let row: Option<AssignmentRow> = sqlx::query_as(
            r#"
            SELECT user_id, mode, assigned_profile_id, fallback_profile_id,
                   prompt_count, version, created_at, updated_at
            FROM user_assignment_state
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("load assignment state", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let state = UserAssignmentState::try_from(row)?;

        let rows: Vec<RankingRow> = sqlx::query_as(
            r#"
            SELECT profile_id, cumulative_score, observation_count, max_score,
                   last_rank, consecutive_top_count, consecutive_drop_count, updated_at
            FROM user_profile_ranking_state
            WHERE user_id = $1
            ORDER BY profile_id
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("load ranking states", e))?;

        let states = rows
            .into_iter()
            .map(RankingState::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(AssignmentSnapshot::new(
            state,
            UserRankings::reconstitute(user_id.clone(), states),
        )))
    }

    async fn commit(&self, snapshot: &AssignmentSnapshot) -> Result<(), DomainError> {
        let state = &snapshot.state;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("begin transaction", e))?;

        let result = sqlx::query(
            r#"
            UPDATE user_assignment_state SET
                mode = $3,
                assigned_profile_id = $4,
                fallback_profile_id = $5,
                prompt_count = $6,
                updated_at = $7,
                version = version + 1
            WHERE user_id = $1 AND version = $2
            "#,
        )
        .bind(state.user_id().as_str())
        .bind(to_i64(state.version()))
        .bind(state.mode().as_str())
        .bind(state.assigned_profile_id().map(|p| p.as_str()))
        .bind(state.fallback_profile_id().map(|p| p.as_str()))
        .bind(to_i64(state.prompt_count()))
        .bind(state.updated_at().as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("update assignment state", e))?;

        if result.rows_affected() == 0 {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS (SELECT 1 FROM user_assignment_state WHERE user_id = $1)",
            )
            .bind(state.user_id().as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| db_error("check assignment state", e))?;

            let error = if exists {
                DomainError::new(
                    ErrorCode::ConcurrentUpdateConflict,
                    format!(
                        "Stale assignment state for {} at version {}",
                        state.user_id(),
                        state.version()
                    ),
                )
            } else {
                DomainError::new(
                    ErrorCode::UserNotFound,
                    format!("User not registered: {}", state.user_id()),
                )
            };
            return Err(error.with_detail("user_id", state.user_id().to_string()));
        }

        for ranking in snapshot.rankings.iter() {
            upsert_ranking(&mut tx, state.user_id(), ranking).await?;
        }

        tx.commit()
            .await
            .map_err(|e| db_error("commit transaction", e))?;

        Ok(())
    }
}
