use async_trait::async_trait;
use sqlx::QueryBuilder;
use time::OffsetDateTime;

use crate::application::repos::{NewSessionParams, RepoError, SessionsRepo};
use crate::domain::entities::SessionRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: i64,
    user_id: i64,
    prefix: String,
    hashed_secret: Vec<u8>,
    created_at: OffsetDateTime,
    expires_at: OffsetDateTime,
}

impl From<SessionRow> for SessionRecord {
    fn from(row: SessionRow) -> Self {
        SessionRecord {
            id: row.id,
            user_id: row.user_id,
            prefix: row.prefix,
            hashed_secret: row.hashed_secret,
            created_at: row.created_at,
            expires_at: row.expires_at,
        }
    }
}

#[async_trait]
impl SessionsRepo for PostgresRepositories {
    async fn insert_session(&self, params: NewSessionParams) -> Result<SessionRecord, RepoError> {
        let mut qb = QueryBuilder::new(
            "INSERT INTO sessions (user_id, prefix, hashed_secret, expires_at) VALUES (",
        );
        qb.push_bind(params.user_id);
        qb.push(", ");
        qb.push_bind(&params.prefix);
        qb.push(", ");
        qb.push_bind(&params.hashed_secret);
        qb.push(", ");
        qb.push_bind(params.expires_at);
        qb.push(") RETURNING id, user_id, prefix, hashed_secret, created_at, expires_at");

        let row = qb
            .build_query_as::<SessionRow>()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn find_by_prefix(&self, prefix: &str) -> Result<Option<SessionRecord>, RepoError> {
        let mut qb = QueryBuilder::new(
            "SELECT id, user_id, prefix, hashed_secret, created_at, expires_at \
             FROM sessions WHERE prefix = ",
        );
        qb.push_bind(prefix);

        let row = qb
            .build_query_as::<SessionRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(SessionRecord::from))
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<(), RepoError> {
        let mut qb = QueryBuilder::new("DELETE FROM sessions WHERE prefix = ");
        qb.push_bind(prefix);

        qb.build()
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn delete_expired(&self, now: OffsetDateTime) -> Result<u64, RepoError> {
        let mut qb = QueryBuilder::new("DELETE FROM sessions WHERE expires_at <= ");
        qb.push_bind(now);

        let result = qb
            .build()
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
