use async_trait::async_trait;
use sqlx::QueryBuilder;
use time::OffsetDateTime;

use crate::application::repos::{NewUserParams, RepoError, UsersRepo};
use crate::domain::entities::UserRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    created_at: OffsetDateTime,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        UserRecord {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

const USER_SELECT: &str = "SELECT id, username, password_hash, created_at FROM users ";

#[async_trait]
impl UsersRepo for PostgresRepositories {
    async fn create_user(&self, params: NewUserParams) -> Result<UserRecord, RepoError> {
        let mut qb = QueryBuilder::new("INSERT INTO users (username, password_hash) VALUES (");
        qb.push_bind(&params.username);
        qb.push(", ");
        qb.push_bind(&params.password_hash);
        qb.push(") RETURNING id, username, password_hash, created_at");

        let row = qb
            .build_query_as::<UserRow>()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError> {
        let mut qb = QueryBuilder::new(USER_SELECT);
        qb.push(" WHERE username = ");
        qb.push_bind(username);

        let row = qb
            .build_query_as::<UserRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(UserRecord::from))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, RepoError> {
        let mut qb = QueryBuilder::new(USER_SELECT);
        qb.push(" WHERE id = ");
        qb.push_bind(id);

        let row = qb
            .build_query_as::<UserRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(UserRecord::from))
    }
}
