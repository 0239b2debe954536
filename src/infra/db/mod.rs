//! Postgres-backed repository implementations.

mod groups;
mod posts;
mod sessions;
mod users;
mod util;

pub use util::map_sqlx_error;

use std::sync::Arc;

use sqlx::{
    Postgres, QueryBuilder,
    postgres::{PgPool, PgPoolOptions},
    query,
};

use crate::application::repos::{PostListScope, RepoError};

/// Columns selected for every post row: the post itself plus its author's
/// username and the joined group, when present.
const POST_SELECT: &str = "SELECT p.id, p.body, p.author_id, u.username AS author_username, \
     p.group_id, g.title AS group_title, g.slug AS group_slug, p.created_at \
     FROM posts p \
     INNER JOIN users u ON u.id = p.author_id \
     LEFT JOIN groups g ON g.id = p.group_id ";

#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }

    fn apply_scope_conditions(qb: &mut QueryBuilder<'_, Postgres>, scope: PostListScope) {
        match scope {
            PostListScope::All => {}
            PostListScope::Group(group_id) => {
                qb.push(" AND p.group_id = ");
                qb.push_bind(group_id);
            }
            PostListScope::Author(author_id) => {
                qb.push(" AND p.author_id = ");
                qb.push_bind(author_id);
            }
        }
    }

    fn convert_count(value: i64) -> Result<u64, RepoError> {
        value
            .try_into()
            .map_err(|_| RepoError::from_persistence("count exceeds supported range"))
    }
}
