use async_trait::async_trait;
use sqlx::QueryBuilder;
use time::OffsetDateTime;

use crate::application::repos::{GroupsRepo, NewGroupParams, RepoError};
use crate::domain::entities::GroupRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct GroupRow {
    id: i64,
    title: String,
    slug: String,
    description: Option<String>,
    created_at: OffsetDateTime,
}

impl From<GroupRow> for GroupRecord {
    fn from(row: GroupRow) -> Self {
        GroupRecord {
            id: row.id,
            title: row.title,
            slug: row.slug,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

const GROUP_SELECT: &str = "SELECT id, title, slug, description, created_at FROM groups ";

#[async_trait]
impl GroupsRepo for PostgresRepositories {
    async fn create_group(&self, params: NewGroupParams) -> Result<GroupRecord, RepoError> {
        let mut qb =
            QueryBuilder::new("INSERT INTO groups (title, slug, description) VALUES (");
        qb.push_bind(&params.title);
        qb.push(", ");
        qb.push_bind(&params.slug);
        qb.push(", ");
        qb.push_bind(&params.description);
        qb.push(") RETURNING id, title, slug, description, created_at");

        let row = qb
            .build_query_as::<GroupRow>()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn list_all(&self) -> Result<Vec<GroupRecord>, RepoError> {
        let mut qb = QueryBuilder::new(GROUP_SELECT);
        qb.push(" ORDER BY LOWER(title), id");

        let rows = qb
            .build_query_as::<GroupRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(GroupRecord::from).collect())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError> {
        let mut qb = QueryBuilder::new(GROUP_SELECT);
        qb.push(" WHERE slug = ");
        qb.push_bind(slug);

        let row = qb
            .build_query_as::<GroupRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(GroupRecord::from))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<GroupRecord>, RepoError> {
        let mut qb = QueryBuilder::new(GROUP_SELECT);
        qb.push(" WHERE id = ");
        qb.push_bind(id);

        let row = qb
            .build_query_as::<GroupRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(GroupRecord::from))
    }
}
