use async_trait::async_trait;
use sqlx::QueryBuilder;
use time::OffsetDateTime;

use crate::application::repos::{
    NewPostParams, PostListScope, PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams,
};
use crate::domain::entities::{PostGroupRef, PostRecord};

use super::{POST_SELECT, PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    body: String,
    author_id: i64,
    author_username: String,
    group_id: Option<i64>,
    group_title: Option<String>,
    group_slug: Option<String>,
    created_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        let group = match (row.group_id, row.group_title, row.group_slug) {
            (Some(id), Some(title), Some(slug)) => Some(PostGroupRef { id, title, slug }),
            _ => None,
        };

        PostRecord {
            id: row.id,
            body: row.body,
            author_id: row.author_id,
            author_username: row.author_username,
            group,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_posts(
        &self,
        scope: PostListScope,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let limit = i64::from(limit.clamp(1, 100));
        let offset = i64::try_from(offset)
            .map_err(|_| RepoError::from_persistence("offset exceeds supported range"))?;

        let mut qb = QueryBuilder::new(POST_SELECT);
        qb.push(" WHERE 1=1 ");
        Self::apply_scope_conditions(&mut qb, scope);
        qb.push(" ORDER BY p.created_at DESC, p.id DESC ");
        qb.push(" LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn count_posts(&self, scope: PostListScope) -> Result<u64, RepoError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM posts p WHERE 1=1 ");
        Self::apply_scope_conditions(&mut qb, scope);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Self::convert_count(count)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        let mut qb = QueryBuilder::new(POST_SELECT);
        qb.push(" WHERE p.id = ");
        qb.push_bind(id);

        let row = qb
            .build_query_as::<PostRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }
}

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: NewPostParams) -> Result<PostRecord, RepoError> {
        let mut qb = QueryBuilder::new("INSERT INTO posts (body, author_id, group_id) VALUES (");
        qb.push_bind(&params.body);
        qb.push(", ");
        qb.push_bind(params.author_id);
        qb.push(", ");
        qb.push_bind(params.group_id);
        qb.push(") RETURNING id");

        let id: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        self.find_by_id(id).await?.ok_or(RepoError::NotFound)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let mut qb = QueryBuilder::new("UPDATE posts SET body = ");
        qb.push_bind(&params.body);
        qb.push(", group_id = ");
        qb.push_bind(params.group_id);
        qb.push(" WHERE id = ");
        qb.push_bind(params.id);
        qb.push(" RETURNING id");

        let id: Option<i64> = qb
            .build_query_scalar()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        match id {
            Some(id) => self.find_by_id(id).await?.ok_or(RepoError::NotFound),
            None => Err(RepoError::NotFound),
        }
    }
}
