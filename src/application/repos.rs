//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::domain::entities::{GroupRecord, PostRecord, SessionRecord, UserRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Which subset of posts a listing query covers. Scopes carry resolved ids;
/// slug/username resolution happens in the services before the query runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostListScope {
    All,
    Group(i64),
    Author(i64),
}

#[derive(Debug, Clone)]
pub struct NewUserParams {
    pub username: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewGroupParams {
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPostParams {
    pub body: String,
    pub author_id: i64,
    pub group_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: i64,
    pub body: String,
    pub group_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewSessionParams {
    pub user_id: i64,
    pub prefix: String,
    pub hashed_secret: Vec<u8>,
    pub expires_at: OffsetDateTime,
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn create_user(&self, params: NewUserParams) -> Result<UserRecord, RepoError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, RepoError>;
}

#[async_trait]
pub trait GroupsRepo: Send + Sync {
    async fn create_group(&self, params: NewGroupParams) -> Result<GroupRecord, RepoError>;

    async fn list_all(&self) -> Result<Vec<GroupRecord>, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<GroupRecord>, RepoError>;
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// List posts in a scope ordered newest first (`created_at DESC, id DESC`).
    async fn list_posts(
        &self,
        scope: PostListScope,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<PostRecord>, RepoError>;

    async fn count_posts(&self, scope: PostListScope) -> Result<u64, RepoError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<PostRecord>, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: NewPostParams) -> Result<PostRecord, RepoError>;

    /// Rewrite body and group of an existing post. Authorship checks belong
    /// to the calling service; the author column is never touched here.
    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;
}

#[async_trait]
pub trait SessionsRepo: Send + Sync {
    async fn insert_session(&self, params: NewSessionParams) -> Result<SessionRecord, RepoError>;

    async fn find_by_prefix(&self, prefix: &str) -> Result<Option<SessionRecord>, RepoError>;

    async fn delete_by_prefix(&self, prefix: &str) -> Result<(), RepoError>;

    /// Remove sessions whose expiry has passed; returns the number deleted.
    async fn delete_expired(&self, now: OffsetDateTime) -> Result<u64, RepoError>;
}
