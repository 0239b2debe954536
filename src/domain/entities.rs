//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRecord {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: OffsetDateTime,
}

/// Group columns joined onto a post row for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostGroupRef {
    pub id: i64,
    pub title: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    pub id: i64,
    pub body: String,
    pub author_id: i64,
    pub author_username: String,
    pub group: Option<PostGroupRef>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRecord {
    pub id: i64,
    pub user_id: i64,
    pub prefix: String,
    pub hashed_secret: Vec<u8>,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}
