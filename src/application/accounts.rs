//! Member accounts and cookie sessions.
//!
//! Session tokens are opaque `rs_<prefix>_<secret>` strings. Only the
//! SHA-256 digest of the secret is persisted; lookup goes through the random
//! prefix and the digest comparison is constant-time.

use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::application::repos::{
    NewSessionParams, NewUserParams, RepoError, SessionsRepo, UsersRepo,
};
use crate::domain::entities::UserRecord;
use crate::domain::error::DomainError;
use crate::domain::users;

const TOKEN_PREFIX: &str = "rs";
const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("username is already taken")]
    UsernameTaken,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub user: UserRecord,
    pub token: String,
    pub expires_at: OffsetDateTime,
}

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UsersRepo>,
    sessions: Arc<dyn SessionsRepo>,
    session_ttl: Duration,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UsersRepo>,
        sessions: Arc<dyn SessionsRepo>,
        session_ttl: Duration,
    ) -> Self {
        Self {
            users,
            sessions,
            session_ttl,
        }
    }

    /// Register a new member. The username must be free and the password
    /// long enough; the stored hash is an Argon2id PHC string.
    pub async fn sign_up(&self, username: &str, password: &str) -> Result<UserRecord, AccountError> {
        let username = users::normalize_username(username)?;
        users::check_password(password)?;

        if self.users.find_by_username(&username).await?.is_some() {
            return Err(AccountError::UsernameTaken);
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| AccountError::Hashing(err.to_string()))?
            .to_string();

        let user = self
            .users
            .create_user(NewUserParams {
                username,
                password_hash,
            })
            .await
            .map_err(|err| match err {
                RepoError::Duplicate { .. } => AccountError::UsernameTaken,
                other => AccountError::Repo(other),
            })?;

        Ok(user)
    }

    /// Verify credentials and issue a fresh session token.
    pub async fn log_in(&self, username: &str, password: &str) -> Result<IssuedSession, AccountError> {
        let user = self
            .users
            .find_by_username(username.trim())
            .await?
            .ok_or(AccountError::InvalidCredentials)?;

        let parsed = PasswordHash::new(&user.password_hash)
            .map_err(|err| AccountError::Hashing(err.to_string()))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| AccountError::InvalidCredentials)?;

        let prefix = Self::generate_prefix();
        let secret = Self::generate_secret();
        let token = format!("{TOKEN_PREFIX}_{prefix}_{secret}");
        let expires_at = OffsetDateTime::now_utc() + self.session_ttl;

        self.sessions
            .insert_session(NewSessionParams {
                user_id: user.id,
                prefix,
                hashed_secret: Self::hash_secret(&secret),
                expires_at,
            })
            .await?;

        Ok(IssuedSession {
            user,
            token,
            expires_at,
        })
    }

    /// Drop the session behind a presented token. Unknown or malformed
    /// tokens are ignored: logout is idempotent.
    pub async fn log_out(&self, token: &str) -> Result<(), AccountError> {
        if let Some(parsed) = Self::parse_token(token) {
            self.sessions.delete_by_prefix(&parsed.prefix).await?;
        }
        Ok(())
    }

    /// Resolve a presented token to its member. Expired, unknown and
    /// malformed tokens all read as anonymous.
    pub async fn resolve(&self, token: &str) -> Result<Option<UserRecord>, AccountError> {
        let Some(parsed) = Self::parse_token(token) else {
            return Ok(None);
        };

        let Some(session) = self.sessions.find_by_prefix(&parsed.prefix).await? else {
            return Ok(None);
        };

        if session.expires_at <= OffsetDateTime::now_utc() {
            return Ok(None);
        }

        let hashed_input = Self::hash_secret(&parsed.secret);
        if session.hashed_secret.ct_eq(&hashed_input).unwrap_u8() == 0 {
            return Ok(None);
        }

        self.users.find_by_id(session.user_id).await.map_err(Into::into)
    }

    /// Startup sweep removing stale rows.
    pub async fn purge_expired_sessions(&self) -> Result<u64, AccountError> {
        self.sessions
            .delete_expired(OffsetDateTime::now_utc())
            .await
            .map_err(Into::into)
    }

    fn hash_secret(secret: &str) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(secret.as_bytes());
        hasher.finalize().to_vec()
    }

    fn generate_prefix() -> String {
        Uuid::new_v4().simple().to_string()[..12].to_string()
    }

    fn generate_secret() -> String {
        format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
    }

    fn parse_token(token: &str) -> Option<ParsedToken> {
        let mut parts = token.splitn(3, '_');
        let prefix_tag = parts.next()?;
        if prefix_tag != TOKEN_PREFIX {
            return None;
        }
        let prefix = parts.next()?;
        let secret = parts.next()?;
        if secret.len() < MIN_SECRET_LEN || prefix.is_empty() {
            return None;
        }
        Some(ParsedToken {
            prefix: prefix.to_string(),
            secret: secret.to_string(),
        })
    }
}

struct ParsedToken {
    prefix: String,
    secret: String,
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::domain::entities::SessionRecord;

    #[derive(Default)]
    struct MemoryUsersRepo {
        users: Mutex<Vec<UserRecord>>,
    }

    #[async_trait]
    impl UsersRepo for MemoryUsersRepo {
        async fn create_user(&self, params: NewUserParams) -> Result<UserRecord, RepoError> {
            let mut users = self.users.lock().unwrap();
            if users.iter().any(|user| user.username == params.username) {
                return Err(RepoError::Duplicate {
                    constraint: "users_username_key".to_string(),
                });
            }
            let record = UserRecord {
                id: users.len() as i64 + 1,
                username: params.username,
                password_hash: params.password_hash,
                created_at: OffsetDateTime::now_utc(),
            };
            users.push(record.clone());
            Ok(record)
        }

        async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError> {
            let users = self.users.lock().unwrap();
            Ok(users.iter().find(|user| user.username == username).cloned())
        }

        async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, RepoError> {
            let users = self.users.lock().unwrap();
            Ok(users.iter().find(|user| user.id == id).cloned())
        }
    }

    #[derive(Default)]
    struct MemorySessionsRepo {
        sessions: Mutex<HashMap<String, SessionRecord>>,
    }

    #[async_trait]
    impl SessionsRepo for MemorySessionsRepo {
        async fn insert_session(
            &self,
            params: NewSessionParams,
        ) -> Result<SessionRecord, RepoError> {
            let mut sessions = self.sessions.lock().unwrap();
            let record = SessionRecord {
                id: sessions.len() as i64 + 1,
                user_id: params.user_id,
                prefix: params.prefix.clone(),
                hashed_secret: params.hashed_secret,
                created_at: OffsetDateTime::now_utc(),
                expires_at: params.expires_at,
            };
            sessions.insert(params.prefix, record.clone());
            Ok(record)
        }

        async fn find_by_prefix(&self, prefix: &str) -> Result<Option<SessionRecord>, RepoError> {
            Ok(self.sessions.lock().unwrap().get(prefix).cloned())
        }

        async fn delete_by_prefix(&self, prefix: &str) -> Result<(), RepoError> {
            self.sessions.lock().unwrap().remove(prefix);
            Ok(())
        }

        async fn delete_expired(&self, now: OffsetDateTime) -> Result<u64, RepoError> {
            let mut sessions = self.sessions.lock().unwrap();
            let before = sessions.len();
            sessions.retain(|_, session| session.expires_at > now);
            Ok((before - sessions.len()) as u64)
        }
    }

    fn service() -> AccountService {
        AccountService::new(
            Arc::new(MemoryUsersRepo::default()),
            Arc::new(MemorySessionsRepo::default()),
            Duration::days(14),
        )
    }

    #[tokio::test]
    async fn signup_login_resolve_round_trip() {
        let accounts = service();
        let user = accounts
            .sign_up("auth", "correct horse battery")
            .await
            .expect("signed up");
        assert_eq!(user.username, "auth");
        assert!(user.password_hash.starts_with("$argon2"));

        let session = accounts
            .log_in("auth", "correct horse battery")
            .await
            .expect("logged in");
        assert!(session.token.starts_with("rs_"));

        let resolved = accounts
            .resolve(&session.token)
            .await
            .expect("resolve")
            .expect("session valid");
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let accounts = service();
        accounts
            .sign_up("auth", "correct horse battery")
            .await
            .expect("signed up");

        let err = accounts
            .log_in("auth", "wrong password!")
            .await
            .expect_err("rejected");
        assert!(matches!(err, AccountError::InvalidCredentials));
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let accounts = service();
        accounts
            .sign_up("auth", "correct horse battery")
            .await
            .expect("signed up");

        let err = accounts
            .sign_up("auth", "another password!")
            .await
            .expect_err("duplicate rejected");
        assert!(matches!(err, AccountError::UsernameTaken));
    }

    #[tokio::test]
    async fn logout_invalidates_the_token() {
        let accounts = service();
        accounts
            .sign_up("auth", "correct horse battery")
            .await
            .expect("signed up");
        let session = accounts
            .log_in("auth", "correct horse battery")
            .await
            .expect("logged in");

        accounts.log_out(&session.token).await.expect("logged out");
        let resolved = accounts.resolve(&session.token).await.expect("resolve");
        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn garbage_tokens_read_as_anonymous() {
        let accounts = service();
        for token in ["", "rs_short", "xx_abcdef_0123456789", "rs__"] {
            let resolved = accounts.resolve(token).await.expect("resolve");
            assert!(resolved.is_none(), "token {token:?} resolved");
        }
    }
}
