//! Writing and editing posts through the compose form.

use std::sync::Arc;

use thiserror::Error;

use crate::application::repos::{
    GroupsRepo, NewPostParams, PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams,
};
use crate::domain::entities::{GroupRecord, PostRecord, UserRecord};
use crate::domain::posts;

/// Raw form fields as submitted. `group` carries the group id as a decimal
/// string; an empty string means "no group".
#[derive(Debug, Clone, Default)]
pub struct PostInput {
    pub text: String,
    pub group: Option<String>,
}

/// Field-level problems reported back onto the re-rendered form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub text: Option<&'static str>,
    pub group: Option<&'static str>,
}

impl FieldErrors {
    fn is_empty(&self) -> bool {
        self.text.is_none() && self.group.is_none()
    }
}

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("form validation failed")]
    Validation(FieldErrors),
    #[error("post not found")]
    NotFound,
    #[error("only the author may edit this post")]
    NotAuthor,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct ComposeService {
    reader: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
    groups: Arc<dyn GroupsRepo>,
}

impl ComposeService {
    pub fn new(
        reader: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        groups: Arc<dyn GroupsRepo>,
    ) -> Self {
        Self {
            reader,
            writer,
            groups,
        }
    }

    /// Groups offered by the form's selection field.
    pub async fn group_choices(&self) -> Result<Vec<GroupRecord>, ComposeError> {
        self.groups.list_all().await.map_err(ComposeError::from)
    }

    pub async fn create_post(
        &self,
        author: &UserRecord,
        input: PostInput,
    ) -> Result<PostRecord, ComposeError> {
        let (body, group_id) = self.validate(&input).await?;

        let post = self
            .writer
            .create_post(NewPostParams {
                body,
                author_id: author.id,
                group_id,
            })
            .await?;

        Ok(post)
    }

    /// Load a post for the edit form, enforcing authorship.
    pub async fn editable_post(
        &self,
        editor: &UserRecord,
        id: i64,
    ) -> Result<PostRecord, ComposeError> {
        let post = self
            .reader
            .find_by_id(id)
            .await?
            .ok_or(ComposeError::NotFound)?;

        if post.author_id != editor.id {
            return Err(ComposeError::NotAuthor);
        }

        Ok(post)
    }

    pub async fn update_post(
        &self,
        editor: &UserRecord,
        id: i64,
        input: PostInput,
    ) -> Result<PostRecord, ComposeError> {
        // Authorship first: a forbidden edit must redirect before any
        // validation output leaks form state.
        self.editable_post(editor, id).await?;

        let (body, group_id) = self.validate(&input).await?;

        let post = self
            .writer
            .update_post(UpdatePostParams { id, body, group_id })
            .await?;

        Ok(post)
    }

    async fn validate(&self, input: &PostInput) -> Result<(String, Option<i64>), ComposeError> {
        let mut errors = FieldErrors::default();

        let body = match posts::normalize_body(&input.text) {
            Ok(body) => Some(body),
            Err(_) => {
                errors.text = Some("Write something before publishing.");
                None
            }
        };

        let group_id = match parse_group_field(input.group.as_deref()) {
            GroupField::None => None,
            GroupField::Invalid => {
                errors.group = Some("Select one of the listed groups.");
                None
            }
            GroupField::Id(id) => match self.groups.find_by_id(id).await? {
                Some(group) => Some(group.id),
                None => {
                    errors.group = Some("Select one of the listed groups.");
                    None
                }
            },
        };

        if !errors.is_empty() {
            return Err(ComposeError::Validation(errors));
        }

        // body is always Some here: a missing body set errors.text above.
        Ok((body.unwrap_or_default(), group_id))
    }
}

enum GroupField {
    None,
    Invalid,
    Id(i64),
}

fn parse_group_field(raw: Option<&str>) -> GroupField {
    match raw.map(str::trim) {
        None | Some("") => GroupField::None,
        Some(value) => match value.parse::<i64>() {
            Ok(id) if id > 0 => GroupField::Id(id),
            _ => GroupField::Invalid,
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use time::OffsetDateTime;

    use super::*;
    use crate::application::repos::{NewGroupParams, PostListScope};
    use crate::domain::entities::PostGroupRef;

    struct StubPostsRepo {
        record: Option<PostRecord>,
    }

    #[async_trait]
    impl PostsRepo for StubPostsRepo {
        async fn list_posts(
            &self,
            _scope: PostListScope,
            _limit: u32,
            _offset: u64,
        ) -> Result<Vec<PostRecord>, RepoError> {
            Ok(Vec::new())
        }

        async fn count_posts(&self, _scope: PostListScope) -> Result<u64, RepoError> {
            Ok(0)
        }

        async fn find_by_id(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
            Ok(self.record.clone().filter(|post| post.id == id))
        }
    }

    #[derive(Default)]
    struct RecordingPostsWriter {
        created: Mutex<Vec<NewPostParams>>,
        updated: Mutex<Vec<UpdatePostParams>>,
    }

    #[async_trait]
    impl PostsWriteRepo for RecordingPostsWriter {
        async fn create_post(&self, params: NewPostParams) -> Result<PostRecord, RepoError> {
            self.created.lock().unwrap().push(params.clone());
            Ok(PostRecord {
                id: 1,
                body: params.body,
                author_id: params.author_id,
                author_username: "auth".to_string(),
                group: None,
                created_at: OffsetDateTime::now_utc(),
            })
        }

        async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
            self.updated.lock().unwrap().push(params.clone());
            Ok(PostRecord {
                id: params.id,
                body: params.body,
                author_id: 1,
                author_username: "auth".to_string(),
                group: None,
                created_at: OffsetDateTime::now_utc(),
            })
        }
    }

    struct StubGroupsRepo {
        record: Option<GroupRecord>,
    }

    #[async_trait]
    impl GroupsRepo for StubGroupsRepo {
        async fn create_group(&self, _params: NewGroupParams) -> Result<GroupRecord, RepoError> {
            unreachable!("not used in these tests")
        }

        async fn list_all(&self) -> Result<Vec<GroupRecord>, RepoError> {
            Ok(self.record.clone().into_iter().collect())
        }

        async fn find_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError> {
            Ok(self.record.clone().filter(|group| group.slug == slug))
        }

        async fn find_by_id(&self, id: i64) -> Result<Option<GroupRecord>, RepoError> {
            Ok(self.record.clone().filter(|group| group.id == id))
        }
    }

    fn author() -> UserRecord {
        UserRecord {
            id: 1,
            username: "auth".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn other_user() -> UserRecord {
        UserRecord {
            id: 2,
            username: "auth2".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn existing_post() -> PostRecord {
        PostRecord {
            id: 12,
            body: "original text".to_string(),
            author_id: 1,
            author_username: "auth".to_string(),
            group: Some(PostGroupRef {
                id: 7,
                title: "Evening Notes".to_string(),
                slug: "evening-notes".to_string(),
            }),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn known_group() -> GroupRecord {
        GroupRecord {
            id: 7,
            title: "Evening Notes".to_string(),
            slug: "evening-notes".to_string(),
            description: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn service(
        post: Option<PostRecord>,
        group: Option<GroupRecord>,
    ) -> (ComposeService, Arc<RecordingPostsWriter>) {
        let writer = Arc::new(RecordingPostsWriter::default());
        let service = ComposeService::new(
            Arc::new(StubPostsRepo { record: post }),
            writer.clone(),
            Arc::new(StubGroupsRepo { record: group }),
        );
        (service, writer)
    }

    #[tokio::test]
    async fn create_trims_body_and_resolves_group() {
        let (service, writer) = service(None, Some(known_group()));
        let input = PostInput {
            text: "  hello there  ".to_string(),
            group: Some("7".to_string()),
        };

        let post = service.create_post(&author(), input).await.expect("created");
        assert_eq!(post.body, "hello there");

        let created = writer.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].group_id, Some(7));
        assert_eq!(created[0].author_id, 1);
    }

    #[tokio::test]
    async fn blank_body_fails_validation_without_writing() {
        let (service, writer) = service(None, Some(known_group()));
        let input = PostInput {
            text: "   ".to_string(),
            group: None,
        };

        let err = service
            .create_post(&author(), input)
            .await
            .expect_err("blank body rejected");
        match err {
            ComposeError::Validation(errors) => assert!(errors.text.is_some()),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(writer.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_group_id_fails_validation() {
        let (service, writer) = service(None, Some(known_group()));
        let input = PostInput {
            text: "valid body".to_string(),
            group: Some("999".to_string()),
        };

        let err = service
            .create_post(&author(), input)
            .await
            .expect_err("unknown group rejected");
        match err {
            ComposeError::Validation(errors) => assert!(errors.group.is_some()),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(writer.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_group_field_means_no_group() {
        let (service, writer) = service(None, Some(known_group()));
        let input = PostInput {
            text: "valid body".to_string(),
            group: Some(String::new()),
        };

        service.create_post(&author(), input).await.expect("created");
        assert_eq!(writer.created.lock().unwrap()[0].group_id, None);
    }

    #[tokio::test]
    async fn non_author_cannot_edit() {
        let (service, writer) = service(Some(existing_post()), Some(known_group()));
        let input = PostInput {
            text: "hijacked".to_string(),
            group: None,
        };

        let err = service
            .update_post(&other_user(), 12, input)
            .await
            .expect_err("non-author rejected");
        assert!(matches!(err, ComposeError::NotAuthor));
        assert!(writer.updated.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn author_edit_rewrites_body_and_keeps_id() {
        let (service, writer) = service(Some(existing_post()), Some(known_group()));
        let input = PostInput {
            text: "revised text".to_string(),
            group: Some(String::new()),
        };

        let post = service
            .update_post(&author(), 12, input)
            .await
            .expect("updated");
        assert_eq!(post.id, 12);
        assert_eq!(post.body, "revised text");

        let updated = writer.updated.lock().unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].id, 12);
    }

    #[tokio::test]
    async fn editing_missing_post_reports_not_found() {
        let (service, _writer) = service(None, None);
        let err = service
            .editable_post(&author(), 404)
            .await
            .expect_err("missing post");
        assert!(matches!(err, ComposeError::NotFound));
    }
}
