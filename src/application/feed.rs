//! Listing pipeline shared by the index, group and profile pages.

use std::sync::Arc;

use thiserror::Error;

use crate::application::pagination::{PageNumber, PageWindow};
use crate::application::repos::{GroupsRepo, PostListScope, PostsRepo, RepoError, UsersRepo};
use crate::domain::entities::PostRecord;
use crate::domain::posts;
use crate::presentation::views::{
    GroupBadge, GroupListContext, ListingContext, PostCard, PostDetailContext, ProfileContext,
};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("unknown group")]
    UnknownGroup,
    #[error("unknown member")]
    UnknownAuthor,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostsRepo>,
    groups: Arc<dyn GroupsRepo>,
    users: Arc<dyn UsersRepo>,
    page_size: u32,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        groups: Arc<dyn GroupsRepo>,
        users: Arc<dyn UsersRepo>,
        page_size: u32,
    ) -> Self {
        Self {
            posts,
            groups,
            users,
            page_size,
        }
    }

    pub async fn index_listing(&self, page: PageNumber) -> Result<ListingContext, FeedError> {
        self.listing(PostListScope::All, "/".to_string(), page)
            .await
    }

    pub async fn group_listing(
        &self,
        slug: &str,
        page: PageNumber,
    ) -> Result<GroupListContext, FeedError> {
        let group = self
            .groups
            .find_by_slug(slug)
            .await?
            .ok_or(FeedError::UnknownGroup)?;

        let listing = self
            .listing(
                PostListScope::Group(group.id),
                format!("/group/{}/", group.slug),
                page,
            )
            .await?;

        Ok(GroupListContext {
            title: group.title,
            slug: group.slug,
            description: group.description,
            listing,
        })
    }

    pub async fn profile_listing(
        &self,
        username: &str,
        page: PageNumber,
    ) -> Result<ProfileContext, FeedError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(FeedError::UnknownAuthor)?;

        let listing = self
            .listing(
                PostListScope::Author(user.id),
                format!("/profile/{}/", user.username),
                page,
            )
            .await?;

        Ok(ProfileContext {
            username: user.username,
            listing,
        })
    }

    pub async fn post_detail(&self, id: i64) -> Result<Option<PostDetailContext>, FeedError> {
        let Some(record) = self.posts.find_by_id(id).await? else {
            return Ok(None);
        };

        Ok(Some(PostDetailContext {
            id: record.id,
            body: record.body.clone(),
            author_username: record.author_username.clone(),
            group: group_badge(&record),
            published: posts::format_human_date(record.created_at),
            iso_date: posts::format_iso_date(record.created_at),
        }))
    }

    async fn listing(
        &self,
        scope: PostListScope,
        base_path: String,
        page: PageNumber,
    ) -> Result<ListingContext, FeedError> {
        let total_count = self.posts.count_posts(scope).await?;
        let window = PageWindow::compute(page, self.page_size, total_count);

        let records = self
            .posts
            .list_posts(scope, window.limit(), window.offset())
            .await?;

        let cards = records.iter().map(record_to_card).collect();

        Ok(ListingContext {
            posts: cards,
            page_obj: window.into(),
            base_path,
        })
    }
}

fn record_to_card(record: &PostRecord) -> PostCard {
    PostCard {
        id: record.id,
        preview: posts::preview(&record.body),
        author_username: record.author_username.clone(),
        group: group_badge(record),
        published: posts::format_human_date(record.created_at),
        iso_date: posts::format_iso_date(record.created_at),
    }
}

fn group_badge(record: &PostRecord) -> Option<GroupBadge> {
    record.group.as_ref().map(|group| GroupBadge {
        title: group.title.clone(),
        slug: group.slug.clone(),
    })
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use time::OffsetDateTime;

    use super::*;
    use crate::application::repos::{NewGroupParams, NewUserParams};
    use crate::domain::entities::{GroupRecord, PostGroupRef, UserRecord};

    struct StubPostsRepo {
        total: u64,
    }

    #[async_trait]
    impl PostsRepo for StubPostsRepo {
        async fn list_posts(
            &self,
            _scope: PostListScope,
            limit: u32,
            offset: u64,
        ) -> Result<Vec<PostRecord>, RepoError> {
            let remaining = self.total.saturating_sub(offset);
            let count = remaining.min(u64::from(limit));
            let posts = (0..count)
                .map(|index| sample_post((offset + index + 1) as i64))
                .collect();
            Ok(posts)
        }

        async fn count_posts(&self, _scope: PostListScope) -> Result<u64, RepoError> {
            Ok(self.total)
        }

        async fn find_by_id(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
            Ok((id as u64 <= self.total).then(|| sample_post(id)))
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

    struct StubUsersRepo {
        record: Option<UserRecord>,
    }

    #[async_trait]
    impl UsersRepo for StubUsersRepo {
        async fn create_user(&self, _params: NewUserParams) -> Result<UserRecord, RepoError> {
            unreachable!("not used in these tests")
        }

        async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError> {
            Ok(self.record.clone().filter(|user| user.username == username))
        }

        async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, RepoError> {
            Ok(self.record.clone().filter(|user| user.id == id))
        }
    }

    fn sample_post(id: i64) -> PostRecord {
        PostRecord {
            id,
            body: format!("post {id}"),
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

    fn sample_user() -> UserRecord {
        UserRecord {
            id: 1,
            username: "auth".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn sample_group() -> GroupRecord {
        GroupRecord {
            id: 7,
            title: "Evening Notes".to_string(),
            slug: "evening-notes".to_string(),
            description: Some("Nightly writing".to_string()),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn service(total: u64) -> FeedService {
        FeedService::new(
            Arc::new(StubPostsRepo { total }),
            Arc::new(StubGroupsRepo {
                record: Some(sample_group()),
            }),
            Arc::new(StubUsersRepo {
                record: Some(sample_user()),
            }),
            10,
        )
    }

    #[tokio::test]
    async fn second_page_of_thirteen_posts_has_three_cards() {
        let listing = service(13)
            .index_listing(PageNumber::new(2))
            .await
            .expect("listing");

        assert_eq!(listing.posts.len(), 3);
        assert_eq!(listing.page_obj.number, 2);
        assert_eq!(listing.page_obj.total_pages, 2);
        assert!(listing.page_obj.has_previous);
        assert!(!listing.page_obj.has_next);
    }

    #[tokio::test]
    async fn group_listing_resolves_slug_and_base_path() {
        let context = service(3)
            .group_listing("evening-notes", PageNumber::FIRST)
            .await
            .expect("group listing");

        assert_eq!(context.title, "Evening Notes");
        assert_eq!(context.listing.base_path, "/group/evening-notes/");
        assert_eq!(context.listing.posts.len(), 3);
    }

    #[tokio::test]
    async fn unknown_group_slug_is_reported() {
        let err = service(3)
            .group_listing("missing", PageNumber::FIRST)
            .await
            .expect_err("unknown group");
        assert!(matches!(err, FeedError::UnknownGroup));
    }

    #[tokio::test]
    async fn unknown_profile_is_reported() {
        let err = service(3)
            .profile_listing("nobody", PageNumber::FIRST)
            .await
            .expect_err("unknown member");
        assert!(matches!(err, FeedError::UnknownAuthor));
    }

    #[tokio::test]
    async fn post_detail_returns_full_body() {
        let detail = service(5)
            .post_detail(4)
            .await
            .expect("lookup")
            .expect("post exists");
        assert_eq!(detail.id, 4);
        assert_eq!(detail.body, "post 4");
        assert_eq!(detail.author_username, "auth");
    }
}
