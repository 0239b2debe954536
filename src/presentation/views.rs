use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::application::error::{ErrorReport, HttpError};
use crate::application::pagination::PageWindow;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(viewer: Option<ViewerView>) -> Response {
    let content = ErrorPageView::not_found();
    let view = LayoutContext::new(viewer, content);
    let mut response = render_template_response(ErrorTemplate { view }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

/// The signed-in member shown in the layout chrome, if any.
#[derive(Clone)]
pub struct ViewerView {
    pub username: String,
}

#[derive(Clone)]
pub struct LayoutContext<T> {
    pub viewer: Option<ViewerView>,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(viewer: Option<ViewerView>, content: T) -> Self {
        Self { viewer, content }
    }
}

#[derive(Clone, Debug)]
pub struct GroupBadge {
    pub title: String,
    pub slug: String,
}

#[derive(Clone, Debug)]
pub struct PostCard {
    pub id: i64,
    pub preview: String,
    pub author_username: String,
    pub group: Option<GroupBadge>,
    pub published: String,
    pub iso_date: String,
}

/// Pagination window as rendered by the listing templates.
#[derive(Clone, Debug)]
pub struct PageObjView {
    pub number: u32,
    pub total_pages: u32,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_number: u32,
    pub next_number: u32,
    pub total_count: u64,
}

impl From<PageWindow> for PageObjView {
    fn from(window: PageWindow) -> Self {
        Self {
            number: window.number,
            total_pages: window.total_pages,
            has_previous: window.has_previous(),
            has_next: window.has_next(),
            previous_number: window.number.saturating_sub(1).max(1),
            next_number: window.number + 1,
            total_count: window.total_count,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ListingContext {
    pub posts: Vec<PostCard>,
    pub page_obj: PageObjView,
    /// Path the pagination links append `?page=N` to.
    pub base_path: String,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub view: LayoutContext<ListingContext>,
}

#[derive(Clone, Debug)]
pub struct GroupListContext {
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub listing: ListingContext,
}

#[derive(Template)]
#[template(path = "group_list.html")]
pub struct GroupListTemplate {
    pub view: LayoutContext<GroupListContext>,
}

#[derive(Clone, Debug)]
pub struct ProfileContext {
    pub username: String,
    pub listing: ListingContext,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub view: LayoutContext<ProfileContext>,
}

#[derive(Clone)]
pub struct PostDetailContext {
    pub id: i64,
    pub body: String,
    pub author_username: String,
    pub group: Option<GroupBadge>,
    pub published: String,
    pub iso_date: String,
}

#[derive(Template)]
#[template(path = "post_detail.html")]
pub struct PostDetailTemplate {
    pub view: LayoutContext<PostDetailContext>,
}

#[derive(Clone)]
pub struct GroupChoice {
    pub id: i64,
    pub title: String,
    pub selected: bool,
}

#[derive(Clone, Default)]
pub struct FieldErrorsView {
    pub text: Option<&'static str>,
    pub group: Option<&'static str>,
}

/// Shared by the create and edit forms; `action` points the form back at
/// whichever route rendered it.
#[derive(Clone)]
pub struct PostFormContext {
    pub is_edit: bool,
    pub action: String,
    pub text: String,
    pub groups: Vec<GroupChoice>,
    pub errors: FieldErrorsView,
}

#[derive(Template)]
#[template(path = "post_create.html")]
pub struct PostFormTemplate {
    pub view: LayoutContext<PostFormContext>,
}

#[derive(Clone, Default)]
pub struct LoginFormContext {
    pub username: String,
    pub next: Option<String>,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub view: LayoutContext<LoginFormContext>,
}

#[derive(Clone, Default)]
pub struct SignupFormContext {
    pub username: String,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupTemplate {
    pub view: LayoutContext<SignupFormContext>,
}

pub struct ErrorPageView {
    pub title: String,
    pub message: String,
}

impl ErrorPageView {
    pub fn not_found() -> Self {
        Self {
            title: "Page Not Found".to_string(),
            message: "The page you requested does not exist. Try returning to the homepage."
                .to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}
