mod auth;
mod compose;
mod forms;
mod middleware;
mod public;

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;
use url::form_urlencoded;

use crate::application::error::ErrorReport;
use crate::application::{accounts::AccountService, compose::ComposeService, feed::FeedService};
use crate::domain::entities::UserRecord;
use crate::presentation::views::ViewerView;

use middleware::{log_responses, set_request_context};

/// Cookie carrying the opaque session token.
pub const SESSION_COOKIE: &str = "ritrovo_session";

#[derive(Clone)]
pub struct HttpState {
    pub feed: Arc<FeedService>,
    pub compose: Arc<ComposeService>,
    pub accounts: Arc<AccountService>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(public::index))
        .route("/group/{slug}/", get(public::group_list))
        .route("/profile/{username}/", get(public::profile))
        .route("/posts/{id}/", get(public::post_detail))
        .route(
            "/create/",
            get(compose::create_form).post(compose::create_submit),
        )
        .route(
            "/posts/{id}/edit/",
            get(compose::edit_form).post(compose::edit_submit),
        )
        .route(
            "/auth/signup/",
            get(auth::signup_form).post(auth::signup_submit),
        )
        .route(
            "/auth/login/",
            get(auth::login_form).post(auth::login_submit),
        )
        .route("/auth/logout/", post(auth::logout))
        .fallback(public::fallback)
        .with_state(state)
        .layer(axum::middleware::from_fn(log_responses))
        .layer(axum::middleware::from_fn(set_request_context))
}

/// 302 Found, the redirect the classic form flows expect.
pub(crate) fn redirect_found(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => {
            let mut response = StatusCode::FOUND.into_response();
            response.headers_mut().insert(LOCATION, value);
            response
        }
        Err(err) => {
            let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
            ErrorReport::from_message(
                "infra::http::redirect_found",
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("invalid redirect location `{location}`: {err}"),
            )
            .attach(&mut response);
            response
        }
    }
}

/// Send an anonymous visitor to the login form, remembering where they were
/// headed.
pub(crate) fn login_redirect(next: &str) -> Response {
    let encoded: String = form_urlencoded::byte_serialize(next.as_bytes()).collect();
    redirect_found(&format!("/auth/login/?next={encoded}"))
}

/// Resolve the session cookie to a member. Failures degrade to anonymous so
/// public pages stay reachable when the session store misbehaves.
pub(crate) async fn current_user(state: &HttpState, jar: &CookieJar) -> Option<UserRecord> {
    let token = jar.get(SESSION_COOKIE)?.value().to_string();
    match state.accounts.resolve(&token).await {
        Ok(user) => user,
        Err(err) => {
            warn!(
                target = "ritrovo::http::session",
                error = %err,
                "session resolution failed; treating request as anonymous"
            );
            None
        }
    }
}

pub(crate) fn viewer_view(user: &Option<UserRecord>) -> Option<ViewerView> {
    user.as_ref().map(|user| ViewerView {
        username: user.username.clone(),
    })
}
