use axum::{
    extract::{Form, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::application::accounts::AccountError;
use crate::application::error::HttpError;
use crate::presentation::views::{
    LayoutContext, LoginFormContext, LoginTemplate, SignupFormContext, SignupTemplate,
    render_template_response,
};

use super::{HttpState, SESSION_COOKIE, current_user, redirect_found, viewer_view};

use super::forms::{LoginForm, NextQuery, SignupForm};

pub(crate) async fn login_form(
    State(state): State<HttpState>,
    Query(query): Query<NextQuery>,
    jar: CookieJar,
) -> Response {
    let user = current_user(&state, &jar).await;
    if user.is_some() {
        return redirect_found("/");
    }

    let content = LoginFormContext {
        next: sanitize_next(query.next),
        ..LoginFormContext::default()
    };
    let view = LayoutContext::new(None, content);
    render_template_response(LoginTemplate { view }, StatusCode::OK)
}

pub(crate) async fn login_submit(
    State(state): State<HttpState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let next = sanitize_next(form.next);

    match state.accounts.log_in(&form.username, &form.password).await {
        Ok(session) => {
            let jar = jar.add(session_cookie(session.token));
            let target = next.unwrap_or_else(|| "/".to_string());
            (jar, redirect_found(&target)).into_response()
        }
        Err(AccountError::InvalidCredentials) => {
            let content = LoginFormContext {
                username: form.username,
                next,
                error: Some("Invalid username or password.".to_string()),
            };
            let view = LayoutContext::new(None, content);
            render_template_response(LoginTemplate { view }, StatusCode::OK)
        }
        Err(err) => auth_error_response("infra::http::auth::login_submit", err),
    }
}

pub(crate) async fn logout(State(state): State<HttpState>, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let token = cookie.value().to_string();
        if let Err(err) = state.accounts.log_out(&token).await {
            return auth_error_response("infra::http::auth::logout", err);
        }
    }

    let mut removal = Cookie::from(SESSION_COOKIE);
    removal.set_path("/");
    let jar = jar.remove(removal);

    (jar, redirect_found("/")).into_response()
}

pub(crate) async fn signup_form(State(state): State<HttpState>, jar: CookieJar) -> Response {
    let user = current_user(&state, &jar).await;
    if user.is_some() {
        return redirect_found("/");
    }

    let view = LayoutContext::new(viewer_view(&user), SignupFormContext::default());
    render_template_response(SignupTemplate { view }, StatusCode::OK)
}

pub(crate) async fn signup_submit(
    State(state): State<HttpState>,
    Form(form): Form<SignupForm>,
) -> Response {
    if form.password != form.confirm {
        return rerender_signup(form.username, "Passwords do not match.");
    }

    match state.accounts.sign_up(&form.username, &form.password).await {
        Ok(_user) => redirect_found("/auth/login/"),
        Err(AccountError::UsernameTaken) => {
            rerender_signup(form.username, "That username is already taken.")
        }
        Err(AccountError::Domain(err)) => {
            let message = err.to_string();
            let content = SignupFormContext {
                username: form.username,
                error: Some(message),
            };
            let view = LayoutContext::new(None, content);
            render_template_response(SignupTemplate { view }, StatusCode::OK)
        }
        Err(err) => auth_error_response("infra::http::auth::signup_submit", err),
    }
}

fn rerender_signup(username: String, message: &str) -> Response {
    let content = SignupFormContext {
        username,
        error: Some(message.to_string()),
    };
    let view = LayoutContext::new(None, content);
    render_template_response(SignupTemplate { view }, StatusCode::OK)
}

fn session_cookie(token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

/// Only follow redirects into this site: a single leading slash, nothing
/// protocol-relative.
fn sanitize_next(next: Option<String>) -> Option<String> {
    next.filter(|value| value.starts_with('/') && !value.starts_with("//"))
}

fn auth_error_response(source: &'static str, err: AccountError) -> Response {
    HttpError::from_error(
        source,
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error",
        &err,
    )
    .into_response()
}
