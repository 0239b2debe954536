use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::application::error::HttpError;
use crate::application::feed::FeedError;
use crate::application::pagination::{PageNumber, PageQuery};
use crate::presentation::views::{
    GroupListTemplate, IndexTemplate, LayoutContext, PostDetailTemplate, ProfileTemplate,
    render_not_found_response, render_template_response,
};

use super::{HttpState, current_user, viewer_view};

pub(crate) async fn index(
    State(state): State<HttpState>,
    Query(query): Query<PageQuery>,
    jar: CookieJar,
) -> Response {
    let user = current_user(&state, &jar).await;
    let page = PageNumber::from(&query);

    match state.feed.index_listing(page).await {
        Ok(content) => {
            let view = LayoutContext::new(viewer_view(&user), content);
            render_template_response(IndexTemplate { view }, StatusCode::OK)
        }
        Err(err) => HttpError::from(err).into_response(),
    }
}

pub(crate) async fn group_list(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
    jar: CookieJar,
) -> Response {
    let user = current_user(&state, &jar).await;
    let page = PageNumber::from(&query);

    match state.feed.group_listing(&slug, page).await {
        Ok(content) => {
            let view = LayoutContext::new(viewer_view(&user), content);
            render_template_response(GroupListTemplate { view }, StatusCode::OK)
        }
        Err(FeedError::UnknownGroup) => {
            render_not_found_response(viewer_view(&user))
        }
        Err(err) => HttpError::from(err).into_response(),
    }
}

pub(crate) async fn profile(
    State(state): State<HttpState>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
    jar: CookieJar,
) -> Response {
    let user = current_user(&state, &jar).await;
    let page = PageNumber::from(&query);

    match state.feed.profile_listing(&username, page).await {
        Ok(content) => {
            let view = LayoutContext::new(viewer_view(&user), content);
            render_template_response(ProfileTemplate { view }, StatusCode::OK)
        }
        Err(FeedError::UnknownAuthor) => {
            render_not_found_response(viewer_view(&user))
        }
        Err(err) => HttpError::from(err).into_response(),
    }
}

pub(crate) async fn post_detail(
    State(state): State<HttpState>,
    Path(id): Path<String>,
    jar: CookieJar,
) -> Response {
    let user = current_user(&state, &jar).await;

    // Route params are matched as raw segments; a non-numeric id is an
    // unknown resource, not a malformed request.
    let Ok(id) = id.parse::<i64>() else {
        return render_not_found_response(viewer_view(&user));
    };

    match state.feed.post_detail(id).await {
        Ok(Some(content)) => {
            let view = LayoutContext::new(viewer_view(&user), content);
            render_template_response(PostDetailTemplate { view }, StatusCode::OK)
        }
        Ok(None) => render_not_found_response(viewer_view(&user)),
        Err(err) => HttpError::from(err).into_response(),
    }
}

pub(crate) async fn fallback(State(state): State<HttpState>, jar: CookieJar) -> Response {
    let user = current_user(&state, &jar).await;
    render_not_found_response(viewer_view(&user))
}
